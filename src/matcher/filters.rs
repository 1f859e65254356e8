//! Predicate evaluation against documents
//!
//! No type coercion. Numbers compare with numbers, strings with strings.
//! Missing fields and nulls never match.

use std::cmp::Ordering;

use serde_json::Value;

use crate::storage::Document;

use super::expression::{FilterOp, Predicate};

/// Evaluates predicates against documents
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks a single predicate.
    ///
    /// Returns None if the document does not match, otherwise the index of the
    /// element of the first array the path traversed (if any).
    pub fn match_predicate(document: &Document, predicate: &Predicate) -> Option<Option<usize>> {
        let parts: Vec<&str> = predicate.path.split('.').collect();
        let (head, rest) = parts.split_first()?;
        let value = document.get(*head)?;
        Self::match_path(value, rest, &predicate.op)
    }

    fn match_path(value: &Value, parts: &[&str], op: &FilterOp) -> Option<Option<usize>> {
        let (head, rest) = match parts.split_first() {
            Some(split) => split,
            None => return Self::match_leaf(value, op),
        };

        match value {
            Value::Object(map) => map.get(*head).and_then(|v| Self::match_path(v, rest, op)),
            Value::Array(items) => {
                // "a.1.b" addresses element 1 directly
                if let Ok(index) = head.parse::<usize>() {
                    if let Some(found) =
                        items.get(index).and_then(|v| Self::match_path(v, rest, op))
                    {
                        return Some(found);
                    }
                }
                items.iter().enumerate().find_map(|(i, item)| match item {
                    Value::Object(_) => Self::match_path(item, parts, op).map(|_| Some(i)),
                    _ => None,
                })
            }
            _ => None,
        }
    }

    fn match_leaf(value: &Value, op: &FilterOp) -> Option<Option<usize>> {
        match value {
            Value::Null => None,
            Value::Array(items) => {
                if Self::compare(value, op) {
                    return Some(None);
                }
                items
                    .iter()
                    .position(|item| !item.is_null() && Self::compare(item, op))
                    .map(Some)
            }
            _ => Self::compare(value, op).then_some(None),
        }
    }

    fn compare(actual: &Value, op: &FilterOp) -> bool {
        match op {
            FilterOp::Eq(expected) => actual == expected,
            FilterOp::Gte(bound) => Self::order(actual, bound).map_or(false, Ordering::is_ge),
            FilterOp::Gt(bound) => Self::order(actual, bound).map_or(false, Ordering::is_gt),
            FilterOp::Lte(bound) => Self::order(actual, bound).map_or(false, Ordering::is_le),
            FilterOp::Lt(bound) => Self::order(actual, bound).map_or(false, Ordering::is_lt),
        }
    }

    /// Orders two values of the same kind; None across kinds
    fn order(actual: &Value, bound: &Value) -> Option<Ordering> {
        match (actual, bound) {
            (Value::Number(a), Value::Number(b)) => {
                if let (Some(ai), Some(bi)) = (a.as_i64(), b.as_i64()) {
                    return Some(ai.cmp(&bi));
                }
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}
