//! Match expression structures

use serde_json::{Map, Value};

use crate::status::{Status, StatusResult};
use crate::storage::Document;

use super::filters::PredicateFilter;

/// Comparison applied at the end of a predicate path
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Equality: field = value
    Eq(Value),
    /// Greater than or equal: field >= value
    Gte(Value),
    /// Greater than: field > value
    Gt(Value),
    /// Less than or equal: field <= value
    Lte(Value),
    /// Less than: field < value
    Lt(Value),
}

impl FilterOp {
    /// Returns the operator name as written in a query
    pub fn op_name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "$eq",
            FilterOp::Gte(_) => "$gte",
            FilterOp::Gt(_) => "$gt",
            FilterOp::Lte(_) => "$lte",
            FilterOp::Lt(_) => "$lt",
        }
    }

    /// Returns the operand
    pub fn operand(&self) -> &Value {
        match self {
            FilterOp::Eq(v)
            | FilterOp::Gte(v)
            | FilterOp::Gt(v)
            | FilterOp::Lte(v)
            | FilterOp::Lt(v) => v,
        }
    }

    fn from_operator(name: &str, operand: Value) -> StatusResult<Self> {
        match name {
            "$eq" => Ok(FilterOp::Eq(operand)),
            "$gte" => Ok(FilterOp::Gte(operand)),
            "$gt" => Ok(FilterOp::Gt(operand)),
            "$lte" => Ok(FilterOp::Lte(operand)),
            "$lt" => Ok(FilterOp::Lt(operand)),
            other => Err(Status::bad_value(format!("unknown operator: {}", other))),
        }
    }
}

/// A single predicate (dotted path + operation)
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Dotted field path
    pub path: String,
    /// Comparison
    pub op: FilterOp,
}

impl Predicate {
    /// Create an equality predicate
    pub fn eq(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            op: FilterOp::Eq(value),
        }
    }

    /// Create a `$gte` predicate
    pub fn gte(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            op: FilterOp::Gte(value),
        }
    }

    /// Create a `$gt` predicate
    pub fn gt(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            op: FilterOp::Gt(value),
        }
    }

    /// Create a `$lte` predicate
    pub fn lte(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            op: FilterOp::Lte(value),
        }
    }

    /// Create a `$lt` predicate
    pub fn lt(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            op: FilterOp::Lt(value),
        }
    }
}

/// Extra information recorded while matching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchDetails {
    elem_match_key: Option<usize>,
}

impl MatchDetails {
    /// Index of the array element that satisfied the match, if an array was
    /// traversed
    pub fn elem_match_key(&self) -> Option<usize> {
        self.elem_match_key
    }
}

/// Conjunction of predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchExpression {
    predicates: Vec<Predicate>,
}

impl MatchExpression {
    /// Creates an expression that matches everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate (builder style)
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Parses a query object such as `{"a": 1, "b.c": {"$gte": 2}}`
    pub fn parse(query: &Value) -> StatusResult<Self> {
        let object = query
            .as_object()
            .ok_or_else(|| Status::bad_value("match expression must be an object"))?;

        let mut expression = Self::new();
        for (path, condition) in object {
            if path.starts_with('$') {
                return Err(Status::bad_value(format!(
                    "unknown top level operator: {}",
                    path
                )));
            }

            match condition {
                Value::Object(ops) if ops.keys().next().map_or(false, |k| k.starts_with('$')) => {
                    for (name, operand) in ops {
                        let op = FilterOp::from_operator(name, operand.clone())?;
                        expression.predicates.push(Predicate {
                            path: path.clone(),
                            op,
                        });
                    }
                }
                value => expression.predicates.push(Predicate::eq(path.clone(), value.clone())),
            }
        }
        Ok(expression)
    }

    /// Returns the predicates
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Returns true if the document satisfies every predicate
    pub fn matches(&self, document: &Document) -> bool {
        self.matches_with_details(document).is_some()
    }

    /// Matches the document, recording which array element satisfied it.
    ///
    /// Returns None when the document does not match. The recorded position
    /// comes from the first predicate, in order, that traversed an array.
    pub fn matches_with_details(&self, document: &Document) -> Option<MatchDetails> {
        let mut details = MatchDetails::default();
        for predicate in &self.predicates {
            let position = PredicateFilter::match_predicate(document, predicate)?;
            if details.elem_match_key.is_none() {
                details.elem_match_key = position;
            }
        }
        Some(details)
    }

    /// Renders the expression as a query object with explicit operators
    pub fn to_json(&self) -> Value {
        let mut query = Map::new();
        for predicate in &self.predicates {
            let entry = query
                .entry(predicate.path.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(ops) = entry {
                ops.insert(
                    predicate.op.op_name().to_string(),
                    predicate.op.operand().clone(),
                );
            }
        }
        Value::Object(query)
    }
}
