//! Applying a projection to a working set member

use serde_json::Value;

use crate::matcher::MatchExpression;
use crate::status::{ErrorCode, Status, StatusResult};
use crate::storage::Document;
use crate::working_set::WorkingSetMember;

use super::spec::{ProjectionKind, ProjectionSpec};
use super::transform::DocumentTransform;

/// Projection evaluator.
///
/// Holds the parsed spec and, for positional projections, the full query
/// used to find the matching array element.
#[derive(Debug, Clone)]
pub struct ProjectionExec {
    spec: ProjectionSpec,
    full_expression: Option<MatchExpression>,
}

impl ProjectionExec {
    /// Creates an evaluator
    pub fn new(spec: ProjectionSpec, full_expression: Option<MatchExpression>) -> Self {
        Self {
            spec,
            full_expression,
        }
    }

    /// Returns the projection spec
    pub fn spec(&self) -> &ProjectionSpec {
        &self.spec
    }

    /// Computes the projected document without touching the member
    pub fn project(&self, member: &WorkingSetMember) -> StatusResult<Document> {
        let source = member.document().ok_or_else(|| {
            Status::internal_error(
                "projection requires a document but the working set member has none",
            )
        })?;

        let mut output = match self.spec.kind() {
            ProjectionKind::Inclusion => self.include(source)?,
            ProjectionKind::Exclusion => self.exclude(source),
        };

        for (field, meta) in self.spec.meta_fields() {
            let value = member.computed(meta.computed_field()).ok_or_else(|| {
                Status::bad_value(format!(
                    "query requires {} metadata, but it is not available",
                    meta.as_str()
                ))
            })?;
            output.insert(field.clone(), value.clone());
        }

        Ok(output)
    }

    fn include(&self, source: &Document) -> StatusResult<Document> {
        let mut output = Document::new();
        if self.spec.include_id() {
            if let Some(id) = source.get("_id") {
                output.insert("_id".to_string(), id.clone());
            }
        }

        for path in self.spec.paths() {
            let parts: Vec<&str> = path.split('.').collect();
            Self::include_path(source, &mut output, &parts);
        }

        if let Some(array_path) = self.spec.positional() {
            self.include_positional(source, &mut output, array_path)?;
        }

        Ok(output)
    }

    fn include_path(source: &Document, target: &mut Document, parts: &[&str]) {
        let (head, rest) = match parts.split_first() {
            Some(split) => split,
            None => return,
        };
        let value = match source.get(*head) {
            Some(v) => v,
            None => return,
        };
        if rest.is_empty() {
            target.insert(head.to_string(), value.clone());
            return;
        }

        match value {
            Value::Object(inner) => {
                let slot = target
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Object(Document::new()));
                if let Value::Object(slot) = slot {
                    Self::include_path(inner, slot, rest);
                }
            }
            Value::Array(items) => {
                // Scalars inside the array cannot hold the sub-path and are dropped
                let objects: Vec<&Document> = items.iter().filter_map(Value::as_object).collect();
                let slot = target.entry(head.to_string()).or_insert_with(|| {
                    Value::Array(objects.iter().map(|_| Value::Object(Document::new())).collect())
                });
                // Only descend into slots laid out one per object element
                let slots = match slot {
                    Value::Array(slots)
                        if slots.len() == objects.len() && slots.iter().all(Value::is_object) =>
                    {
                        slots
                    }
                    _ => return,
                };
                for (object, slot) in objects.iter().zip(slots.iter_mut()) {
                    if let Value::Object(slot) = slot {
                        Self::include_path(object, slot, rest);
                    }
                }
            }
            _ => {}
        }
    }

    fn include_positional(
        &self,
        source: &Document,
        target: &mut Document,
        array_path: &str,
    ) -> StatusResult<()> {
        let expression = self.full_expression.as_ref().ok_or_else(|| {
            Status::bad_value(format!(
                "positional projection '{}.$' requires a query",
                array_path
            ))
        })?;

        let position = expression
            .matches_with_details(source)
            .and_then(|details| details.elem_match_key())
            .ok_or_else(|| {
                Status::bad_value(format!(
                    "positional operator ({}.$) requires corresponding field in query specifier",
                    array_path
                ))
            })?;

        let parts: Vec<&str> = array_path.split('.').collect();
        let items = match Self::lookup(source, &parts) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(Status::new(
                    ErrorCode::TypeMismatch,
                    format!("positional projection on '{}' requires an array", array_path),
                ))
            }
            None => {
                return Err(Status::new(
                    ErrorCode::NoSuchKey,
                    format!("positional projection field '{}' not found", array_path),
                ))
            }
        };

        let element = items.get(position).ok_or_else(|| {
            Status::new(
                ErrorCode::InvalidLength,
                format!(
                    "matched position {} is out of range for '{}' ({} elements)",
                    position,
                    array_path,
                    items.len()
                ),
            )
        })?;

        Self::set_path(target, &parts, Value::Array(vec![element.clone()]));
        Ok(())
    }

    fn lookup<'a>(source: &'a Document, parts: &[&str]) -> Option<&'a Value> {
        let (head, rest) = parts.split_first()?;
        let value = source.get(*head)?;
        if rest.is_empty() {
            return Some(value);
        }
        Self::lookup(value.as_object()?, rest)
    }

    fn set_path(target: &mut Document, parts: &[&str], value: Value) {
        let (head, rest) = match parts.split_first() {
            Some(split) => split,
            None => return,
        };
        if rest.is_empty() {
            target.insert(head.to_string(), value);
            return;
        }

        let slot = target
            .entry(head.to_string())
            .or_insert_with(|| Value::Object(Document::new()));
        if !slot.is_object() {
            *slot = Value::Object(Document::new());
        }
        if let Value::Object(inner) = slot {
            Self::set_path(inner, rest, value);
        }
    }

    fn exclude(&self, source: &Document) -> Document {
        let mut output = source.clone();
        for path in self.spec.paths() {
            let parts: Vec<&str> = path.split('.').collect();
            Self::exclude_path(&mut output, &parts);
        }
        if !self.spec.include_id() {
            output.remove("_id");
        }
        output
    }

    fn exclude_path(target: &mut Document, parts: &[&str]) {
        let (head, rest) = match parts.split_first() {
            Some(split) => split,
            None => return,
        };
        if rest.is_empty() {
            target.remove(*head);
            return;
        }

        match target.get_mut(*head) {
            Some(Value::Object(inner)) => Self::exclude_path(inner, rest),
            Some(Value::Array(items)) => {
                for item in items.iter_mut() {
                    if let Value::Object(inner) = item {
                        Self::exclude_path(inner, rest);
                    }
                }
            }
            _ => {}
        }
    }
}

impl DocumentTransform for ProjectionExec {
    /// Replaces the member's document with its projection.
    ///
    /// The result is an owned document: it no longer mirrors the record the
    /// member was read from, so the member drops its location.
    fn transform(&self, member: &mut WorkingSetMember) -> StatusResult<()> {
        let output = self.project(member)?;
        member.replace_with_owned(output);
        Ok(())
    }
}
