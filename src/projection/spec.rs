//! Projection specification parsing

use serde_json::Value;

use crate::status::{Status, StatusResult};

/// Whether listed paths are kept or removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionKind {
    /// Only listed paths (and `_id`) survive
    Inclusion,
    /// Listed paths are removed, everything else survives
    Exclusion,
}

/// Computed metadata a projection can surface as a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    /// Relevance score computed by a text search
    TextScore,
}

impl MetaField {
    /// Returns the `$meta` keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            MetaField::TextScore => "textScore",
        }
    }

    /// Returns the computed field name on the working set member
    pub fn computed_field(&self) -> &'static str {
        match self {
            MetaField::TextScore => "textScore",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "textScore" => Some(MetaField::TextScore),
            _ => None,
        }
    }
}

/// A parsed projection object
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionSpec {
    source: Value,
    kind: ProjectionKind,
    include_id: bool,
    paths: Vec<String>,
    positional: Option<String>,
    meta_fields: Vec<(String, MetaField)>,
}

impl ProjectionSpec {
    /// Parses a projection object such as `{"a": 1, "b.c": 1, "_id": 0}`
    pub fn parse(projection: &Value) -> StatusResult<Self> {
        let object = projection
            .as_object()
            .ok_or_else(|| Status::bad_value("projection specification must be an object"))?;

        let mut id_flag = None;
        let mut included = Vec::new();
        let mut excluded = Vec::new();
        let mut positional = None;
        let mut meta_fields = Vec::new();

        for (field, value) in object {
            if let Value::Object(options) = value {
                meta_fields.push((field.clone(), Self::parse_meta(field, options)?));
                continue;
            }

            let include = Self::parse_flag(field, value)?;

            if field == "_id" {
                id_flag = Some(include);
            } else if let Some(array_path) = field.strip_suffix(".$") {
                if !include {
                    return Err(Status::bad_value(format!(
                        "positional projection '{}' cannot be used to exclude",
                        field
                    )));
                }
                if positional.is_some() {
                    return Err(Status::bad_value(
                        "cannot specify more than one positional projection",
                    ));
                }
                if array_path.is_empty() || array_path.contains('$') {
                    return Err(Status::bad_value(format!(
                        "invalid positional projection '{}'",
                        field
                    )));
                }
                positional = Some(array_path.to_string());
            } else if field.is_empty() || field.contains('$') {
                return Err(Status::bad_value(format!(
                    "invalid projection field name '{}'",
                    field
                )));
            } else if include {
                included.push(field.clone());
            } else {
                excluded.push(field.clone());
            }
        }

        let has_inclusion = !included.is_empty() || positional.is_some();
        if has_inclusion && !excluded.is_empty() {
            return Err(Status::bad_value(format!(
                "cannot exclude '{}' in an inclusion projection",
                excluded[0]
            )));
        }

        let kind = if has_inclusion || (id_flag == Some(true) && excluded.is_empty()) {
            ProjectionKind::Inclusion
        } else {
            ProjectionKind::Exclusion
        };
        let paths = match kind {
            ProjectionKind::Inclusion => included,
            ProjectionKind::Exclusion => excluded,
        };

        let mut claimed: Vec<&str> = paths.iter().map(String::as_str).collect();
        claimed.extend(positional.as_deref());
        claimed.extend(meta_fields.iter().map(|(field, _)| field.as_str()));
        Self::check_collisions(&claimed)?;

        Ok(Self {
            source: projection.clone(),
            kind,
            include_id: id_flag.unwrap_or(true),
            paths,
            positional,
            meta_fields,
        })
    }

    /// Rejects a path that is also the parent of another path (`a` and `a.b`)
    fn check_collisions(paths: &[&str]) -> StatusResult<()> {
        for (i, a) in paths.iter().enumerate() {
            for b in &paths[i + 1..] {
                let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
                let collides = long
                    .strip_prefix(*short)
                    .map_or(false, |rest| rest.is_empty() || rest.starts_with('.'));
                if collides {
                    return Err(Status::bad_value(format!(
                        "path collision at '{}' and '{}'",
                        short, long
                    )));
                }
            }
        }
        Ok(())
    }

    fn parse_flag(field: &str, value: &Value) -> StatusResult<bool> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(n.as_f64().map_or(false, |f| f != 0.0)),
            other => Err(Status::bad_value(format!(
                "unsupported projection value for '{}': {}",
                field, other
            ))),
        }
    }

    fn parse_meta(
        field: &str,
        options: &serde_json::Map<String, Value>,
    ) -> StatusResult<MetaField> {
        let mut entries = options.iter();
        match (entries.next(), entries.next()) {
            (Some((op, Value::String(name))), None) if op == "$meta" => MetaField::parse(name)
                .ok_or_else(|| Status::bad_value(format!("unsupported $meta field: {}", name))),
            _ => Err(Status::bad_value(format!(
                "unsupported projection option for '{}'",
                field
            ))),
        }
    }

    /// Returns the projection object this spec was parsed from
    pub fn source(&self) -> &Value {
        &self.source
    }

    /// Returns whether listed paths are kept or removed
    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    /// Returns true if `_id` survives the projection
    pub fn include_id(&self) -> bool {
        self.include_id
    }

    /// Returns the listed dotted paths
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Returns the array path of a positional projection (`"a.$"` gives `"a"`)
    pub fn positional(&self) -> Option<&str> {
        self.positional.as_deref()
    }

    /// Returns output field / metadata pairs
    pub fn meta_fields(&self) -> &[(String, MetaField)] {
        &self.meta_fields
    }

    /// Returns true if applying the projection needs the full query
    pub fn requires_match_details(&self) -> bool {
        self.positional.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_inclusion() {
        let spec = ProjectionSpec::parse(&json!({"a": 1, "b.c": true})).unwrap();
        assert_eq!(spec.kind(), ProjectionKind::Inclusion);
        assert!(spec.include_id());
        assert_eq!(spec.paths(), &["a".to_string(), "b.c".to_string()]);
    }

    #[test]
    fn test_exclusion_with_id() {
        let spec = ProjectionSpec::parse(&json!({"secret": 0, "_id": 0})).unwrap();
        assert_eq!(spec.kind(), ProjectionKind::Exclusion);
        assert!(!spec.include_id());
        assert_eq!(spec.paths(), &["secret".to_string()]);
    }

    #[test]
    fn test_id_exclusion_allowed_in_inclusion() {
        let spec = ProjectionSpec::parse(&json!({"a": 1, "_id": false})).unwrap();
        assert_eq!(spec.kind(), ProjectionKind::Inclusion);
        assert!(!spec.include_id());
    }

    #[test]
    fn test_id_only_inclusion() {
        let spec = ProjectionSpec::parse(&json!({"_id": 1})).unwrap();
        assert_eq!(spec.kind(), ProjectionKind::Inclusion);
        assert!(spec.paths().is_empty());
    }

    #[test]
    fn test_empty_is_exclusion_of_nothing() {
        let spec = ProjectionSpec::parse(&json!({})).unwrap();
        assert_eq!(spec.kind(), ProjectionKind::Exclusion);
        assert!(spec.paths().is_empty());
        assert!(spec.include_id());
    }

    #[test]
    fn test_mixed_is_rejected() {
        let err = ProjectionSpec::parse(&json!({"a": 1, "b": 0})).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadValue);
        assert!(err.reason().contains("'b'"));
    }

    #[test]
    fn test_positional() {
        let spec = ProjectionSpec::parse(&json!({"grades.$": 1})).unwrap();
        assert_eq!(spec.kind(), ProjectionKind::Inclusion);
        assert_eq!(spec.positional(), Some("grades"));
        assert!(spec.requires_match_details());
    }

    #[test]
    fn test_positional_errors() {
        assert!(ProjectionSpec::parse(&json!({"a.$": 0})).is_err());
        assert!(ProjectionSpec::parse(&json!({"a.$": 1, "b.$": 1})).is_err());
        assert!(ProjectionSpec::parse(&json!({"a.$": 1, "b": 0})).is_err());
        assert!(ProjectionSpec::parse(&json!({"a.$.b": 1})).is_err());
    }

    #[test]
    fn test_meta() {
        let spec = ProjectionSpec::parse(&json!({"score": {"$meta": "textScore"}})).unwrap();
        assert_eq!(spec.kind(), ProjectionKind::Exclusion);
        assert_eq!(spec.meta_fields(), &[("score".to_string(), MetaField::TextScore)]);

        assert!(ProjectionSpec::parse(&json!({"s": {"$meta": "geoNear"}})).is_err());
        assert!(ProjectionSpec::parse(&json!({"s": {"$slice": 2}})).is_err());
    }

    #[test]
    fn test_path_collisions_rejected() {
        for projection in [
            json!({"a": 1, "a.b": 1, "_id": 0}),
            json!({"a.b": 0, "a": 0}),
            json!({"a.b": 1, "a.b.c": 1}),
            json!({"grades": 1, "grades.$": 1}),
            json!({"s": 1, "s.x": {"$meta": "textScore"}}),
        ] {
            let err = ProjectionSpec::parse(&projection).unwrap_err();
            assert_eq!(err.code(), ErrorCode::BadValue);
            assert!(err.reason().contains("path collision"), "{}", projection);
        }
    }

    #[test]
    fn test_sibling_paths_accepted() {
        let spec = ProjectionSpec::parse(&json!({"a.b": 1, "a.bc": 1, "a.c": 1})).unwrap();
        assert_eq!(spec.paths().len(), 3);
    }

    #[test]
    fn test_bad_values() {
        assert!(ProjectionSpec::parse(&json!([1])).is_err());
        assert!(ProjectionSpec::parse(&json!({"a": "yes"})).is_err());
        assert!(ProjectionSpec::parse(&json!({"$a": 1})).is_err());
    }
}
