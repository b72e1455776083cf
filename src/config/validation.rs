//! Schema validation for resolved unit configuration.
//!
//! A unit may declare a [`ConfigSchema`]: the fields it reads, their kinds, whether
//! they are required and what default they take. The engine validates every resolved
//! configuration against the schema before the unit runs, so a bad field is reported
//! with its name and the violated constraint instead of failing inside the unit.
//!
//! # Validation Pipeline
//!
//! 1. **Shape**: the resolved configuration must be a mapping
//! 2. **Presence**: every required field is present and not null
//! 3. **Kind**: every present field matches its declared kind
//! 4. **Closed schemas**: unknown fields are rejected when the schema denies them
//!
//! # Path fields
//!
//! Fields of kind [`FieldKind::Path`] hold data pool references (`@name`, a bare
//! registered name, or a literal path). Their names are expected to end in `_path`;
//! [`ConfigSchema::path_naming_violations`] lists the ones that do not, and the
//! registry logs a warning for each when the unit is registered.
//!
//! # Example
//! ```rust
//! use the_pipewright::config::{ConfigSchema, FieldKind};
//! use serde_json::json;
//!
//! let schema = ConfigSchema::new()
//!     .required("input", FieldKind::String)
//!     .optional("factor", FieldKind::Number, json!(1.0));
//!
//! assert!(schema.validate("scale", &json!({ "input": "seed" })).is_ok());
//! assert!(schema.validate("scale", &json!({ "factor": 2 })).is_err());
//! ```

use serde_json::{Map, Value};
use std::fmt;

use crate::config::consts::PATH_FIELD_SUFFIX;
use crate::errors::ConfigError;

/// The kind of value a configuration field must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Bool,
    Sequence,
    Mapping,
    /// A non-empty string resolved through the data pool.
    Path,
    Any,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Number => value.is_number(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Sequence => value.is_array(),
            FieldKind::Mapping => value.is_object(),
            FieldKind::Path => value.as_str().is_some_and(|s| !s.trim().is_empty()),
            FieldKind::Any => true,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Bool => "boolean",
            FieldKind::Sequence => "sequence",
            FieldKind::Mapping => "mapping",
            FieldKind::Path => "non-empty path string",
            FieldKind::Any => "value",
        };
        f.write_str(name)
    }
}

/// One declared configuration field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
}

/// Declared configuration shape of a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSchema {
    fields: Vec<FieldSpec>,
    deny_unknown: bool,
}

impl ConfigSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field that must be present and non-null.
    pub fn required(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            kind,
            required: true,
            default: None,
        });
        self
    }

    /// Declare a field that falls back to `default` when absent.
    pub fn optional(mut self, name: &str, kind: FieldKind, default: Value) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            kind,
            required: false,
            default: Some(default),
        });
        self
    }

    /// Reject configuration keys the schema does not declare.
    pub fn deny_unknown_fields(mut self) -> Self {
        self.deny_unknown = true;
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Field defaults as a mapping, used as the lowest-precedence merge layer.
    pub fn defaults(&self) -> Value {
        let defaults: Map<String, Value> = self
            .fields
            .iter()
            .filter_map(|field| {
                field
                    .default
                    .as_ref()
                    .map(|value| (field.name.clone(), value.clone()))
            })
            .collect();
        Value::Object(defaults)
    }

    /// Path-kind fields whose names lack the `_path` suffix.
    pub fn path_naming_violations(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Path && !f.name.ends_with(PATH_FIELD_SUFFIX))
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Validate a resolved configuration for `unit`.
    ///
    /// Returns the first violation as `ConfigError::Configuration` naming the field
    /// and the constraint it broke.
    pub fn validate(&self, unit: &str, config: &Value) -> Result<(), ConfigError> {
        let violation = |field: &str, constraint: String| ConfigError::Configuration {
            unit: unit.to_string(),
            field: field.to_string(),
            constraint,
        };

        let map = config
            .as_object()
            .ok_or_else(|| violation("<root>", "must be a mapping".to_string()))?;

        for field in &self.fields {
            match map.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(violation(&field.name, "is required".to_string()));
                }
                None | Some(Value::Null) => {}
                Some(value) if !field.kind.accepts(value) => {
                    return Err(violation(&field.name, format!("must be a {}", field.kind)));
                }
                Some(_) => {}
            }
        }

        if self.deny_unknown {
            if let Some(unknown) = map
                .keys()
                .find(|key| !self.fields.iter().any(|f| &f.name == *key))
            {
                return Err(violation(unknown, "is not a recognised field".to_string()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> ConfigSchema {
        ConfigSchema::new()
            .required("input", FieldKind::String)
            .required("count", FieldKind::Integer)
            .optional("ratio", FieldKind::Number, json!(0.5))
            .optional("enabled", FieldKind::Bool, json!(true))
            .optional("source_path", FieldKind::Path, json!("data/in.json"))
    }

    #[test]
    fn test_validate_table_driven() {
        struct TestCase {
            name: &'static str,
            config: Value,
            expected_field: Option<&'static str>,
            expected_constraint: &'static str,
        }

        let test_cases = vec![
            TestCase {
                name: "valid",
                config: json!({ "input": "seed", "count": 3 }),
                expected_field: None,
                expected_constraint: "",
            },
            TestCase {
                name: "missing required",
                config: json!({ "input": "seed" }),
                expected_field: Some("count"),
                expected_constraint: "is required",
            },
            TestCase {
                name: "null required",
                config: json!({ "input": "seed", "count": null }),
                expected_field: Some("count"),
                expected_constraint: "is required",
            },
            TestCase {
                name: "float for integer",
                config: json!({ "input": "seed", "count": 1.5 }),
                expected_field: Some("count"),
                expected_constraint: "must be a integer",
            },
            TestCase {
                name: "empty path",
                config: json!({ "input": "seed", "count": 1, "source_path": "  " }),
                expected_field: Some("source_path"),
                expected_constraint: "must be a non-empty path string",
            },
            TestCase {
                name: "not a mapping",
                config: json!([1, 2]),
                expected_field: Some("<root>"),
                expected_constraint: "must be a mapping",
            },
        ];

        for case in test_cases {
            let result = schema().validate("unit", &case.config);
            match (case.expected_field, result) {
                (None, Ok(())) => {}
                (Some(field), Err(ConfigError::Configuration { field: f, constraint, .. })) => {
                    assert_eq!(f, field, "Test case '{}'", case.name);
                    assert_eq!(constraint, case.expected_constraint, "Test case '{}'", case.name);
                }
                (expected, other) => panic!(
                    "Test case '{}': expected {:?}, got {:?}",
                    case.name, expected, other
                ),
            }
        }
    }

    #[test]
    fn test_deny_unknown_fields() {
        let schema = ConfigSchema::new()
            .required("value", FieldKind::Any)
            .deny_unknown_fields();

        let err = schema
            .validate("constant", &json!({ "value": 1, "valeu": 2 }))
            .unwrap_err();
        assert!(err.to_string().contains("'valeu' is not a recognised field"));
    }

    #[test]
    fn test_defaults_layer() {
        assert_eq!(
            schema().defaults(),
            json!({ "ratio": 0.5, "enabled": true, "source_path": "data/in.json" })
        );
    }

    #[test]
    fn test_path_naming_violations() {
        let schema = ConfigSchema::new()
            .required("source_path", FieldKind::Path)
            .required("target", FieldKind::Path);

        assert_eq!(schema.path_naming_violations(), vec!["target"]);
    }
}
