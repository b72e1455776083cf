// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Command-line overrides: `dotted.key=value` strings folded into one mapping.
//!
//! Values are coerced in order: integer, float, `true`/`false`, structured literal
//! (a YAML flow sequence or mapping), and finally a plain string. Only keys under an
//! accepted top-level namespace are allowed.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::errors::ConfigError;
use crate::observability::messages::{config::OverrideApplied, StructuredLog};

fn key_segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("override key grammar is a valid regex")
    })
}

/// A single parsed override.
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub path: Vec<String>,
    pub value: Value,
}

impl Override {
    /// Parse `a.b.c=value`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidOverride {
            raw: raw.to_string(),
            reason: reason.to_string(),
        };

        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| invalid("expected KEY=VALUE"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(invalid("key is empty"));
        }

        let path: Vec<String> = key.split('.').map(str::to_string).collect();
        if let Some(bad) = path.iter().find(|s| !key_segment_pattern().is_match(s)) {
            return Err(invalid(&format!("key segment '{bad}' is not an identifier")));
        }

        Ok(Self {
            path,
            value: coerce_value(value.trim()),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.path[0]
    }

    pub fn dotted_key(&self) -> String {
        self.path.join(".")
    }
}

/// Coerce override text into a typed value; anything unparseable stays a string.
pub fn coerce_value(text: &str) -> Value {
    if let Ok(int) = text.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = text.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if text.starts_with('[') || text.starts_with('{') {
        if let Ok(structured) = serde_yaml::from_str::<Value>(text) {
            return structured;
        }
    }
    Value::String(text.to_string())
}

/// Parse every override and fold them into one nested mapping, later entries winning.
///
/// # Errors
/// `InvalidOverride` when an entry is malformed or its first segment is not in
/// `namespaces`.
pub fn overrides_tree<S: AsRef<str>>(
    raws: &[S],
    namespaces: &[&str],
) -> Result<Value, ConfigError> {
    let mut tree = Map::new();

    for raw in raws {
        let raw = raw.as_ref();
        let parsed = Override::parse(raw)?;
        if !namespaces.contains(&parsed.namespace()) {
            return Err(ConfigError::InvalidOverride {
                raw: raw.to_string(),
                reason: format!(
                    "namespace '{}' cannot be overridden (accepted: {})",
                    parsed.namespace(),
                    namespaces.join(", ")
                ),
            });
        }

        OverrideApplied {
            key: &parsed.dotted_key(),
            value: &parsed.value,
        }
        .log();
        insert_path(&mut tree, &parsed.path, parsed.value);
    }

    Ok(Value::Object(tree))
}

fn insert_path(tree: &mut Map<String, Value>, path: &[String], value: Value) {
    let (last, parents) = match path.split_last() {
        Some(split) => split,
        None => return,
    };

    let mut current = tree;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(map) = slot else {
            return;
        };
        current = map;
    }
    current.insert(last.clone(), value);
}
