// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Reference and `_extends` expansion for configuration trees.
//!
//! A string matching `@segment(.segment)*` is a reference into the namespace root
//! (normally `{ "defaults": ... }`). A mapping carrying `_extends: "@path"` inherits
//! the referenced mapping and deep-merges its own keys on top.
//!
//! # Algorithm
//! Recursive descent with a stack of the dotted paths currently being resolved:
//! - **Cycle detection**: re-entering a path already on the stack fails and reports
//!   the cycle from its first occurrence
//! - **Chains**: a looked-up value is resolved again before it is returned
//! - **Aliases**: a single-segment reference whose segment is not in the root is left
//!   untouched so the data pool can treat it as an explicit `@name` source alias
//!
//! Resolution is pure. The same tree and root always produce the same result, and a
//! resolved tree resolves to itself.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::config::consts::{EXTENDS_KEY, REFERENCE_PREFIX};
use crate::config::merger::deep_merge;
use crate::errors::ConfigError;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^@[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
            .expect("reference grammar is a valid regex")
    })
}

/// Returns true when `text` is a reference rather than a literal string.
pub fn is_reference(text: &str) -> bool {
    reference_pattern().is_match(text)
}

/// Expand every reference and `_extends` in `tree` against `root`.
///
/// # Errors
/// * `CircularReference` - a reference chain loops back on itself
/// * `UnresolvedReference` - a multi-segment reference names a missing segment
/// * `InvalidExtends` - `_extends` holds something other than a reference
/// * `ExtendsNonMapping` - `_extends` resolves to a scalar or sequence
pub fn resolve(tree: &Value, root: &Value) -> Result<Value, ConfigError> {
    Resolver {
        root,
        stack: Vec::new(),
    }
    .resolve_node(tree)
}

struct Resolver<'a> {
    root: &'a Value,
    stack: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn resolve_node(&mut self, node: &Value) -> Result<Value, ConfigError> {
        match node {
            Value::String(text) if is_reference(text) => self.resolve_reference(text),
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_node(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => self.resolve_mapping(map),
            other => Ok(other.clone()),
        }
    }

    fn resolve_mapping(&mut self, map: &Map<String, Value>) -> Result<Value, ConfigError> {
        let base = match map.get(EXTENDS_KEY) {
            None => None,
            Some(Value::String(reference)) if is_reference(reference) => {
                match self.resolve_reference(reference)? {
                    resolved @ Value::Object(_) => Some(resolved),
                    _ => {
                        return Err(ConfigError::ExtendsNonMapping {
                            reference: reference.clone(),
                        })
                    }
                }
            }
            Some(other) => {
                return Err(ConfigError::InvalidExtends {
                    found: other.to_string(),
                })
            }
        };

        let mut local = Map::new();
        for (key, value) in map {
            if key == EXTENDS_KEY {
                continue;
            }
            local.insert(key.clone(), self.resolve_node(value)?);
        }
        let local = Value::Object(local);

        Ok(match base {
            Some(base) => deep_merge(&base, &local),
            None => local,
        })
    }

    fn resolve_reference(&mut self, reference: &str) -> Result<Value, ConfigError> {
        let path = reference.trim_start_matches(REFERENCE_PREFIX);

        if let Some(start) = self.stack.iter().position(|entry| entry == path) {
            let mut cycle = self.stack[start..].to_vec();
            cycle.push(path.to_string());
            return Err(ConfigError::CircularReference { cycle });
        }

        let root = self.root;
        let target = match lookup(root, path) {
            Ok(target) => target,
            Err(_) if !path.contains('.') => return Ok(Value::String(reference.to_string())),
            Err(segment) => {
                return Err(ConfigError::UnresolvedReference {
                    reference: reference.to_string(),
                    segment,
                })
            }
        };

        self.stack.push(path.to_string());
        let resolved = self.resolve_node(target);
        self.stack.pop();
        resolved
    }
}

/// Walk a dotted path from `root`, returning the first missing segment on failure.
fn lookup<'v>(root: &'v Value, path: &str) -> Result<&'v Value, String> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment).ok_or_else(|| segment.to_string())?,
            _ => return Err(segment.to_string()),
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_grammar() {
        struct TestCase {
            text: &'static str,
            expected: bool,
        }

        let test_cases = vec![
            TestCase { text: "@defaults", expected: true },
            TestCase { text: "@defaults.paths.output", expected: true },
            TestCase { text: "@_private.x1", expected: true },
            TestCase { text: "@1abc", expected: false },
            TestCase { text: "@defaults.", expected: false },
            TestCase { text: "@defaults..x", expected: false },
            TestCase { text: "@data/file.csv", expected: false },
            TestCase { text: "defaults.x", expected: false },
            TestCase { text: "user@example.com", expected: false },
        ];

        for case in test_cases {
            assert_eq!(is_reference(case.text), case.expected, "text: {}", case.text);
        }
    }

    #[test]
    fn test_resolves_reference_chain() {
        let root = json!({
            "defaults": {
                "threshold": "@defaults.limits.high",
                "limits": { "high": 90, "low": 10 }
            }
        });
        let tree = json!({ "cutoff": "@defaults.threshold", "tags": ["@defaults.limits.low", "x"] });

        let resolved = resolve(&tree, &root).unwrap();

        assert_eq!(resolved, json!({ "cutoff": 90, "tags": [10, "x"] }));
    }

    #[test]
    fn test_cycle_detected_from_either_entry_point() {
        let root = json!({
            "defaults": { "a": "@defaults.b", "b": "@defaults.a" }
        });

        for start in ["@defaults.a", "@defaults.b"] {
            let err = resolve(&json!({ "value": start }), &root).unwrap_err();
            match err {
                ConfigError::CircularReference { cycle } => {
                    assert_eq!(cycle.len(), 3);
                    assert_eq!(cycle.first(), cycle.last());
                }
                other => panic!("expected circular reference, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_extends_deep_merges_locally() {
        let root = json!({
            "defaults": { "base": { "x": 1, "y": { "p": 1, "q": 2 } } }
        });
        let tree = json!({ "_extends": "@defaults.base", "y": { "q": 99 }, "z": 3 });

        let resolved = resolve(&tree, &root).unwrap();

        assert_eq!(resolved, json!({ "x": 1, "y": { "p": 1, "q": 99 }, "z": 3 }));
    }

    #[test]
    fn test_extends_cycle_detected() {
        let root = json!({
            "defaults": {
                "a": { "_extends": "@defaults.b", "k": 1 },
                "b": { "_extends": "@defaults.a", "k": 2 }
            }
        });

        let err = resolve(&json!({ "_extends": "@defaults.a" }), &root).unwrap_err();
        assert!(matches!(err, ConfigError::CircularReference { .. }));
    }

    #[test]
    fn test_extends_rejects_non_mapping_target() {
        let root = json!({ "defaults": { "list": [1, 2] } });

        let err = resolve(&json!({ "_extends": "@defaults.list" }), &root).unwrap_err();
        assert!(matches!(err, ConfigError::ExtendsNonMapping { .. }));

        let err = resolve(&json!({ "_extends": 42 }), &root).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidExtends { .. }));
    }

    #[test]
    fn test_unresolved_segment_is_named() {
        let root = json!({ "defaults": { "paths": { "input": "in.csv" } } });

        let err = resolve(&json!("@defaults.paths.output"), &root).unwrap_err();
        match err {
            ConfigError::UnresolvedReference { segment, .. } => assert_eq!(segment, "output"),
            other => panic!("expected unresolved reference, got {other:?}"),
        }
    }

    #[test]
    fn test_single_segment_alias_left_for_data_pool() {
        let root = json!({ "defaults": {} });

        let resolved = resolve(&json!({ "source_path": "@customer_master" }), &root).unwrap();
        assert_eq!(resolved, json!({ "source_path": "@customer_master" }));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let root = json!({
            "defaults": { "base": { "n": "@defaults.n" }, "n": 5 }
        });
        let tree = json!({ "_extends": "@defaults.base", "alias": "@src" });

        let once = resolve(&tree, &root).unwrap();
        let twice = resolve(&once, &root).unwrap();

        assert_eq!(once, twice);
        assert_eq!(once, json!({ "n": 5, "alias": "@src" }));
    }

    #[test]
    fn test_self_child_reference_is_not_a_cycle() {
        let root = json!({
            "defaults": { "a": { "x": 1, "y": "@defaults.a.x" } }
        });

        let resolved = resolve(&json!("@defaults.a"), &root).unwrap();
        assert_eq!(resolved, json!({ "x": 1, "y": 1 }));
    }
}
