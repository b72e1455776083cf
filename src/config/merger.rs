// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Four-layer configuration merging with a content-addressed cache.
//!
//! Precedence, lowest first:
//! 1. unit-declared defaults
//! 2. shared/global configuration
//! 3. run-scoped configuration (the step's own `config`)
//! 4. command-line overrides
//!
//! The raw layers are deep-merged first and the merged tree is then
//! reference-resolved against the `defaults` namespace, so a reference shadowed
//! by a higher layer is never looked up. Because resolution is pure, the result
//! is cached under a BLAKE3 hash of the four input layers for the lifetime of
//! the merger.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::config::consts::DEFAULTS_KEY;
use crate::config::reference::resolve;
use crate::errors::ConfigError;
use crate::observability::messages::{config::ConfigCacheHit, StructuredLog};

/// Deep-merge `overlay` on top of `base`.
///
/// Mapping keys merge recursively; any other value in `overlay` (scalars and
/// sequences alike) replaces the base value outright.
///
/// # Example
/// ```
/// use the_pipewright::config::deep_merge;
/// use serde_json::json;
///
/// let merged = deep_merge(
///     &json!({ "x": 1, "y": { "p": 1, "q": 2 } }),
///     &json!({ "y": { "q": 99 }, "z": 3 }),
/// );
/// assert_eq!(merged, json!({ "x": 1, "y": { "p": 1, "q": 99 }, "z": 3 }));
/// ```
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in overlay_map {
                let next = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Wrap a `defaults` section as the namespace root references resolve against.
pub fn namespace_root(defaults: &Value) -> Value {
    let mut root = Map::new();
    let defaults = match defaults {
        Value::Null => Value::Object(Map::new()),
        other => other.clone(),
    };
    root.insert(DEFAULTS_KEY.to_string(), defaults);
    Value::Object(root)
}

/// Builds the resolved configuration for each unit invocation.
#[derive(Debug)]
pub struct ConfigMerger {
    root: Value,
    cache: HashMap<String, Value>,
}

impl ConfigMerger {
    /// Create a merger whose references resolve into `defaults`.
    pub fn new(defaults: &Value) -> Self {
        Self::with_root(namespace_root(defaults))
    }

    /// Create a merger with an explicit namespace root.
    pub fn with_root(root: Value) -> Self {
        Self {
            root,
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Number of distinct layer combinations resolved so far.
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Merge and resolve the four layers for `unit`.
    ///
    /// `Null` layers are treated as absent. Identical layers return the cached
    /// tree without merging or resolving again.
    pub fn build(
        &mut self,
        unit: &str,
        unit_defaults: &Value,
        shared: &Value,
        run: &Value,
        overrides: &Value,
    ) -> Result<Value, ConfigError> {
        let layers = [unit_defaults, shared, run, overrides];
        let key = cache_key(&layers);

        if let Some(cached) = self.cache.get(&key) {
            ConfigCacheHit { unit, key: &key }.log();
            return Ok(cached.clone());
        }

        let merged = layers
            .into_iter()
            .filter(|layer| !layer.is_null())
            .fold(Value::Object(Map::new()), |merged, layer| {
                deep_merge(&merged, layer)
            });
        let resolved = resolve(&merged, &self.root)?;

        self.cache.insert(key, resolved.clone());
        Ok(resolved)
    }
}

fn cache_key(layers: &[&Value]) -> String {
    let mut hasher = blake3::Hasher::new();
    for layer in layers {
        hasher.update(layer.to_string().as_bytes());
        hasher.update(b"\0");
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_precedence_table_driven() {
        struct TestCase {
            name: &'static str,
            defaults: Value,
            shared: Value,
            run: Value,
            overrides: Value,
            expected: Value,
        }

        let test_cases = vec![
            TestCase {
                name: "override wins",
                defaults: json!({ "n": 1 }),
                shared: json!({ "n": 2 }),
                run: json!({ "n": 3 }),
                overrides: json!({ "n": 4 }),
                expected: json!(4),
            },
            TestCase {
                name: "run config without override",
                defaults: json!({ "n": 1 }),
                shared: json!({ "n": 2 }),
                run: json!({ "n": 3 }),
                overrides: Value::Null,
                expected: json!(3),
            },
            TestCase {
                name: "shared config without run or override",
                defaults: json!({ "n": 1 }),
                shared: json!({ "n": 2 }),
                run: json!({}),
                overrides: Value::Null,
                expected: json!(2),
            },
            TestCase {
                name: "unit defaults only",
                defaults: json!({ "n": 1 }),
                shared: Value::Null,
                run: json!({}),
                overrides: Value::Null,
                expected: json!(1),
            },
        ];

        for case in test_cases {
            let mut merger = ConfigMerger::new(&json!({}));
            let resolved = merger
                .build("unit", &case.defaults, &case.shared, &case.run, &case.overrides)
                .unwrap();
            assert_eq!(resolved["n"], case.expected, "Test case '{}'", case.name);
        }
    }

    #[test]
    fn test_arrays_replace_outright() {
        let merged = deep_merge(&json!({ "cols": [1, 2, 3] }), &json!({ "cols": [9] }));
        assert_eq!(merged, json!({ "cols": [9] }));
    }

    #[test]
    fn test_extends_base_sits_below_every_merged_layer() {
        let mut merger = ConfigMerger::new(&json!({
            "base": { "alpha": 0.5, "window": 7, "mode": "median" }
        }));

        let resolved = merger
            .build(
                "smoother",
                &json!({ "window": 3, "mode": "mean" }),
                &Value::Null,
                &json!({ "_extends": "@defaults.base", "alpha": 0.9 }),
                &Value::Null,
            )
            .unwrap();

        assert_eq!(resolved, json!({ "alpha": 0.9, "window": 3, "mode": "mean" }));
    }

    #[test]
    fn test_shadowed_reference_is_never_resolved() {
        let mut merger = ConfigMerger::new(&json!({}));

        let resolved = merger
            .build(
                "scale",
                &json!({}),
                &json!({ "factor": "@defaults.missing.x" }),
                &json!({ "factor": 4 }),
                &Value::Null,
            )
            .unwrap();
        assert_eq!(resolved, json!({ "factor": 4 }));

        let err = merger
            .build(
                "scale",
                &json!({}),
                &json!({ "factor": "@defaults.missing.x" }),
                &json!({}),
                &Value::Null,
            )
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::UnresolvedReference { ref segment, .. } if segment == "missing")
        );
    }

    #[test]
    fn test_build_is_pure_and_cached() {
        let mut merger = ConfigMerger::new(&json!({ "k": 10 }));
        let run = json!({ "value": "@defaults.k", "nested": { "a": [1, 2] } });

        let first = merger.build("u", &json!({}), &Value::Null, &run, &Value::Null).unwrap();
        let second = merger.build("u", &json!({}), &Value::Null, &run, &Value::Null).unwrap();

        assert_eq!(first, second);
        assert_eq!(merger.cached_entries(), 1);

        let again = resolve(&first, merger.root()).unwrap();
        assert_eq!(again, first);
    }

    #[test]
    fn test_resolution_errors_propagate() {
        let mut merger = ConfigMerger::new(&json!({ "a": "@defaults.b", "b": "@defaults.a" }));

        let err = merger
            .build("u", &json!({}), &Value::Null, &json!({ "x": "@defaults.a" }), &Value::Null)
            .unwrap_err();
        assert!(matches!(err, ConfigError::CircularReference { .. }));
        assert_eq!(merger.cached_entries(), 0);
    }
}
