// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::consts::{
    DATA_SOURCES_NAMESPACE, DEFAULTS_KEY, DEFAULT_UNIT_TYPE, FRAMEWORK_NAMESPACE,
};
use crate::config::merger::{deep_merge, namespace_root};
use crate::config::reference::resolve;
use crate::errors::ConfigError;

/// Pipeline document: the run-scoped configuration for one execution.
///
/// # Fields
/// * `defaults` - Namespace that `@defaults.*` references and `_extends` point into
/// * `framework` - Framework-level settings (root directory, discovery)
/// * `data_sources` - Logical data source names registered with the data pool
/// * `steps` - Ordered steps; executed strictly in this order
///
/// # Example
/// ```yaml
/// defaults:
///   scaling: { factor: 2 }
/// framework:
///   root_dir: "."
/// data_sources:
///   customer_master:
///     path: data/customers.json
/// steps:
///   - unit: constant
///     config: { value: 21 }
///     outputs: [seed]
///   - unit: scale
///     config:
///       factor: "@defaults.scaling.factor"
///       input: seed
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub defaults: Value,
    #[serde(default)]
    pub framework: FrameworkConfig,
    #[serde(default)]
    pub data_sources: IndexMap<String, DataSourceConfig>,
    pub steps: Vec<PipelineStep>,
}

/// Framework-level settings.
///
/// # Fields
/// * `root_dir` - Case directory literal paths resolve against; relative values are
///   taken relative to the pipeline document's directory
/// * `discover` - Directory (relative to the root) whose files are auto-registered
///   as data sources by file stem
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FrameworkConfig {
    pub root_dir: Option<PathBuf>,
    pub discover: Option<PathBuf>,
}

/// A data source declared in the pipeline document.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DataSourceConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub handler: Option<String>,
    #[serde(default = "default_must_exist")]
    pub must_exist: bool,
}

/// One step of the pipeline.
///
/// # Fields
/// * `unit` - Registered unit name
/// * `unit_type` - Unit type (`type:` in YAML), defaults to `plugin`
/// * `config` - Run-scoped configuration layer; may use `_extends` and references
/// * `outputs` - Names the step's results are routed to
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PipelineStep {
    pub unit: String,
    #[serde(rename = "type", default = "default_unit_type")]
    pub unit_type: String,
    #[serde(default = "empty_mapping")]
    pub config: Value,
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl PipelineStep {
    pub fn new(unit: &str) -> Self {
        Self {
            unit: unit.to_string(),
            unit_type: default_unit_type(),
            config: empty_mapping(),
            outputs: Vec::new(),
        }
    }

    pub fn with_type(mut self, unit_type: &str) -> Self {
        self.unit_type = unit_type.to_string();
        self
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_outputs(mut self, outputs: &[&str]) -> Self {
        self.outputs = outputs.iter().map(|o| o.to_string()).collect();
        self
    }
}

fn default_must_exist() -> bool {
    true
}

fn default_unit_type() -> String {
    DEFAULT_UNIT_TYPE.to_string()
}

fn empty_mapping() -> Value {
    Value::Object(Map::new())
}

impl PipelineConfig {
    /// Parse a pipeline document from YAML text.
    ///
    /// `framework` and `data_sources` are reference-resolved against `defaults`
    /// here; step configurations are resolved per step by the merger.
    pub fn from_yaml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let document: Value = serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_value(document, origin)
    }

    /// Build a pipeline from an already parsed document tree.
    pub fn from_value(mut document: Value, origin: &str) -> Result<Self, ConfigError> {
        let map = document.as_object_mut().ok_or_else(|| ConfigError::Parse {
            origin: origin.to_string(),
            reason: "pipeline document must be a mapping".to_string(),
        })?;

        let root = namespace_root(map.get(DEFAULTS_KEY).unwrap_or(&Value::Null));
        for section in [FRAMEWORK_NAMESPACE, DATA_SOURCES_NAMESPACE] {
            if let Some(value) = map.get(section) {
                let resolved = resolve(value, &root)?;
                map.insert(section.to_string(), resolved);
            }
        }

        serde_json::from_value(document).map_err(|e| ConfigError::Parse {
            origin: origin.to_string(),
            reason: e.to_string(),
        })
    }

    /// Distinct unit names in step order.
    pub fn unit_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for step in &self.steps {
            if !names.contains(&step.unit.as_str()) {
                names.push(&step.unit);
            }
        }
        names
    }

    /// Namespaces a command override may target for this pipeline.
    pub fn override_namespaces(&self) -> Vec<&str> {
        let mut namespaces = vec![FRAMEWORK_NAMESPACE, DATA_SOURCES_NAMESPACE];
        namespaces.extend(self.unit_names());
        namespaces
    }

    /// Apply the `framework` and `data_sources` parts of an override tree.
    ///
    /// Unit-level overrides are applied per step by the engine.
    pub fn apply_overrides(&mut self, overrides: &Value) -> Result<(), ConfigError> {
        if let Some(framework) = overrides.get(FRAMEWORK_NAMESPACE) {
            let current = to_value(&self.framework)?;
            self.framework = from_section(deep_merge(&current, framework), FRAMEWORK_NAMESPACE)?;
        }
        if let Some(sources) = overrides.get(DATA_SOURCES_NAMESPACE) {
            let current = to_value(&self.data_sources)?;
            self.data_sources =
                from_section(deep_merge(&current, sources), DATA_SOURCES_NAMESPACE)?;
        }
        Ok(())
    }
}

fn to_value<T: serde::Serialize>(section: &T) -> Result<Value, ConfigError> {
    serde_json::to_value(section).map_err(|e| ConfigError::Parse {
        origin: "overrides".to_string(),
        reason: e.to_string(),
    })
}

fn from_section<T: serde::de::DeserializeOwned>(value: Value, section: &str) -> Result<T, ConfigError> {
    serde_json::from_value(value).map_err(|e| ConfigError::Parse {
        origin: format!("overrides.{section}"),
        reason: e.to_string(),
    })
}

/// Load a pipeline document from a YAML file.
pub fn load_pipeline<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    PipelineConfig::from_yaml_str(&content, &path.display().to_string())
}

/// Load the shared/global configuration document.
///
/// The document is a mapping with an optional `defaults` section and one section
/// per unit name; an empty file yields an empty mapping.
pub fn load_shared_config<P: AsRef<Path>>(path: P) -> Result<Value, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(empty_mapping());
    }
    let document: Value = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
        origin: path.display().to_string(),
        reason: e.to_string(),
    })?;
    match document {
        Value::Null => Ok(empty_mapping()),
        Value::Object(_) => Ok(document),
        _ => Err(ConfigError::Parse {
            origin: path.display().to_string(),
            reason: "shared configuration must be a mapping".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_basic_pipeline() {
        let yaml = r#"
steps:
  - unit: constant
    config: { value: 3 }
    outputs: [seed]
  - unit: frame_stamp
    type: renderer
"#;

        let cfg = PipelineConfig::from_yaml_str(yaml, "inline").unwrap();
        assert_eq!(cfg.steps.len(), 2);
        assert_eq!(cfg.steps[0].unit_type, "plugin");
        assert_eq!(cfg.steps[0].outputs, vec!["seed"]);
        assert_eq!(cfg.steps[1].unit_type, "renderer");
        assert_eq!(cfg.steps[1].config, json!({}));
        assert!(cfg.data_sources.is_empty());
    }

    #[test]
    fn test_data_sources_resolve_against_defaults() {
        let yaml = r#"
defaults:
  paths:
    master: data/customers.json
data_sources:
  customer_master:
    path: "@defaults.paths.master"
  scratch:
    path: tmp/scratch.yaml
    handler: yaml
    must_exist: false
steps: []
"#;

        let cfg = PipelineConfig::from_yaml_str(yaml, "inline").unwrap();
        let master = &cfg.data_sources["customer_master"];
        assert_eq!(master.path, PathBuf::from("data/customers.json"));
        assert!(master.must_exist);
        assert_eq!(cfg.data_sources["scratch"].handler.as_deref(), Some("yaml"));
        assert!(!cfg.data_sources["scratch"].must_exist);
    }

    #[test]
    fn test_missing_steps_is_a_parse_error() {
        let err = PipelineConfig::from_yaml_str("defaults: {}\n", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_override_namespaces_include_unit_names() {
        let yaml = r#"
steps:
  - unit: constant
  - unit: scale
  - unit: constant
"#;
        let cfg = PipelineConfig::from_yaml_str(yaml, "inline").unwrap();
        assert_eq!(
            cfg.override_namespaces(),
            vec!["framework", "data_sources", "constant", "scale"]
        );
    }

    #[test]
    fn test_apply_overrides_updates_sources_and_framework() {
        let yaml = r#"
data_sources:
  customer_master:
    path: data/customers.json
steps: []
"#;
        let mut cfg = PipelineConfig::from_yaml_str(yaml, "inline").unwrap();
        cfg.apply_overrides(&json!({
            "framework": { "root_dir": "/srv/case" },
            "data_sources": { "customer_master": { "path": "data/customers_v2.json" } },
            "constant": { "value": 9 }
        }))
        .unwrap();

        assert_eq!(cfg.framework.root_dir, Some(PathBuf::from("/srv/case")));
        assert_eq!(
            cfg.data_sources["customer_master"].path,
            PathBuf::from("data/customers_v2.json")
        );
    }

    #[test]
    fn test_load_pipeline_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pipeline.yaml");
        std::fs::write(&file, "steps:\n  - unit: constant\n").unwrap();

        let cfg = load_pipeline(&file).unwrap();
        assert_eq!(cfg.steps[0].unit, "constant");

        let err = load_pipeline(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_shared_config() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("shared.yaml");

        std::fs::write(&file, "").unwrap();
        assert_eq!(load_shared_config(&file).unwrap(), json!({}));

        std::fs::write(&file, "scale:\n  factor: 3\n").unwrap();
        assert_eq!(load_shared_config(&file).unwrap(), json!({ "scale": { "factor": 3 } }));

        std::fs::write(&file, "- 1\n- 2\n").unwrap();
        assert!(load_shared_config(&file).is_err());
    }
}
