// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{Map, Value};

use crate::config::ConfigSchema;
use crate::traits::Implementation;

/// A dependency a unit needs injected from the execution context.
///
/// Units declare these up front; the engine resolves every one of them before the
/// unit runs and fails with `UnresolvedDependency` when one has no source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// The resolved configuration object.
    Config,
    /// A tracing span scoped to the step.
    Logger,
    /// Mutable access to the data pool.
    DataPool,
    /// Read access to the run's shared state.
    SharedState,
    /// A named value from shared state or the data pool.
    Input(String),
    /// A named value whose name is read from the given configuration field.
    /// The value is exposed under the field's name.
    InputFromConfig(String),
}

impl Dependency {
    pub fn input(name: &str) -> Self {
        Dependency::Input(name.to_string())
    }

    pub fn input_from_config(key: &str) -> Self {
        Dependency::InputFromConfig(key.to_string())
    }

    /// Name under which an input dependency appears in the context.
    pub fn input_name(&self) -> Option<&str> {
        match self {
            Dependency::Input(name) | Dependency::InputFromConfig(name) => Some(name),
            _ => None,
        }
    }
}

/// A registered execution unit. Immutable once registered.
#[derive(Debug, Clone)]
pub struct UnitSpec {
    pub name: String,
    pub unit_type: String,
    pub implementation: Implementation,
    pub config_schema: Option<ConfigSchema>,
    pub description: String,
    pub metadata: Map<String, Value>,
    pub dependencies: Vec<Dependency>,
}

impl UnitSpec {
    pub fn new(name: &str, unit_type: &str, implementation: Implementation) -> Self {
        Self {
            name: name.to_string(),
            unit_type: unit_type.to_string(),
            implementation,
            config_schema: None,
            description: String::new(),
            metadata: Map::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema: ConfigSchema) -> Self {
        self.config_schema = Some(schema);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn depends_on(&self, dependency: &Dependency) -> bool {
        self.dependencies.contains(dependency)
    }

    /// Declares an input dependency exposed under `name`.
    pub fn has_input(&self, name: &str) -> bool {
        self.dependencies
            .iter()
            .any(|dep| dep.input_name() == Some(name))
    }

    /// Unit-declared defaults: the lowest-precedence configuration layer.
    pub fn defaults(&self) -> Value {
        self.config_schema
            .as_ref()
            .map(ConfigSchema::defaults)
            .unwrap_or_else(|| Value::Object(Map::new()))
    }
}
