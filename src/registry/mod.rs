// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Execution unit registry: `{unit_type -> {name -> UnitSpec}}` plus one runner per type.
//!
//! The registry is an ordinary owned value. It is populated once during startup by
//! [`bootstrap`] (or by hand in tests), then handed to the engine; nothing registers
//! units through import-time side effects.
//!
//! # Lifecycle
//! 1. `register_type` for every unit type and its runner
//! 2. `register_unit` for every unit; the type's runner validates the implementation
//!    immediately, so shape mismatches fail at startup rather than at first use
//! 3. `get_unit` / `execute_unit` during the run
//!
//! # Example
//! ```rust
//! use the_pipewright::registry::{Registry, StatelessRunner, UnitSpec};
//! use the_pipewright::traits::{Implementation, UnitOutput};
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//! registry.register_type("plugin", Box::new(StatelessRunner::new())).unwrap();
//! registry
//!     .register_unit(UnitSpec::new(
//!         "answer",
//!         "plugin",
//!         Implementation::function(|_| Ok(UnitOutput::Single(json!(42)))),
//!     ))
//!     .unwrap();
//!
//! assert!(registry.get_unit("answer", "plugin").is_ok());
//! assert!(registry.get_unit("answer", "renderer").is_err());
//! ```

mod runners;
mod spec;

pub use runners::{InstantiatingRunner, StatelessRunner};
pub use spec::{Dependency, UnitSpec};

use indexmap::IndexMap;
use serde_json::Value;

use crate::config::consts::{DEFAULT_UNIT_TYPE, RENDERER_UNIT_TYPE};
use crate::engine::UnitContext;
use crate::errors::{PipelineError, RegistryError};
use crate::observability::messages::config::PathFieldNaming;
use crate::observability::messages::registry::{UnitRegistered, UnitTypeRegistered};
use crate::observability::messages::StructuredLog;
use crate::traits::{Runner, UnitOutput};

struct UnitType {
    runner: Box<dyn Runner>,
    units: IndexMap<String, UnitSpec>,
}

/// Registered unit types and their units.
#[derive(Default)]
pub struct Registry {
    types: IndexMap<String, UnitType>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit type and the runner that validates and invokes its units.
    pub fn register_type(
        &mut self,
        name: &str,
        runner: Box<dyn Runner>,
    ) -> Result<(), RegistryError> {
        if self.types.contains_key(name) {
            return Err(RegistryError::DuplicateUnitType {
                unit_type: name.to_string(),
            });
        }

        UnitTypeRegistered {
            unit_type: name,
            runner: runner.name(),
        }
        .log();

        self.types.insert(
            name.to_string(),
            UnitType {
                runner,
                units: IndexMap::new(),
            },
        );
        Ok(())
    }

    /// Register a unit under its declared type.
    ///
    /// # Errors
    /// * `UnknownUnitType` - the unit's type was never registered
    /// * `DuplicateUnit` - the name is taken within that type
    /// * `InvalidImplementation` - the runner rejected the implementation's shape
    pub fn register_unit(&mut self, spec: UnitSpec) -> Result<(), RegistryError> {
        let unit_type = self.types.get_mut(&spec.unit_type).ok_or_else(|| {
            RegistryError::UnknownUnitType {
                unit: spec.name.clone(),
                unit_type: spec.unit_type.clone(),
            }
        })?;

        if unit_type.units.contains_key(&spec.name) {
            return Err(RegistryError::DuplicateUnit {
                unit: spec.name.clone(),
                unit_type: spec.unit_type.clone(),
            });
        }

        unit_type.runner.validate(&spec)?;

        if let Some(schema) = &spec.config_schema {
            for field in schema.path_naming_violations() {
                PathFieldNaming {
                    unit: &spec.name,
                    field,
                }
                .log();
            }
        }

        UnitRegistered {
            unit: &spec.name,
            unit_type: &spec.unit_type,
            dependency_count: spec.dependencies.len(),
        }
        .log();

        unit_type.units.insert(spec.name.clone(), spec);
        Ok(())
    }

    /// Look up a unit by name within its type.
    pub fn get_unit(&self, name: &str, unit_type: &str) -> Result<&UnitSpec, RegistryError> {
        self.types
            .get(unit_type)
            .and_then(|registered| registered.units.get(name))
            .ok_or_else(|| RegistryError::UnitNotFound {
                unit: name.to_string(),
                unit_type: unit_type.to_string(),
            })
    }

    /// Look up a unit and dispatch it through its type's runner.
    pub fn execute_unit(
        &self,
        name: &str,
        unit_type: &str,
        ctx: &mut UnitContext<'_>,
        config: &Value,
    ) -> Result<UnitOutput, PipelineError> {
        let registered = self
            .types
            .get(unit_type)
            .ok_or_else(|| RegistryError::UnitNotFound {
                unit: name.to_string(),
                unit_type: unit_type.to_string(),
            })?;
        let spec = self.get_unit(name, unit_type)?;
        registered.runner.execute(spec, ctx, config)
    }

    pub fn contains_unit(&self, name: &str, unit_type: &str) -> bool {
        self.get_unit(name, unit_type).is_ok()
    }

    pub fn unit_types(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Every registered unit, grouped by type in registration order.
    pub fn units(&self) -> impl Iterator<Item = &UnitSpec> {
        self.types.values().flat_map(|registered| registered.units.values())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("unit_types", &self.types.keys().collect::<Vec<_>>())
            .field("unit_count", &self.units().count())
            .finish()
    }
}

/// Registry with the built-in unit types and no units.
pub fn with_builtin_types() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    registry.register_type(DEFAULT_UNIT_TYPE, Box::new(StatelessRunner::new()))?;
    registry.register_type(RENDERER_UNIT_TYPE, Box::new(InstantiatingRunner::new()))?;
    Ok(registry)
}

/// Startup phase: built-in unit types plus every built-in unit.
///
/// Call once per process run and pass the result to the engine.
pub fn bootstrap() -> Result<Registry, RegistryError> {
    let mut registry = with_builtin_types()?;
    crate::units::register(&mut registry)?;
    Ok(registry)
}
