// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The two runner strategies units are dispatched through.
//!
//! * [`StatelessRunner`] calls a function implementation on every invocation
//! * [`InstantiatingRunner`] constructs one instance per unit name from the first
//!   invocation's configuration, caches it for the run and calls its `process`
//!   method thereafter
//!
//! The instance cache is the only state the registry keeps across invocations. It
//! sits behind a `Mutex` because the check-then-construct path mutates a shared map.

use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::consts::{BUFFER_INPUT, POSITION_KEY};
use crate::engine::UnitContext;
use crate::errors::{ConfigError, ExecutionError, PipelineError, RegistryError};
use crate::observability::messages::{registry::UnitInstanceCreated, StructuredLog};
use crate::registry::UnitSpec;
use crate::traits::{Implementation, Runner, StatefulUnit, UnitOutput};

fn wrong_shape(spec: &UnitSpec, expected: &str) -> RegistryError {
    RegistryError::InvalidImplementation {
        unit: spec.name.clone(),
        unit_type: spec.unit_type.clone(),
        reason: format!(
            "expected a {} implementation, found a {}",
            expected,
            spec.implementation.shape()
        ),
    }
}

/// Runs function implementations directly.
#[derive(Debug, Default)]
pub struct StatelessRunner;

impl StatelessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Runner for StatelessRunner {
    fn validate(&self, spec: &UnitSpec) -> Result<(), RegistryError> {
        match spec.implementation {
            Implementation::Function(_) => Ok(()),
            Implementation::Constructor(_) => Err(wrong_shape(spec, "function")),
        }
    }

    fn execute(
        &self,
        spec: &UnitSpec,
        ctx: &mut UnitContext<'_>,
        _config: &Value,
    ) -> Result<UnitOutput, PipelineError> {
        let function = match &spec.implementation {
            Implementation::Function(function) => function,
            Implementation::Constructor(_) => return Err(wrong_shape(spec, "function").into()),
        };

        function(ctx).map_err(|source| {
            ExecutionError::Unit {
                unit: spec.name.clone(),
                source,
            }
            .into()
        })
    }

    fn name(&self) -> &'static str {
        "stateless"
    }
}

/// Constructs stateful units lazily and reuses them for the rest of the run.
#[derive(Default)]
pub struct InstantiatingRunner {
    instances: Mutex<HashMap<String, Box<dyn StatefulUnit>>>,
}

impl InstantiatingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of units instantiated so far.
    pub fn instance_count(&self) -> usize {
        self.instances.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}

impl Runner for InstantiatingRunner {
    fn validate(&self, spec: &UnitSpec) -> Result<(), RegistryError> {
        if !matches!(spec.implementation, Implementation::Constructor(_)) {
            return Err(wrong_shape(spec, "constructor"));
        }
        if !spec.has_input(BUFFER_INPUT) {
            return Err(RegistryError::InvalidImplementation {
                unit: spec.name.clone(),
                unit_type: spec.unit_type.clone(),
                reason: format!("must declare the '{BUFFER_INPUT}' input it processes"),
            });
        }
        Ok(())
    }

    fn execute(
        &self,
        spec: &UnitSpec,
        ctx: &mut UnitContext<'_>,
        config: &Value,
    ) -> Result<UnitOutput, PipelineError> {
        let construct = match &spec.implementation {
            Implementation::Constructor(construct) => construct,
            Implementation::Function(_) => return Err(wrong_shape(spec, "constructor").into()),
        };

        let position = match config.get(POSITION_KEY) {
            None | Some(Value::Null) => 0,
            Some(value) => value.as_u64().ok_or_else(|| ConfigError::Configuration {
                unit: spec.name.clone(),
                field: POSITION_KEY.to_string(),
                constraint: "must be a non-negative integer".to_string(),
            })?,
        };

        let mut buffer = ctx.take_input(BUFFER_INPUT).ok_or_else(|| {
            ExecutionError::UnresolvedDependency {
                unit: spec.name.clone(),
                dependency: format!("input '{BUFFER_INPUT}'"),
            }
        })?;

        let mut instances = self
            .instances
            .lock()
            .map_err(|_| ExecutionError::CachePoisoned {
                unit_type: spec.unit_type.clone(),
            })?;

        let instance = match instances.entry(spec.name.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let instance =
                    construct(config).map_err(|source| ExecutionError::InstanceConstruction {
                        unit: spec.name.clone(),
                        source,
                    })?;
                UnitInstanceCreated {
                    unit: &spec.name,
                    unit_type: &spec.unit_type,
                }
                .log();
                entry.insert(instance)
            }
        };

        let result = instance
            .process(&mut buffer, position)
            .map_err(|source| ExecutionError::Unit {
                unit: spec.name.clone(),
                source,
            })?;

        Ok(UnitOutput::Single(result))
    }

    fn name(&self) -> &'static str {
        "instantiating"
    }
}
