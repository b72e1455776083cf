// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::PipelineError;

/// Errors raised while preparing or running a unit.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// A declared dependency had no matching source in the execution context.
    #[error("Unit '{unit}' declares dependency {dependency} but nothing provides it")]
    UnresolvedDependency { unit: String, dependency: String },

    /// Whatever the unit implementation itself raised.
    #[error("Unit '{unit}' failed: {source}")]
    Unit {
        unit: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Unit '{unit}' could not be instantiated: {source}")]
    InstanceConstruction {
        unit: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Instance cache for unit type '{unit_type}' is poisoned")]
    CachePoisoned { unit_type: String },
}

/// The first error of a failed run, tagged with the step that raised it.
#[derive(Error, Debug)]
#[error("Step {index} ('{unit}') failed: {source}")]
pub struct StepFailure {
    pub index: usize,
    pub unit: String,
    #[source]
    pub source: PipelineError,
}
