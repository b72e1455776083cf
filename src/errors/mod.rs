// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error taxonomy for configuration, registry, data pool and execution failures.
//!
//! Each subsystem owns its own `thiserror` enum. `PipelineError` unifies them so a
//! step can fail with any of them, and `StepFailure` attaches the identity of the
//! step that aborted the run.

mod config;
mod data;
mod execution;
mod registry;

pub use config::ConfigError;
pub use data::DataError;
pub use execution::{ExecutionError, StepFailure};
pub use registry::RegistryError;

use thiserror::Error;

/// Any error a pipeline step can raise while it is resolved, dispatched or routed.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}
