// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Orchestration engine: walks the pipeline's steps strictly in order.
//!
//! Per step: build the resolved configuration, validate it, resolve the unit's
//! declared dependencies, dispatch through the registry, then route the result.
//! The first error aborts the run.

mod context;
mod pipeline;

pub use context::{SharedState, UnitContext};
pub use pipeline::{PipelineEngine, RunState, RunSummary, StepResult};
