// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for run lifecycle and step execution events.
//!
//! This module contains message types for logging events related to:
//! * Run start, completion and failure
//! * Run state machine transitions
//! * Step execution and output routing

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Run started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_pipewright::observability::messages::engine::RunStarted;
///
/// let msg = RunStarted {
///     step_count: 4,
///     data_source_count: 1,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunStarted {
    pub step_count: usize,
    pub data_source_count: usize,
}

impl Display for RunStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting pipeline run: {} steps, {} data sources",
            self.step_count, self.data_source_count
        )
    }
}

impl StructuredLog for RunStarted {
    fn log(&self) {
        tracing::info!(
            step_count = self.step_count,
            data_source_count = self.data_source_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run",
            span_name = name,
            step_count = self.step_count,
            data_source_count = self.data_source_count,
        )
    }
}

/// Run completed with every step executed.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_pipewright::observability::messages::engine::RunCompleted;
/// use std::time::Duration;
///
/// let msg = RunCompleted {
///     step_count: 4,
///     duration: Duration::from_millis(120),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunCompleted {
    pub step_count: usize,
    pub duration: Duration,
}

impl Display for RunCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline run completed: {} steps in {:?}",
            self.step_count, self.duration
        )
    }
}

impl StructuredLog for RunCompleted {
    fn log(&self) {
        tracing::info!(
            step_count = self.step_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_completed",
            span_name = name,
            step_count = self.step_count,
            duration = ?self.duration,
        )
    }
}

/// Run aborted by a failing step.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct RunFailed<'a> {
    pub step_index: usize,
    pub unit: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for RunFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline run failed at step {} ('{}'): {}",
            self.step_index, self.unit, self.error
        )
    }
}

impl StructuredLog for RunFailed<'_> {
    fn log(&self) {
        tracing::error!(
            step_index = self.step_index,
            unit = self.unit,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "run_failed",
            span_name = name,
            step_index = self.step_index,
            unit = self.unit,
            error = %self.error,
        )
    }
}

/// Run state machine moved to a new state.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct RunStateChanged<'a> {
    pub from: &'a dyn Display,
    pub to: &'a dyn Display,
}

impl Display for RunStateChanged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Run state: {} -> {}", self.from, self.to)
    }
}

impl StructuredLog for RunStateChanged<'_> {
    fn log(&self) {
        tracing::debug!(
            from = %self.from,
            to = %self.to,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "run_state",
            span_name = name,
            from = %self.from,
            to = %self.to,
        )
    }
}

/// Step execution started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_pipewright::observability::messages::engine::StepStarted;
///
/// let msg = StepStarted {
///     step_index: 1,
///     unit: "scale",
///     unit_type: "plugin",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct StepStarted<'a> {
    pub step_index: usize,
    pub unit: &'a str,
    pub unit_type: &'a str,
}

impl Display for StepStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step {} started: {} '{}'",
            self.step_index, self.unit_type, self.unit
        )
    }
}

impl StructuredLog for StepStarted<'_> {
    fn log(&self) {
        tracing::info!(
            step_index = self.step_index,
            unit = self.unit,
            unit_type = self.unit_type,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "step_execution",
            span_name = name,
            step_index = self.step_index,
            unit = self.unit,
            unit_type = self.unit_type,
        )
    }
}

/// Step execution completed and its outputs were routed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct StepCompleted<'a> {
    pub step_index: usize,
    pub unit: &'a str,
    pub output_count: usize,
    pub duration: Duration,
}

impl Display for StepCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step {} ('{}') completed: {} outputs in {:?}",
            self.step_index, self.unit, self.output_count, self.duration
        )
    }
}

impl StructuredLog for StepCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            step_index = self.step_index,
            unit = self.unit,
            output_count = self.output_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "step_completed",
            span_name = name,
            step_index = self.step_index,
            unit = self.unit,
            output_count = self.output_count,
        )
    }
}

/// A step output was stored in the data pool.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct OutputRouted<'a> {
    pub unit: &'a str,
    pub output: &'a str,
    pub persisted: bool,
}

impl Display for OutputRouted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let target = if self.persisted { "saved" } else { "kept in memory" };
        write!(f, "Output '{}' of '{}' {}", self.output, self.unit, target)
    }
}

impl StructuredLog for OutputRouted<'_> {
    fn log(&self) {
        tracing::debug!(
            unit = self.unit,
            output = self.output,
            persisted = self.persisted,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "output_routed",
            span_name = name,
            unit = self.unit,
            output = self.output,
        )
    }
}

/// A declared output had no matching key in a named result.
///
/// # Log Level
/// `warn!` - Potential issue requiring attention
pub struct DeclaredOutputMissing<'a> {
    pub unit: &'a str,
    pub output: &'a str,
}

impl Display for DeclaredOutputMissing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Unit '{}' declared output '{}' but did not return it",
            self.unit, self.output
        )
    }
}

impl StructuredLog for DeclaredOutputMissing<'_> {
    fn log(&self) {
        tracing::warn!(unit = self.unit, output = self.output, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "declared_output_missing",
            span_name = name,
            unit = self.unit,
            output = self.output,
        )
    }
}

/// A named result carried a key the step did not declare.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct UndeclaredOutputDropped<'a> {
    pub unit: &'a str,
    pub output: &'a str,
}

impl Display for UndeclaredOutputDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropping undeclared output '{}' of unit '{}'",
            self.output, self.unit
        )
    }
}

impl StructuredLog for UndeclaredOutputDropped<'_> {
    fn log(&self) {
        tracing::debug!(unit = self.unit, output = self.output, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "undeclared_output_dropped",
            span_name = name,
            unit = self.unit,
            output = self.output,
        )
    }
}
