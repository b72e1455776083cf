// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for unit type, unit and instance registration.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Unit type registered with its runner.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
///
/// # Example
/// ```
/// use the_pipewright::observability::messages::registry::UnitTypeRegistered;
///
/// let msg = UnitTypeRegistered {
///     unit_type: "renderer",
///     runner: "instantiating",
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct UnitTypeRegistered<'a> {
    pub unit_type: &'a str,
    pub runner: &'a str,
}

impl Display for UnitTypeRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Registered unit type '{}' with {} runner",
            self.unit_type, self.runner
        )
    }
}

impl StructuredLog for UnitTypeRegistered<'_> {
    fn log(&self) {
        tracing::debug!(unit_type = self.unit_type, runner = self.runner, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "unit_type_registered",
            span_name = name,
            unit_type = self.unit_type,
            runner = self.runner,
        )
    }
}

/// Unit registered and validated by its runner.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct UnitRegistered<'a> {
    pub unit: &'a str,
    pub unit_type: &'a str,
    pub dependency_count: usize,
}

impl Display for UnitRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Registered {} '{}' ({} declared dependencies)",
            self.unit_type, self.unit, self.dependency_count
        )
    }
}

impl StructuredLog for UnitRegistered<'_> {
    fn log(&self) {
        tracing::debug!(
            unit = self.unit,
            unit_type = self.unit_type,
            dependency_count = self.dependency_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "unit_registered",
            span_name = name,
            unit = self.unit,
            unit_type = self.unit_type,
        )
    }
}

/// First invocation of a stateful unit constructed its cached instance.
///
/// # Log Level
/// `info!` - Important operational event
pub struct UnitInstanceCreated<'a> {
    pub unit: &'a str,
    pub unit_type: &'a str,
}

impl Display for UnitInstanceCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Instantiated {} '{}' for the remainder of the run",
            self.unit_type, self.unit
        )
    }
}

impl StructuredLog for UnitInstanceCreated<'_> {
    fn log(&self) {
        tracing::info!(unit = self.unit, unit_type = self.unit_type, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "unit_instance_created",
            span_name = name,
            unit = self.unit,
            unit_type = self.unit_type,
        )
    }
}
