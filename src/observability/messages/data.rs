// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for data pool events.
//!
//! This module contains message types for logging events related to:
//! * Data source registration and auto-discovery
//! * Lazy loading of entries
//! * Write-through saves

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// Data source registered.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
///
/// # Example
/// ```
/// use the_pipewright::observability::messages::data::DataSourceRegistered;
/// use std::path::Path;
///
/// let msg = DataSourceRegistered {
///     name: "customer_master",
///     handler: "json",
///     path: Path::new("data/customers.json"),
///     must_exist: true,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct DataSourceRegistered<'a> {
    pub name: &'a str,
    pub handler: &'a str,
    pub path: &'a Path,
    pub must_exist: bool,
}

impl Display for DataSourceRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Registered data source '{}' -> {} ({})",
            self.name,
            self.path.display(),
            self.handler
        )
    }
}

impl StructuredLog for DataSourceRegistered<'_> {
    fn log(&self) {
        tracing::debug!(
            source = self.name,
            handler = self.handler,
            path = %self.path.display(),
            must_exist = self.must_exist,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "data_source_registered",
            span_name = name,
            source = self.name,
            path = %self.path.display(),
        )
    }
}

/// Files in a directory were registered as data sources.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DataSourcesDiscovered<'a> {
    pub dir: &'a Path,
    pub count: usize,
}

impl Display for DataSourcesDiscovered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Discovered {} data sources in {}",
            self.count,
            self.dir.display()
        )
    }
}

impl StructuredLog for DataSourcesDiscovered<'_> {
    fn log(&self) {
        tracing::info!(dir = %self.dir.display(), count = self.count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "data_sources_discovered",
            span_name = name,
            dir = %self.dir.display(),
            count = self.count,
        )
    }
}

/// Entry loaded from storage on first access.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DataLoaded<'a> {
    pub name: &'a str,
    pub path: &'a Path,
}

impl Display for DataLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Loaded '{}' from {}", self.name, self.path.display())
    }
}

impl StructuredLog for DataLoaded<'_> {
    fn log(&self) {
        tracing::info!(source = self.name, path = %self.path.display(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "data_loaded",
            span_name = name,
            source = self.name,
            path = %self.path.display(),
        )
    }
}

/// Value written through to storage.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DataSaved<'a> {
    pub name: &'a str,
    pub path: &'a Path,
}

impl Display for DataSaved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Saved '{}' to {}", self.name, self.path.display())
    }
}

impl StructuredLog for DataSaved<'_> {
    fn log(&self) {
        tracing::info!(source = self.name, path = %self.path.display(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "data_saved",
            span_name = name,
            source = self.name,
            path = %self.path.display(),
        )
    }
}

/// Optional source was absent and loaded as null.
///
/// # Log Level
/// `warn!` - Potential issue requiring attention
pub struct OptionalSourceAbsent<'a> {
    pub name: &'a str,
    pub path: &'a Path,
}

impl Display for OptionalSourceAbsent<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Optional data source '{}' not found at {}; using null",
            self.name,
            self.path.display()
        )
    }
}

impl StructuredLog for OptionalSourceAbsent<'_> {
    fn log(&self) {
        tracing::warn!(source = self.name, path = %self.path.display(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "optional_source_absent",
            span_name = name,
            source = self.name,
        )
    }
}
