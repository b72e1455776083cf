// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration merging and schema checks.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Merged configuration served from the cache.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct ConfigCacheHit<'a> {
    pub unit: &'a str,
    pub key: &'a str,
}

impl Display for ConfigCacheHit<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Reusing resolved configuration for '{}' ({})", self.unit, self.key)
    }
}

impl StructuredLog for ConfigCacheHit<'_> {
    fn log(&self) {
        tracing::debug!(unit = self.unit, key = self.key, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("config_cache_hit", span_name = name, unit = self.unit)
    }
}

/// Override accepted into the highest-precedence layer.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct OverrideApplied<'a> {
    pub key: &'a str,
    pub value: &'a serde_json::Value,
}

impl Display for OverrideApplied<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Override {} = {}", self.key, self.value)
    }
}

impl StructuredLog for OverrideApplied<'_> {
    fn log(&self) {
        tracing::debug!(key = self.key, value = %self.value, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("override_applied", span_name = name, key = self.key)
    }
}

/// A path-typed schema field does not follow the `*_path` naming contract.
///
/// # Log Level
/// `warn!` - Potential issue requiring attention
///
/// # Example
/// ```
/// use the_pipewright::observability::messages::config::PathFieldNaming;
///
/// let msg = PathFieldNaming {
///     unit: "load_source",
///     field: "source",
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct PathFieldNaming<'a> {
    pub unit: &'a str,
    pub field: &'a str,
}

impl Display for PathFieldNaming<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Unit '{}' declares path field '{}' without the '_path' suffix",
            self.unit, self.field
        )
    }
}

impl StructuredLog for PathFieldNaming<'_> {
    fn log(&self) {
        tracing::warn!(unit = self.unit, field = self.field, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "path_field_naming",
            span_name = name,
            unit = self.unit,
            field = self.field,
        )
    }
}
