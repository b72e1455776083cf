// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, merging, resolving or validating configuration.
///
/// All of these surface before any unit implementation runs and are never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A reference chain re-entered a path that was still being resolved.
    #[error("Circular reference detected: {}", .cycle.join(" -> "))]
    CircularReference { cycle: Vec<String> },

    /// A reference points at a path segment that does not exist.
    #[error("Unresolved reference '{reference}': segment '{segment}' does not exist")]
    UnresolvedReference { reference: String, segment: String },

    /// `_extends` was given something other than a reference string.
    #[error("'_extends' must be a reference string, found {found}")]
    InvalidExtends { found: String },

    /// `_extends` resolved to a scalar or a sequence.
    #[error("'_extends' target '{reference}' is not a mapping")]
    ExtendsNonMapping { reference: String },

    /// A command override was malformed or targeted a protected namespace.
    #[error("Invalid override '{raw}': {reason}")]
    InvalidOverride { raw: String, reason: String },

    /// A resolved configuration did not satisfy the unit's schema.
    #[error("Configuration error in unit '{unit}': field '{field}' {constraint}")]
    Configuration {
        unit: String,
        field: String,
        constraint: String,
    },

    #[error("Failed to read configuration '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration '{origin}': {reason}")]
    Parse { origin: String, reason: String },
}
