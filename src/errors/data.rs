// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the data pool and its handlers.
#[derive(Error, Debug)]
pub enum DataError {
    /// An explicit `@name` did not match any registered data source.
    #[error("Unknown data source '{name}'")]
    UnknownDataSource { name: String },

    #[error("Invalid data source name '{name}': expected an identifier")]
    InvalidSourceName { name: String },

    /// Neither the declared kind nor the path extension selects a handler.
    #[error("No data handler for kind '{kind}' (path '{}')", .path.display())]
    UnknownHandler { kind: String, path: PathBuf },

    /// A required source was accessed before anything produced it.
    #[error("Data source '{name}' is missing: '{}' does not exist", .path.display())]
    DataSourceMissing { name: String, path: PathBuf },

    #[error("Data source '{name}' is held in memory and has no path to save to")]
    NoPersistentPath { name: String },

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The handler could not encode or decode the value.
    #[error("Codec error on '{}': {reason}", .path.display())]
    Codec { path: PathBuf, reason: String },
}
