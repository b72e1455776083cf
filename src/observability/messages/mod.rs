// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] for emitting it with structured fields at its level.
//!
//! # Organization
//!
//! * `config` - Configuration merge cache and schema warnings
//! * `data` - Data pool events
//! * `engine` - Run and step lifecycle events
//! * `registry` - Registration events
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_pipewright::observability::messages::engine::RunStarted;
//!
//! let msg = RunStarted {
//!     step_count: 3,
//!     data_source_count: 2,
//! };
//!
//! tracing::info!("{}", msg);
//! ```

use tracing::Span;

pub mod config;
pub mod data;
pub mod engine;
pub mod registry;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
