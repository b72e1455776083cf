// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout the pipeline runtime. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Keep magic strings out of the engine, registry and data pool
//! * Give every event the same structured fields wherever it is logged
//! * Keep the wording of each event in one place
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::config` - Configuration merging, caching and schema warnings
//! * `messages::data` - Data pool registration, loading and saving
//! * `messages::engine` - Run lifecycle and step execution events
//! * `messages::registry` - Unit type, unit and instance registration
//!
//! # Usage
//!
//! ```rust
//! use the_pipewright::observability::messages::engine::StepStarted;
//! use the_pipewright::observability::messages::StructuredLog;
//!
//! let msg = StepStarted {
//!     step_index: 0,
//!     unit: "constant",
//!     unit_type: "plugin",
//! };
//!
//! msg.log();
//! ```
//!
//! Installing a subscriber is left to the binary; the library only emits events.

pub mod messages;
