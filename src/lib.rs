// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // documents, references, merge, overrides, runtime
pub mod data;       // data pool + handlers
pub mod engine;     // sequential step walker
pub mod errors;     // error handling
pub mod observability;
pub mod registry;   // unit types, units, runners
pub mod traits;     // unit and runner abstractions
pub mod units;      // built-in units
