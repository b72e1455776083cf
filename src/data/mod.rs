// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Data pool: named, lazily loaded data shared by the steps of one run.
//!
//! Names resolve in three tiers (explicit `@name`, implicit registered name,
//! literal path under the pool root); the format of each file is handled by a
//! [`DataHandler`] selected by declared kind or extension.

mod handlers;
mod pool;

pub use handlers::{
    BinaryHandler, DataHandler, HandlerRegistry, JsonHandler, TextHandler, TomlHandler,
    YamlHandler,
};
pub use pool::{DataEntry, DataPool, Resolved};
