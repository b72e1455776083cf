// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in execution units.
//!
//! Each module exposes `register`, called once from [`register`] during
//! [`crate::registry::bootstrap`].

pub mod constant;
pub mod counter;
pub mod frame_stamp;
pub mod load_source;
pub mod scale;
pub mod split_fields;

use crate::errors::RegistryError;
use crate::registry::Registry;

/// Register every built-in unit.
pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    constant::register(registry)?;
    scale::register(registry)?;
    split_fields::register(registry)?;
    counter::register(registry)?;
    load_source::register(registry)?;
    frame_stamp::register(registry)?;
    Ok(())
}
