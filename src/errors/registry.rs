// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while registering or looking up execution units.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unit '{unit}' uses unknown unit type '{unit_type}'")]
    UnknownUnitType { unit: String, unit_type: String },

    #[error("Unit type '{unit_type}' is already registered")]
    DuplicateUnitType { unit_type: String },

    #[error("Unit '{unit}' is already registered for unit type '{unit_type}'")]
    DuplicateUnit { unit: String, unit_type: String },

    #[error("Unit '{unit}' of type '{unit_type}' is not registered")]
    UnitNotFound { unit: String, unit_type: String },

    /// The implementation does not have the shape the unit type's runner requires.
    #[error("Unit '{unit}' cannot be registered as '{unit_type}': {reason}")]
    InvalidImplementation {
        unit: String,
        unit_type: String,
        reason: String,
    },
}
