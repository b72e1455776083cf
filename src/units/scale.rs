// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::bail;
use serde_json::{json, Value};

use crate::config::consts::DEFAULT_UNIT_TYPE;
use crate::config::{ConfigSchema, FieldKind};
use crate::engine::UnitContext;
use crate::errors::RegistryError;
use crate::registry::{Dependency, Registry, UnitSpec};
use crate::traits::{Implementation, UnitOutput};

pub const NAME: &str = "scale";

/// Multiplies the numeric input named by `input` by `factor`.
///
/// Integer inputs scaled by an integer factor stay integers.
pub fn spec() -> UnitSpec {
    UnitSpec::new(NAME, DEFAULT_UNIT_TYPE, Implementation::function(scale))
        .with_description("Multiply a numeric input by a factor")
        .with_schema(
            ConfigSchema::new()
                .required("input", FieldKind::String)
                .optional("factor", FieldKind::Number, json!(1)),
        )
        .with_dependencies(vec![
            Dependency::Config,
            Dependency::input_from_config("input"),
        ])
}

fn scale(ctx: &mut UnitContext<'_>) -> anyhow::Result<UnitOutput> {
    let factor: Value = ctx.config_field("factor")?;
    let input = ctx.input("input")?;

    let scaled = match (input.as_i64(), factor.as_i64()) {
        (Some(value), Some(factor)) => match value.checked_mul(factor) {
            Some(product) => json!(product),
            None => bail!("{value} * {factor} overflows"),
        },
        _ => match (input.as_f64(), factor.as_f64()) {
            (Some(value), Some(factor)) => json!(value * factor),
            _ => bail!("input must be a number, got {input}"),
        },
    };
    Ok(UnitOutput::Single(scaled))
}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_unit(spec())
}
