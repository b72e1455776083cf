// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{anyhow, bail};
use indexmap::IndexMap;
use serde_json::json;

use crate::config::consts::DEFAULT_UNIT_TYPE;
use crate::config::{ConfigSchema, FieldKind};
use crate::engine::UnitContext;
use crate::errors::RegistryError;
use crate::registry::{Dependency, Registry, UnitSpec};
use crate::traits::{Implementation, UnitOutput};

pub const NAME: &str = "split_fields";

/// Splits a mapping input into one named output per field.
///
/// `fields` restricts and orders the split; when empty every field is emitted.
pub fn spec() -> UnitSpec {
    UnitSpec::new(NAME, DEFAULT_UNIT_TYPE, Implementation::function(split))
        .with_description("Emit each field of a mapping as a named output")
        .with_schema(
            ConfigSchema::new()
                .required("input", FieldKind::String)
                .optional("fields", FieldKind::Sequence, json!([])),
        )
        .with_dependencies(vec![
            Dependency::Config,
            Dependency::input_from_config("input"),
        ])
}

fn split(ctx: &mut UnitContext<'_>) -> anyhow::Result<UnitOutput> {
    let fields: Vec<String> = ctx.config_field("fields")?;
    let Some(record) = ctx.input("input")?.as_object() else {
        bail!("input must be a mapping");
    };

    if fields.is_empty() {
        return Ok(UnitOutput::named(
            record.iter().map(|(k, v)| (k.clone(), v.clone())),
        ));
    }

    let mut outputs = IndexMap::new();
    for field in fields {
        let value = record
            .get(&field)
            .cloned()
            .ok_or_else(|| anyhow!("input has no field '{field}'"))?;
        outputs.insert(field, value);
    }
    Ok(UnitOutput::Named(outputs))
}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_unit(spec())
}
