// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::bail;
use serde_json::{json, Value};

use crate::config::consts::{BUFFER_INPUT, POSITION_KEY, RENDERER_UNIT_TYPE};
use crate::config::{ConfigSchema, FieldKind};
use crate::errors::RegistryError;
use crate::registry::{Dependency, Registry, UnitSpec};
use crate::traits::{Implementation, StatefulUnit};

pub const NAME: &str = "frame_stamp";

/// Stamps `label`, the frame position and a per-instance count into a frame mapping.
///
/// The label is fixed when the instance is constructed; later configuration
/// changes to it are ignored for the rest of the run.
pub struct FrameStamp {
    label: String,
    stamped: u64,
}

impl FrameStamp {
    pub fn from_config(config: &Value) -> anyhow::Result<Self> {
        let label = match config.get("label") {
            None | Some(Value::Null) => "frame".to_string(),
            Some(Value::String(label)) => label.clone(),
            Some(other) => bail!("label must be a string, got {other}"),
        };
        Ok(Self { label, stamped: 0 })
    }
}

impl StatefulUnit for FrameStamp {
    fn process(&mut self, buffer: &mut Value, position: u64) -> anyhow::Result<Value> {
        let Some(frame) = buffer.as_object_mut() else {
            bail!("frame buffer must be a mapping");
        };
        self.stamped += 1;
        frame.insert("label".to_string(), json!(self.label));
        frame.insert(POSITION_KEY.to_string(), json!(position));
        frame.insert("stamp_count".to_string(), json!(self.stamped));
        Ok(buffer.clone())
    }
}

pub fn spec() -> UnitSpec {
    UnitSpec::new(
        NAME,
        RENDERER_UNIT_TYPE,
        Implementation::constructor(|config| {
            Ok(Box::new(FrameStamp::from_config(config)?) as Box<dyn StatefulUnit>)
        }),
    )
    .with_description("Stamp a label and position into each frame")
    .with_schema(
        ConfigSchema::new()
            .optional("label", FieldKind::String, json!("frame"))
            .optional(POSITION_KEY, FieldKind::Integer, json!(0)),
    )
    .with_dependencies(vec![Dependency::Config, Dependency::input(BUFFER_INPUT)])
}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_unit(spec())
}
