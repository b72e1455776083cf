// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::bail;
use serde_json::json;

use crate::config::consts::DEFAULT_UNIT_TYPE;
use crate::config::{ConfigSchema, FieldKind};
use crate::engine::UnitContext;
use crate::errors::RegistryError;
use crate::registry::{Dependency, Registry, UnitSpec};
use crate::traits::{Implementation, UnitOutput};

pub const NAME: &str = "counter";

/// Increments an integer in shared state by `step` and returns the new count.
pub fn spec() -> UnitSpec {
    UnitSpec::new(NAME, DEFAULT_UNIT_TYPE, Implementation::function(count))
        .with_description("Increment a shared-state counter")
        .with_schema(
            ConfigSchema::new()
                .optional("key", FieldKind::String, json!("counter"))
                .optional("step", FieldKind::Integer, json!(1)),
        )
        .with_dependencies(vec![
            Dependency::Config,
            Dependency::SharedState,
            Dependency::Logger,
        ])
}

fn count(ctx: &mut UnitContext<'_>) -> anyhow::Result<UnitOutput> {
    let key: String = ctx.config_field("key")?;
    let step: i64 = ctx.config_field("step")?;

    let current = ctx
        .shared()?
        .get(&key)
        .and_then(|value| value.as_i64())
        .unwrap_or(0);
    let Some(next) = current.checked_add(step) else {
        bail!("{key}: {current} + {step} overflows");
    };

    ctx.logger()?.in_scope(|| tracing::debug!(key = %key, count = next, "counter advanced"));
    ctx.publish(&key, json!(next));
    Ok(UnitOutput::Single(json!(next)))
}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_unit(spec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SharedState;
    use tracing::Span;

    #[test]
    fn test_counts_from_shared_state() {
        let config = json!({ "key": "frames", "step": 2 });
        let mut shared = SharedState::new();
        shared.insert("frames", json!(5));

        let mut ctx = UnitContext::new(NAME)
            .with_config(&config)
            .with_shared_state(&shared)
            .with_logger(Span::none());

        assert_eq!(count(&mut ctx).unwrap(), UnitOutput::Single(json!(7)));
        assert_eq!(ctx.into_shared_writes().get("frames"), Some(&json!(7)));
    }

    #[test]
    fn test_starts_from_zero() {
        let config = json!({ "key": "counter", "step": 1 });
        let shared = SharedState::new();
        let mut ctx = UnitContext::new(NAME)
            .with_config(&config)
            .with_shared_state(&shared)
            .with_logger(Span::none());

        assert_eq!(count(&mut ctx).unwrap(), UnitOutput::Single(json!(1)));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let config = json!({ "key": "frames", "step": i64::MAX });
        let mut shared = SharedState::new();
        shared.insert("frames", json!(1));

        let mut ctx = UnitContext::new(NAME)
            .with_config(&config)
            .with_shared_state(&shared)
            .with_logger(Span::none());

        let err = count(&mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "frames: 1 + 9223372036854775807 overflows");
        assert!(ctx.into_shared_writes().is_empty());
    }
}
