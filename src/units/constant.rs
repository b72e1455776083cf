use serde_json::Value;

use crate::config::consts::DEFAULT_UNIT_TYPE;
use crate::config::{ConfigSchema, FieldKind};
use crate::errors::RegistryError;
use crate::registry::{Dependency, Registry, UnitSpec};
use crate::traits::{Implementation, UnitOutput};

pub const NAME: &str = "constant";

/// Emits its configured `value` unchanged.
pub fn spec() -> UnitSpec {
    UnitSpec::new(
        NAME,
        DEFAULT_UNIT_TYPE,
        Implementation::function(|ctx| {
            let value: Value = ctx.config_field("value")?;
            Ok(UnitOutput::Single(value))
        }),
    )
    .with_description("Emit the configured value")
    .with_schema(ConfigSchema::new().required("value", FieldKind::Any))
    .with_dependencies(vec![Dependency::Config])
}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_unit(spec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::UnitContext;
    use serde_json::json;

    #[test]
    fn test_emits_configured_value() {
        let config = json!({ "value": { "nested": [1, 2] } });
        let spec = spec();
        let crate::traits::Implementation::Function(function) = &spec.implementation else {
            panic!("constant must be a function unit");
        };

        let mut ctx = UnitContext::new(NAME).with_config(&config);
        assert_eq!(
            function(&mut ctx).unwrap(),
            UnitOutput::Single(json!({ "nested": [1, 2] }))
        );
    }
}
