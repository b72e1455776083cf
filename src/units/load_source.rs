use serde_json::Value;

use crate::config::consts::DEFAULT_UNIT_TYPE;
use crate::config::{ConfigSchema, FieldKind};
use crate::engine::UnitContext;
use crate::errors::RegistryError;
use crate::registry::{Dependency, Registry, UnitSpec};
use crate::traits::{Implementation, UnitOutput};

pub const NAME: &str = "load_source";

/// Reads `source_path` through the data pool (`@name`, registered name or literal path).
pub fn spec() -> UnitSpec {
    UnitSpec::new(NAME, DEFAULT_UNIT_TYPE, Implementation::function(load))
        .with_description("Load a data source or file through the data pool")
        .with_schema(ConfigSchema::new().required("source_path", FieldKind::Path))
        .with_dependencies(vec![Dependency::Config, Dependency::DataPool])
}

fn load(ctx: &mut UnitContext<'_>) -> anyhow::Result<UnitOutput> {
    let source: String = ctx.config_field("source_path")?;
    let value: Value = ctx.data_pool()?.get(&source)?;
    Ok(UnitOutput::Single(value))
}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_unit(spec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataPool;
    use serde_json::json;
    use std::fs;

    #[test]
    fn test_loads_through_pool() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("prices.yaml"), "apple: 3\n").unwrap();
        let mut pool = DataPool::new(dir.path());
        pool.register_source("prices", None, "prices.yaml", true).unwrap();

        for source in ["@prices", "prices", "prices.yaml"] {
            let config = json!({ "source_path": source });
            let mut ctx = UnitContext::new(NAME)
                .with_config(&config)
                .with_data_pool(&mut pool);
            assert_eq!(
                load(&mut ctx).unwrap(),
                UnitOutput::Single(json!({ "apple": 3 })),
                "source {source}"
            );
        }
    }

    #[test]
    fn test_unknown_explicit_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut pool = DataPool::new(dir.path());
        let config = json!({ "source_path": "@missing" });
        let mut ctx = UnitContext::new(NAME)
            .with_config(&config)
            .with_data_pool(&mut pool);

        assert_eq!(
            load(&mut ctx).unwrap_err().to_string(),
            "Unknown data source 'missing'"
        );
    }
}
