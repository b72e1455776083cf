// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{anyhow, Context};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::Span;

use crate::config::consts::LAST_RESULT_KEY;
use crate::data::DataPool;

/// Run-scoped key/value state. Created empty per run, discarded at run end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedState(IndexMap<String, Value>);

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Result of the most recently completed step.
    pub fn last_result(&self) -> Option<&Value> {
        self.0.get(LAST_RESULT_KEY)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Extend<(String, Value)> for SharedState {
    fn extend<I: IntoIterator<Item = (String, Value)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

/// Everything a unit was granted for one invocation.
///
/// Only the dependencies the unit declared are populated; asking for anything
/// else is an error. Shared-state writes are buffered here and committed by the
/// engine once the unit returns successfully.
pub struct UnitContext<'a> {
    unit: String,
    config: Option<&'a Value>,
    logger: Option<Span>,
    data_pool: Option<&'a mut DataPool>,
    shared: Option<&'a SharedState>,
    inputs: IndexMap<String, Value>,
    shared_writes: IndexMap<String, Value>,
}

impl<'a> UnitContext<'a> {
    pub fn new(unit: &str) -> Self {
        Self {
            unit: unit.to_string(),
            config: None,
            logger: None,
            data_pool: None,
            shared: None,
            inputs: IndexMap::new(),
            shared_writes: IndexMap::new(),
        }
    }

    pub fn with_config(mut self, config: &'a Value) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_logger(mut self, span: Span) -> Self {
        self.logger = Some(span);
        self
    }

    pub fn with_data_pool(mut self, pool: &'a mut DataPool) -> Self {
        self.data_pool = Some(pool);
        self
    }

    pub fn with_shared_state(mut self, shared: &'a SharedState) -> Self {
        self.shared = Some(shared);
        self
    }

    pub fn with_input(mut self, name: &str, value: Value) -> Self {
        self.inputs.insert(name.to_string(), value);
        self
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    fn undeclared(&self, dependency: &str) -> anyhow::Error {
        anyhow!(
            "unit '{}' did not declare the {} dependency",
            self.unit,
            dependency
        )
    }

    pub fn config(&self) -> anyhow::Result<&Value> {
        self.config.ok_or_else(|| self.undeclared("config"))
    }

    /// Deserialize one field of the resolved configuration.
    pub fn config_field<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<T> {
        let value = self
            .config()?
            .get(key)
            .ok_or_else(|| anyhow!("missing config field '{key}'"))?;
        serde_json::from_value(value.clone())
            .with_context(|| format!("invalid config field '{key}'"))
    }

    pub fn logger(&self) -> anyhow::Result<&Span> {
        self.logger.as_ref().ok_or_else(|| self.undeclared("logger"))
    }

    pub fn data_pool(&mut self) -> anyhow::Result<&mut DataPool> {
        match self.data_pool.as_deref_mut() {
            Some(pool) => Ok(pool),
            None => Err(anyhow!(
                "unit '{}' did not declare the data pool dependency",
                self.unit
            )),
        }
    }

    pub fn shared(&self) -> anyhow::Result<&SharedState> {
        self.shared.ok_or_else(|| self.undeclared("shared state"))
    }

    pub fn input(&self, name: &str) -> anyhow::Result<&Value> {
        self.inputs
            .get(name)
            .ok_or_else(|| self.undeclared(&format!("input '{name}'")))
    }

    /// Move an input out of the context.
    pub fn take_input(&mut self, name: &str) -> Option<Value> {
        self.inputs.shift_remove(name)
    }

    /// Queue a shared-state write; visible to later steps only.
    pub fn publish(&mut self, key: &str, value: Value) {
        self.shared_writes.insert(key.to_string(), value);
    }

    pub fn into_shared_writes(self) -> IndexMap<String, Value> {
        self.shared_writes
    }
}

impl std::fmt::Debug for UnitContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitContext")
            .field("unit", &self.unit)
            .field("config", &self.config.is_some())
            .field("logger", &self.logger.is_some())
            .field("data_pool", &self.data_pool.is_some())
            .field("shared", &self.shared.is_some())
            .field("inputs", &self.inputs.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_declared_dependencies_are_available() {
        let config = json!({ "factor": 3, "label": "x" });
        let ctx = UnitContext::new("scale")
            .with_config(&config)
            .with_input("seed", json!(7));

        assert_eq!(ctx.config_field::<i64>("factor").unwrap(), 3);
        assert_eq!(ctx.input("seed").unwrap(), &json!(7));

        let err = ctx.shared().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unit 'scale' did not declare the shared state dependency"
        );
        assert!(ctx.input("other").is_err());
        assert!(ctx.logger().is_err());
    }

    #[test]
    fn test_config_field_errors() {
        let config = json!({ "factor": "three" });
        let ctx = UnitContext::new("scale").with_config(&config);

        assert_eq!(
            ctx.config_field::<f64>("missing").unwrap_err().to_string(),
            "missing config field 'missing'"
        );
        assert_eq!(
            ctx.config_field::<f64>("factor").unwrap_err().to_string(),
            "invalid config field 'factor'"
        );
    }

    #[test]
    fn test_data_pool_access() {
        let dir = tempfile::tempdir().unwrap();
        let mut pool = DataPool::new(dir.path());
        {
            let mut ctx = UnitContext::new("writer").with_data_pool(&mut pool);
            ctx.data_pool().unwrap().put("scratch", json!(1));
        }
        assert_eq!(pool.get("scratch").unwrap(), json!(1));

        let mut ctx = UnitContext::new("reader");
        assert!(ctx.data_pool().is_err());
    }

    #[test]
    fn test_publish_is_buffered_and_take_input_moves() {
        let shared = SharedState::new();
        let mut ctx = UnitContext::new("counter")
            .with_shared_state(&shared)
            .with_input("buffer", json!({ "frame": 1 }));

        ctx.publish("count", json!(1));
        assert!(ctx.shared().unwrap().is_empty());

        assert_eq!(ctx.take_input("buffer"), Some(json!({ "frame": 1 })));
        assert_eq!(ctx.take_input("buffer"), None);

        let writes = ctx.into_shared_writes();
        assert_eq!(writes.get("count"), Some(&json!(1)));
    }
}
