use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::engine::UnitContext;

/// A stateless unit: called with its execution context on every invocation.
pub type UnitFn = Arc<dyn Fn(&mut UnitContext<'_>) -> anyhow::Result<UnitOutput> + Send + Sync>;

/// Builds a stateful unit from its resolved configuration.
pub type UnitConstructor =
    Arc<dyn Fn(&Value) -> anyhow::Result<Box<dyn StatefulUnit>> + Send + Sync>;

/// A unit that is constructed once per run and then invoked repeatedly.
pub trait StatefulUnit: Send {
    /// Process one buffer (typically a frame) at `position`, returning the new buffer.
    fn process(&mut self, buffer: &mut Value, position: u64) -> anyhow::Result<Value>;
}

/// The registered implementation of a unit.
///
/// Which shape is acceptable is decided by the runner of the unit's type.
#[derive(Clone)]
pub enum Implementation {
    Function(UnitFn),
    Constructor(UnitConstructor),
}

impl Implementation {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&mut UnitContext<'_>) -> anyhow::Result<UnitOutput> + Send + Sync + 'static,
    {
        Implementation::Function(Arc::new(f))
    }

    pub fn constructor<F>(f: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Box<dyn StatefulUnit>> + Send + Sync + 'static,
    {
        Implementation::Constructor(Arc::new(f))
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Implementation::Function(_) => "function",
            Implementation::Constructor(_) => "constructor",
        }
    }
}

impl std::fmt::Debug for Implementation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Implementation::{}", self.shape())
    }
}

/// What a unit returns: one value, or values keyed by output name.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutput {
    Single(Value),
    Named(IndexMap<String, Value>),
}

impl UnitOutput {
    pub fn named<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        UnitOutput::Named(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// The whole result as one value; named outputs become a mapping.
    pub fn to_value(&self) -> Value {
        match self {
            UnitOutput::Single(value) => value.clone(),
            UnitOutput::Named(values) => Value::Object(
                values
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}
