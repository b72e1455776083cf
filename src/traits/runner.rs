use serde_json::Value;

use crate::engine::UnitContext;
use crate::errors::{PipelineError, RegistryError};
use crate::registry::UnitSpec;
use crate::traits::UnitOutput;

/// Per-unit-type strategy defining how units are validated and invoked.
///
/// `validate` runs once when a unit is registered so an implementation of the
/// wrong shape is rejected at startup. `execute` runs on every invocation with the
/// unit's resolved configuration.
pub trait Runner: Send + Sync {
    fn validate(&self, spec: &UnitSpec) -> Result<(), RegistryError>;

    fn execute(
        &self,
        spec: &UnitSpec,
        ctx: &mut UnitContext<'_>,
        config: &Value,
    ) -> Result<UnitOutput, PipelineError>;

    fn name(&self) -> &'static str;
}
