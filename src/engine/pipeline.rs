// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

use crate::config::consts::{DEFAULTS_KEY, LAST_RESULT_KEY};
use crate::config::{deep_merge, is_reference, ConfigMerger, PipelineConfig, PipelineStep};
use crate::data::{DataPool, Resolved};
use crate::engine::context::{SharedState, UnitContext};
use crate::errors::{ExecutionError, PipelineError, StepFailure};
use crate::observability::messages::engine::{
    DeclaredOutputMissing, OutputRouted, RunCompleted, RunFailed, RunStarted, RunStateChanged,
    StepCompleted, StepStarted, UndeclaredOutputDropped,
};
use crate::observability::messages::StructuredLog;
use crate::registry::{Dependency, Registry, UnitSpec};
use crate::traits::UnitOutput;

/// Where a run is. Step indices are positions in the pipeline's step list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initialized,
    Resolving { step: usize },
    Executing { step: usize },
    Completed,
    Failed { step: usize },
}

impl Display for RunState {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            RunState::Initialized => write!(f, "initialized"),
            RunState::Resolving { step } => write!(f, "resolving step {step}"),
            RunState::Executing { step } => write!(f, "executing step {step}"),
            RunState::Completed => write!(f, "completed"),
            RunState::Failed { step } => write!(f, "failed at step {step}"),
        }
    }
}

fn transition(state: &mut RunState, next: RunState) {
    RunStateChanged {
        from: &*state,
        to: &next,
    }
    .log();
    *state = next;
}

/// Outcome of one successful step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub index: usize,
    pub unit: String,
    pub unit_type: String,
    /// The whole result, as mirrored into `last_result`.
    pub output: Value,
    /// Output names the result was routed to, in routing order.
    pub routed: Vec<String>,
    pub duration: Duration,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps: Vec<StepResult>,
    pub shared_state: SharedState,
    pub duration: Duration,
}

/// Sequential step walker.
///
/// Owns the registry and the run-independent configuration layers (shared
/// document and command overrides). The data pool is passed per run.
///
/// # Example
/// ```rust
/// use the_pipewright::config::{PipelineConfig, PipelineStep};
/// use the_pipewright::data::DataPool;
/// use the_pipewright::engine::PipelineEngine;
/// use the_pipewright::registry::bootstrap;
/// use serde_json::json;
///
/// let pipeline = PipelineConfig::from_value(
///     json!({ "steps": [{ "unit": "constant", "config": { "value": 21 }, "outputs": ["seed"] }] }),
///     "inline",
/// )
/// .unwrap();
///
/// let mut engine = PipelineEngine::new(bootstrap().unwrap());
/// let mut pool = DataPool::new(".");
/// let summary = engine.run(&pipeline, &mut pool).unwrap();
///
/// assert_eq!(summary.steps[0].output, json!(21));
/// assert_eq!(pool.get("seed").unwrap(), json!(21));
/// ```
#[derive(Debug)]
pub struct PipelineEngine {
    registry: Registry,
    shared_config: Value,
    overrides: Value,
    state: RunState,
}

impl PipelineEngine {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            shared_config: Value::Object(Map::new()),
            overrides: Value::Object(Map::new()),
            state: RunState::Initialized,
        }
    }

    /// Shared document: `defaults` plus one section per unit name.
    pub fn with_shared_config(mut self, shared: Value) -> Self {
        self.shared_config = shared;
        self
    }

    /// Override tree as produced by `overrides_tree`; unit sections only are used here.
    pub fn with_overrides(mut self, overrides: Value) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// State the most recent run ended in.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute every step in order against `pool`.
    ///
    /// The first error aborts the run: nothing after the failing step runs and
    /// outputs already persisted by earlier steps stay where they are.
    pub fn run(
        &mut self,
        pipeline: &PipelineConfig,
        pool: &mut DataPool,
    ) -> Result<RunSummary, StepFailure> {
        let started = Instant::now();
        RunStarted {
            step_count: pipeline.steps.len(),
            data_source_count: pool.entries().count(),
        }
        .log();

        let shared_defaults = self.shared_config.get(DEFAULTS_KEY).unwrap_or(&Value::Null);
        let defaults = match (shared_defaults, &pipeline.defaults) {
            (Value::Null, pipeline_defaults) => pipeline_defaults.clone(),
            (shared, Value::Null) => shared.clone(),
            (shared, pipeline_defaults) => deep_merge(shared, pipeline_defaults),
        };
        let mut merger = ConfigMerger::new(&defaults);

        let mut state = RunState::Initialized;
        let mut shared_state = SharedState::new();
        let mut steps = Vec::with_capacity(pipeline.steps.len());

        for (index, step) in pipeline.steps.iter().enumerate() {
            match self.run_step(
                &mut state,
                index,
                step,
                &mut merger,
                pool,
                &mut shared_state,
            ) {
                Ok(result) => steps.push(result),
                Err(source) => {
                    transition(&mut state, RunState::Failed { step: index });
                    RunFailed {
                        step_index: index,
                        unit: &step.unit,
                        error: &source,
                    }
                    .log();
                    self.state = state;
                    return Err(StepFailure {
                        index,
                        unit: step.unit.clone(),
                        source,
                    });
                }
            }
        }

        transition(&mut state, RunState::Completed);
        self.state = state;

        let duration = started.elapsed();
        RunCompleted {
            step_count: steps.len(),
            duration,
        }
        .log();

        Ok(RunSummary {
            steps,
            shared_state,
            duration,
        })
    }

    fn run_step(
        &self,
        state: &mut RunState,
        index: usize,
        step: &PipelineStep,
        merger: &mut ConfigMerger,
        pool: &mut DataPool,
        shared_state: &mut SharedState,
    ) -> Result<StepResult, PipelineError> {
        let started = Instant::now();
        transition(state, RunState::Resolving { step: index });

        let spec = self.registry.get_unit(&step.unit, &step.unit_type)?;
        let config = merger.build(
            &step.unit,
            &spec.defaults(),
            self.shared_config.get(&step.unit).unwrap_or(&Value::Null),
            &step.config,
            self.overrides.get(&step.unit).unwrap_or(&Value::Null),
        )?;
        if let Some(schema) = &spec.config_schema {
            schema.validate(&step.unit, &config)?;
        }
        check_data_aliases(&config, pool)?;

        let message = StepStarted {
            step_index: index,
            unit: &step.unit,
            unit_type: &step.unit_type,
        };
        let span = message.span("step_execution");
        let _guard = span.enter();
        message.log();

        let inputs = resolve_inputs(spec, &config, pool, shared_state)?;

        transition(state, RunState::Executing { step: index });
        let (output, writes) = {
            let mut ctx = UnitContext::new(&step.unit);
            if spec.depends_on(&Dependency::Config) {
                ctx = ctx.with_config(&config);
            }
            if spec.depends_on(&Dependency::Logger) {
                ctx = ctx.with_logger(span.clone());
            }
            if spec.depends_on(&Dependency::SharedState) {
                ctx = ctx.with_shared_state(shared_state);
            }
            if spec.depends_on(&Dependency::DataPool) {
                ctx = ctx.with_data_pool(pool);
            }
            for (name, value) in inputs {
                ctx = ctx.with_input(&name, value);
            }

            let output =
                self.registry
                    .execute_unit(&step.unit, &step.unit_type, &mut ctx, &config)?;
            (output, ctx.into_shared_writes())
        };

        shared_state.extend(writes);
        let routed = route_output(step, &output, pool)?;
        let output = output.to_value();
        shared_state.insert(LAST_RESULT_KEY, output.clone());

        let duration = started.elapsed();
        StepCompleted {
            step_index: index,
            unit: &step.unit,
            output_count: routed.len(),
            duration,
        }
        .log();

        Ok(StepResult {
            index,
            unit: step.unit.clone(),
            unit_type: step.unit_type.clone(),
            output,
            routed,
            duration,
        })
    }
}

/// Every reference left after resolution is a data source alias and must name a
/// registered or in-memory entry.
fn check_data_aliases(config: &Value, pool: &DataPool) -> Result<(), PipelineError> {
    match config {
        Value::String(text) if is_reference(text) => {
            pool.resolve(text)?;
        }
        Value::Array(items) => {
            for item in items {
                check_data_aliases(item, pool)?;
            }
        }
        Value::Object(map) => {
            for value in map.values() {
                check_data_aliases(value, pool)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Collect every declared input before the unit runs.
fn resolve_inputs(
    spec: &UnitSpec,
    config: &Value,
    pool: &mut DataPool,
    shared_state: &SharedState,
) -> Result<Vec<(String, Value)>, PipelineError> {
    let unresolved = |dependency: String| ExecutionError::UnresolvedDependency {
        unit: spec.name.clone(),
        dependency,
    };

    let mut inputs = Vec::new();
    for dependency in &spec.dependencies {
        match dependency {
            Dependency::Input(name) => {
                let value = lookup_input(name, pool, shared_state)?
                    .ok_or_else(|| unresolved(format!("input '{name}'")))?;
                inputs.push((name.clone(), value));
            }
            Dependency::InputFromConfig(key) => {
                let name = config.get(key).and_then(Value::as_str).ok_or_else(|| {
                    unresolved(format!("config field '{key}' naming an input"))
                })?;
                let value = lookup_input(name, pool, shared_state)?
                    .ok_or_else(|| unresolved(format!("input '{name}' (from '{key}')")))?;
                inputs.push((key.clone(), value));
            }
            Dependency::Config
            | Dependency::Logger
            | Dependency::DataPool
            | Dependency::SharedState => {}
        }
    }
    Ok(inputs)
}

/// Shared state first, then registered or in-memory pool entries.
fn lookup_input(
    name: &str,
    pool: &mut DataPool,
    shared_state: &SharedState,
) -> Result<Option<Value>, PipelineError> {
    if let Some(value) = shared_state.get(name) {
        return Ok(Some(value.clone()));
    }
    match pool.resolve(name)? {
        Resolved::Entry(entry) => Ok(Some(pool.get(&entry)?)),
        Resolved::Literal(_) => Ok(None),
    }
}

/// Store a unit's result under its output names; returns the names written.
fn route_output(
    step: &PipelineStep,
    output: &UnitOutput,
    pool: &mut DataPool,
) -> Result<Vec<String>, PipelineError> {
    let mut routed = Vec::new();
    let mut store = |name: &str, value: Value| -> Result<(), PipelineError> {
        let persisted = pool.store(name, value)?;
        OutputRouted {
            unit: &step.unit,
            output: name,
            persisted,
        }
        .log();
        routed.push(name.to_string());
        Ok(())
    };

    match output {
        UnitOutput::Single(value) => {
            let name = step.outputs.first().unwrap_or(&step.unit);
            store(name.as_str(), value.clone())?;
        }
        UnitOutput::Named(values) if step.outputs.is_empty() => {
            for (name, value) in values {
                store(name.as_str(), value.clone())?;
            }
        }
        UnitOutput::Named(values) => {
            for name in &step.outputs {
                match values.get(name) {
                    Some(value) => store(name.as_str(), value.clone())?,
                    None => DeclaredOutputMissing {
                        unit: &step.unit,
                        output: name,
                    }
                    .log(),
                }
            }
            for name in values.keys().filter(|key| !step.outputs.contains(*key)) {
                UndeclaredOutputDropped {
                    unit: &step.unit,
                    output: name,
                }
                .log();
            }
        }
    }
    Ok(routed)
}
