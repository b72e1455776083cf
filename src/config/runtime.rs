// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::config::loader::{load_pipeline, load_shared_config, PipelineConfig};
use crate::config::overrides::overrides_tree;
use crate::data::DataPool;
use crate::engine::{PipelineEngine, RunSummary};
use crate::errors::{PipelineError, StepFailure};
use crate::registry::{bootstrap, Registry};

/// Runtime builder - assembles engine, pipeline and data pool from configuration files.
///
/// The builder performs the startup phase in a fixed order:
/// 1. Load the pipeline document (its `framework` and `data_sources` sections are
///    reference-resolved against its `defaults`)
/// 2. Load the shared document, when one is given
/// 3. Parse command overrides against the pipeline's namespaces and apply the
///    `framework` / `data_sources` parts
/// 4. Bootstrap the registry (unless one was supplied)
/// 5. Create the data pool at the case root, register declared sources and run
///    auto-discovery
///
/// Any failure here happens before a single unit runs.
///
/// # Examples
///
/// ```no_run
/// use the_pipewright::config::RuntimeBuilder;
///
/// let mut runtime = RuntimeBuilder::new()
///     .with_shared_config("configs/shared.yaml")
///     .with_override("scale.factor=3")
///     .build("configs/demo-pipeline.yaml")
///     .unwrap();
///
/// let summary = runtime.run().unwrap();
/// println!("{} steps", summary.steps.len());
/// ```
#[derive(Debug, Default)]
pub struct RuntimeBuilder {
    registry: Option<Registry>,
    shared_config: Option<PathBuf>,
    overrides: Vec<String>,
    root_dir: Option<PathBuf>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `registry` instead of the bootstrapped built-in registry.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_shared_config<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.shared_config = Some(path.into());
        self
    }

    /// Add one `dotted.key=value` override; later overrides win.
    pub fn with_override(mut self, raw: &str) -> Self {
        self.overrides.push(raw.to_string());
        self
    }

    pub fn with_overrides<I, S>(mut self, raws: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overrides.extend(raws.into_iter().map(Into::into));
        self
    }

    /// Case root for literal paths; takes precedence over `framework.root_dir`.
    pub fn with_root_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.root_dir = Some(dir.into());
        self
    }

    pub fn build<P: AsRef<Path>>(self, pipeline_path: P) -> Result<Runtime, PipelineError> {
        let pipeline_path = pipeline_path.as_ref();
        let mut pipeline = load_pipeline(pipeline_path)?;

        let shared = match &self.shared_config {
            Some(path) => load_shared_config(path)?,
            None => Value::Object(Map::new()),
        };

        let overrides = overrides_tree(&self.overrides, &pipeline.override_namespaces())?;
        pipeline.apply_overrides(&overrides)?;

        let registry = match self.registry {
            Some(registry) => registry,
            None => bootstrap()?,
        };

        let base_dir = pipeline_path.parent().unwrap_or_else(|| Path::new("."));
        let root = match (self.root_dir, &pipeline.framework.root_dir) {
            (Some(root), _) => root,
            (None, Some(root)) => base_dir.join(root),
            (None, None) => base_dir.to_path_buf(),
        };

        let data_pool = build_data_pool(&pipeline, root)?;
        let engine = PipelineEngine::new(registry)
            .with_shared_config(shared)
            .with_overrides(overrides);

        Ok(Runtime {
            engine,
            pipeline,
            data_pool,
        })
    }
}

fn build_data_pool(pipeline: &PipelineConfig, root: PathBuf) -> Result<DataPool, PipelineError> {
    let mut pool = DataPool::new(root);
    for (name, source) in &pipeline.data_sources {
        pool.register_source(
            name,
            source.handler.as_deref(),
            &source.path,
            source.must_exist,
        )?;
    }
    if let Some(dir) = &pipeline.framework.discover {
        pool.discover(dir)?;
    }
    Ok(pool)
}

/// A ready-to-run pipeline.
#[derive(Debug)]
pub struct Runtime {
    pub engine: PipelineEngine,
    pub pipeline: PipelineConfig,
    pub data_pool: DataPool,
}

impl Runtime {
    pub fn run(&mut self) -> Result<RunSummary, StepFailure> {
        self.engine.run(&self.pipeline, &mut self.data_pool)
    }
}
