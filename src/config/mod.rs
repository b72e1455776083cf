// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod merger;
mod overrides;
mod reference;
mod runtime;
mod validation;

pub mod consts;

pub use loader::{
    load_pipeline, load_shared_config, DataSourceConfig, FrameworkConfig, PipelineConfig,
    PipelineStep,
};
pub use merger::{deep_merge, namespace_root, ConfigMerger};
pub use overrides::{coerce_value, overrides_tree, Override};
pub use reference::{is_reference, resolve};
pub use runtime::{Runtime, RuntimeBuilder};
pub use validation::{ConfigSchema, FieldKind, FieldSpec};
