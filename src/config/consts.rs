/// Reserved mapping key that inherits from a referenced mapping
pub const EXTENDS_KEY: &str = "_extends";
/// Top-level document key holding the namespace references point into
pub const DEFAULTS_KEY: &str = "defaults";
/// Prefix marking a configuration string as a reference or a data source alias
pub const REFERENCE_PREFIX: char = '@';

/// Unit type assumed when a step does not name one
pub const DEFAULT_UNIT_TYPE: &str = "plugin";
/// Unit type for stateful, instantiated units
pub const RENDERER_UNIT_TYPE: &str = "renderer";

/// Override namespace for framework settings
pub const FRAMEWORK_NAMESPACE: &str = "framework";
/// Override namespace for data source registrations
pub const DATA_SOURCES_NAMESPACE: &str = "data_sources";

/// Shared state key mirroring the most recent step result
pub const LAST_RESULT_KEY: &str = "last_result";
/// Naming contract suffix for path-valued configuration fields
pub const PATH_FIELD_SUFFIX: &str = "_path";

/// Named input that carries the frame buffer into a stateful unit
pub const BUFFER_INPUT: &str = "buffer";
/// Configuration key carrying the position handed to a stateful unit
pub const POSITION_KEY: &str = "position";
