// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::consts::REFERENCE_PREFIX;
use crate::data::handlers::{DataHandler, HandlerRegistry};
use crate::errors::DataError;
use crate::observability::messages::data::{
    DataLoaded, DataSaved, DataSourceRegistered, DataSourcesDiscovered, OptionalSourceAbsent,
};
use crate::observability::messages::StructuredLog;

/// A named entry in the pool.
///
/// Registered sources carry a path; step outputs with no persistent sink are
/// held in memory only and have `resolved_path: None`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataEntry {
    pub logical_name: String,
    pub handler_kind: Option<String>,
    pub resolved_path: Option<PathBuf>,
    pub must_exist: bool,
    pub cached_value: Option<Value>,
}

impl DataEntry {
    pub fn is_persistent(&self) -> bool {
        self.resolved_path.is_some()
    }
}

/// Outcome of resolving a name or path against the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A registered or in-memory entry, by logical name.
    Entry(String),
    /// A literal path, already joined onto the pool root.
    Literal(PathBuf),
}

/// Run-scoped store of named data: lazy loads, write-through saves.
#[derive(Debug)]
pub struct DataPool {
    root: PathBuf,
    entries: IndexMap<String, DataEntry>,
    handlers: HandlerRegistry,
    literal_cache: HashMap<PathBuf, Value>,
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

impl DataPool {
    /// Create a pool whose literal paths resolve against `root`.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self::with_handlers(root, HandlerRegistry::with_builtin())
    }

    pub fn with_handlers<P: Into<PathBuf>>(root: P, handlers: HandlerRegistry) -> Self {
        Self {
            root: root.into(),
            entries: IndexMap::new(),
            handlers,
            literal_cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Register a logical name for a file.
    ///
    /// Relative paths are taken relative to the pool root. Registering an existing
    /// name replaces it and drops its cached value.
    ///
    /// # Errors
    /// * `InvalidSourceName` - `name` is not an identifier
    /// * `UnknownHandler` - neither `handler_kind` nor the extension selects a handler
    pub fn register_source<P: AsRef<Path>>(
        &mut self,
        name: &str,
        handler_kind: Option<&str>,
        path: P,
        must_exist: bool,
    ) -> Result<(), DataError> {
        if !is_identifier(name) {
            return Err(DataError::InvalidSourceName {
                name: name.to_string(),
            });
        }

        let path = self.root.join(path.as_ref());
        let handler = self.handlers.select(handler_kind, &path)?;

        DataSourceRegistered {
            name,
            handler: handler.kind(),
            path: &path,
            must_exist,
        }
        .log();

        self.entries.insert(
            name.to_string(),
            DataEntry {
                logical_name: name.to_string(),
                handler_kind: handler_kind.map(str::to_string),
                resolved_path: Some(path),
                must_exist,
                cached_value: None,
            },
        );
        Ok(())
    }

    /// Register every file in `dir` (relative to the root) whose extension has a
    /// handler and whose stem is an identifier. Already registered names are kept.
    ///
    /// Returns the number of sources added.
    pub fn discover<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize, DataError> {
        let dir = self.root.join(dir.as_ref());
        let io_error = |source| DataError::Io {
            path: dir.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        let mut added = 0;
        for path in files {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !is_identifier(stem)
                || self.entries.contains_key(stem)
                || self.handlers.by_extension(&path).is_none()
            {
                continue;
            }
            let stem = stem.to_string();
            self.register_source(&stem, None, &path, true)?;
            added += 1;
        }

        DataSourcesDiscovered {
            dir: &dir,
            count: added,
        }
        .log();
        Ok(added)
    }

    /// Resolve a name or path.
    ///
    /// 1. `@name` must name an entry, else `UnknownDataSource`
    /// 2. a bare identifier naming an entry resolves to it
    /// 3. anything else is a literal path relative to the root
    pub fn resolve(&self, name_or_path: &str) -> Result<Resolved, DataError> {
        if let Some(name) = name_or_path.strip_prefix(REFERENCE_PREFIX) {
            return if self.entries.contains_key(name) {
                Ok(Resolved::Entry(name.to_string()))
            } else {
                Err(DataError::UnknownDataSource {
                    name: name.to_string(),
                })
            };
        }

        if is_identifier(name_or_path) && self.entries.contains_key(name_or_path) {
            return Ok(Resolved::Entry(name_or_path.to_string()));
        }

        Ok(Resolved::Literal(self.root.join(name_or_path)))
    }

    /// Whether `name` (with or without `@`) is a registered or in-memory entry.
    pub fn contains(&self, name: &str) -> bool {
        let name = name.strip_prefix(REFERENCE_PREFIX).unwrap_or(name);
        self.entries.contains_key(name)
    }

    pub fn entry(&self, name: &str) -> Option<&DataEntry> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &DataEntry> {
        self.entries.values()
    }

    /// Value for a name or path, loaded on first access and cached for the run.
    ///
    /// A missing optional source yields `null` and is not cached, so a later
    /// step that produces the file sees it.
    pub fn get(&mut self, name_or_path: &str) -> Result<Value, DataError> {
        match self.resolve(name_or_path)? {
            Resolved::Entry(name) => self.load_entry(&name),
            Resolved::Literal(path) => self.load_literal(name_or_path, path),
        }
    }

    fn load_entry(&mut self, name: &str) -> Result<Value, DataError> {
        let Some(entry) = self.entries.get_mut(name) else {
            return Err(DataError::UnknownDataSource {
                name: name.to_string(),
            });
        };
        if let Some(value) = &entry.cached_value {
            return Ok(value.clone());
        }
        let Some(path) = entry.resolved_path.clone() else {
            return Ok(Value::Null);
        };

        if !path.exists() {
            if entry.must_exist {
                return Err(DataError::DataSourceMissing {
                    name: name.to_string(),
                    path,
                });
            }
            OptionalSourceAbsent { name, path: &path }.log();
            return Ok(Value::Null);
        }

        let handler = self
            .handlers
            .select(entry.handler_kind.as_deref(), &path)?;
        let value = handler.load(&path)?;
        DataLoaded { name, path: &path }.log();

        entry.cached_value = Some(value.clone());
        Ok(value)
    }

    fn load_literal(&mut self, requested: &str, path: PathBuf) -> Result<Value, DataError> {
        if let Some(value) = self.literal_cache.get(&path) {
            return Ok(value.clone());
        }
        if !path.exists() {
            return Err(DataError::DataSourceMissing {
                name: requested.to_string(),
                path,
            });
        }

        let value = self.handlers.select(None, &path)?.load(&path)?;
        DataLoaded {
            name: requested,
            path: &path,
        }
        .log();

        self.literal_cache.insert(path, value.clone());
        Ok(value)
    }

    /// Write `value` through to the entry's file (or a literal path), creating
    /// parent directories, and refresh the cache.
    ///
    /// # Errors
    /// * `NoPersistentPath` - the entry is held in memory only
    pub fn save(&mut self, name_or_path: &str, value: Value) -> Result<(), DataError> {
        match self.resolve(name_or_path)? {
            Resolved::Entry(name) => {
                let Some(entry) = self.entries.get_mut(&name) else {
                    return Err(DataError::UnknownDataSource { name });
                };
                let Some(path) = entry.resolved_path.clone() else {
                    return Err(DataError::NoPersistentPath { name });
                };
                let handler = self.handlers.select(entry.handler_kind.as_deref(), &path)?;
                write_through(handler, &path, &value)?;
                DataSaved { name: &name, path: &path }.log();
                entry.cached_value = Some(value);
            }
            Resolved::Literal(path) => {
                let handler = self.handlers.select(None, &path)?;
                write_through(handler, &path, &value)?;
                DataSaved {
                    name: name_or_path,
                    path: &path,
                }
                .log();
                self.literal_cache.insert(path, value);
            }
        }
        Ok(())
    }

    /// Hold `value` in memory under `name`; an existing entry keeps its path but
    /// is not written.
    pub fn put(&mut self, name: &str, value: Value) {
        match self.entries.get_mut(name) {
            Some(entry) => entry.cached_value = Some(value),
            None => {
                self.entries.insert(
                    name.to_string(),
                    DataEntry {
                        logical_name: name.to_string(),
                        handler_kind: None,
                        resolved_path: None,
                        must_exist: false,
                        cached_value: Some(value),
                    },
                );
            }
        }
    }

    /// Save when `name` is a persistent entry, otherwise keep in memory.
    ///
    /// Returns whether the value was persisted.
    pub fn store(&mut self, name: &str, value: Value) -> Result<bool, DataError> {
        let persistent = self
            .entries
            .get(name)
            .is_some_and(DataEntry::is_persistent);
        if persistent {
            self.save(name, value)?;
        } else {
            self.put(name, value);
        }
        Ok(persistent)
    }
}

fn write_through(
    handler: &dyn DataHandler,
    path: &Path,
    value: &Value,
) -> Result<(), DataError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| DataError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    handler.save(path, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn pool_with_customers() -> (tempfile::TempDir, DataPool) {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(
            dir.path().join("data/customers.json"),
            r#"{"customers": ["ada", "grace"]}"#,
        )
        .unwrap();

        let mut pool = DataPool::new(dir.path());
        pool.register_source("customer_master", None, "data/customers.json", true)
            .unwrap();
        (dir, pool)
    }

    #[test]
    fn test_resolution_order_table_driven() {
        struct TestCase {
            name: &'static str,
            input: &'static str,
            expected: Result<Resolved, &'static str>,
        }

        let (dir, pool) = pool_with_customers();
        let test_cases = vec![
            TestCase {
                name: "explicit registered name",
                input: "@customer_master",
                expected: Ok(Resolved::Entry("customer_master".into())),
            },
            TestCase {
                name: "explicit unknown name",
                input: "@nobody",
                expected: Err("Unknown data source 'nobody'"),
            },
            TestCase {
                name: "implicit registered name",
                input: "customer_master",
                expected: Ok(Resolved::Entry("customer_master".into())),
            },
            TestCase {
                name: "unregistered identifier is a literal path",
                input: "customers",
                expected: Ok(Resolved::Literal(dir.path().join("customers"))),
            },
            TestCase {
                name: "relative literal path",
                input: "data/customers.json",
                expected: Ok(Resolved::Literal(dir.path().join("data/customers.json"))),
            },
            TestCase {
                name: "absolute path passes through",
                input: "/tmp/elsewhere.json",
                expected: Ok(Resolved::Literal(PathBuf::from("/tmp/elsewhere.json"))),
            },
        ];

        for case in test_cases {
            match (pool.resolve(case.input), case.expected) {
                (Ok(actual), Ok(expected)) => {
                    assert_eq!(actual, expected, "Test case '{}'", case.name)
                }
                (Err(err), Err(message)) => {
                    assert_eq!(err.to_string(), message, "Test case '{}'", case.name)
                }
                (actual, expected) => panic!(
                    "Test case '{}': expected {:?}, got {:?}",
                    case.name, expected, actual
                ),
            }
        }
    }

    #[test]
    fn test_lazy_load_is_cached_for_the_run() {
        let (dir, mut pool) = pool_with_customers();
        assert_eq!(pool.entry("customer_master").unwrap().cached_value, None);

        let first = pool.get("@customer_master").unwrap();
        assert_eq!(first, json!({ "customers": ["ada", "grace"] }));

        fs::remove_file(dir.path().join("data/customers.json")).unwrap();
        assert_eq!(pool.get("customer_master").unwrap(), first);
    }

    #[test]
    fn test_literal_path_loads_by_extension() {
        let (_dir, mut pool) = pool_with_customers();
        assert_eq!(
            pool.get("data/customers.json").unwrap(),
            json!({ "customers": ["ada", "grace"] })
        );
    }

    #[test]
    fn test_missing_sources() {
        let dir = tempdir().unwrap();
        let mut pool = DataPool::new(dir.path());
        pool.register_source("required", None, "out/required.json", true)
            .unwrap();
        pool.register_source("optional", None, "out/optional.json", false)
            .unwrap();

        assert!(matches!(
            pool.get("required"),
            Err(DataError::DataSourceMissing { .. })
        ));
        assert_eq!(pool.get("optional").unwrap(), Value::Null);

        fs::create_dir_all(dir.path().join("out")).unwrap();
        fs::write(dir.path().join("out/optional.json"), "[1, 2]").unwrap();
        assert_eq!(pool.get("optional").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_save_writes_through_and_creates_directories() {
        let dir = tempdir().unwrap();
        let mut pool = DataPool::new(dir.path());
        pool.register_source("report", Some("yaml"), "out/nested/report.data", true)
            .unwrap();

        pool.save("report", json!({ "total": 7 })).unwrap();

        let written = fs::read_to_string(dir.path().join("out/nested/report.data")).unwrap();
        assert!(written.contains("total: 7"));
        assert_eq!(pool.get("@report").unwrap(), json!({ "total": 7 }));
    }

    #[test]
    fn test_store_persists_registered_entries_only() {
        let dir = tempdir().unwrap();
        let mut pool = DataPool::new(dir.path());
        pool.register_source("totals", None, "totals.json", true).unwrap();

        assert!(pool.store("totals", json!(3)).unwrap());
        assert!(dir.path().join("totals.json").exists());

        assert!(!pool.store("scratch", json!("in memory")).unwrap());
        assert_eq!(pool.get("scratch").unwrap(), json!("in memory"));
        assert!(!pool.entry("scratch").unwrap().is_persistent());

        assert!(matches!(
            pool.save("scratch", json!(1)),
            Err(DataError::NoPersistentPath { .. })
        ));
    }

    #[test]
    fn test_register_source_rejections() {
        let dir = tempdir().unwrap();
        let mut pool = DataPool::new(dir.path());

        assert!(matches!(
            pool.register_source("not-an-identifier", None, "a.json", true),
            Err(DataError::InvalidSourceName { .. })
        ));
        assert!(matches!(
            pool.register_source("archive", None, "archive.xyz", true),
            Err(DataError::UnknownHandler { .. })
        ));
    }

    #[test]
    fn test_discover_registers_known_files() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("prices.json"), "{}").unwrap();
        fs::write(data.join("notes.txt"), "hello").unwrap();
        fs::write(data.join("bad-name.json"), "{}").unwrap();
        fs::write(data.join("unknown.xyz"), "?").unwrap();

        let mut pool = DataPool::new(dir.path());
        pool.register_source("prices", Some("text"), "data/prices.json", true)
            .unwrap();

        assert_eq!(pool.discover("data").unwrap(), 1);
        assert!(pool.contains("@notes"));
        assert_eq!(
            pool.entry("prices").unwrap().handler_kind.as_deref(),
            Some("text")
        );
        assert_eq!(pool.get("notes").unwrap(), json!("hello"));
    }
}
