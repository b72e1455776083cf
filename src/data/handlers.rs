// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Data handlers: the load/save codecs behind data pool entries.
//!
//! A handler is chosen by the entry's declared kind, or by the path's
//! extension when no kind is declared.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::errors::DataError;

/// Load/save contract for one data format.
pub trait DataHandler: Send + Sync {
    /// Kind name used in `data_sources.<name>.handler`.
    fn kind(&self) -> &'static str;

    /// File extensions (without the dot) this handler claims.
    fn extensions(&self) -> &'static [&'static str];

    /// Shape of the value `load` produces, for listings and diagnostics.
    fn produced_type(&self) -> &'static str;

    fn load(&self, path: &Path) -> Result<Value, DataError>;

    fn save(&self, path: &Path, value: &Value) -> Result<(), DataError>;
}

fn read_text(path: &Path) -> Result<String, DataError> {
    fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), DataError> {
    fs::write(path, bytes).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn codec_error(path: &Path, reason: impl ToString) -> DataError {
    DataError::Codec {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[derive(Debug, Default)]
pub struct JsonHandler;

impl DataHandler for JsonHandler {
    fn kind(&self) -> &'static str {
        "json"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn produced_type(&self) -> &'static str {
        "record"
    }

    fn load(&self, path: &Path) -> Result<Value, DataError> {
        serde_json::from_str(&read_text(path)?).map_err(|e| codec_error(path, e))
    }

    fn save(&self, path: &Path, value: &Value) -> Result<(), DataError> {
        let text = serde_json::to_string_pretty(value).map_err(|e| codec_error(path, e))?;
        write_bytes(path, text.as_bytes())
    }
}

#[derive(Debug, Default)]
pub struct YamlHandler;

impl DataHandler for YamlHandler {
    fn kind(&self) -> &'static str {
        "yaml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["yaml", "yml"]
    }

    fn produced_type(&self) -> &'static str {
        "record"
    }

    fn load(&self, path: &Path) -> Result<Value, DataError> {
        let text = read_text(path)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_yaml::from_str(&text).map_err(|e| codec_error(path, e))
    }

    fn save(&self, path: &Path, value: &Value) -> Result<(), DataError> {
        let text = serde_yaml::to_string(value).map_err(|e| codec_error(path, e))?;
        write_bytes(path, text.as_bytes())
    }
}

/// TOML documents. Top-level values must be tables.
#[derive(Debug, Default)]
pub struct TomlHandler;

impl DataHandler for TomlHandler {
    fn kind(&self) -> &'static str {
        "toml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["toml"]
    }

    fn produced_type(&self) -> &'static str {
        "record"
    }

    fn load(&self, path: &Path) -> Result<Value, DataError> {
        toml::from_str(&read_text(path)?).map_err(|e| codec_error(path, e))
    }

    fn save(&self, path: &Path, value: &Value) -> Result<(), DataError> {
        let text = toml::to_string_pretty(value).map_err(|e| codec_error(path, e))?;
        write_bytes(path, text.as_bytes())
    }
}

/// Plain text; non-string values are saved in their JSON form.
#[derive(Debug, Default)]
pub struct TextHandler;

impl DataHandler for TextHandler {
    fn kind(&self) -> &'static str {
        "text"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["txt", "text", "md", "log"]
    }

    fn produced_type(&self) -> &'static str {
        "string"
    }

    fn load(&self, path: &Path) -> Result<Value, DataError> {
        Ok(Value::String(read_text(path)?))
    }

    fn save(&self, path: &Path, value: &Value) -> Result<(), DataError> {
        match value {
            Value::String(text) => write_bytes(path, text.as_bytes()),
            other => write_bytes(path, other.to_string().as_bytes()),
        }
    }
}

/// Raw bytes, carried in the pool as a base64 string.
#[derive(Debug, Default)]
pub struct BinaryHandler;

impl DataHandler for BinaryHandler {
    fn kind(&self) -> &'static str {
        "binary"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["bin", "png", "jpg", "jpeg", "mp4"]
    }

    fn produced_type(&self) -> &'static str {
        "base64 string"
    }

    fn load(&self, path: &Path) -> Result<Value, DataError> {
        let bytes = fs::read(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Value::String(STANDARD.encode(bytes)))
    }

    fn save(&self, path: &Path, value: &Value) -> Result<(), DataError> {
        let encoded = value
            .as_str()
            .ok_or_else(|| codec_error(path, "binary values must be base64 strings"))?;
        let bytes = STANDARD.decode(encoded).map_err(|e| codec_error(path, e))?;
        write_bytes(path, &bytes)
    }
}

/// Handler kinds available to a data pool.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: IndexMap<String, Arc<dyn DataHandler>>,
}

impl HandlerRegistry {
    /// An empty registry; see [`HandlerRegistry::with_builtin`].
    pub fn new() -> Self {
        Self {
            handlers: IndexMap::new(),
        }
    }

    /// `json`, `yaml`, `toml`, `text` and `binary`.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(JsonHandler));
        registry.register(Arc::new(YamlHandler));
        registry.register(Arc::new(TomlHandler));
        registry.register(Arc::new(TextHandler));
        registry.register(Arc::new(BinaryHandler));
        registry
    }

    /// Add a handler, replacing any handler of the same kind.
    pub fn register(&mut self, handler: Arc<dyn DataHandler>) {
        self.handlers.insert(handler.kind().to_string(), handler);
    }

    pub fn by_kind(&self, kind: &str) -> Option<&dyn DataHandler> {
        self.handlers.get(kind).map(|handler| handler.as_ref())
    }

    /// First registered handler claiming the path's extension (case-insensitive).
    pub fn by_extension(&self, path: &Path) -> Option<&dyn DataHandler> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        self.handlers
            .values()
            .find(|handler| handler.extensions().contains(&extension.as_str()))
            .map(|handler| handler.as_ref())
    }

    /// Handler for a declared kind, else for the path's extension.
    pub fn select(&self, kind: Option<&str>, path: &Path) -> Result<&dyn DataHandler, DataError> {
        let handler = match kind {
            Some(kind) => self.by_kind(kind),
            None => self.by_extension(path),
        };
        handler.ok_or_else(|| DataError::UnknownHandler {
            kind: kind.unwrap_or("<by extension>").to_string(),
            path: path.to_path_buf(),
        })
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.handlers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_select_table_driven() {
        struct TestCase {
            name: &'static str,
            kind: Option<&'static str>,
            path: &'static str,
            expected: Option<&'static str>,
        }

        let test_cases = vec![
            TestCase {
                name: "json by extension",
                kind: None,
                path: "data/customers.json",
                expected: Some("json"),
            },
            TestCase {
                name: "yml alias",
                kind: None,
                path: "settings.YML",
                expected: Some("yaml"),
            },
            TestCase {
                name: "declared kind beats extension",
                kind: Some("text"),
                path: "notes.json",
                expected: Some("text"),
            },
            TestCase {
                name: "unknown extension",
                kind: None,
                path: "archive.xyz",
                expected: None,
            },
            TestCase {
                name: "no extension",
                kind: None,
                path: "README",
                expected: None,
            },
            TestCase {
                name: "unknown declared kind",
                kind: Some("parquet"),
                path: "table.parquet",
                expected: None,
            },
        ];

        let registry = HandlerRegistry::with_builtin();
        for case in test_cases {
            let selected = registry
                .select(case.kind, Path::new(case.path))
                .map(|handler| handler.kind());
            match case.expected {
                Some(kind) => assert_eq!(selected.unwrap(), kind, "Test case '{}'", case.name),
                None => assert!(
                    matches!(selected, Err(DataError::UnknownHandler { .. })),
                    "Test case '{}'",
                    case.name
                ),
            }
        }
    }

    #[test]
    fn test_structured_handlers_save_then_load() {
        let dir = tempdir().unwrap();
        let record = json!({ "name": "Ada", "tags": ["x", "y"], "score": 3 });

        for handler in [
            &JsonHandler as &dyn DataHandler,
            &YamlHandler,
            &TomlHandler,
        ] {
            let path = dir.path().join(format!("record.{}", handler.extensions()[0]));
            handler.save(&path, &record).unwrap();
            assert_eq!(handler.load(&path).unwrap(), record, "kind {}", handler.kind());
        }
    }

    #[test]
    fn test_binary_handler_carries_base64() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        fs::write(&path, [0u8, 159, 146, 150]).unwrap();

        let loaded = BinaryHandler.load(&path).unwrap();
        assert_eq!(loaded, json!("AJ+Slg=="));

        let copy = dir.path().join("copy.bin");
        BinaryHandler.save(&copy, &loaded).unwrap();
        assert_eq!(fs::read(&copy).unwrap(), vec![0u8, 159, 146, 150]);

        let err = BinaryHandler.save(&copy, &json!(12)).unwrap_err();
        assert!(matches!(err, DataError::Codec { .. }));
    }

    #[test]
    fn test_text_handler_writes_non_strings_as_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");

        TextHandler.save(&path, &json!({ "a": 1 })).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_toml_rejects_non_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("value.toml");

        let err = TomlHandler.save(&path, &json!([1, 2])).unwrap_err();
        assert!(matches!(err, DataError::Codec { .. }));
    }

    #[test]
    fn test_custom_handler_registration() {
        struct Upper;

        impl DataHandler for Upper {
            fn kind(&self) -> &'static str {
                "upper"
            }
            fn extensions(&self) -> &'static [&'static str] {
                &["up"]
            }
            fn produced_type(&self) -> &'static str {
                "string"
            }
            fn load(&self, path: &Path) -> Result<Value, DataError> {
                Ok(Value::String(read_text(path)?.to_uppercase()))
            }
            fn save(&self, path: &Path, value: &Value) -> Result<(), DataError> {
                write_bytes(path, value.to_string().as_bytes())
            }
        }

        let mut registry = HandlerRegistry::with_builtin();
        registry.register(Arc::new(Upper));

        assert_eq!(
            registry.select(None, Path::new("shout.up")).unwrap().kind(),
            "upper"
        );
        assert_eq!(registry.kinds().count(), 6);
    }
}
