// In: src/config.rs

//! The single source of truth for catboost bridge configuration.
//!
//! `BridgeConfig` is created once at the application boundary (from a JSON file,
//! a JSON string or `Default`) and then shared read-only by every model the
//! bridge loads.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

//==================================================================================
// I. Core Configuration Enums & Structs
//==================================================================================

/// Declares how categorical feature columns are to be interpreted.
///
/// This is the caller's half of the dispatch decision; the other half is the
/// runtime type of the categorical columns themselves.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalEncoding {
    /// **Default:** All-string categorical columns are passed to the native library
    /// as C strings. If any categorical column is integer-typed, every categorical
    /// value is hashed with the library's own hash functions instead.
    #[default]
    Auto,

    /// Always hash categorical values, including strings. Avoids copying string
    /// data into terminated buffers at the cost of one native call per value.
    HashStrings,

    /// Categorical integer columns already hold codes produced by the library's
    /// hash function. They are forwarded untouched and the hash pipeline is skipped.
    PreHashed,
}

/// Logging settings consumed by [`crate::observability::init_logging`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// A `log::LevelFilter` name: `off`, `error`, `warn`, `info`, `debug` or `trace`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// If set, log lines are appended to this file instead of stderr.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

//==================================================================================
// II. The Unified BridgeConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BridgeConfig {
    /// Path of the CatBoost model-calcer shared library. Required by
    /// [`crate::ModelRegistry`]; callers that inject their own API may leave it empty.
    #[serde(default)]
    pub library_path: Option<PathBuf>,

    /// **The maximum number of rows marshaled per native call.**
    /// Bounds the transient buffers independently of the input size.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Default interpretation of categorical columns for evaluation calls that do
    /// not pass their own.
    #[serde(default)]
    pub categorical_encoding: CategoricalEncoding,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            library_path: None,
            max_batch_size: default_max_batch_size(),
            categorical_encoding: CategoricalEncoding::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Parses and validates a config from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: BridgeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn with_categorical_encoding(mut self, encoding: CategoricalEncoding) -> Self {
        self.categorical_encoding = encoding;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            return Err(BridgeError::Config(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        self.logging
            .level
            .parse::<log::LevelFilter>()
            .map_err(|_| {
                BridgeError::Config(format!("unknown log level '{}'", self.logging.level))
            })?;
        Ok(())
    }
}

/// Helper for `serde` to provide a default for `max_batch_size`.
fn default_max_batch_size() -> usize {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_json_yields_defaults() {
        let config = BridgeConfig::from_json_str("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.max_batch_size, 10_000);
        assert_eq!(config.categorical_encoding, CategoricalEncoding::Auto);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_full_json_is_parsed() {
        let json = r#"{
            "library_path": "/opt/catboost/libcatboostmodel.so",
            "max_batch_size": 512,
            "categorical_encoding": "pre_hashed",
            "logging": { "level": "debug", "file": "/tmp/bridge.log" }
        }"#;
        let config = BridgeConfig::from_json_str(json).unwrap();
        assert_eq!(
            config.library_path.as_deref(),
            Some(Path::new("/opt/catboost/libcatboostmodel.so"))
        );
        assert_eq!(config.max_batch_size, 512);
        assert_eq!(config.categorical_encoding, CategoricalEncoding::PreHashed);
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/bridge.log")));
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let result = BridgeConfig::from_json_str(r#"{ "max_batch_size": 0 }"#);
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let result = BridgeConfig::from_json_str(r#"{ "logging": { "level": "loud" } }"#);
        assert!(matches!(result, Err(BridgeError::Config(msg)) if msg.contains("loud")));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "categorical_encoding": "hash_strings" }}"#).unwrap();

        let config = BridgeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.categorical_encoding, CategoricalEncoding::HashStrings);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = BridgeConfig::from_file("/definitely/not/here.json");
        assert!(matches!(result, Err(BridgeError::Io(_))));
    }
}
