// In: src/error.rs

//! This module defines the single, unified error type for the catboost bridge.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Every failure of an evaluation call is reported through exactly one of these
//! variants; none of them is ever folded into the output column as a sentinel.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    // =========================================================================
    // === Bridge Errors (one per failing stage)
    // =========================================================================
    /// The native library or the model file could not be used.
    #[error("Cannot load CatBoost model: {0}")]
    Load(String),

    /// The supplied columns do not match the feature schema of the loaded model.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A column's runtime type cannot be bound to the feature slot it occupies.
    #[error("Type mismatch for column {column}: {reason}")]
    TypeMismatch { column: usize, reason: String },

    /// The native library reported failure for a window of rows.
    #[error(
        "Error occurred while applying CatBoost model to rows [{offset}, {}): {message}",
        .offset + .rows
    )]
    NativeCompute {
        offset: usize,
        rows: usize,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error originating from the underlying I/O subsystem (e.g., config file not found).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while reading a config file.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    pub(crate) fn type_mismatch(column: usize, reason: impl Into<String>) -> Self {
        BridgeError::TypeMismatch {
            column,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

impl From<libloading::Error> for BridgeError {
    fn from(err: libloading::Error) -> Self {
        BridgeError::Load(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_compute_message_names_the_window() {
        let err = BridgeError::NativeCompute {
            offset: 10,
            rows: 5,
            message: "bad model".into(),
        };
        assert_eq!(
            err.to_string(),
            "Error occurred while applying CatBoost model to rows [10, 15): bad model"
        );
    }

    #[test]
    fn test_type_mismatch_names_the_column() {
        let err = BridgeError::type_mismatch(3, "expected numeric");
        assert!(err.to_string().contains("column 3"));
        assert!(matches!(err, BridgeError::TypeMismatch { column: 3, .. }));
    }
}
