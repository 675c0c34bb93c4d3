//! This file is the root of the `catboost_bridge` Rust crate.
//!
//! The crate marshals Arrow columns into the buffers a dynamically loaded
//! CatBoost model-calcer library expects, and turns its output back into an
//! Arrow column. Its responsibilities here are strictly limited to:
//! 1.  Declaring the top-level modules (`bridge`, `evaluator`, `ffi`, etc.).
//! 2.  Re-exporting the public surface so callers can `use catboost_bridge::*`.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
pub mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod buffers;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod ffi;
pub mod hashing;
pub mod model;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[doc(hidden)]
pub use log as __log;

//==================================================================================
// 2. Public Surface
//==================================================================================
pub use bridge::{CatBoostModel, ModelInfo, ModelRegistry};
pub use config::{BridgeConfig, CategoricalEncoding, LoggingConfig};
pub use error::{BridgeError, Result};
pub use evaluator::PredictionStrategy;
pub use ffi::{CatBoostApi, SharedLibraryApi};
pub use model::{FeatureSchema, ModelHandle};
pub use observability::init_logging;
