//! This module defines the strongly-typed classification of input columns used
//! throughout the bridge.
//!
//! It includes the canonical `ColumnKind` enum, which maps an Arrow `DataType`
//! onto the feature families the native library understands.

pub mod column_kind;

// Re-export the main type(s) for easier access.
pub use column_kind::{ColumnKind, StringWidth};
