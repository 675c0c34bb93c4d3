//! Ownership of a loaded native model and its immutable feature schema.

pub mod handle;
pub mod schema;

pub use handle::ModelHandle;
pub use schema::FeatureSchema;
