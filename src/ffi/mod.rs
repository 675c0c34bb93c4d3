// In: src/ffi/mod.rs

//! The boundary with the native CatBoost model-calcer library.
//!
//! `api` declares the capability the rest of the crate depends on: the set of
//! named native functions as typed callables. `library` resolves that capability
//! from a shared object at runtime. Nothing outside this module touches
//! `libloading`.

pub mod api;
pub mod library;

pub use api::{CatBoostApi, ModelCalcerHandle};
pub use library::SharedLibraryApi;
