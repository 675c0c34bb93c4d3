// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the public face of the crate. Callers hand it Arrow columns and
// get back one prediction column; everything native stays behind it.
//
// Data Flow (Evaluation):
//
//   1. [ModelRegistry]                 -> get_or_load(model_path), one load per path
//         |
//         `-> returns a shared `CatBoostModel`
//
//   2. [CatBoostModel::evaluate]       -> Receives `&[ArrayRef]` (or a RecordBatch)
//         |
//         `-> a. `evaluator::dispatch` validates columns, picks the strategy once
//         |
//         `-> b. `evaluator::batched` slices rows into windows; per window the
//         |      `buffers` / `hashing` builders fill native buffers and the
//         |      `ffi::CatBoostApi` call writes into the output slice
//
//   3. [evaluator::output]             -> Float64Array, or a StructArray per dimension
//
// ====================================================================================
pub mod model;
pub mod registry;

pub use model::CatBoostModel;
pub use registry::{ModelInfo, ModelRegistry};

#[cfg(test)]
mod tests;
