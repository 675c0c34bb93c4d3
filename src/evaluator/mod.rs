// In: src/evaluator/mod.rs

//! Batched evaluation of input columns against a loaded model.
//!
//! `dispatch` validates a call and fixes its strategy, `batched` runs the
//! window loop, and `output` shapes the result column.

pub mod batched;
pub mod dispatch;
pub mod output;

pub use batched::evaluate_columns;
pub use dispatch::{EvaluationPlan, PredictionStrategy};
pub use output::assemble_output;
