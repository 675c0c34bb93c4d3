// In: src/evaluator/batched.rs

//! The window loop: one plan, many bounded native calls.
//!
//! Each window slices every input column (zero copy), builds that window's
//! buffers, makes exactly one native call that writes straight into the
//! window's range of the output, and drops the buffers before the next window
//! starts. A failing window aborts the call; no partial output escapes.

use arrow::array::{Array, ArrayRef};

use super::dispatch::{EvaluationPlan, PredictionStrategy};
use crate::buffers::{place_numeric_columns, row_array_ptr, RowWindow, RowWindows, TerminatedStrings};
use crate::config::CategoricalEncoding;
use crate::error::{BridgeError, Result};
use crate::hashing::{copy_prehashed_columns, hash_categorical_columns};
use crate::model::ModelHandle;

/// Evaluates `columns` against `handle` and returns the native row-major output,
/// `rows * dimensions` values.
pub fn evaluate_columns(
    handle: &ModelHandle,
    columns: &[ArrayRef],
    encoding: CategoricalEncoding,
    max_batch_size: usize,
) -> Result<Vec<f64>> {
    let plan = EvaluationPlan::new(handle.schema(), columns, encoding)?;
    let dimensions = plan.schema.dimensions;
    if plan.rows == 0 {
        return Ok(Vec::new());
    }

    let mut output = vec![0.0f64; plan.rows * dimensions];
    for window in RowWindows::new(plan.rows, max_batch_size) {
        let out = &mut output[window.offset * dimensions..window.end() * dimensions];
        evaluate_window(handle, &plan, window, out)?;
    }
    Ok(output)
}

fn slice_columns(columns: &[ArrayRef], window: RowWindow) -> Vec<ArrayRef> {
    columns
        .iter()
        .map(|column| column.slice(window.offset, window.len))
        .collect()
}

/// Builds one window's buffers and makes its native call.
fn evaluate_window(
    handle: &ModelHandle,
    plan: &EvaluationPlan<'_>,
    window: RowWindow,
    out: &mut [f64],
) -> Result<()> {
    let api = handle.api();
    let float_window = slice_columns(plan.float_columns, window);
    let cat_window = slice_columns(plan.cat_columns, window);
    let first_cat_column = plan.schema.float_features;

    let floats = place_numeric_columns::<f32>(&float_window, 0, window.len)?;
    let float_rows = floats.row_pointers();

    // SAFETY (all arms): `handle.raw()` is live for the borrow of `handle`, and
    // every row-pointer vector outlives the call that reads it, with `window.len`
    // rows of exactly the stated feature count each.
    let succeeded = match plan.strategy {
        PredictionStrategy::Flat => unsafe {
            api.calc_prediction_flat(
                handle.raw(),
                window.len,
                row_array_ptr(&float_rows),
                floats.features(),
                out,
            )
        },
        PredictionStrategy::RawStrings => {
            let strings = TerminatedStrings::build(&cat_window, first_cat_column, window.len)?;
            let cat_rows = strings.row_pointers();
            unsafe {
                api.calc_prediction(
                    handle.raw(),
                    window.len,
                    row_array_ptr(&float_rows),
                    floats.features(),
                    row_array_ptr(&cat_rows),
                    strings.features(),
                    out,
                )
            }
        }
        PredictionStrategy::Hashed | PredictionStrategy::PreHashed => {
            let hashes = if plan.strategy.uses_hash_pipeline() {
                hash_categorical_columns(api, &cat_window, first_cat_column, window.len)?
            } else {
                copy_prehashed_columns(&cat_window, first_cat_column, window.len)?
            };
            let cat_rows = hashes.row_pointers();
            unsafe {
                api.calc_prediction_hashed(
                    handle.raw(),
                    window.len,
                    row_array_ptr(&float_rows),
                    floats.features(),
                    row_array_ptr(&cat_rows),
                    hashes.features(),
                    out,
                )
            }
        }
    };

    if !succeeded {
        let message = api.error_string();
        log::warn!(
            "CatBoost prediction failed for rows [{}, {}): {}",
            window.offset,
            window.end(),
            message
        );
        return Err(BridgeError::NativeCompute {
            offset: window.offset,
            rows: window.len,
            message,
        });
    }

    log_metric!(
        "event" = "window",
        "offset" = window.offset,
        "rows" = window.len,
        "strategy" = format!("{:?}", plan.strategy)
    );
    Ok(())
}
