// In: src/hashing.rs

//! The categorical hash pipeline.
//!
//! The hashed prediction entry point expects every categorical value replaced
//! by the 32-bit code the library's own hash function assigns to it, because
//! the model was trained against exactly that hash space. This module produces
//! those codes, one per `(row, categorical feature)` cell, in the same layout
//! as the numeric buffers.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{Int32Type, UInt32Type};

use crate::buffers::numeric::ensure_dense;
use crate::buffers::{for_each_integer, BorrowedSpans, FeatureMatrix};
use crate::error::{BridgeError, Result};
use crate::ffi::CatBoostApi;
use crate::types::ColumnKind;

/// Hashes one categorical column into `feature` of `matrix`.
///
/// String-like columns go through the native string hash over borrowed spans;
/// integer columns through the native integer hash. Anything else is a
/// [`BridgeError::TypeMismatch`].
pub fn hash_column(
    api: &dyn CatBoostApi,
    column: &dyn Array,
    column_idx: usize,
    feature: usize,
    matrix: &mut FeatureMatrix<u32>,
) -> Result<()> {
    let kind = ColumnKind::from_arrow_type(column_idx, column.data_type())?;
    if kind.is_string_like() {
        let spans = BorrowedSpans::from_column(column, column_idx)?;
        for (row, span) in spans.iter().enumerate() {
            matrix.set(row, feature, api.string_cat_feature_hash(span));
        }
        Ok(())
    } else if kind.is_integer() {
        for_each_integer(column, column_idx, |row, value| {
            matrix.set(row, feature, api.integer_cat_feature_hash(value));
        })
    } else {
        Err(BridgeError::type_mismatch(
            column_idx,
            format!("column of type {} should be integer or string to make cat feature", kind),
        ))
    }
}

/// Runs the hash pipeline over a window of categorical columns. Column `i` is
/// reported as `first_column_idx + i` in errors.
pub fn hash_categorical_columns(
    api: &dyn CatBoostApi,
    columns: &[ArrayRef],
    first_column_idx: usize,
    rows: usize,
) -> Result<FeatureMatrix<u32>> {
    let mut matrix = FeatureMatrix::new(rows, columns.len());
    for (feature, column) in columns.iter().enumerate() {
        hash_column(api, column.as_ref(), first_column_idx + feature, feature, &mut matrix)?;
    }
    log_metric!("event" = "hash_window", "rows" = rows, "features" = columns.len());
    Ok(matrix)
}

/// Copies columns that already hold library hash codes. `Int32` codes are
/// reinterpreted bit for bit, the way the library's C `int` carries them.
pub fn copy_prehashed_columns(
    columns: &[ArrayRef],
    first_column_idx: usize,
    rows: usize,
) -> Result<FeatureMatrix<u32>> {
    let mut matrix = FeatureMatrix::new(rows, columns.len());
    for (feature, column) in columns.iter().enumerate() {
        let column_idx = first_column_idx + feature;
        ensure_dense(column.as_ref(), column_idx)?;
        match ColumnKind::from_arrow_type(column_idx, column.data_type())? {
            ColumnKind::Int32 => {
                let codes: &[u32] =
                    bytemuck::cast_slice(&column.as_primitive::<Int32Type>().values()[..]);
                for (row, code) in codes.iter().enumerate() {
                    matrix.set(row, feature, *code);
                }
            }
            ColumnKind::UInt32 => {
                for (row, code) in column.as_primitive::<UInt32Type>().values().iter().enumerate() {
                    matrix.set(row, feature, *code);
                }
            }
            kind => {
                return Err(BridgeError::type_mismatch(
                    column_idx,
                    format!("pre-hashed cat feature must be Int32 or UInt32, got {}", kind),
                ))
            }
        }
    }
    Ok(matrix)
}
