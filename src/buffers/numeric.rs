// In: src/buffers/numeric.rs

//! Numeric placement: copies primitive column values into a [`FeatureMatrix`],
//! converting to the width the native call expects.

use std::fmt::Display;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    Date32Type, Date64Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
    UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use num_traits::{NumCast, ToPrimitive};

use super::FeatureMatrix;
use crate::error::{BridgeError, Result};
use crate::types::ColumnKind;

/// Rejects columns with nulls; the native library only takes dense values.
pub(crate) fn ensure_dense(column: &dyn Array, column_idx: usize) -> Result<()> {
    if column.null_count() > 0 {
        return Err(BridgeError::type_mismatch(
            column_idx,
            format!("{} null values in a feature column", column.null_count()),
        ));
    }
    Ok(())
}

fn place_values<N, T>(
    values: impl Iterator<Item = N>,
    column_idx: usize,
    feature: usize,
    matrix: &mut FeatureMatrix<T>,
) -> Result<()>
where
    N: ToPrimitive + Copy + Display,
    T: NumCast + Copy,
{
    for (row, value) in values.enumerate() {
        let converted = T::from(value).ok_or_else(|| {
            BridgeError::type_mismatch(
                column_idx,
                format!("value {} at row {} does not fit the feature type", value, row),
            )
        })?;
        matrix.set(row, feature, converted);
    }
    Ok(())
}

/// Writes every value of `column` into `feature` of `matrix`.
///
/// `column_idx` is the column's position in the caller's input and only
/// appears in errors. Fails with [`BridgeError::TypeMismatch`] for non-numeric
/// columns, columns with nulls, and values that do not fit `T`.
pub fn place_numeric_column<T>(
    column: &dyn Array,
    column_idx: usize,
    feature: usize,
    matrix: &mut FeatureMatrix<T>,
) -> Result<()>
where
    T: NumCast + Copy,
{
    ensure_dense(column, column_idx)?;
    debug_assert_eq!(column.len(), matrix.rows());

    macro_rules! place_primitive {
        ($arrow_ty:ty) => {
            place_values(
                column.as_primitive::<$arrow_ty>().values().iter().copied(),
                column_idx,
                feature,
                matrix,
            )
        };
    }

    use ColumnKind::*;
    match ColumnKind::from_arrow_type(column_idx, column.data_type())? {
        Int8 => place_primitive!(Int8Type),
        Int16 => place_primitive!(Int16Type),
        Int32 => place_primitive!(Int32Type),
        Int64 => place_primitive!(Int64Type),
        UInt8 => place_primitive!(UInt8Type),
        UInt16 => place_primitive!(UInt16Type),
        UInt32 => place_primitive!(UInt32Type),
        UInt64 => place_primitive!(UInt64Type),
        Float32 => place_primitive!(Float32Type),
        Float64 => place_primitive!(Float64Type),
        Date32 => place_primitive!(Date32Type),
        Date64 => place_primitive!(Date64Type),
        Boolean => place_values(
            column.as_boolean().values().iter().map(|b| b as u8),
            column_idx,
            feature,
            matrix,
        ),
        kind => Err(BridgeError::type_mismatch(
            column_idx,
            format!("column of type {} should be numeric to make float feature", kind),
        )),
    }
}

/// Builds a matrix with one feature per column. Column `i` is reported as
/// `first_column_idx + i` in errors.
pub fn place_numeric_columns<T>(
    columns: &[ArrayRef],
    first_column_idx: usize,
    rows: usize,
) -> Result<FeatureMatrix<T>>
where
    T: NumCast + Copy + Default,
{
    let mut matrix = FeatureMatrix::new(rows, columns.len());
    for (feature, column) in columns.iter().enumerate() {
        place_numeric_column(column.as_ref(), first_column_idx + feature, feature, &mut matrix)?;
    }
    Ok(matrix)
}

/// Calls `f(row, value)` for every value of an integer-typed column, widened
/// to `i64`. `UInt64` values above `i64::MAX` wrap, as they do in C.
pub fn for_each_integer(
    column: &dyn Array,
    column_idx: usize,
    mut f: impl FnMut(usize, i64),
) -> Result<()> {
    ensure_dense(column, column_idx)?;

    macro_rules! visit_primitive {
        ($arrow_ty:ty) => {
            for (row, value) in column.as_primitive::<$arrow_ty>().values().iter().enumerate() {
                f(row, *value as i64);
            }
        };
    }

    use ColumnKind::*;
    match ColumnKind::from_arrow_type(column_idx, column.data_type())? {
        Int8 => visit_primitive!(Int8Type),
        Int16 => visit_primitive!(Int16Type),
        Int32 => visit_primitive!(Int32Type),
        Int64 => visit_primitive!(Int64Type),
        UInt8 => visit_primitive!(UInt8Type),
        UInt16 => visit_primitive!(UInt16Type),
        UInt32 => visit_primitive!(UInt32Type),
        UInt64 => visit_primitive!(UInt64Type),
        Date32 => visit_primitive!(Date32Type),
        Date64 => visit_primitive!(Date64Type),
        kind => {
            return Err(BridgeError::type_mismatch(
                column_idx,
                format!("column of type {} is not integer-typed", kind),
            ))
        }
    }
    Ok(())
}
