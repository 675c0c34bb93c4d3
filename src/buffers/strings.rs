// In: src/buffers/strings.rs

//! String placement, in two ownership modes that are never mixed:
//!
//! - [`BorrowedSpans`]: pointer + length views into the column's own memory.
//!   Zero copy, bound to the column's lifetime. Consumers must not assume a
//!   terminator (the hash pipeline does not need one).
//! - [`TerminatedStrings`]: window-owned, NUL-terminated copies for the native
//!   call that takes C strings. Arrow values carry no terminator, whether they
//!   are offset-addressed or fixed width, so every cell is copied. The copies
//!   live exactly as long as the struct.

use std::marker::PhantomData;
use std::os::raw::c_char;

use arrow::array::{Array, ArrayRef, AsArray};

use super::numeric::ensure_dense;
use super::FeatureMatrix;
use crate::error::{BridgeError, Result};
use crate::types::{ColumnKind, StringWidth};

//==================================================================================
// 1. Borrowed Spans
//==================================================================================

/// One borrowed byte span per row of a string-like column.
#[derive(Debug, Clone)]
pub struct BorrowedSpans<'a> {
    spans: Vec<&'a [u8]>,
    width: StringWidth,
}

impl<'a> BorrowedSpans<'a> {
    /// Fails with [`BridgeError::TypeMismatch`] unless `column` is string-like and dense.
    pub fn from_column(column: &'a dyn Array, column_idx: usize) -> Result<Self> {
        ensure_dense(column, column_idx)?;
        let kind = ColumnKind::from_arrow_type(column_idx, column.data_type())?;
        let width = kind.string_width().ok_or_else(|| {
            BridgeError::type_mismatch(
                column_idx,
                format!("column of type {} is not string-like", kind),
            )
        })?;

        let spans: Vec<&'a [u8]> = match kind {
            ColumnKind::Utf8 => {
                let array = column.as_string::<i32>();
                (0..array.len()).map(|i| array.value(i).as_bytes()).collect()
            }
            ColumnKind::LargeUtf8 => {
                let array = column.as_string::<i64>();
                (0..array.len()).map(|i| array.value(i).as_bytes()).collect()
            }
            ColumnKind::Binary => {
                let array = column.as_binary::<i32>();
                (0..array.len()).map(|i| array.value(i)).collect()
            }
            ColumnKind::LargeBinary => {
                let array = column.as_binary::<i64>();
                (0..array.len()).map(|i| array.value(i)).collect()
            }
            ColumnKind::FixedSizeBinary(_) => {
                let array = column.as_fixed_size_binary();
                (0..array.len()).map(|i| array.value(i)).collect()
            }
            kind => {
                return Err(BridgeError::type_mismatch(
                    column_idx,
                    format!("column of type {} is not string-like", kind),
                ))
            }
        };
        Ok(Self { spans, width })
    }

    pub(crate) fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn width(&self) -> StringWidth {
        self.width
    }

    pub fn get(&self, row: usize) -> &'a [u8] {
        self.spans[row]
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.spans.iter().copied()
    }

    /// Total bytes addressed, excluding any terminators.
    pub fn byte_len(&self) -> usize {
        match self.width {
            StringWidth::Fixed(width) => width * self.spans.len(),
            StringWidth::Variable => self.spans.iter().map(|s| s.len()).sum(),
        }
    }
}

//==================================================================================
// 2. Window-Owned Terminated Strings
//==================================================================================

/// NUL-terminated copies of a window of categorical string columns, with the
/// row-pointer layout `CalcModelPrediction` reads.
///
/// The `'a` lifetime ties the buffer to the window's columns even though the
/// bytes are copied, so a buffer cannot outlive the window it was built for.
pub struct TerminatedStrings<'a> {
    cells: FeatureMatrix<*const c_char>,
    /// `(start, len)` of each cell in its column's storage, terminator included.
    bounds: FeatureMatrix<(usize, usize)>,
    /// One allocation per categorical column; `cells` points into these.
    storage: Vec<Vec<u8>>,
    _window: PhantomData<&'a dyn Array>,
}

impl<'a> TerminatedStrings<'a> {
    /// Copies every value of `columns` into terminated storage. Column `i` is
    /// reported as `first_column_idx + i` in errors.
    pub fn build(columns: &'a [ArrayRef], first_column_idx: usize, rows: usize) -> Result<Self> {
        let mut cells = FeatureMatrix::filled(rows, columns.len(), std::ptr::null());
        let mut bounds = FeatureMatrix::new(rows, columns.len());
        let mut storage = Vec::with_capacity(columns.len());

        for (feature, column) in columns.iter().enumerate() {
            let spans = BorrowedSpans::from_column(column.as_ref(), first_column_idx + feature)?;
            debug_assert_eq!(spans.len(), rows);

            let mut bytes = Vec::with_capacity(spans.byte_len() + spans.len());
            for (row, span) in spans.iter().enumerate() {
                let start = bytes.len();
                // Exactly the declared bytes, never more; the terminator is ours.
                bytes.extend_from_slice(span);
                bytes.push(0);
                bounds.set(row, feature, (start, span.len() + 1));
            }

            // `bytes` is complete, so its heap block no longer moves.
            let base = bytes.as_ptr() as *const c_char;
            for row in 0..rows {
                let (start, _) = bounds.get(row, feature);
                // SAFETY: `start` is an offset inside `bytes`.
                cells.set(row, feature, unsafe { base.add(start) });
            }
            storage.push(bytes);
        }

        Ok(Self {
            cells,
            bounds,
            storage,
            _window: PhantomData,
        })
    }

    pub fn rows(&self) -> usize {
        self.cells.rows()
    }

    pub fn features(&self) -> usize {
        self.cells.features()
    }

    /// The copied bytes of one cell plus its terminator. Interior NULs of
    /// fixed-width values are part of the cell.
    pub fn cell_bytes(&self, row: usize, feature: usize) -> &[u8] {
        let (start, len) = self.bounds.get(row, feature);
        &self.storage[feature][start..start + len]
    }

    /// One pointer per row to its `features` C-string pointers; empty when
    /// there are no categorical features.
    pub fn row_pointers(&self) -> Vec<*const *const c_char> {
        self.cells.row_pointers()
    }
}
