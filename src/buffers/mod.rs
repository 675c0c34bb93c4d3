// In: src/buffers/mod.rs

//! Window-scoped feature buffers in the layout the native library reads.
//!
//! A [`FeatureMatrix`] stores one window's worth of values for one feature
//! family. Cell `(row, feature)` lives at `values[row * features + feature]`,
//! and [`FeatureMatrix::row_pointers`] yields the per-row pointer array the
//! native call takes. Builders fill it one feature (column) at a time.

pub mod numeric;
pub mod strings;

pub use numeric::{for_each_integer, place_numeric_column, place_numeric_columns};
pub use strings::{BorrowedSpans, TerminatedStrings};

//==================================================================================
// 1. Row Windows
//==================================================================================

/// The half-open row range `[offset, offset + len)` marshaled by one native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowWindow {
    pub offset: usize,
    pub len: usize,
}

impl RowWindow {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Tiles `[0, total_rows)` with ascending, non-empty windows of at most
/// `max_batch_size` rows.
#[derive(Debug, Clone)]
pub struct RowWindows {
    total_rows: usize,
    max_batch_size: usize,
    next_offset: usize,
}

impl RowWindows {
    pub fn new(total_rows: usize, max_batch_size: usize) -> Self {
        Self {
            total_rows,
            max_batch_size: max_batch_size.max(1),
            next_offset: 0,
        }
    }
}

impl Iterator for RowWindows {
    type Item = RowWindow;

    fn next(&mut self) -> Option<RowWindow> {
        if self.next_offset >= self.total_rows {
            return None;
        }
        let len = std::cmp::min(self.max_batch_size, self.total_rows - self.next_offset);
        let window = RowWindow {
            offset: self.next_offset,
            len,
        };
        self.next_offset += len;
        Some(window)
    }
}

//==================================================================================
// 2. Feature Matrix
//==================================================================================

#[derive(Debug, Clone)]
pub struct FeatureMatrix<T> {
    values: Vec<T>,
    rows: usize,
    features: usize,
}

impl<T: Copy + Default> FeatureMatrix<T> {
    pub fn new(rows: usize, features: usize) -> Self {
        Self::filled(rows, features, T::default())
    }
}

impl<T: Copy> FeatureMatrix<T> {
    pub fn filled(rows: usize, features: usize, fill: T) -> Self {
        Self {
            values: vec![fill; rows * features],
            rows,
            features,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn features(&self) -> usize {
        self.features
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn get(&self, row: usize, feature: usize) -> T {
        self.values[row * self.features + feature]
    }

    pub fn set(&mut self, row: usize, feature: usize, value: T) {
        debug_assert!(feature < self.features && row < self.rows);
        self.values[row * self.features + feature] = value;
    }

    /// The `features` cells of one row.
    pub fn row(&self, row: usize) -> &[T] {
        let start = row * self.features;
        &self.values[start..start + self.features]
    }

    /// All values of one feature, in row order.
    pub fn feature_values(&self, feature: usize) -> Vec<T> {
        (0..self.rows).map(|row| self.get(row, feature)).collect()
    }

    /// One pointer per row to that row's first cell.
    ///
    /// Empty when the matrix has no features; the caller passes a null array
    /// instead. The pointers borrow `self` and must not outlive it.
    pub fn row_pointers(&self) -> Vec<*const T> {
        if self.features == 0 {
            return Vec::new();
        }
        self.values
            .chunks_exact(self.features)
            .map(<[T]>::as_ptr)
            .collect()
    }
}

/// The pointer to pass for a row array: null when the family has no features.
pub fn row_array_ptr<T>(row_pointers: &[*const T]) -> *const *const T {
    if row_pointers.is_empty() {
        std::ptr::null()
    } else {
        row_pointers.as_ptr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_tile_rows_in_order() {
        let windows: Vec<RowWindow> = RowWindows::new(7, 3).collect();
        assert_eq!(
            windows,
            vec![
                RowWindow { offset: 0, len: 3 },
                RowWindow { offset: 3, len: 3 },
                RowWindow { offset: 6, len: 1 },
            ]
        );
    }

    #[test]
    fn test_windows_clip_to_input() {
        let windows: Vec<RowWindow> = RowWindows::new(5, 1000).collect();
        assert_eq!(windows, vec![RowWindow { offset: 0, len: 5 }]);
    }

    #[test]
    fn test_no_windows_for_empty_input() {
        assert_eq!(RowWindows::new(0, 10).count(), 0);
    }

    #[test]
    fn test_zero_batch_size_still_progresses() {
        assert_eq!(RowWindows::new(3, 0).count(), 3);
    }

    #[test]
    fn test_matrix_layout_is_row_major() {
        let mut matrix = FeatureMatrix::<f32>::new(2, 3);
        matrix.set(0, 0, 1.0);
        matrix.set(0, 2, 3.0);
        matrix.set(1, 1, 5.0);

        assert_eq!(matrix.values(), &[1.0, 0.0, 3.0, 0.0, 5.0, 0.0]);
        assert_eq!(matrix.row(1), &[0.0, 5.0, 0.0]);
        assert_eq!(matrix.feature_values(2), vec![3.0, 0.0]);
    }

    #[test]
    fn test_row_pointers_address_each_row() {
        let mut matrix = FeatureMatrix::<u32>::new(3, 2);
        for row in 0..3 {
            matrix.set(row, 0, row as u32);
            matrix.set(row, 1, 10 + row as u32);
        }
        let pointers = matrix.row_pointers();
        assert_eq!(pointers.len(), 3);
        for (row, ptr) in pointers.iter().enumerate() {
            let cells = unsafe { std::slice::from_raw_parts(*ptr, 2) };
            assert_eq!(cells, &[row as u32, 10 + row as u32]);
        }
    }

    #[test]
    fn test_featureless_matrix_passes_null() {
        let matrix = FeatureMatrix::<f32>::new(4, 0);
        let pointers = matrix.row_pointers();
        assert!(pointers.is_empty());
        assert!(row_array_ptr(&pointers).is_null());
    }
}
