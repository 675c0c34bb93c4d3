//! This module defines the canonical classification of input column types.

use arrow::datatypes::DataType as ArrowDataType;
use std::fmt;

use crate::error::{BridgeError, Result};

/// How the bytes of a string-like column are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringWidth {
    /// Offsets-addressed values of arbitrary length.
    Variable,
    /// Every value occupies exactly this many bytes, with no terminator.
    Fixed(usize),
}

/// The bridge's internal view of a column's physical type.
///
/// Only the types listed here can be bound to a feature slot; every other Arrow
/// type is rejected with [`BridgeError::TypeMismatch`] when the column is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Boolean,
    /// Days since epoch, stored as `i32`.
    Date32,
    /// Milliseconds since epoch, stored as `i64`.
    Date64,
    Utf8,
    LargeUtf8,
    Binary,
    LargeBinary,
    FixedSizeBinary(usize),
}

impl ColumnKind {
    /// Classifies the Arrow type of the column at position `column`.
    pub fn from_arrow_type(column: usize, arrow_type: &ArrowDataType) -> Result<Self> {
        match arrow_type {
            ArrowDataType::Int8 => Ok(Self::Int8),
            ArrowDataType::Int16 => Ok(Self::Int16),
            ArrowDataType::Int32 => Ok(Self::Int32),
            ArrowDataType::Int64 => Ok(Self::Int64),
            ArrowDataType::UInt8 => Ok(Self::UInt8),
            ArrowDataType::UInt16 => Ok(Self::UInt16),
            ArrowDataType::UInt32 => Ok(Self::UInt32),
            ArrowDataType::UInt64 => Ok(Self::UInt64),
            ArrowDataType::Float32 => Ok(Self::Float32),
            ArrowDataType::Float64 => Ok(Self::Float64),
            ArrowDataType::Boolean => Ok(Self::Boolean),
            ArrowDataType::Date32 => Ok(Self::Date32),
            ArrowDataType::Date64 => Ok(Self::Date64),
            ArrowDataType::Utf8 => Ok(Self::Utf8),
            ArrowDataType::LargeUtf8 => Ok(Self::LargeUtf8),
            ArrowDataType::Binary => Ok(Self::Binary),
            ArrowDataType::LargeBinary => Ok(Self::LargeBinary),
            ArrowDataType::FixedSizeBinary(width) => {
                let width = usize::try_from(*width).map_err(|_| {
                    BridgeError::type_mismatch(column, format!("negative fixed width {}", width))
                })?;
                Ok(Self::FixedSizeBinary(width))
            }
            dt => Err(BridgeError::type_mismatch(
                column,
                format!("unsupported column type {:?}", dt),
            )),
        }
    }

    /// Returns `true` if the column can fill a float feature slot.
    pub fn is_numeric(&self) -> bool {
        !self.is_string_like()
    }

    /// Returns `true` if the column holds integer values suitable for the
    /// native integer hash.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
                | Self::Date32
                | Self::Date64
        )
    }

    /// Returns `true` if the column can hold already-hashed 32-bit codes.
    pub fn is_hash_code(&self) -> bool {
        matches!(self, Self::Int32 | Self::UInt32)
    }

    /// Returns `true` if the column holds byte strings.
    pub fn is_string_like(&self) -> bool {
        self.string_width().is_some()
    }

    pub fn string_width(&self) -> Option<StringWidth> {
        match self {
            Self::Utf8 | Self::LargeUtf8 | Self::Binary | Self::LargeBinary => {
                Some(StringWidth::Variable)
            }
            Self::FixedSizeBinary(width) => Some(StringWidth::Fixed(*width)),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_families() {
        let kind = ColumnKind::from_arrow_type(0, &ArrowDataType::Float32).unwrap();
        assert!(kind.is_numeric());
        assert!(!kind.is_integer());

        let kind = ColumnKind::from_arrow_type(0, &ArrowDataType::Date32).unwrap();
        assert!(kind.is_numeric());
        assert!(kind.is_integer());
        assert!(!kind.is_hash_code());

        assert!(ColumnKind::UInt32.is_hash_code());
    }

    #[test]
    fn test_string_families() {
        let kind = ColumnKind::from_arrow_type(1, &ArrowDataType::LargeUtf8).unwrap();
        assert_eq!(kind.string_width(), Some(StringWidth::Variable));
        assert!(!kind.is_numeric());

        let kind = ColumnKind::from_arrow_type(1, &ArrowDataType::FixedSizeBinary(6)).unwrap();
        assert_eq!(kind.string_width(), Some(StringWidth::Fixed(6)));
        assert!(!kind.is_integer());
    }

    #[test]
    fn test_unsupported_type_names_the_column() {
        let result = ColumnKind::from_arrow_type(4, &ArrowDataType::Float16);
        match result {
            Err(BridgeError::TypeMismatch { column, reason }) => {
                assert_eq!(column, 4);
                assert!(reason.contains("Float16"));
            }
            other => panic!("Expected TypeMismatch, got {:?}", other),
        }
    }
}
