// In: src/evaluator/output.rs

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StructArray};
use arrow::datatypes::{DataType, Field, Fields};

use crate::error::{BridgeError, Result};

/// Turns the native row-major output into the result column.
///
/// One dimension gives a `Float64Array`. More give a `StructArray` with one
/// non-null `Float64` child `dim_<d>` per dimension, where row `r` of child `d`
/// is `values[r * dimensions + d]`.
pub fn assemble_output(values: Vec<f64>, dimensions: usize) -> Result<ArrayRef> {
    if dimensions <= 1 {
        return Ok(Arc::new(Float64Array::from(values)));
    }
    if values.len() % dimensions != 0 {
        return Err(BridgeError::SchemaMismatch(format!(
            "{} output values do not divide into {} dimensions",
            values.len(),
            dimensions
        )));
    }

    let mut fields = Vec::with_capacity(dimensions);
    let mut children: Vec<ArrayRef> = Vec::with_capacity(dimensions);
    for dim in 0..dimensions {
        let child: Vec<f64> = values.iter().skip(dim).step_by(dimensions).copied().collect();
        fields.push(Field::new(format!("dim_{}", dim), DataType::Float64, false));
        children.push(Arc::new(Float64Array::from(child)));
    }

    let output = StructArray::try_new(Fields::from(fields), children, None)?;
    Ok(Arc::new(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::Float64Type;

    #[test]
    fn test_single_dimension_is_plain_column() {
        let output = assemble_output(vec![0.5, 1.5], 1).unwrap();
        assert_eq!(output.data_type(), &DataType::Float64);
        assert_eq!(output.as_primitive::<Float64Type>().values().to_vec(), vec![0.5, 1.5]);
    }

    #[test]
    fn test_multiple_dimensions_are_deinterleaved() {
        // Two rows, three dimensions, row-major.
        let output = assemble_output(vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0], 3).unwrap();
        let output = output.as_struct();

        assert_eq!(output.len(), 2);
        assert_eq!(output.num_columns(), 3);
        assert_eq!(output.column_names(), vec!["dim_0", "dim_1", "dim_2"]);
        assert_eq!(output.column(1).as_primitive::<Float64Type>().values().to_vec(), vec![1.0, 11.0]);
        assert_eq!(output.column(2).null_count(), 0);
    }

    #[test]
    fn test_empty_multi_dimensional_output() {
        let output = assemble_output(Vec::new(), 4).unwrap();
        assert_eq!(output.len(), 0);
        assert_eq!(output.as_struct().num_columns(), 4);
    }

    #[test]
    fn test_ragged_values_are_rejected() {
        assert!(matches!(
            assemble_output(vec![1.0, 2.0, 3.0], 2),
            Err(BridgeError::SchemaMismatch(_))
        ));
    }
}
