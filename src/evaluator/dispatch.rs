// In: src/evaluator/dispatch.rs

//! Validation of an evaluation call and the choice of native entry point.
//!
//! Both happen exactly once per call, before any window is marshaled. The
//! resulting [`EvaluationPlan`] is what the window loop executes; nothing in
//! the loop re-inspects column types.

use arrow::array::{Array, ArrayRef};

use crate::buffers::numeric::ensure_dense;
use crate::config::CategoricalEncoding;
use crate::error::{BridgeError, Result};
use crate::model::FeatureSchema;
use crate::types::ColumnKind;

/// The closed set of ways a window can be handed to the native library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionStrategy {
    /// No categorical features: `CalcModelPredictionFlat` with float rows only.
    Flat,
    /// All categorical columns are strings, passed as NUL-terminated C strings to
    /// `CalcModelPrediction`.
    RawStrings,
    /// Categorical values run through the hash pipeline, then
    /// `CalcModelPredictionWithHashedCatFeatures`.
    Hashed,
    /// Categorical columns already hold hash codes; same entry point as `Hashed`
    /// without the hash pipeline.
    PreHashed,
}

impl PredictionStrategy {
    /// Chooses the strategy from the schema, the declared encoding and the
    /// classified categorical columns.
    pub fn select(
        schema: &FeatureSchema,
        cat_kinds: &[ColumnKind],
        encoding: CategoricalEncoding,
    ) -> Self {
        if schema.cat_features == 0 {
            return Self::Flat;
        }
        match encoding {
            CategoricalEncoding::PreHashed => Self::PreHashed,
            CategoricalEncoding::HashStrings => Self::Hashed,
            CategoricalEncoding::Auto => {
                if cat_kinds.iter().all(ColumnKind::is_string_like) {
                    Self::RawStrings
                } else {
                    Self::Hashed
                }
            }
        }
    }

    pub fn uses_hash_pipeline(&self) -> bool {
        matches!(self, Self::Hashed)
    }
}

/// A validated evaluation call: the columns split by feature family, their
/// common row count, and the strategy every window will use.
#[derive(Debug)]
pub struct EvaluationPlan<'a> {
    pub schema: FeatureSchema,
    pub float_columns: &'a [ArrayRef],
    pub cat_columns: &'a [ArrayRef],
    pub rows: usize,
    pub strategy: PredictionStrategy,
}

impl<'a> EvaluationPlan<'a> {
    /// Checks `columns` against `schema` and picks the strategy.
    ///
    /// Fails with [`BridgeError::SchemaMismatch`] for a wrong column count or
    /// unequal row counts, and with [`BridgeError::TypeMismatch`] for a column
    /// that cannot fill its slot. No native call is made.
    pub fn new(
        schema: &FeatureSchema,
        columns: &'a [ArrayRef],
        encoding: CategoricalEncoding,
    ) -> Result<Self> {
        schema.check_column_count(columns.len())?;

        let rows = columns[0].len();
        if let Some((idx, column)) = columns.iter().enumerate().find(|(_, c)| c.len() != rows) {
            return Err(BridgeError::SchemaMismatch(format!(
                "column {} has {} rows, expected {}",
                idx,
                column.len(),
                rows
            )));
        }

        let (float_columns, cat_columns) = columns.split_at(schema.float_features);

        for (idx, column) in float_columns.iter().enumerate() {
            let kind = classify(column.as_ref(), idx)?;
            if !kind.is_numeric() {
                return Err(BridgeError::type_mismatch(
                    idx,
                    format!("column of type {} should be numeric to make float feature", kind),
                ));
            }
        }

        let mut cat_kinds = Vec::with_capacity(cat_columns.len());
        for (i, column) in cat_columns.iter().enumerate() {
            let idx = schema.float_features + i;
            let kind = classify(column.as_ref(), idx)?;
            check_cat_kind(kind, idx, encoding)?;
            cat_kinds.push(kind);
        }

        let strategy = PredictionStrategy::select(schema, &cat_kinds, encoding);
        log::debug!(
            "Evaluating {} rows with {} float and {} cat columns using {:?}",
            rows,
            float_columns.len(),
            cat_columns.len(),
            strategy
        );

        Ok(Self {
            schema: *schema,
            float_columns,
            cat_columns,
            rows,
            strategy,
        })
    }
}

fn classify(column: &dyn Array, idx: usize) -> Result<ColumnKind> {
    let kind = ColumnKind::from_arrow_type(idx, column.data_type())?;
    ensure_dense(column, idx)?;
    Ok(kind)
}

fn check_cat_kind(kind: ColumnKind, idx: usize, encoding: CategoricalEncoding) -> Result<()> {
    match encoding {
        CategoricalEncoding::PreHashed if !kind.is_hash_code() => Err(BridgeError::type_mismatch(
            idx,
            format!("pre-hashed cat feature must be Int32 or UInt32, got {}", kind),
        )),
        _ if !(kind.is_string_like() || kind.is_integer()) => Err(BridgeError::type_mismatch(
            idx,
            format!("column of type {} should be integer or string to make cat feature", kind),
        )),
        _ => Ok(()),
    }
}
