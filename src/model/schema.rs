// In: src/model/schema.rs

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::ffi::{CatBoostApi, ModelCalcerHandle};

/// The feature layout a loaded model expects, queried once at load time.
///
/// Input columns bind to features positionally: the first `float_features`
/// columns are float features, the next `cat_features` are categorical.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    pub float_features: usize,
    pub cat_features: usize,
    /// `1` when the library does not report a tree count.
    pub tree_count: usize,
    /// Number of output values per row; `1` when the library does not report it.
    pub dimensions: usize,
}

impl FeatureSchema {
    /// Queries the counts from a loaded calcer.
    ///
    /// # Safety
    /// `handle` must be a live calcer of `api` with a model loaded into it.
    pub(crate) unsafe fn query(api: &dyn CatBoostApi, handle: *mut ModelCalcerHandle) -> Self {
        Self {
            float_features: api.float_features_count(handle),
            cat_features: api.cat_features_count(handle),
            tree_count: api.tree_count(handle).unwrap_or(1),
            dimensions: api.dimensions_count(handle).unwrap_or(1).max(1),
        }
    }

    pub fn feature_count(&self) -> usize {
        self.float_features + self.cat_features
    }

    /// Fails with [`BridgeError::SchemaMismatch`] unless exactly one column per
    /// feature was supplied.
    pub fn check_column_count(&self, columns: usize) -> Result<()> {
        if columns == 0 {
            return Err(BridgeError::SchemaMismatch(
                "got empty columns list for CatBoost model".to_string(),
            ));
        }
        if columns != self.feature_count() {
            return Err(BridgeError::SchemaMismatch(format!(
                "number of columns is different with number of features: columns size {} \
                 float features size {} + cat features size {}",
                columns, self.float_features, self.cat_features
            )));
        }
        Ok(())
    }
}
