// In: src/bridge/model.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::record_batch::RecordBatch;

use crate::config::{BridgeConfig, CategoricalEncoding};
use crate::error::Result;
use crate::evaluator::{assemble_output, evaluate_columns};
use crate::ffi::{CatBoostApi, SharedLibraryApi};
use crate::model::{FeatureSchema, ModelHandle};

/// A loaded CatBoost model, ready to evaluate Arrow columns.
///
/// Evaluation takes `&self` and holds no lock, so one model can be shared
/// across threads behind an `Arc`.
pub struct CatBoostModel {
    handle: ModelHandle,
    model_path: PathBuf,
    config: Arc<BridgeConfig>,
}

impl CatBoostModel {
    /// Opens the model-calcer library at `library_path` and loads `model_path` with it.
    pub fn load(
        library_path: impl AsRef<Path>,
        model_path: impl AsRef<Path>,
        config: Arc<BridgeConfig>,
    ) -> Result<Self> {
        config.validate()?;
        let api = Arc::new(SharedLibraryApi::open(library_path)?);
        Self::with_api(api, model_path, config)
    }

    /// Loads `model_path` through an already resolved library.
    pub fn with_api(
        api: Arc<dyn CatBoostApi>,
        model_path: impl AsRef<Path>,
        config: Arc<BridgeConfig>,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let handle = ModelHandle::load(api, model_path)?;
        Ok(Self {
            handle,
            model_path: model_path.to_path_buf(),
            config,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.handle.schema()
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Evaluates with the configured categorical encoding.
    pub fn evaluate(&self, columns: &[ArrayRef]) -> Result<ArrayRef> {
        self.evaluate_with(columns, self.config.categorical_encoding)
    }

    /// Evaluates with an explicit categorical encoding.
    ///
    /// Columns bind positionally: float features first, then categorical ones.
    /// Returns one value per row, or a struct of `dimensions` values per row.
    pub fn evaluate_with(
        &self,
        columns: &[ArrayRef],
        encoding: CategoricalEncoding,
    ) -> Result<ArrayRef> {
        let values = self.evaluate_raw(columns, encoding)?;
        assemble_output(values, self.schema().dimensions)
    }

    /// The native row-major output, `rows * dimensions` values.
    pub fn evaluate_raw(
        &self,
        columns: &[ArrayRef],
        encoding: CategoricalEncoding,
    ) -> Result<Vec<f64>> {
        evaluate_columns(&self.handle, columns, encoding, self.config.max_batch_size)
    }

    /// Evaluates every column of `batch`, in schema order.
    pub fn evaluate_batch(&self, batch: &RecordBatch) -> Result<ArrayRef> {
        self.evaluate(batch.columns())
    }
}

impl std::fmt::Debug for CatBoostModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatBoostModel")
            .field("model_path", &self.model_path)
            .field("schema", self.schema())
            .finish()
    }
}
