// In: src/bridge/registry.rs

//! A cache of loaded models keyed by model path.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::Serialize;

use super::model::CatBoostModel;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::ffi::{CatBoostApi, SharedLibraryApi};
use crate::model::FeatureSchema;

/// What the registry knows about one loaded model.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub model_path: PathBuf,
    pub schema: FeatureSchema,
    pub loading_start_time: DateTime<Utc>,
    pub loading_duration: Duration,
}

struct Entry {
    model: Arc<CatBoostModel>,
    info: ModelInfo,
}

/// Loads each model once and hands out shared references to it.
///
/// All models of a registry use the same native library. The lock is held only
/// to look up or swap entries; loading and evaluation happen outside it. A
/// removed model stays usable by whoever still holds its `Arc`, and its native
/// calcer is released when the last one drops.
pub struct ModelRegistry {
    api: Arc<dyn CatBoostApi>,
    config: Arc<BridgeConfig>,
    models: RwLock<HashMap<PathBuf, Entry>>,
}

impl ModelRegistry {
    /// Opens the library named by `config.library_path`.
    pub fn new(config: BridgeConfig) -> Result<Self> {
        let library_path = config.library_path.clone().ok_or_else(|| {
            BridgeError::Config("library_path is required to open the CatBoost library".to_string())
        })?;
        config.validate()?;
        let api = Arc::new(SharedLibraryApi::open(library_path)?);
        Self::with_api(api, config)
    }

    pub fn with_api(api: Arc<dyn CatBoostApi>, config: BridgeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            api,
            config: Arc::new(config),
            models: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns the cached model for `model_path`, loading it on first use.
    pub fn get_or_load(&self, model_path: impl AsRef<Path>) -> Result<Arc<CatBoostModel>> {
        let model_path = model_path.as_ref();
        if let Some(entry) = self.read().get(model_path) {
            return Ok(Arc::clone(&entry.model));
        }

        let loaded = self.load_entry(model_path)?;
        let mut models = self.write();
        // Another thread may have loaded the same path meanwhile; keep the first.
        let entry = models
            .entry(model_path.to_path_buf())
            .or_insert(loaded);
        Ok(Arc::clone(&entry.model))
    }

    /// Loads `model_path` again and replaces the cached entry.
    pub fn reload(&self, model_path: impl AsRef<Path>) -> Result<Arc<CatBoostModel>> {
        let model_path = model_path.as_ref();
        let loaded = self.load_entry(model_path)?;
        let model = Arc::clone(&loaded.model);
        self.write().insert(model_path.to_path_buf(), loaded);
        log::info!("Reloaded CatBoost model {}", model_path.display());
        Ok(model)
    }

    /// Drops the cache entry for `model_path`. Returns whether there was one.
    pub fn remove(&self, model_path: impl AsRef<Path>) -> bool {
        let model_path = model_path.as_ref();
        let removed = self.write().remove(model_path).is_some();
        if removed {
            log::info!("Unloaded CatBoost model {}", model_path.display());
        }
        removed
    }

    pub fn clear(&self) {
        let mut models = self.write();
        log::info!("Unloading {} CatBoost models", models.len());
        models.clear();
    }

    /// One entry per cached model, ordered by path.
    pub fn infos(&self) -> Vec<ModelInfo> {
        let mut infos: Vec<ModelInfo> = self.read().values().map(|e| e.info.clone()).collect();
        infos.sort_by(|a, b| a.model_path.cmp(&b.model_path));
        infos
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn load_entry(&self, model_path: &Path) -> Result<Entry> {
        let loading_start_time = Utc::now();
        let started = Instant::now();
        let model = CatBoostModel::with_api(
            Arc::clone(&self.api),
            model_path,
            Arc::clone(&self.config),
        )?;
        let info = ModelInfo {
            model_path: model_path.to_path_buf(),
            schema: *model.schema(),
            loading_start_time,
            loading_duration: started.elapsed(),
        };
        log_metric!(
            "event" = "model_load",
            "path" = model_path.display(),
            "duration_us" = info.loading_duration.as_micros()
        );
        Ok(Entry {
            model: Arc::new(model),
            info,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, Entry>> {
        self.models.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, Entry>> {
        self.models.write().unwrap_or_else(PoisonError::into_inner)
    }
}
