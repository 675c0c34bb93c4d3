// In: src/model/handle.rs

//! The single-owner wrapper around a native model calcer.

use std::ffi::CString;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::error::{BridgeError, Result};
use crate::ffi::{CatBoostApi, ModelCalcerHandle};
use crate::model::schema::FeatureSchema;

/// Owns one native calcer and deletes it exactly once on drop.
///
/// Kept separate from [`ModelHandle`] so that a calcer created during a load
/// that later fails is still released.
struct Calcer {
    api: Arc<dyn CatBoostApi>,
    raw: NonNull<ModelCalcerHandle>,
}

impl Drop for Calcer {
    fn drop(&mut self) {
        // SAFETY: `raw` came from `model_calcer_create` of the same api and is
        // deleted only here.
        unsafe { self.api.model_calcer_delete(self.raw.as_ptr()) }
    }
}

/// Unix paths are raw bytes; only an interior NUL makes them unrepresentable.
#[cfg(unix)]
fn c_path(path: &Path) -> Option<CString> {
    use std::os::unix::ffi::OsStrExt;
    CString::new(path.as_os_str().as_bytes()).ok()
}

#[cfg(not(unix))]
fn c_path(path: &Path) -> Option<CString> {
    path.to_str().and_then(|p| CString::new(p).ok())
}

/// An opaque reference to a loaded CatBoost model.
///
/// The feature schema is read once during [`ModelHandle::load`] and never
/// changes afterwards. The handle exposes no mutating operations.
pub struct ModelHandle {
    calcer: Calcer,
    schema: FeatureSchema,
}

// SAFETY: the handle is never mutated after load. Concurrent prediction calls on
// one calcer rely on the native library being reentrant, which is the
// library's contract; callers that need isolation hold one handle per thread.
unsafe impl Send for ModelHandle {}
unsafe impl Sync for ModelHandle {}

impl ModelHandle {
    /// Creates a calcer, loads `model_path` into it and caches its schema.
    pub fn load(api: Arc<dyn CatBoostApi>, model_path: &Path) -> Result<Self> {
        std::fs::metadata(model_path).map_err(|e| {
            BridgeError::Load(format!(
                "cannot read model file {}: {}",
                model_path.display(),
                e
            ))
        })?;
        let c_path = c_path(model_path).ok_or_else(|| {
            BridgeError::Load(format!(
                "model path {} is not representable as a C string",
                model_path.display()
            ))
        })?;

        let raw = NonNull::new(api.model_calcer_create()).ok_or_else(|| {
            BridgeError::Load(format!("cannot create model calcer: {}", api.error_string()))
        })?;
        let calcer = Calcer { api, raw };

        // SAFETY: `calcer.raw` is live until `calcer` drops.
        let loaded = unsafe {
            calcer
                .api
                .load_full_model_from_file(calcer.raw.as_ptr(), &c_path)
        };
        if !loaded {
            return Err(BridgeError::Load(calcer.api.error_string()));
        }

        // SAFETY: as above, with the model now loaded.
        let schema = unsafe { FeatureSchema::query(calcer.api.as_ref(), calcer.raw.as_ptr()) };
        log::info!(
            "Loaded CatBoost model {}: {} float features, {} cat features, {} trees, {} dimensions",
            model_path.display(),
            schema.float_features,
            schema.cat_features,
            schema.tree_count,
            schema.dimensions
        );

        Ok(Self { calcer, schema })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn api(&self) -> &dyn CatBoostApi {
        self.calcer.api.as_ref()
    }

    pub(crate) fn raw(&self) -> *mut ModelCalcerHandle {
        self.calcer.raw.as_ptr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockCatBoostApi;

    #[test]
    fn test_load_caches_schema() {
        let mock = Arc::new(MockCatBoostApi::new(2, 1).with_dimensions(3).with_tree_count(40));
        let model_file = mock.model_file();

        let handle = ModelHandle::load(mock.clone(), model_file.path()).unwrap();
        assert_eq!(
            *handle.schema(),
            FeatureSchema {
                float_features: 2,
                cat_features: 1,
                tree_count: 40,
                dimensions: 3,
            }
        );
    }

    #[test]
    fn test_missing_optional_counts_default_to_one() {
        let mock = Arc::new(MockCatBoostApi::new(1, 0).without_optional_counts());
        let model_file = mock.model_file();

        let handle = ModelHandle::load(mock.clone(), model_file.path()).unwrap();
        assert_eq!(handle.schema().tree_count, 1);
        assert_eq!(handle.schema().dimensions, 1);
    }

    #[test]
    fn test_drop_deletes_exactly_once() {
        let mock = Arc::new(MockCatBoostApi::new(1, 0));
        let model_file = mock.model_file();

        let handle = ModelHandle::load(mock.clone(), model_file.path()).unwrap();
        assert_eq!(mock.live_calcers(), 1);
        drop(handle);
        assert_eq!(mock.created(), 1);
        assert_eq!(mock.deleted(), 1);
        assert_eq!(mock.live_calcers(), 0);
    }

    #[test]
    fn test_failed_load_releases_calcer() {
        let mock = Arc::new(MockCatBoostApi::new(1, 0).failing_load("malformed model"));
        let model_file = mock.model_file();

        let result = ModelHandle::load(mock.clone(), model_file.path());
        match result {
            Err(BridgeError::Load(msg)) => assert_eq!(msg, "malformed model"),
            Err(other) => panic!("Expected Load error, got {:?}", other),
            Ok(_) => panic!("Expected Load error, got a handle"),
        }
        assert_eq!(mock.created(), 1);
        assert_eq!(mock.deleted(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_model_path_loads() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mock = Arc::new(MockCatBoostApi::new(1, 0));
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join(OsStr::from_bytes(b"model_\xff.cbm"));
        std::fs::copy(mock.model_file().path(), &model_path).unwrap();

        let handle = ModelHandle::load(mock.clone(), &model_path).unwrap();
        assert_eq!(handle.schema().float_features, 1);
        assert_eq!(c_path(&model_path).unwrap().as_bytes(), model_path.as_os_str().as_bytes());
    }

    #[test]
    fn test_unreadable_model_file_is_load_error() {
        let mock = Arc::new(MockCatBoostApi::new(1, 0));
        let result = ModelHandle::load(mock.clone(), Path::new("/no/such/model.cbm"));

        assert!(matches!(result, Err(BridgeError::Load(msg)) if msg.contains("model.cbm")));
        // The file check happens before any native object exists.
        assert_eq!(mock.created(), 0);
    }
}
