// In: src/ffi/library.rs

//! Runtime resolution of the CatBoost model-calcer library via `libloading`.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::path::Path;

use libloading::Library;

use super::api::*;
use crate::error::{BridgeError, Result};

/// A [`CatBoostApi`] backed by a dynamically loaded shared object.
///
/// Every required symbol is resolved in [`SharedLibraryApi::open`]; a missing
/// one fails the open with [`BridgeError::Load`]. The tree and dimension count
/// accessors are optional. The function pointers stay valid for as long as
/// `_library` is alive, which is the lifetime of this struct.
pub struct SharedLibraryApi {
    model_calcer_create: ModelCalcerCreateFn,
    model_calcer_delete: ModelCalcerDeleteFn,
    get_error_string: GetErrorStringFn,
    load_full_model_from_file: LoadFullModelFromFileFn,
    calc_model_prediction_flat: CalcModelPredictionFlatFn,
    calc_model_prediction: CalcModelPredictionFn,
    calc_model_prediction_with_hashed_cat_features: CalcModelPredictionWithHashedCatFeaturesFn,
    get_string_cat_feature_hash: GetStringCatFeatureHashFn,
    get_integer_cat_feature_hash: GetIntegerCatFeatureHashFn,
    get_float_features_count: GetFeaturesCountFn,
    get_cat_features_count: GetFeaturesCountFn,
    get_tree_count: Option<GetFeaturesCountFn>,
    get_dimensions_count: Option<GetFeaturesCountFn>,
    _library: Library,
}

/// Copies a required function pointer out of `library`.
///
/// # Safety
/// `T` must be the exact signature of the exported symbol.
unsafe fn required<T: Copy>(library: &Library, symbol: &[u8]) -> Result<T> {
    library.get::<T>(symbol).map(|s| *s).map_err(|e| {
        BridgeError::Load(format!(
            "missing symbol {}: {}",
            symbols::display_name(symbol),
            e
        ))
    })
}

/// # Safety
/// `T` must be the exact signature of the exported symbol.
unsafe fn optional<T: Copy>(library: &Library, symbol: &[u8]) -> Option<T> {
    library.get::<T>(symbol).ok().map(|s| *s)
}

impl SharedLibraryApi {
    /// Loads the shared object at `path` and resolves the model-calcer API.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        // SAFETY: loading a library runs its initialisers; the CatBoost
        // model-calcer library has no initialisers with preconditions.
        let library = unsafe { Library::new(path) }.map_err(|e| {
            BridgeError::Load(format!("cannot open library {}: {}", path.display(), e))
        })?;

        // SAFETY: each type alias matches the C declaration of its symbol.
        let api = unsafe {
            Self {
                model_calcer_create: required(&library, symbols::MODEL_CALCER_CREATE)?,
                model_calcer_delete: required(&library, symbols::MODEL_CALCER_DELETE)?,
                get_error_string: required(&library, symbols::GET_ERROR_STRING)?,
                load_full_model_from_file: required(
                    &library,
                    symbols::LOAD_FULL_MODEL_FROM_FILE,
                )?,
                calc_model_prediction_flat: required(
                    &library,
                    symbols::CALC_MODEL_PREDICTION_FLAT,
                )?,
                calc_model_prediction: required(&library, symbols::CALC_MODEL_PREDICTION)?,
                calc_model_prediction_with_hashed_cat_features: required(
                    &library,
                    symbols::CALC_MODEL_PREDICTION_WITH_HASHED_CAT_FEATURES,
                )?,
                get_string_cat_feature_hash: required(
                    &library,
                    symbols::GET_STRING_CAT_FEATURE_HASH,
                )?,
                get_integer_cat_feature_hash: required(
                    &library,
                    symbols::GET_INTEGER_CAT_FEATURE_HASH,
                )?,
                get_float_features_count: required(&library, symbols::GET_FLOAT_FEATURES_COUNT)?,
                get_cat_features_count: required(&library, symbols::GET_CAT_FEATURES_COUNT)?,
                get_tree_count: optional(&library, symbols::GET_TREE_COUNT),
                get_dimensions_count: optional(&library, symbols::GET_DIMENSIONS_COUNT),
                _library: library,
            }
        };

        log::info!(
            "Loaded CatBoost library {} (tree count: {}, dimensions count: {})",
            path.display(),
            if api.get_tree_count.is_some() { "yes" } else { "no" },
            if api.get_dimensions_count.is_some() { "yes" } else { "no" },
        );
        Ok(api)
    }
}

impl CatBoostApi for SharedLibraryApi {
    fn model_calcer_create(&self) -> *mut ModelCalcerHandle {
        unsafe { (self.model_calcer_create)() }
    }

    unsafe fn model_calcer_delete(&self, handle: *mut ModelCalcerHandle) {
        (self.model_calcer_delete)(handle)
    }

    fn error_string(&self) -> String {
        let message = unsafe { (self.get_error_string)() };
        if message.is_null() {
            return "unknown error".to_string();
        }
        // SAFETY: the library returns a NUL-terminated string it owns.
        unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned()
    }

    unsafe fn load_full_model_from_file(
        &self,
        handle: *mut ModelCalcerHandle,
        path: &CStr,
    ) -> bool {
        (self.load_full_model_from_file)(handle, path.as_ptr())
    }

    unsafe fn float_features_count(&self, handle: *mut ModelCalcerHandle) -> usize {
        (self.get_float_features_count)(handle)
    }

    unsafe fn cat_features_count(&self, handle: *mut ModelCalcerHandle) -> usize {
        (self.get_cat_features_count)(handle)
    }

    unsafe fn tree_count(&self, handle: *mut ModelCalcerHandle) -> Option<usize> {
        let get_tree_count = self.get_tree_count?;
        Some(get_tree_count(handle))
    }

    unsafe fn dimensions_count(&self, handle: *mut ModelCalcerHandle) -> Option<usize> {
        let get_dimensions_count = self.get_dimensions_count?;
        Some(get_dimensions_count(handle))
    }

    unsafe fn calc_prediction_flat(
        &self,
        handle: *mut ModelCalcerHandle,
        doc_count: usize,
        float_rows: *const *const f32,
        float_count: usize,
        result: &mut [f64],
    ) -> bool {
        (self.calc_model_prediction_flat)(
            handle,
            doc_count,
            float_rows,
            float_count,
            result.as_mut_ptr(),
            result.len(),
        )
    }

    unsafe fn calc_prediction(
        &self,
        handle: *mut ModelCalcerHandle,
        doc_count: usize,
        float_rows: *const *const f32,
        float_count: usize,
        cat_rows: *const *const *const c_char,
        cat_count: usize,
        result: &mut [f64],
    ) -> bool {
        (self.calc_model_prediction)(
            handle,
            doc_count,
            float_rows,
            float_count,
            cat_rows,
            cat_count,
            result.as_mut_ptr(),
            result.len(),
        )
    }

    unsafe fn calc_prediction_hashed(
        &self,
        handle: *mut ModelCalcerHandle,
        doc_count: usize,
        float_rows: *const *const f32,
        float_count: usize,
        cat_rows: *const *const u32,
        cat_count: usize,
        result: &mut [f64],
    ) -> bool {
        // `u32` and C `int` share size and alignment; the codes are bit patterns.
        (self.calc_model_prediction_with_hashed_cat_features)(
            handle,
            doc_count,
            float_rows,
            float_count,
            cat_rows as *const *const c_int,
            cat_count,
            result.as_mut_ptr(),
            result.len(),
        )
    }

    fn string_cat_feature_hash(&self, value: &[u8]) -> u32 {
        let hash = unsafe {
            (self.get_string_cat_feature_hash)(value.as_ptr() as *const c_char, value.len())
        };
        bytemuck::cast::<c_int, u32>(hash)
    }

    fn integer_cat_feature_hash(&self, value: i64) -> u32 {
        let hash = unsafe { (self.get_integer_cat_feature_hash)(value) };
        bytemuck::cast::<c_int, u32>(hash)
    }
}
