// In: src/ffi/api.rs

//! The `CatBoostApi` capability and the raw C signatures behind it.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_longlong};

/// Opaque native model calcer. Only ever handled behind a pointer.
#[repr(C)]
pub struct ModelCalcerHandle {
    _private: [u8; 0],
}

//==================================================================================
// 1. Native Signatures
//==================================================================================

pub type ModelCalcerCreateFn = unsafe extern "C" fn() -> *mut ModelCalcerHandle;
pub type ModelCalcerDeleteFn = unsafe extern "C" fn(*mut ModelCalcerHandle);
pub type GetErrorStringFn = unsafe extern "C" fn() -> *const c_char;
pub type LoadFullModelFromFileFn =
    unsafe extern "C" fn(*mut ModelCalcerHandle, *const c_char) -> bool;
pub type CalcModelPredictionFlatFn = unsafe extern "C" fn(
    *mut ModelCalcerHandle,
    usize,
    *const *const f32,
    usize,
    *mut f64,
    usize,
) -> bool;
pub type CalcModelPredictionFn = unsafe extern "C" fn(
    *mut ModelCalcerHandle,
    usize,
    *const *const f32,
    usize,
    *const *const *const c_char,
    usize,
    *mut f64,
    usize,
) -> bool;
pub type CalcModelPredictionWithHashedCatFeaturesFn = unsafe extern "C" fn(
    *mut ModelCalcerHandle,
    usize,
    *const *const f32,
    usize,
    *const *const c_int,
    usize,
    *mut f64,
    usize,
) -> bool;
pub type GetStringCatFeatureHashFn = unsafe extern "C" fn(*const c_char, usize) -> c_int;
pub type GetIntegerCatFeatureHashFn = unsafe extern "C" fn(c_longlong) -> c_int;
pub type GetFeaturesCountFn = unsafe extern "C" fn(*mut ModelCalcerHandle) -> usize;

/// Exported symbol names, NUL-terminated for `dlsym`.
pub mod symbols {
    pub const MODEL_CALCER_CREATE: &[u8] = b"ModelCalcerCreate\0";
    pub const MODEL_CALCER_DELETE: &[u8] = b"ModelCalcerDelete\0";
    pub const GET_ERROR_STRING: &[u8] = b"GetErrorString\0";
    pub const LOAD_FULL_MODEL_FROM_FILE: &[u8] = b"LoadFullModelFromFile\0";
    pub const CALC_MODEL_PREDICTION_FLAT: &[u8] = b"CalcModelPredictionFlat\0";
    pub const CALC_MODEL_PREDICTION: &[u8] = b"CalcModelPrediction\0";
    pub const CALC_MODEL_PREDICTION_WITH_HASHED_CAT_FEATURES: &[u8] =
        b"CalcModelPredictionWithHashedCatFeatures\0";
    pub const GET_STRING_CAT_FEATURE_HASH: &[u8] = b"GetStringCatFeatureHash\0";
    pub const GET_INTEGER_CAT_FEATURE_HASH: &[u8] = b"GetIntegerCatFeatureHash\0";
    pub const GET_FLOAT_FEATURES_COUNT: &[u8] = b"GetFloatFeaturesCount\0";
    pub const GET_CAT_FEATURES_COUNT: &[u8] = b"GetCatFeaturesCount\0";
    pub const GET_TREE_COUNT: &[u8] = b"GetTreeCount\0";
    pub const GET_DIMENSIONS_COUNT: &[u8] = b"GetDimensionsCount\0";

    /// Strips the terminator for use in messages.
    pub fn display_name(symbol: &[u8]) -> String {
        String::from_utf8_lossy(symbol.strip_suffix(b"\0").unwrap_or(symbol)).into_owned()
    }
}

//==================================================================================
// 2. The Capability Trait
//==================================================================================

/// **CONTRACT:** The native functions the bridge needs, resolved once and
/// validated before first use.
///
/// Row buffers follow the library's layout: `float_rows[r]` points at the
/// `float_count` features of row `r`, and `cat_rows[r]` at its `cat_count`
/// categorical cells. A family with zero features is passed as a null array.
/// Every prediction writes `result.len()` values, which must equal
/// `doc_count * dimensions`.
///
/// # Safety
/// The `unsafe` methods take a `handle` that must come from
/// [`CatBoostApi::model_calcer_create`] on the same implementation and must not
/// have been deleted. Row arrays must hold `doc_count` valid pointers, each
/// addressing the stated number of readable cells, for the duration of the call.
pub trait CatBoostApi: Send + Sync {
    fn model_calcer_create(&self) -> *mut ModelCalcerHandle;

    /// # Safety
    /// Releases `handle`; it must not be used afterwards.
    unsafe fn model_calcer_delete(&self, handle: *mut ModelCalcerHandle);

    /// The library's description of its most recent failure.
    fn error_string(&self) -> String;

    /// # Safety
    /// See the trait-level contract.
    unsafe fn load_full_model_from_file(&self, handle: *mut ModelCalcerHandle, path: &CStr)
        -> bool;

    /// # Safety
    /// See the trait-level contract.
    unsafe fn float_features_count(&self, handle: *mut ModelCalcerHandle) -> usize;

    /// # Safety
    /// See the trait-level contract.
    unsafe fn cat_features_count(&self, handle: *mut ModelCalcerHandle) -> usize;

    /// `None` when the library does not export `GetTreeCount`.
    ///
    /// # Safety
    /// See the trait-level contract.
    unsafe fn tree_count(&self, handle: *mut ModelCalcerHandle) -> Option<usize>;

    /// `None` when the library does not export `GetDimensionsCount`.
    ///
    /// # Safety
    /// See the trait-level contract.
    unsafe fn dimensions_count(&self, handle: *mut ModelCalcerHandle) -> Option<usize>;

    /// # Safety
    /// See the trait-level contract.
    unsafe fn calc_prediction_flat(
        &self,
        handle: *mut ModelCalcerHandle,
        doc_count: usize,
        float_rows: *const *const f32,
        float_count: usize,
        result: &mut [f64],
    ) -> bool;

    /// Split call with categorical values as NUL-terminated C strings.
    ///
    /// # Safety
    /// See the trait-level contract.
    #[allow(clippy::too_many_arguments)]
    unsafe fn calc_prediction(
        &self,
        handle: *mut ModelCalcerHandle,
        doc_count: usize,
        float_rows: *const *const f32,
        float_count: usize,
        cat_rows: *const *const *const c_char,
        cat_count: usize,
        result: &mut [f64],
    ) -> bool;

    /// Split call with categorical values already hashed.
    ///
    /// # Safety
    /// See the trait-level contract.
    #[allow(clippy::too_many_arguments)]
    unsafe fn calc_prediction_hashed(
        &self,
        handle: *mut ModelCalcerHandle,
        doc_count: usize,
        float_rows: *const *const f32,
        float_count: usize,
        cat_rows: *const *const u32,
        cat_count: usize,
        result: &mut [f64],
    ) -> bool;

    /// Hashes a raw byte span; no terminator is required.
    fn string_cat_feature_hash(&self, value: &[u8]) -> u32;

    fn integer_cat_feature_hash(&self, value: i64) -> u32;
}
