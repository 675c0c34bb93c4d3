// In: src/testing.rs

//! An in-process stand-in for the native library, for unit tests and benches.
//!
//! `MockCatBoostApi` behaves like a loaded model-calcer library without any
//! shared object: it counts calcer lifetimes, records every prediction call,
//! and computes a deterministic prediction from the buffers it is handed, so
//! tests can tell which cells reached the native side and in what layout.
//!
//! The mock model is linear: for row `r` and output dimension `d`
//!
//! ```text
//! prediction = sum_f float[r][f] * (f + 1) + sum_c hash[r][c] * 1e-6 + d * 100
//! ```
//!
//! where `hash` is the mock's own string hash for C-string calls, so raw-string
//! and hashed dispatch agree on the same input.

use std::ffi::CStr;
use std::os::raw::c_char;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::ffi::{CatBoostApi, ModelCalcerHandle};

/// Which native prediction entry point a recorded call went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    Flat,
    Strings,
    Hashed,
}

/// One prediction call as the mock saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub entry: EntryPoint,
    pub doc_count: usize,
    pub float_count: usize,
    pub cat_count: usize,
    pub float_rows_null: bool,
    pub cat_rows_null: bool,
}

/// The object behind each handle the mock hands out.
struct MockCalcer {
    loaded: bool,
}

pub struct MockCatBoostApi {
    float_features: usize,
    cat_features: usize,
    tree_count: Option<usize>,
    dimensions: Option<usize>,
    load_error: Option<String>,
    /// `(call index, message)`: the prediction call with that index fails.
    prediction_error: Option<(usize, String)>,

    created: AtomicUsize,
    deleted: AtomicUsize,
    prediction_calls: AtomicUsize,
    string_hash_calls: AtomicUsize,
    integer_hash_calls: AtomicUsize,
    calls: Mutex<Vec<RecordedCall>>,
    last_error: Mutex<String>,
}

impl MockCatBoostApi {
    pub fn new(float_features: usize, cat_features: usize) -> Self {
        Self {
            float_features,
            cat_features,
            tree_count: Some(100),
            dimensions: Some(1),
            load_error: None,
            prediction_error: None,
            created: AtomicUsize::new(0),
            deleted: AtomicUsize::new(0),
            prediction_calls: AtomicUsize::new(0),
            string_hash_calls: AtomicUsize::new(0),
            integer_hash_calls: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            last_error: Mutex::new(String::new()),
        }
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn with_tree_count(mut self, tree_count: usize) -> Self {
        self.tree_count = Some(tree_count);
        self
    }

    /// Behaves like a library without `GetTreeCount` and `GetDimensionsCount`.
    pub fn without_optional_counts(mut self) -> Self {
        self.tree_count = None;
        self.dimensions = None;
        self
    }

    pub fn failing_load(mut self, message: &str) -> Self {
        self.load_error = Some(message.to_string());
        self
    }

    /// Makes the prediction call with index `call` (0-based) report `message`.
    pub fn failing_prediction(mut self, call: usize, message: &str) -> Self {
        self.prediction_error = Some((call, message.to_string()));
        self
    }

    /// A throwaway file to pass as the model path.
    #[cfg(test)]
    pub fn model_file(&self) -> tempfile::NamedTempFile {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().expect("create mock model file");
        file.write_all(b"CBM1").expect("write mock model file");
        file
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> usize {
        self.deleted.load(Ordering::SeqCst)
    }

    pub fn live_calcers(&self) -> usize {
        self.created() - self.deleted()
    }

    pub fn string_hash_calls(&self) -> usize {
        self.string_hash_calls.load(Ordering::SeqCst)
    }

    pub fn integer_hash_calls(&self) -> usize {
        self.integer_hash_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn set_error(&self, message: &str) {
        if let Ok(mut last) = self.last_error.lock() {
            *last = message.to_string();
        }
    }

    /// Records the call and decides whether it succeeds.
    unsafe fn begin_prediction(
        &self,
        handle: *mut ModelCalcerHandle,
        call: RecordedCall,
        result_len: usize,
    ) -> bool {
        let index = self.prediction_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.clone());
        }

        if !(*(handle as *mut MockCalcer)).loaded {
            self.set_error("model is not loaded");
            return false;
        }
        if call.float_count != self.float_features || call.cat_count != self.cat_features {
            self.set_error("feature count does not match the model");
            return false;
        }
        if result_len != call.doc_count * self.dimensions.unwrap_or(1).max(1) {
            self.set_error("result buffer has the wrong size");
            return false;
        }
        if let Some((failing_call, message)) = &self.prediction_error {
            if *failing_call == index {
                self.set_error(message);
                return false;
            }
        }
        true
    }

    /// Fills `result` from the float rows plus one categorical contribution per row.
    unsafe fn fill_result(
        &self,
        float_rows: *const *const f32,
        cat_term: impl Fn(usize) -> f64,
        result: &mut [f64],
    ) {
        let dimensions = self.dimensions.unwrap_or(1).max(1);
        for (row, out) in result.chunks_exact_mut(dimensions).enumerate() {
            let mut base = cat_term(row);
            if self.float_features > 0 {
                let floats = std::slice::from_raw_parts(*float_rows.add(row), self.float_features);
                base += floats
                    .iter()
                    .enumerate()
                    .map(|(f, v)| f64::from(*v) * (f + 1) as f64)
                    .sum::<f64>();
            }
            for (dim, value) in out.iter_mut().enumerate() {
                *value = base + (dim * 100) as f64;
            }
        }
    }

    fn fnv1a(value: &[u8]) -> u32 {
        value.iter().fold(0x811c_9dc5u32, |hash, byte| {
            (hash ^ u32::from(*byte)).wrapping_mul(0x0100_0193)
        })
    }
}

impl CatBoostApi for MockCatBoostApi {
    fn model_calcer_create(&self) -> *mut ModelCalcerHandle {
        self.created.fetch_add(1, Ordering::SeqCst);
        Box::into_raw(Box::new(MockCalcer { loaded: false })) as *mut ModelCalcerHandle
    }

    unsafe fn model_calcer_delete(&self, handle: *mut ModelCalcerHandle) {
        self.deleted.fetch_add(1, Ordering::SeqCst);
        drop(Box::from_raw(handle as *mut MockCalcer));
    }

    fn error_string(&self) -> String {
        self.last_error
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    unsafe fn load_full_model_from_file(
        &self,
        handle: *mut ModelCalcerHandle,
        _path: &CStr,
    ) -> bool {
        if let Some(message) = &self.load_error {
            self.set_error(message);
            return false;
        }
        (*(handle as *mut MockCalcer)).loaded = true;
        true
    }

    unsafe fn float_features_count(&self, _handle: *mut ModelCalcerHandle) -> usize {
        self.float_features
    }

    unsafe fn cat_features_count(&self, _handle: *mut ModelCalcerHandle) -> usize {
        self.cat_features
    }

    unsafe fn tree_count(&self, _handle: *mut ModelCalcerHandle) -> Option<usize> {
        self.tree_count
    }

    unsafe fn dimensions_count(&self, _handle: *mut ModelCalcerHandle) -> Option<usize> {
        self.dimensions
    }

    unsafe fn calc_prediction_flat(
        &self,
        handle: *mut ModelCalcerHandle,
        doc_count: usize,
        float_rows: *const *const f32,
        float_count: usize,
        result: &mut [f64],
    ) -> bool {
        let call = RecordedCall {
            entry: EntryPoint::Flat,
            doc_count,
            float_count,
            cat_count: 0,
            float_rows_null: float_rows.is_null(),
            cat_rows_null: true,
        };
        if !self.begin_prediction(handle, call, result.len()) {
            return false;
        }
        self.fill_result(float_rows, |_| 0.0, result);
        true
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
        let call = RecordedCall {
            entry: EntryPoint::Strings,
            doc_count,
            float_count,
            cat_count,
            float_rows_null: float_rows.is_null(),
            cat_rows_null: cat_rows.is_null(),
        };
        if !self.begin_prediction(handle, call, result.len()) {
            return false;
        }
        let cat_term = |row: usize| {
            if cat_count == 0 {
                return 0.0;
            }
            let cells = std::slice::from_raw_parts(*cat_rows.add(row), cat_count);
            cells
                .iter()
                .map(|cell| f64::from(Self::fnv1a(CStr::from_ptr(*cell).to_bytes())) * 1e-6)
                .sum()
        };
        self.fill_result(float_rows, cat_term, result);
        true
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
        let call = RecordedCall {
            entry: EntryPoint::Hashed,
            doc_count,
            float_count,
            cat_count,
            float_rows_null: float_rows.is_null(),
            cat_rows_null: cat_rows.is_null(),
        };
        if !self.begin_prediction(handle, call, result.len()) {
            return false;
        }
        let cat_term = |row: usize| {
            if cat_count == 0 {
                return 0.0;
            }
            let cells = std::slice::from_raw_parts(*cat_rows.add(row), cat_count);
            cells.iter().map(|hash| f64::from(*hash) * 1e-6).sum()
        };
        self.fill_result(float_rows, cat_term, result);
        true
    }

    fn string_cat_feature_hash(&self, value: &[u8]) -> u32 {
        self.string_hash_calls.fetch_add(1, Ordering::SeqCst);
        Self::fnv1a(value)
    }

    fn integer_cat_feature_hash(&self, value: i64) -> u32 {
        self.integer_hash_calls.fetch_add(1, Ordering::SeqCst);
        // splitmix64 finalizer, folded to 32 bits.
        let mut z = (value as u64).wrapping_add(0x9e37_79b9_7f4a_7c15);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        (z ^ (z >> 32)) as u32
    }
}
