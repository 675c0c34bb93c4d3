use super::*;
use crate::config::{BridgeConfig, CategoricalEncoding};
use crate::error::BridgeError;
use crate::testing::{EntryPoint, MockCatBoostApi};
use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use std::path::Path;
use std::sync::Arc;
use std::thread;

fn model_with(mock: MockCatBoostApi, config: BridgeConfig) -> (Arc<MockCatBoostApi>, CatBoostModel) {
    let mock = Arc::new(mock);
    let model_file = mock.model_file();
    let model = CatBoostModel::with_api(mock.clone(), model_file.path(), Arc::new(config)).unwrap();
    (mock, model)
}

fn create_test_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("price", DataType::Float64, false),
        Field::new("rooms", DataType::Int64, false),
        Field::new("city", DataType::Utf8, false),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0, 4.0])),
            Arc::new(Int64Array::from(vec![1, 2, 3, 4])),
            Arc::new(StringArray::from(vec!["oslo", "rome", "oslo", "lima"])),
        ],
    )
    .unwrap()
}

#[cfg(test)]
mod model_tests {
    use super::*;

    #[test]
    fn test_evaluate_batch_returns_one_value_per_row() {
        let (mock, model) = model_with(MockCatBoostApi::new(2, 1), BridgeConfig::default());
        let output = model.evaluate_batch(&create_test_batch()).unwrap();

        assert_eq!(output.len(), 4);
        assert_eq!(output.data_type(), &DataType::Float64);
        assert_eq!(output.null_count(), 0);
        assert_eq!(mock.calls()[0].entry, EntryPoint::Strings);
    }

    #[test]
    fn test_config_drives_batch_size_and_encoding() {
        let config = BridgeConfig::default()
            .with_max_batch_size(3)
            .with_categorical_encoding(CategoricalEncoding::HashStrings);
        let (mock, model) = model_with(MockCatBoostApi::new(2, 1), config);

        let hashed = model.evaluate_batch(&create_test_batch()).unwrap();
        let entries: Vec<EntryPoint> = mock.calls().iter().map(|c| c.entry).collect();
        assert_eq!(entries, vec![EntryPoint::Hashed, EntryPoint::Hashed]);

        // An explicit encoding overrides the configured one, with the same result.
        let raw = model
            .evaluate_with(create_test_batch().columns(), CategoricalEncoding::Auto)
            .unwrap();
        assert_eq!(
            raw.as_primitive::<Float64Type>().values().to_vec(),
            hashed.as_primitive::<Float64Type>().values().to_vec()
        );
    }

    #[test]
    fn test_multi_dimensional_model_returns_struct() {
        let (_, model) = model_with(MockCatBoostApi::new(2, 1).with_dimensions(2), BridgeConfig::default());
        let output = model.evaluate_batch(&create_test_batch()).unwrap();

        let output = output.as_struct();
        assert_eq!(output.len(), 4);
        assert_eq!(output.num_columns(), 2);
        let dim_0 = output.column(0).as_primitive::<Float64Type>();
        let dim_1 = output.column(1).as_primitive::<Float64Type>();
        // Each extra dimension adds 100 to the mock's prediction, up to rounding.
        for row in 0..4 {
            let diff = dim_1.value(row) - dim_0.value(row);
            assert!((diff - 100.0).abs() < 1e-9, "row {}: {}", row, diff);
        }
    }

    #[test]
    fn test_evaluate_raw_matches_native_layout() {
        let (_, model) = model_with(MockCatBoostApi::new(1, 0).with_dimensions(2), BridgeConfig::default());
        let columns: Vec<ArrayRef> = vec![Arc::new(Float64Array::from(vec![5.0]))];
        let values = model.evaluate_raw(&columns, CategoricalEncoding::Auto).unwrap();
        assert_eq!(values, vec![5.0, 105.0]);
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let (mock, model) = model_with(MockCatBoostApi::new(2, 1), BridgeConfig::default());
        let output = model.evaluate_batch(&create_test_batch().slice(0, 0)).unwrap();
        assert_eq!(output.len(), 0);
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_schema_and_path_accessors() {
        let mock = Arc::new(MockCatBoostApi::new(3, 2).with_tree_count(12));
        let model_file = mock.model_file();
        let model =
            CatBoostModel::with_api(mock, model_file.path(), Arc::new(BridgeConfig::default()))
                .unwrap();

        assert_eq!(model.model_path(), model_file.path());
        assert_eq!(model.schema().feature_count(), 5);
        assert_eq!(model.schema().tree_count, 12);
    }

    #[test]
    fn test_missing_library_is_load_error() {
        let result = CatBoostModel::load(
            "/no/such/libcatboostmodel.so",
            "/no/such/model.cbm",
            Arc::new(BridgeConfig::default()),
        );
        assert!(matches!(result, Err(BridgeError::Load(_))));
    }

    #[test]
    fn test_shared_model_evaluates_from_many_threads() {
        let (mock, model) = model_with(MockCatBoostApi::new(2, 1), BridgeConfig::default());
        let model = Arc::new(model);
        let expected = model.evaluate_batch(&create_test_batch()).unwrap();
        let expected = expected.as_primitive::<Float64Type>().values().to_vec();

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let model = Arc::clone(&model);
                thread::spawn(move || {
                    let output = model.evaluate_batch(&create_test_batch()).unwrap();
                    output.as_primitive::<Float64Type>().values().to_vec()
                })
            })
            .collect();
        for worker in workers {
            assert_eq!(worker.join().unwrap(), expected);
        }
        assert_eq!(mock.calls().len(), 5);
    }
}

#[cfg(test)]
mod registry_tests {
    use super::*;

    fn new_registry(mock: &Arc<MockCatBoostApi>) -> ModelRegistry {
        ModelRegistry::with_api(mock.clone(), BridgeConfig::default()).unwrap()
    }

    #[test]
    fn test_get_or_load_loads_once_per_path() {
        let mock = Arc::new(MockCatBoostApi::new(2, 1));
        let model_file = mock.model_file();
        let registry = new_registry(&mock);

        let first = registry.get_or_load(model_file.path()).unwrap();
        let second = registry.get_or_load(model_file.path()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(mock.created(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reload_replaces_and_releases_old_model() {
        let mock = Arc::new(MockCatBoostApi::new(2, 1));
        let model_file = mock.model_file();
        let registry = new_registry(&mock);

        let first = registry.get_or_load(model_file.path()).unwrap();
        let second = registry.reload(model_file.path()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(mock.live_calcers(), 2);

        // The old model stays usable until its last reference goes.
        assert!(first.evaluate_batch(&create_test_batch()).is_ok());
        drop(first);
        assert_eq!(mock.live_calcers(), 1);
    }

    #[test]
    fn test_remove_and_clear_release_calcers() {
        let mock = Arc::new(MockCatBoostApi::new(2, 1));
        let (file_a, file_b) = (mock.model_file(), mock.model_file());
        let registry = new_registry(&mock);

        registry.get_or_load(file_a.path()).unwrap();
        registry.get_or_load(file_b.path()).unwrap();
        assert_eq!(mock.live_calcers(), 2);

        assert!(registry.remove(file_a.path()));
        assert!(!registry.remove(file_a.path()));
        assert_eq!(mock.live_calcers(), 1);

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(mock.live_calcers(), 0);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let mock = Arc::new(MockCatBoostApi::new(2, 1).failing_load("bad magic"));
        let model_file = mock.model_file();
        let registry = new_registry(&mock);

        let result = registry.get_or_load(model_file.path());
        assert!(matches!(result, Err(BridgeError::Load(msg)) if msg == "bad magic"));
        assert!(registry.is_empty());
        assert_eq!(mock.live_calcers(), 0);
    }

    #[test]
    fn test_infos_report_schema_and_timing() {
        let mock = Arc::new(MockCatBoostApi::new(2, 1).with_dimensions(3));
        let model_file = mock.model_file();
        let registry = new_registry(&mock);
        registry.get_or_load(model_file.path()).unwrap();

        let infos = registry.infos();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].model_path, model_file.path());
        assert_eq!(infos[0].schema.dimensions, 3);
        assert!(infos[0].loading_start_time <= chrono::Utc::now());

        let json = serde_json::to_value(&infos[0]).unwrap();
        assert_eq!(json["schema"]["float_features"], 2);
        assert!(json.get("loading_duration").is_some());
    }

    #[test]
    fn test_new_requires_library_path() {
        let result = ModelRegistry::new(BridgeConfig::default());
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mock = Arc::new(MockCatBoostApi::new(1, 0));
        let result = ModelRegistry::with_api(mock, BridgeConfig::default().with_max_batch_size(0));
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_concurrent_get_or_load_shares_one_entry() {
        let mock = Arc::new(MockCatBoostApi::new(2, 1));
        let model_file = mock.model_file();
        let registry = Arc::new(new_registry(&mock));
        let path = model_file.path().to_path_buf();

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let path = path.clone();
                thread::spawn(move || registry.get_or_load(&path).unwrap())
            })
            .collect();
        let models: Vec<Arc<CatBoostModel>> =
            workers.into_iter().map(|w| w.join().unwrap()).collect();

        // Racing loads may create extra calcers, but only one stays cached.
        assert_eq!(registry.len(), 1);
        let cached = registry.get_or_load(Path::new(&path)).unwrap();
        drop(models);
        assert_eq!(Arc::strong_count(&cached), 2);
        assert_eq!(mock.live_calcers(), 1);
    }
}
