use std::fs;

use excel_master::{MasterError, MasterStore, SaveOutcome};
use excel_model::{FieldDescriptor, MasterSchema, ValueKind};
use tempfile::tempdir;

fn sample_schema(dataset: &str) -> MasterSchema {
    MasterSchema::new(
        dataset,
        vec![
            FieldDescriptor::new("id", ValueKind::Number)
                .unique()
                .with_numeric_range(1.0, 3.0),
            FieldDescriptor::new("name", ValueKind::String),
            FieldDescriptor::new("rank", ValueKind::Number).with_numeric_range(1.0, 5.0),
        ],
    )
    .unwrap()
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let store = MasterStore::new(dir.path().join("masterFiles"));

    let schema = sample_schema("AvatarExcelConfigData");
    let outcome = store.save(&schema, false).expect("save master");
    assert!(outcome.is_written());
    assert!(
        outcome
            .path()
            .to_string_lossy()
            .ends_with("AvatarExcelConfigData.master.json")
    );

    let loaded = store.load("AvatarExcelConfigData").expect("load master");
    assert_eq!(loaded, schema);
}

#[test]
fn master_file_is_a_plain_descriptor_array() {
    let dir = tempdir().unwrap();
    let store = MasterStore::new(dir.path());
    store.save(&sample_schema("A"), false).unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&fs::read(store.path_for("A")).unwrap()).unwrap();
    let array = raw.as_array().expect("array root");
    assert_eq!(array.len(), 3);
    assert_eq!(array[0]["canonical_name"], "id");
}

#[test]
fn save_without_force_skips_existing() {
    let dir = tempdir().unwrap();
    let store = MasterStore::new(dir.path());
    store.save(&sample_schema("A"), false).unwrap();
    let before = fs::read(store.path_for("A")).unwrap();

    let other = MasterSchema::new("A", vec![FieldDescriptor::new("x", ValueKind::Bool)]).unwrap();
    let outcome = store.save(&other, false).unwrap();
    assert_eq!(outcome, SaveOutcome::SkippedExisting(store.path_for("A")));
    assert_eq!(fs::read(store.path_for("A")).unwrap(), before);

    let forced = store.save(&other, true).unwrap();
    assert!(forced.is_written());
    assert_eq!(store.load("A").unwrap().canonical_names(), vec!["x"]);
}

#[test]
fn missing_master_is_not_found() {
    let dir = tempdir().unwrap();
    let store = MasterStore::new(dir.path());
    match store.load("Nope") {
        Err(MasterError::NotFound { dataset, path }) => {
            assert_eq!(dataset, "Nope");
            assert_eq!(path, store.path_for("Nope"));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(store.try_load("Nope").unwrap().is_none());
}

#[test]
fn malformed_master_reports_path() {
    let dir = tempdir().unwrap();
    let store = MasterStore::new(dir.path());
    fs::write(store.path_for("Bad"), b"{ not json").unwrap();

    let err = store.load("Bad").unwrap_err();
    match &err {
        MasterError::Malformed { path, dataset, .. } => {
            assert_eq!(path, &store.path_for("Bad"));
            assert_eq!(dataset, "Bad");
        }
        other => panic!("expected Malformed, got {other:?}"),
    }
    assert!(err.to_string().contains("Bad.master.json"));
}

#[test]
fn duplicate_fields_are_a_schema_error() {
    let dir = tempdir().unwrap();
    let store = MasterStore::new(dir.path());
    fs::write(
        store.path_for("Dup"),
        br#"[{"canonical_name":"id","value_kind":"number"},{"canonical_name":"id","value_kind":"string"}]"#,
    )
    .unwrap();
    assert!(matches!(
        store.load("Dup"),
        Err(MasterError::InvalidSchema { .. })
    ));
}

#[test]
fn list_returns_sorted_datasets() {
    let dir = tempdir().unwrap();
    let store = MasterStore::new(dir.path());
    assert!(store.list().unwrap().is_empty());
    store.save(&sample_schema("Weapon"), false).unwrap();
    store.save(&sample_schema("Avatar"), false).unwrap();
    fs::write(dir.path().join("README.txt"), "x").unwrap();

    assert_eq!(store.list().unwrap(), vec!["Avatar", "Weapon"]);
}
