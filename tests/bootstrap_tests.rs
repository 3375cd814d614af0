//! Tests for startup manifest reload

use cellstore::bootstrap::load_persisted_tables;
use cellstore::codec;
use cellstore::Storage;
use tempfile::TempDir;

fn setup_storage() -> (TempDir, Storage) {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::open_path(temp_dir.path()).unwrap();
    (temp_dir, storage)
}

#[test]
fn test_load_returns_tables_with_schemas() {
    let (_temp, storage) = setup_storage();

    storage.append_to_manifest("t1").unwrap();
    storage.persist_schema("t1", b"schema-1").unwrap();
    storage.append_to_manifest("t2").unwrap();
    storage.persist_schema("t2", b"schema-2").unwrap();

    let tables = load_persisted_tables(&storage).unwrap();
    assert_eq!(tables.len(), 2);

    assert_eq!(tables[0].name, "t1");
    assert_eq!(tables[0].schema_key, codec::schema_key("t1"));
    assert_eq!(tables[0].schema.as_ref(), b"schema-1");
    assert_eq!(tables[1].name, "t2");
}

#[test]
fn test_load_skips_missing_and_empty_schemas() {
    let (_temp, storage) = setup_storage();

    // Listed but never persisted
    storage.append_to_manifest("ghost").unwrap();

    // Listed with an empty blob
    storage.append_to_manifest("hollow").unwrap();
    storage.persist_schema("hollow", b"").unwrap();

    // Healthy entry
    storage.append_to_manifest("solid").unwrap();
    storage.persist_schema("solid", b"schema").unwrap();

    let tables = load_persisted_tables(&storage).unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].name, "solid");
}

#[test]
fn test_load_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let storage = Storage::open_path(temp_dir.path()).unwrap();
        storage.append_to_manifest("t1").unwrap();
        storage.persist_schema("t1", b"schema-1").unwrap();
        storage.close().unwrap();
    }

    let storage = Storage::open_path(temp_dir.path()).unwrap();
    let tables = load_persisted_tables(&storage).unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].schema.as_ref(), b"schema-1");
}

#[test]
fn test_load_empty_manifest() {
    let (_temp, storage) = setup_storage();
    assert!(load_persisted_tables(&storage).unwrap().is_empty());
}
