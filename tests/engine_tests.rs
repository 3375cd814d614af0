//! Tests for the embedded engine
//!
//! These tests verify:
//! - Family lifecycle (create, drop, enumerate, default protection)
//! - Handle invalidation after drop
//! - Ordered range primitives
//! - Durability across close/reopen (WAL replay and compaction)

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use cellstore::config::WalSyncStrategy;
use cellstore::engine::{Database, WriteBatch, DEFAULT_FAMILY};
use cellstore::error::StoreError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open(temp_dir.path(), WalSyncStrategy::EveryWrite).unwrap();
    (temp_dir, db)
}

fn setup_db_path() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

// =============================================================================
// Family Lifecycle Tests
// =============================================================================

#[test]
fn test_open_creates_default_family() {
    let (_temp, db) = setup_db();
    assert_eq!(db.family_names(), vec![DEFAULT_FAMILY.to_string()]);
    assert!(db.family(DEFAULT_FAMILY).is_some());
}

#[test]
fn test_create_and_enumerate_families() {
    let (_temp, db) = setup_db();

    db.create_family("t1/cf1").unwrap();
    db.create_family("t1/cf2").unwrap();

    assert_eq!(
        db.family_names(),
        vec![
            DEFAULT_FAMILY.to_string(),
            "t1/cf1".to_string(),
            "t1/cf2".to_string()
        ]
    );
}

#[test]
fn test_create_duplicate_family_fails() {
    let (_temp, db) = setup_db();
    db.create_family("t1/cf1").unwrap();
    assert!(matches!(
        db.create_family("t1/cf1"),
        Err(StoreError::FamilyExists(_))
    ));
}

#[test]
fn test_drop_family_removes_it() {
    let (_temp, db) = setup_db();
    db.create_family("t1/cf1").unwrap();
    db.drop_family("t1/cf1").unwrap();

    assert!(db.family("t1/cf1").is_none());
    assert!(matches!(
        db.drop_family("t1/cf1"),
        Err(StoreError::FamilyNotFound(_))
    ));
}

#[test]
fn test_drop_default_family_refused() {
    let (_temp, db) = setup_db();
    assert!(matches!(
        db.drop_family(DEFAULT_FAMILY),
        Err(StoreError::DefaultFamilyProtected)
    ));
}

#[test]
fn test_handle_invalidated_after_drop() {
    let (_temp, db) = setup_db();
    let handle = db.create_family("t1/cf1").unwrap();
    db.drop_family("t1/cf1").unwrap();

    assert!(handle.is_dropped());
    assert!(matches!(
        db.put(&handle, b"k", b"v"),
        Err(StoreError::FamilyDropped(_))
    ));
}

// =============================================================================
// Read/Write Tests
// =============================================================================

#[test]
fn test_put_get_delete() {
    let (_temp, db) = setup_db();
    let default = db.default_family();

    db.put(&default, b"k1", b"v1").unwrap();
    assert_eq!(default.get(b"k1").unwrap().as_ref(), b"v1");

    db.delete(&default, b"k1").unwrap();
    assert!(default.get(b"k1").is_none());
}

#[test]
fn test_empty_value_is_stored() {
    let (_temp, db) = setup_db();
    let default = db.default_family();

    db.put(&default, b"k", b"").unwrap();
    let value = default.get(b"k").unwrap();
    assert!(value.is_empty());
}

#[test]
fn test_write_batch_is_applied_whole() {
    let (_temp, db) = setup_db();
    let default = db.default_family();

    let mut batch = WriteBatch::new();
    batch.put(&default, b"k1", b"v1");
    batch.put(&default, b"k2", b"v2");
    batch.delete(&default, b"k1");
    db.write(batch).unwrap();

    assert!(default.get(b"k1").is_none());
    assert_eq!(default.get(b"k2").unwrap().as_ref(), b"v2");
}

#[test]
fn test_delete_range_is_exclusive_at_end() {
    let (_temp, db) = setup_db();
    let default = db.default_family();

    db.put(&default, b"a", b"1").unwrap();
    db.put(&default, b"b", b"2").unwrap();
    db.put(&default, b"c", b"3").unwrap();

    db.delete_range(&default, b"a", b"c").unwrap();

    assert!(default.get(b"a").is_none());
    assert!(default.get(b"b").is_none());
    assert_eq!(default.get(b"c").unwrap().as_ref(), b"3");
}

#[test]
fn test_is_range_empty() {
    let (_temp, db) = setup_db();
    let default = db.default_family();

    assert!(default.is_range_empty(b"a", b"z"));
    db.put(&default, b"m", b"v").unwrap();
    assert!(!default.is_range_empty(b"a", b"z"));
    assert!(default.is_range_empty(b"n", b"z"));
}

// =============================================================================
// Iterator Tests
// =============================================================================

#[test]
fn test_iterator_seek_and_traverse() {
    let (_temp, db) = setup_db();
    let default = db.default_family();

    db.put(&default, b"a", b"1").unwrap();
    db.put(&default, b"b", b"2").unwrap();
    db.put(&default, b"d", b"4").unwrap();

    let mut it = default.iter();
    it.seek(b"b");
    assert!(it.valid());
    assert_eq!(it.key().unwrap(), b"b");

    it.next();
    assert_eq!(it.key().unwrap(), b"d");

    it.next();
    assert!(!it.valid());
    assert!(it.key().is_none());

    it.seek_to_first();
    assert_eq!(it.key().unwrap(), b"a");

    // Seek between keys lands on the next one
    it.seek(b"c");
    assert_eq!(it.key().unwrap(), b"d");
}

// =============================================================================
// Durability Tests
// =============================================================================

#[test]
fn test_reopen_preserves_data_and_families() {
    let (_temp, path) = setup_db_path();

    {
        let db = Database::open(&path, WalSyncStrategy::EveryWrite).unwrap();
        let default = db.default_family();
        db.put(&default, b"meta", b"value").unwrap();

        let cf = db.create_family("t1/cf1").unwrap();
        db.put(&cf, b"/tables/t1/row-1/c1/7", b"v7").unwrap();
        db.sync().unwrap();
    }

    let db = Database::open(&path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(
        db.default_family().get(b"meta").unwrap().as_ref(),
        b"value"
    );

    let cf = db.family("t1/cf1").expect("family survives reopen");
    assert_eq!(
        cf.get(b"/tables/t1/row-1/c1/7").unwrap().as_ref(),
        b"v7"
    );
}

#[test]
fn test_reopen_forgets_dropped_families() {
    let (_temp, path) = setup_db_path();

    {
        let db = Database::open(&path, WalSyncStrategy::EveryWrite).unwrap();
        let cf = db.create_family("t1/cf1").unwrap();
        db.put(&cf, b"k", b"v").unwrap();
        db.drop_family("t1/cf1").unwrap();
        db.sync().unwrap();
    }

    let db = Database::open(&path, WalSyncStrategy::EveryWrite).unwrap();
    assert!(db.family("t1/cf1").is_none());
}

#[test]
fn test_concurrent_puts_replay_to_live_value() {
    let (_temp, path) = setup_db_path();

    let live = {
        let db = Arc::new(
            Database::open(&path, WalSyncStrategy::EveryNEntries { count: 10_000 }).unwrap(),
        );

        // Writers race on one key; the log and the in-memory map must agree
        // on who won
        let workers: Vec<_> = (0..4u8)
            .map(|i| {
                let db = Arc::clone(&db);
                thread::spawn(move || {
                    let default = db.default_family();
                    for _ in 0..200 {
                        db.put(&default, b"contended", &[i]).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        db.sync().unwrap();
        db.default_family().get(b"contended").unwrap()
    };

    let db = Database::open(&path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(db.default_family().get(b"contended").unwrap(), live);
}

#[test]
fn test_open_ignores_stale_compaction_scratch() {
    let (_temp, path) = setup_db_path();

    {
        let db = Database::open(&path, WalSyncStrategy::EveryWrite).unwrap();
        let default = db.default_family();
        db.put(&default, b"k", b"v").unwrap();
        db.sync().unwrap();
    }

    // A crash mid-compaction can leave a half-written scratch file behind;
    // the real log is untouched until the rename
    std::fs::write(path.join("wal.log.tmp"), b"garbage").unwrap();

    let db = Database::open(&path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(db.default_family().get(b"k").unwrap().as_ref(), b"v");
    assert!(!path.join("wal.log.tmp").exists());
}

#[test]
fn test_open_compacts_the_log() {
    let (_temp, path) = setup_db_path();

    {
        let db = Database::open(&path, WalSyncStrategy::EveryWrite).unwrap();
        let default = db.default_family();
        // Overwrite the same key many times; the snapshot keeps one version
        for i in 0..100u32 {
            db.put(&default, b"hot", format!("v{}", i).as_bytes()).unwrap();
        }
        db.sync().unwrap();
    }

    let size_before = std::fs::metadata(path.join("wal.log")).unwrap().len();

    {
        let _db = Database::open(&path, WalSyncStrategy::EveryWrite).unwrap();
    }

    let size_after = std::fs::metadata(path.join("wal.log")).unwrap().len();
    assert!(size_after < size_before);

    let db = Database::open(&path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(db.default_family().get(b"hot").unwrap().as_ref(), b"v99");
}
