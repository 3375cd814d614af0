//! Tests for the key codec
//!
//! These tests verify:
//! - Cell key and prefix layout
//! - Family name construction and normalization
//! - Exclusive prefix-end bounds, including the all-0xFF degenerate case
//! - Manifest line trimming

use cellstore::codec;

// =============================================================================
// Key Layout Tests
// =============================================================================

#[test]
fn test_cell_key_layout() {
    let key = codec::cell_key("projects/p/instances/i/tables/t1", "row-1", "col-1", 123);
    assert_eq!(
        key,
        b"/tables/projects/p/instances/i/tables/t1/row-1/col-1/123".to_vec()
    );
}

#[test]
fn test_cell_key_negative_timestamp() {
    let key = codec::cell_key("t", "r", "q", -7);
    assert_eq!(key, b"/tables/t/r/q/-7".to_vec());
}

#[test]
fn test_row_prefix_covers_cell_keys() {
    let prefix = codec::row_prefix("t1", "row-1");
    let key = codec::cell_key("t1", "row-1", "c", 5);
    assert!(key.starts_with(&prefix));
    assert_eq!(prefix, b"/tables/t1/row-1/".to_vec());
}

#[test]
fn test_column_prefix_covers_all_timestamps() {
    let prefix = codec::column_prefix("t1", "row-1", "c1");
    assert!(codec::cell_key("t1", "row-1", "c1", 1).starts_with(&prefix));
    assert!(codec::cell_key("t1", "row-1", "c1", 999).starts_with(&prefix));
    assert!(!codec::cell_key("t1", "row-1", "c2", 1).starts_with(&prefix));
}

#[test]
fn test_schema_key_uses_tables_prefix() {
    assert_eq!(codec::schema_key("t1"), "/tables/t1");
}

// =============================================================================
// Family Name Tests
// =============================================================================

#[test]
fn test_family_name_prefixes_table() {
    assert_eq!(codec::family_name("t1", "cf1"), "t1/cf1");
}

#[test]
fn test_family_name_normalization_is_idempotent() {
    let table = "projects/p/instances/i/tables/t1";
    let once = codec::family_name(table, "cf1");
    let twice = codec::family_name(table, &once);
    assert_eq!(once, twice);
    assert_eq!(once, format!("{}/cf1", table));
}

#[test]
fn test_family_name_does_not_strip_partial_match() {
    // "t1x" merely starts with the table name; it is not a prefixed id
    assert_eq!(codec::family_name("t1", "t1x"), "t1/t1x");
}

#[test]
fn test_table_family_prefix() {
    assert_eq!(codec::table_family_prefix("t1"), "t1/");
}

// =============================================================================
// Prefix-End Tests
// =============================================================================

#[test]
fn test_prefix_end_increments_last_byte() {
    assert_eq!(codec::prefix_end(b"abc"), b"abd".to_vec());
}

#[test]
fn test_prefix_end_strips_trailing_ff() {
    assert_eq!(codec::prefix_end(&[b'a', b'b', 0xFF]), b"ac".to_vec());
    assert_eq!(codec::prefix_end(&[b'a', 0xFF, 0xFF]), b"b".to_vec());
}

#[test]
fn test_prefix_end_all_ff_degenerate() {
    assert_eq!(codec::prefix_end(&[0xFF]), vec![0xFF]);
    assert_eq!(codec::prefix_end(&[0xFF, 0xFF]), vec![0xFF]);
}

#[test]
fn test_prefix_end_bounds_the_range() {
    let prefix = b"/tables/t1/row-1/";
    let end = codec::prefix_end(prefix);

    // Every key with the prefix sorts before the bound
    let key = codec::cell_key("t1", "row-1", "zzz", i64::MAX);
    assert!(key.as_slice() < end.as_slice());

    // The next sibling row sorts at or after the bound
    let other = codec::row_prefix("t1", "row-2");
    assert!(other.as_slice() >= end.as_slice());
}

// =============================================================================
// Trim Tests
// =============================================================================

#[test]
fn test_trim_strips_newlines_only() {
    assert_eq!(codec::trim("\nabc\r\n"), "abc");
    assert_eq!(codec::trim(" abc "), " abc ");
    assert_eq!(codec::trim("\n\r"), "");
}
