//! Key Codec
//!
//! Pure functions mapping the logical data model
//! (table → row → column family → qualifier → timestamp) into the flat,
//! ordered byte key space of the engine, plus the prefix bounds used by
//! range scans and range deletes.
//!
//! ## Key layout
//! ```text
//! schema row   (default family):  /tables/{table}            → schema bytes
//! manifest row (default family):  /manifest                  → newline list
//! cell         ({table}/{cf}):    /tables/{table}/{row}/{qualifier}/{millis}
//! ```
//!
//! Components are joined with `/` and are NOT escaped: a component that
//! itself contains the separator is a caller contract violation, not a
//! codec-detected error.

/// Prefix under which schema rows live in the default family. Cell keys
/// share the same prefix inside their own families.
pub const TABLES_PREFIX: &str = "/tables/";

/// Default-family key holding the newline-delimited list of schema keys for
/// all live tables.
pub const MANIFEST_KEY: &str = "/manifest";

/// Separator between key components and between table and family name.
pub const SEPARATOR: char = '/';

/// Key of the persisted schema row for `table` (also its manifest line).
pub fn schema_key(table: &str) -> String {
    format!("{TABLES_PREFIX}{table}")
}

/// Full cell key for a single (row, qualifier, timestamp) entry.
///
/// The column family does not appear in the key: it is represented by the
/// physical family the key is stored in.
pub fn cell_key(table: &str, row: &str, qualifier: &str, timestamp_millis: i64) -> Vec<u8> {
    format!("{TABLES_PREFIX}{table}/{row}/{qualifier}/{timestamp_millis}").into_bytes()
}

/// Prefix covering every cell of `row` in `table` (any qualifier, any
/// timestamp).
pub fn row_prefix(table: &str, row: &str) -> Vec<u8> {
    format!("{TABLES_PREFIX}{table}/{row}/").into_bytes()
}

/// Prefix covering every stored timestamp version of one row+qualifier.
pub fn column_prefix(table: &str, row: &str, qualifier: &str) -> Vec<u8> {
    format!("{TABLES_PREFIX}{table}/{row}/{qualifier}/").into_bytes()
}

/// Physical family name for a (table, column family) pair: `table/cf`.
///
/// Normalization is idempotent: a `cf` that already carries the
/// `table + "/"` prefix (e.g. restored from a persisted proto) is reduced
/// to its bare suffix first, so the result is never double-prefixed.
pub fn family_name(table: &str, column_family: &str) -> String {
    let bare = normalize_family_id(table, column_family);
    format!("{table}{SEPARATOR}{bare}")
}

/// Strip a `table + "/"` prefix from a column family id, if present.
pub fn normalize_family_id<'a>(table: &str, column_family: &'a str) -> &'a str {
    column_family
        .strip_prefix(table)
        .and_then(|rest| rest.strip_prefix(SEPARATOR))
        .unwrap_or(column_family)
}

/// Prefix of every family name owned by `table`.
pub fn table_family_prefix(table: &str) -> String {
    format!("{table}{SEPARATOR}")
}

/// Smallest byte string strictly greater than every string starting with
/// `prefix`, used as the exclusive end bound of range scans and deletes.
///
/// Trailing `0xFF` bytes cannot be incremented without growing the string,
/// so they are stripped before incrementing the new last byte. If that
/// consumes the whole prefix (all `0xFF`) no true exclusive bound exists;
/// `[0xFF]` is returned and callers must treat it as scan-to-end.
pub fn prefix_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    while let Some(&last) = end.last() {
        if last != 0xFF {
            break;
        }
        end.pop();
    }

    match end.last_mut() {
        Some(last) => *last += 1,
        None => end.push(0xFF),
    }
    end
}

/// Strip leading and trailing newline/carriage-return characters only.
/// Interior whitespace and spaces at the edges are preserved, matching the
/// manifest line format.
pub fn trim(s: &str) -> &str {
    s.trim_matches(|c| c == '\n' || c == '\r')
}
