//! Column family storage
//!
//! One `Family` is a named, ordered partition of the key space. Contents
//! live in a BTreeMap guarded by an RwLock; durability comes from the WAL
//! owned by the `Database`, which replays every family on open.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

/// Shared handle to a column family
///
/// Handles stay valid while the family is live; once the family is dropped
/// every write through an outstanding handle fails.
pub type FamilyHandle = Arc<Family>;

/// A named, ordered partition of the key space
pub struct Family {
    name: String,

    /// Sorted row data (many concurrent readers, exclusive writer)
    rows: RwLock<BTreeMap<Vec<u8>, Bytes>>,

    /// Set when the family is dropped; outstanding handles become inert
    dropped: AtomicBool,
}

impl Family {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: RwLock::new(BTreeMap::new()),
            dropped: AtomicBool::new(false),
        }
    }

    /// Family name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Point lookup
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.rows.read().get(key).cloned()
    }

    /// True when no key falls inside `[start, end)`
    ///
    /// An empty or inverted range holds no keys.
    pub fn is_range_empty(&self, start: &[u8], end: &[u8]) -> bool {
        if start >= end {
            return true;
        }
        self.rows
            .read()
            .range::<[u8], _>((Bound::Included(start), Bound::Excluded(end)))
            .next()
            .is_none()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Whether the family has been dropped
    pub fn is_dropped(&self) -> bool {
        self.dropped.load(Ordering::Acquire)
    }

    /// Seekable forward iterator over a point-in-time snapshot
    ///
    /// The snapshot is taken under a short read lock; iteration itself never
    /// blocks writers.
    pub fn iter(&self) -> FamilyIterator {
        let entries = self
            .rows
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        FamilyIterator { entries, pos: 0 }
    }

    pub(crate) fn mark_dropped(&self) {
        self.dropped.store(true, Ordering::Release);
    }

    pub(crate) fn apply_put(&self, key: Vec<u8>, value: Bytes) {
        self.rows.write().insert(key, value);
    }

    pub(crate) fn apply_delete(&self, key: &[u8]) {
        self.rows.write().remove(key);
    }

    pub(crate) fn apply_delete_range(&self, start: &[u8], end: &[u8]) {
        if start >= end {
            return;
        }
        let mut rows = self.rows.write();
        let doomed: Vec<Vec<u8>> = rows
            .range::<[u8], _>((Bound::Included(start), Bound::Excluded(end)))
            .map(|(k, _)| k.clone())
            .collect();
        for key in doomed {
            rows.remove(&key);
        }
    }
}

/// Forward iterator over a family snapshot
///
/// Mirrors the seek-based engine contract: position with `seek`/
/// `seek_to_first`, check `valid`, then read `key`/`value` and advance with
/// `next`.
pub struct FamilyIterator {
    entries: Vec<(Vec<u8>, Bytes)>,
    pos: usize,
}

impl FamilyIterator {
    /// Position at the first key
    pub fn seek_to_first(&mut self) {
        self.pos = 0;
    }

    /// Position at the first key >= `target`
    pub fn seek(&mut self, target: &[u8]) {
        self.pos = self.entries.partition_point(|(k, _)| k.as_slice() < target);
    }

    /// Whether the iterator is positioned on an entry
    pub fn valid(&self) -> bool {
        self.pos < self.entries.len()
    }

    /// Key at the current position
    pub fn key(&self) -> Option<&[u8]> {
        self.entries.get(self.pos).map(|(k, _)| k.as_slice())
    }

    /// Value at the current position
    pub fn value(&self) -> Option<&Bytes> {
        self.entries.get(self.pos).map(|(_, v)| v)
    }

    /// Advance to the next entry
    pub fn next(&mut self) {
        if self.pos < self.entries.len() {
            self.pos += 1;
        }
    }
}
