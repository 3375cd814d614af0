//! Embedded ordered key-value engine
//!
//! The trusted store underneath the storage layer: byte-string keys, named
//! column families, atomic single writes and atomic batches, and seekable
//! per-family iterators.
//!
//! ## Responsibilities
//! - Open a database directory, recovering every family from the WAL
//! - Create/drop/enumerate column families
//! - Get/put/delete/delete-range/batch-write scoped to a family
//! - Rewrite a compacted WAL after recovery (recover → snapshot → truncate)
//!
//! Mutations append one WAL entry and then apply in memory, so a batch is
//! all-or-nothing across crash recovery.

mod family;

pub use family::{Family, FamilyHandle, FamilyIterator};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};

use crate::config::WalSyncStrategy;
use crate::error::{Result, StoreError};
use crate::wal::{WalRecord, WalRecovery, WalWriter};

/// Name of the always-present default column family
pub const DEFAULT_FAMILY: &str = "default";

const WAL_FILENAME: &str = "wal.log";
const WAL_TMP_FILENAME: &str = "wal.log.tmp";

/// The embedded database: a set of named families backed by one WAL
///
/// ## Concurrency
/// - `families`: RwLock map, write-locked only for create/drop
/// - `wal`: Mutex, serializes all mutations; append and in-memory apply
///   both happen under it, so log order equals apply order and replay
///   reconstructs exactly the live state for overlapping keys
/// - Reads go straight to the family handles and never take either lock
pub struct Database {
    path: PathBuf,
    wal: Mutex<WalWriter>,
    families: RwLock<HashMap<String, FamilyHandle>>,
}

impl Database {
    /// Open or create a database at `path`
    ///
    /// Enumerates and rebuilds every column family recorded in the WAL,
    /// then rewrites the log as a compacted snapshot so replay cost does not
    /// grow across restarts. The default family always exists afterwards.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        fs::create_dir_all(path)?;
        let wal_path = path.join(WAL_FILENAME);

        let mut families: HashMap<String, FamilyHandle> = HashMap::new();
        families.insert(
            DEFAULT_FAMILY.to_string(),
            Arc::new(Family::new(DEFAULT_FAMILY)),
        );

        if wal_path.exists() {
            let (entries, stats) = WalRecovery::recover(&wal_path)?;
            if stats.entries_recovered > 0 || stats.entries_corrupted > 0 {
                tracing::info!(
                    recovered = stats.entries_recovered,
                    corrupted = stats.entries_corrupted,
                    last_lsn = stats.last_lsn,
                    truncated = stats.was_truncated,
                    "WAL recovery complete"
                );
            }
            for entry in entries {
                Self::replay_records(&mut families, entry.records);
            }
        }

        // Recovered state is now authoritative. The compacted snapshot is
        // built in a scratch file and renamed into place, so the previous
        // log stays intact until the rewrite is fully synced.
        let tmp_path = path.join(WAL_TMP_FILENAME);
        let mut writer = WalWriter::create(&tmp_path, sync_strategy)?;
        for (name, family) in &families {
            let mut records = Vec::new();
            if name != DEFAULT_FAMILY {
                records.push(WalRecord::CreateFamily { name: name.clone() });
            }
            let mut it = family.iter();
            it.seek_to_first();
            while it.valid() {
                records.push(WalRecord::Put {
                    family: name.clone(),
                    key: it.key().unwrap_or_default().to_vec(),
                    value: it.value().map(|v| v.to_vec()).unwrap_or_default(),
                });
                it.next();
            }
            if !records.is_empty() {
                writer.append(records)?;
            }
        }
        writer.sync()?;

        // The writer keeps its handle to the same inode across the rename;
        // subsequent appends land in the renamed file.
        fs::rename(&tmp_path, &wal_path)?;
        fs::File::open(path)?.sync_all()?;

        tracing::debug!(
            path = %path.display(),
            families = families.len(),
            "opened database"
        );

        Ok(Self {
            path: path.to_path_buf(),
            wal: Mutex::new(writer),
            families: RwLock::new(families),
        })
    }

    /// Database directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all live families, sorted (default included)
    pub fn family_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.families.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Look up a live family by name
    pub fn family(&self, name: &str) -> Option<FamilyHandle> {
        self.families.read().get(name).cloned()
    }

    /// Handle to the default family (always present)
    pub fn default_family(&self) -> FamilyHandle {
        self.families
            .read()
            .get(DEFAULT_FAMILY)
            .cloned()
            .expect("default family always exists")
    }

    /// Create a new column family
    pub fn create_family(&self, name: &str) -> Result<FamilyHandle> {
        let mut families = self.families.write();
        if families.contains_key(name) {
            return Err(StoreError::FamilyExists(name.to_string()));
        }

        self.wal.lock().append(vec![WalRecord::CreateFamily {
            name: name.to_string(),
        }])?;

        let handle: FamilyHandle = Arc::new(Family::new(name));
        families.insert(name.to_string(), handle.clone());
        tracing::debug!(family = name, "created column family");
        Ok(handle)
    }

    /// Drop a column family and all of its data
    ///
    /// The default family is refused. Outstanding handles are invalidated;
    /// writes through them fail afterwards.
    pub fn drop_family(&self, name: &str) -> Result<()> {
        if name == DEFAULT_FAMILY {
            return Err(StoreError::DefaultFamilyProtected);
        }

        let mut families = self.families.write();
        let handle = families
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::FamilyNotFound(name.to_string()))?;

        self.wal.lock().append(vec![WalRecord::DropFamily {
            name: name.to_string(),
        }])?;

        handle.mark_dropped();
        families.remove(name);
        tracing::debug!(family = name, "dropped column family");
        Ok(())
    }

    /// Put a single key-value pair into a family (atomic)
    pub fn put(&self, family: &FamilyHandle, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_live(family)?;
        let mut wal = self.wal.lock();
        wal.append(vec![WalRecord::Put {
            family: family.name().to_string(),
            key: key.to_vec(),
            value: value.to_vec(),
        }])?;
        family.apply_put(key.to_vec(), Bytes::copy_from_slice(value));
        Ok(())
    }

    /// Delete a single key from a family
    pub fn delete(&self, family: &FamilyHandle, key: &[u8]) -> Result<()> {
        self.check_live(family)?;
        let mut wal = self.wal.lock();
        wal.append(vec![WalRecord::Delete {
            family: family.name().to_string(),
            key: key.to_vec(),
        }])?;
        family.apply_delete(key);
        Ok(())
    }

    /// Delete the key range `[start, end)` from a family
    pub fn delete_range(&self, family: &FamilyHandle, start: &[u8], end: &[u8]) -> Result<()> {
        self.check_live(family)?;
        let mut wal = self.wal.lock();
        wal.append(vec![WalRecord::DeleteRange {
            family: family.name().to_string(),
            start: start.to_vec(),
            end: end.to_vec(),
        }])?;
        family.apply_delete_range(start, end);
        Ok(())
    }

    /// Apply a batch as one atomic write (one WAL entry, all-or-nothing)
    pub fn write(&self, batch: WriteBatch) -> Result<()> {
        if batch.records.is_empty() {
            return Ok(());
        }

        // Validate every target family before anything reaches the log
        let families = self.families.read();
        for record in &batch.records {
            let name = batch_record_family(record);
            if !families.contains_key(name) {
                return Err(StoreError::FamilyNotFound(name.to_string()));
            }
        }

        let mut wal = self.wal.lock();
        wal.append(batch.records.clone())?;

        for record in batch.records {
            match record {
                WalRecord::Put { family, key, value } => {
                    if let Some(handle) = families.get(&family) {
                        handle.apply_put(key, Bytes::from(value));
                    }
                }
                WalRecord::Delete { family, key } => {
                    if let Some(handle) = families.get(&family) {
                        handle.apply_delete(&key);
                    }
                }
                WalRecord::DeleteRange { family, start, end } => {
                    if let Some(handle) = families.get(&family) {
                        handle.apply_delete_range(&start, &end);
                    }
                }
                // Family lifecycle records are not batched
                WalRecord::CreateFamily { .. } | WalRecord::DropFamily { .. } => {}
            }
        }
        Ok(())
    }

    /// Flush and fsync the WAL
    pub fn sync(&self) -> Result<()> {
        self.wal.lock().sync()
    }

    fn check_live(&self, family: &FamilyHandle) -> Result<()> {
        if family.is_dropped() {
            return Err(StoreError::FamilyDropped(family.name().to_string()));
        }
        Ok(())
    }

    fn replay_records(families: &mut HashMap<String, FamilyHandle>, records: Vec<WalRecord>) {
        for record in records {
            match record {
                WalRecord::CreateFamily { name } => {
                    families
                        .entry(name.clone())
                        .or_insert_with(|| Arc::new(Family::new(name)));
                }
                WalRecord::DropFamily { name } => {
                    if let Some(handle) = families.remove(&name) {
                        handle.mark_dropped();
                    }
                }
                WalRecord::Put { family, key, value } => {
                    if let Some(handle) = families.get(&family) {
                        handle.apply_put(key, Bytes::from(value));
                    }
                }
                WalRecord::Delete { family, key } => {
                    if let Some(handle) = families.get(&family) {
                        handle.apply_delete(&key);
                    }
                }
                WalRecord::DeleteRange { family, start, end } => {
                    if let Some(handle) = families.get(&family) {
                        handle.apply_delete_range(&start, &end);
                    }
                }
            }
        }
    }
}

/// A set of mutations applied as one atomic write
#[derive(Default)]
pub struct WriteBatch {
    records: Vec<WalRecord>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a put against a family
    pub fn put(&mut self, family: &FamilyHandle, key: &[u8], value: &[u8]) {
        self.records.push(WalRecord::Put {
            family: family.name().to_string(),
            key: key.to_vec(),
            value: value.to_vec(),
        });
    }

    /// Queue a delete against a family
    pub fn delete(&mut self, family: &FamilyHandle, key: &[u8]) {
        self.records.push(WalRecord::Delete {
            family: family.name().to_string(),
            key: key.to_vec(),
        });
    }

    /// Queue a range delete against a family
    pub fn delete_range(&mut self, family: &FamilyHandle, start: &[u8], end: &[u8]) {
        self.records.push(WalRecord::DeleteRange {
            family: family.name().to_string(),
            start: start.to_vec(),
            end: end.to_vec(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

fn batch_record_family(record: &WalRecord) -> &str {
    match record {
        WalRecord::Put { family, .. }
        | WalRecord::Delete { family, .. }
        | WalRecord::DeleteRange { family, .. } => family,
        WalRecord::CreateFamily { name } | WalRecord::DropFamily { name } => name,
    }
}
