//! Storage facade
//!
//! Row and cell operations over the engine, the family registry and the
//! manifest: point writes, point reads, batched atomic writes, existence
//! checks, and targeted deletions from a single column up to a whole table.
//!
//! ## Responsibilities
//! - Translate (table, row, qualifier, timestamp) cells into engine keys
//! - Resolve column families lazily through the registry
//! - Keep the manifest consistent with persisted schemas
//! - Run the table-deletion cascade as an explicit best-effort saga

use std::sync::Arc;

use bytes::Bytes;

use crate::codec;
use crate::config::Config;
use crate::engine::{Database, WriteBatch};
use crate::error::Result;
use crate::manifest::Manifest;
use crate::registry::{DropReport, FamilyRegistry};

/// One storage instance: exclusive owner of the database, the registry and
/// the manifest
///
/// Every operation is synchronous and either completes or fails before
/// returning. Handles are owned within the database's lifetime, so dropping
/// a `Storage` releases all family handles before the database itself goes
/// away.
pub struct Storage {
    db: Arc<Database>,
    registry: FamilyRegistry,
    manifest: Manifest,
}

/// Structured result of the table-deletion saga
///
/// The manifest update happens first and independently of the physical
/// drops: a crash mid-sequence leaves the table absent from the manifest
/// and the remaining cleanup safe to retry.
#[derive(Debug)]
pub struct DeleteTableOutcome {
    /// Whether the manifest held (and lost) the table's line. When false
    /// the whole operation was an idempotent no-op.
    pub manifest_changed: bool,

    /// Per-family results of the physical drop cascade
    pub families: DropReport,

    /// Whether the persisted schema row was deleted
    pub schema_deleted: bool,
}

/// One family's contents, as dumped by [`Storage::scan_database`]
#[derive(Debug)]
pub struct FamilyDump {
    pub family: String,
    pub entries: Vec<(Vec<u8>, Bytes)>,
}

impl Storage {
    /// Open or create storage with the given config
    pub fn open(config: Config) -> Result<Self> {
        let db = Arc::new(Database::open(&config.data_dir, config.wal_sync_strategy)?);
        let registry = FamilyRegistry::new(db.clone());
        let manifest = Manifest::new(db.clone());

        Ok(Self {
            db,
            registry,
            manifest,
        })
    }

    /// Open with a path and default config (convenience)
    pub fn open_path(path: impl Into<std::path::PathBuf>) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    // =========================================================================
    // Bare rows (default family: schema blobs, manifest)
    // =========================================================================

    /// Write a bare row to the default family
    pub fn put_row(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let default = self.db.default_family();
        self.db.put(&default, key, value)
    }

    /// Read a bare row from the default family
    ///
    /// `None` means the key is absent; an empty stored value comes back as
    /// `Some` with zero length, so the two are distinguishable.
    pub fn get_row(&self, key: &[u8]) -> Result<Option<Bytes>> {
        Ok(self.db.default_family().get(key))
    }

    /// Delete a bare row from the default family
    pub fn delete_row(&self, key: &[u8]) -> Result<()> {
        let default = self.db.default_family();
        self.db.delete(&default, key)
    }

    /// Apply key-value pairs to the default family as one atomic write
    pub fn put_batch(&self, pairs: &[(Vec<u8>, Vec<u8>)]) -> Result<()> {
        let default = self.db.default_family();
        let mut batch = WriteBatch::new();
        for (key, value) in pairs {
            batch.put(&default, key, value);
        }
        self.db.write(batch)
    }

    // =========================================================================
    // Cells
    // =========================================================================

    /// Write one cell value
    ///
    /// Resolves (creating if needed) the physical family for
    /// `table/column_family`, then writes the encoded cell key. Fails
    /// before any write if family resolution fails.
    pub fn put_cell(
        &self,
        table: &str,
        row: &str,
        column_family: &str,
        qualifier: &str,
        timestamp_millis: i64,
        value: &[u8],
    ) -> Result<()> {
        let family_name = codec::family_name(table, column_family);
        let family = self.registry.get_or_create(&family_name)?;

        let key = codec::cell_key(table, row, qualifier, timestamp_millis);
        tracing::trace!(
            family = %family_name,
            key = %String::from_utf8_lossy(&key),
            "put cell"
        );
        self.db.put(&family, &key, value)
    }

    // =========================================================================
    // Existence checks
    // =========================================================================

    /// Membership test against the registry's known family names
    pub fn family_exists(&self, table: &str, column_family: &str) -> bool {
        self.registry
            .contains(&codec::family_name(table, column_family))
    }

    /// Whether `row` has at least one cell inside one family
    pub fn row_exists_in_family(&self, table: &str, row: &str, column_family: &str) -> bool {
        let family_name = codec::family_name(table, column_family);
        let Some(family) = self.registry.get(&family_name) else {
            return false;
        };

        let prefix = codec::row_prefix(table, row);
        let end = codec::prefix_end(&prefix);
        !family.is_range_empty(&prefix, &end)
    }

    /// Whether `row` exists in at least one of the table's families
    pub fn row_exists(&self, table: &str, row: &str) -> bool {
        let prefix = codec::row_prefix(table, row);
        let end = codec::prefix_end(&prefix);

        self.registry
            .families_for_table(table)
            .iter()
            .any(|(_, family)| !family.is_range_empty(&prefix, &end))
    }

    // =========================================================================
    // Targeted deletions
    // =========================================================================

    /// Delete every stored timestamp version of one row+qualifier inside
    /// one family
    pub fn delete_column(
        &self,
        table: &str,
        row: &str,
        column_family: &str,
        qualifier: &str,
    ) -> Result<()> {
        let family_name = codec::family_name(table, column_family);
        let Some(family) = self.registry.get(&family_name) else {
            // Nothing stored under a family that never existed
            return Ok(());
        };

        let prefix = codec::column_prefix(table, row, qualifier);
        let end = codec::prefix_end(&prefix);
        self.db.delete_range(&family, &prefix, &end)
    }

    /// Delete the full row range within one family
    ///
    /// Returns `false` when the family does not exist, distinguishing
    /// "nothing to delete" from "deleted successfully".
    pub fn delete_family_row(&self, table: &str, row: &str, column_family: &str) -> Result<bool> {
        let family_name = codec::family_name(table, column_family);
        let Some(family) = self.registry.get(&family_name) else {
            return Ok(false);
        };

        let prefix = codec::row_prefix(table, row);
        let end = codec::prefix_end(&prefix);
        self.db.delete_range(&family, &prefix, &end)?;
        Ok(true)
    }

    /// Delete the row range across every family owned by the table
    ///
    /// Best-effort: a failing family is logged and the rest still run; the
    /// first failure is reported after the cascade completes.
    pub fn delete_table_row(&self, table: &str, row: &str) -> Result<()> {
        let prefix = codec::row_prefix(table, row);
        let end = codec::prefix_end(&prefix);

        let mut first_error = None;
        for (name, family) in self.registry.families_for_table(table) {
            if let Err(e) = self.db.delete_range(&family, &prefix, &end) {
                tracing::error!(family = %name, error = %e, "row delete failed in family");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Delete a table: manifest line, physical families, schema row
    ///
    /// Steps, in order:
    /// 1. remove the schema-key line from the manifest; stop here when the
    ///    table was already absent (idempotent no-op)
    /// 2. drop all families owned by the table (best-effort)
    /// 3. delete the persisted schema row
    pub fn delete_table(&self, table: &str) -> Result<DeleteTableOutcome> {
        let schema_key = codec::schema_key(table);

        let manifest_changed = self.manifest.remove(&schema_key)?;
        if !manifest_changed {
            return Ok(DeleteTableOutcome {
                manifest_changed: false,
                families: DropReport::default(),
                schema_deleted: false,
            });
        }

        let families = self.registry.drop_all_for_table(table);
        if !families.all_succeeded() {
            tracing::warn!(
                table,
                failed = families.failed.len(),
                "some column families could not be dropped; retry is safe"
            );
        }

        let schema_deleted = match self.delete_row(schema_key.as_bytes()) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(table, error = %e, "failed to delete schema row");
                false
            }
        };

        Ok(DeleteTableOutcome {
            manifest_changed,
            families,
            schema_deleted,
        })
    }

    // =========================================================================
    // Schema-object boundary
    // =========================================================================

    /// Persist opaque schema bytes for a table
    pub fn persist_schema(&self, table: &str, schema: &[u8]) -> Result<()> {
        self.put_row(codec::schema_key(table).as_bytes(), schema)
    }

    /// Read back the persisted schema bytes for a table
    pub fn read_schema(&self, table: &str) -> Result<Option<Bytes>> {
        self.get_row(codec::schema_key(table).as_bytes())
    }

    /// Add a table's schema key to the manifest (idempotent)
    pub fn append_to_manifest(&self, table: &str) -> Result<bool> {
        self.manifest.append(&codec::schema_key(table))
    }

    /// Remove a table's schema key from the manifest
    pub fn remove_from_manifest(&self, table: &str) -> Result<bool> {
        self.manifest.remove(&codec::schema_key(table))
    }

    /// Manifest access for bootstrap and diagnostics
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Full dump of every family, sorted by family name
    ///
    /// Best-effort snapshot with no transactional semantics.
    pub fn scan_database(&self) -> Vec<FamilyDump> {
        self.registry
            .all()
            .into_iter()
            .map(|(name, family)| {
                let mut entries = Vec::new();
                let mut it = family.iter();
                it.seek_to_first();
                while it.valid() {
                    if let (Some(k), Some(v)) = (it.key(), it.value()) {
                        entries.push((k.to_vec(), v.clone()));
                    }
                    it.next();
                }
                FamilyDump {
                    family: name,
                    entries,
                }
            })
            .collect()
    }

    /// Every cell of one row, across all families of the table
    pub fn row_data(&self, table: &str, row: &str) -> Vec<FamilyDump> {
        let prefix = codec::row_prefix(table, row);
        let end = codec::prefix_end(&prefix);

        self.registry
            .families_for_table(table)
            .into_iter()
            .map(|(name, family)| {
                let mut entries = Vec::new();
                let mut it = family.iter();
                it.seek(&prefix);
                while it.valid() {
                    match it.key() {
                        Some(key) if key < end.as_slice() => {
                            entries.push((key.to_vec(), it.value().cloned().unwrap_or_default()));
                        }
                        _ => break,
                    }
                    it.next();
                }
                FamilyDump {
                    family: name,
                    entries,
                }
            })
            .collect()
    }

    /// Flush and fsync outstanding writes without releasing the instance
    pub fn sync(&self) -> Result<()> {
        self.db.sync()
    }

    /// Flush and fsync outstanding writes, then release the instance
    ///
    /// Handle release ordering relative to the database is structural:
    /// registry handles drop with `self`, before the database `Arc` itself.
    pub fn close(self) -> Result<()> {
        self.sync()
    }
}
