//! Column-Family Registry
//!
//! Owns the mapping from logical column-family name to engine family
//! handle. Handles are created lazily on first use, reconstructed by
//! enumerating the engine on reopen, and destroyed on family drop.
//!
//! Alongside the flat name map the registry keeps a typed table→families
//! relation, so cascade operations walk an explicit ownership set instead
//! of re-deriving it by string-prefix matching. Family names still follow
//! the `table/cf` prefix convention on disk, so families persisted before
//! this relation existed rebuild into it on open.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::codec;
use crate::engine::{Database, FamilyHandle, DEFAULT_FAMILY};
use crate::error::Result;

/// Registry of live column families
///
/// One mutex guards both maps; it covers lookup/create/drop bookkeeping
/// only and is never held across a range scan.
pub struct FamilyRegistry {
    db: Arc<Database>,
    inner: Mutex<RegistryInner>,
}

struct RegistryInner {
    /// name → handle, default family included
    families: HashMap<String, FamilyHandle>,

    /// table → names of the families it owns (default family excluded)
    owners: HashMap<String, BTreeSet<String>>,
}

/// Outcome of a multi-family drop cascade
///
/// Sub-step failures do not abort the cascade; callers see exactly which
/// families went away and which need a retry.
#[derive(Debug, Default)]
pub struct DropReport {
    pub dropped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl DropReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

impl FamilyRegistry {
    /// Build the registry from the families the engine discovered on open
    pub fn new(db: Arc<Database>) -> Self {
        let mut families = HashMap::new();
        let mut owners: HashMap<String, BTreeSet<String>> = HashMap::new();

        for name in db.family_names() {
            if let Some(handle) = db.family(&name) {
                if let Some(table) = owning_table(&name) {
                    owners
                        .entry(table.to_string())
                        .or_default()
                        .insert(name.clone());
                }
                families.insert(name, handle);
            }
        }

        tracing::debug!(families = families.len(), "registry populated");

        Self {
            db,
            inner: Mutex::new(RegistryInner { families, owners }),
        }
    }

    /// Return the handle for `name`, creating the family if unseen
    ///
    /// On creation failure no state changes; the caller must treat its
    /// write as failed, not partially applied.
    pub fn get_or_create(&self, name: &str) -> Result<FamilyHandle> {
        let mut inner = self.inner.lock();
        if let Some(handle) = inner.families.get(name) {
            return Ok(handle.clone());
        }

        let handle = self.db.create_family(name).map_err(|e| {
            tracing::error!(family = name, error = %e, "failed to create column family");
            e
        })?;

        inner.families.insert(name.to_string(), handle.clone());
        if let Some(table) = owning_table(name) {
            inner
                .owners
                .entry(table.to_string())
                .or_default()
                .insert(name.to_string());
        }
        Ok(handle)
    }

    /// Look up a handle without creating
    pub fn get(&self, name: &str) -> Option<FamilyHandle> {
        self.inner.lock().families.get(name).cloned()
    }

    /// Membership test against the known family names
    pub fn contains(&self, name: &str) -> bool {
        self.inner.lock().families.contains_key(name)
    }

    /// All known family names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.lock().families.keys().cloned().collect();
        names.sort();
        names
    }

    /// Handles of every family owned by `table`
    pub fn families_for_table(&self, table: &str) -> Vec<(String, FamilyHandle)> {
        let inner = self.inner.lock();
        let mut out = Vec::new();

        if let Some(owned) = inner.owners.get(table) {
            for name in owned {
                if let Some(handle) = inner.families.get(name) {
                    out.push((name.clone(), handle.clone()));
                }
            }
        }
        out
    }

    /// All registered handles (default included), sorted by name
    pub fn all(&self) -> Vec<(String, FamilyHandle)> {
        let inner = self.inner.lock();
        let mut out: Vec<(String, FamilyHandle)> = inner
            .families
            .iter()
            .map(|(n, h)| (n.clone(), h.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Drop one family: engine drop, then map removal
    ///
    /// The default family is refused. A failure at the engine step leaves
    /// the entry in place; dropping is best-effort and safe to retry.
    pub fn drop_family(&self, name: &str) -> Result<()> {
        if name == DEFAULT_FAMILY {
            return Err(crate::error::StoreError::DefaultFamilyProtected);
        }

        let mut inner = self.inner.lock();
        self.db.drop_family(name).map_err(|e| {
            tracing::error!(family = name, error = %e, "failed to drop column family");
            e
        })?;

        inner.families.remove(name);
        if let Some(table) = owning_table(name) {
            if let Some(owned) = inner.owners.get_mut(table) {
                owned.remove(name);
                if owned.is_empty() {
                    inner.owners.remove(table);
                }
            }
        }
        Ok(())
    }

    /// Drop every family owned by `table`, best-effort
    ///
    /// Order among families is unspecified. Failures are collected, not
    /// propagated, so one stuck family does not strand the rest.
    pub fn drop_all_for_table(&self, table: &str) -> DropReport {
        let doomed: Vec<String> = {
            let inner = self.inner.lock();
            inner
                .owners
                .get(table)
                .map(|owned| owned.iter().cloned().collect())
                .unwrap_or_default()
        };

        let mut report = DropReport::default();
        for name in doomed {
            match self.drop_family(&name) {
                Ok(()) => report.dropped.push(name),
                Err(e) => report.failed.push((name, e.to_string())),
            }
        }
        report
    }
}

/// Table a family name belongs to under the `table/cf` convention
///
/// Table names themselves contain separators (`projects/p/instances/i/
/// tables/t`), so the split is at the LAST separator: everything before it
/// is the table, the final component is the bare column family id. The
/// default family has no owner.
fn owning_table(family_name: &str) -> Option<&str> {
    if family_name == DEFAULT_FAMILY {
        return None;
    }
    family_name
        .rsplit_once(codec::SEPARATOR)
        .map(|(table, _)| table)
}
