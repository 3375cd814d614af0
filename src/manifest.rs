//! Manifest Manager
//!
//! Maintains the single newline-delimited record listing the schema keys of
//! all live tables, stored under [`codec::MANIFEST_KEY`] in the default
//! family. Updated on table creation and table deletion.
//!
//! Lines keep insertion order; comparisons trim `\n`/`\r` only.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::codec::{self, MANIFEST_KEY};
use crate::engine::Database;
use crate::error::Result;

/// Read/rewrite access to the manifest record
pub struct Manifest {
    db: Arc<Database>,

    /// Serializes the read-modify-write cycle so concurrent appends and
    /// removals cannot lose lines
    update_lock: Mutex<()>,
}

impl Manifest {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            update_lock: Mutex::new(()),
        }
    }

    /// Append a schema key line, unless already present
    ///
    /// Idempotent: re-creating an existing table never duplicates its line.
    /// Returns whether the manifest changed.
    pub fn append(&self, schema_key: &str) -> Result<bool> {
        let _guard = self.update_lock.lock();
        let text = self.read_text();

        let target = codec::trim(schema_key);
        let present = text.lines().any(|line| codec::trim(line) == target);
        if present {
            return Ok(false);
        }

        let mut updated = text;
        updated.push_str(target);
        updated.push('\n');
        self.write_text(&updated)?;
        Ok(true)
    }

    /// Remove every line matching the schema key
    ///
    /// The manifest is rewritten only when at least one line was removed;
    /// the returned flag lets callers skip downstream cascading work when
    /// the table was already absent. Surviving lines keep their order.
    pub fn remove(&self, schema_key: &str) -> Result<bool> {
        let _guard = self.update_lock.lock();
        let text = self.read_text();

        let target = codec::trim(schema_key);
        let mut survivors = String::new();
        let mut changed = false;

        for line in text.lines() {
            if codec::trim(line) == target {
                changed = true;
            } else {
                survivors.push_str(line);
                survivors.push('\n');
            }
        }

        if changed {
            self.write_text(&survivors)?;
        }
        Ok(changed)
    }

    /// Trimmed, non-empty manifest lines in stored order
    pub fn entries(&self) -> Result<Vec<String>> {
        Ok(self
            .read_text()
            .lines()
            .map(codec::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn read_text(&self) -> String {
        match self.db.default_family().get(MANIFEST_KEY.as_bytes()) {
            Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            None => String::new(),
        }
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let default = self.db.default_family();
        self.db.put(&default, MANIFEST_KEY.as_bytes(), text.as_bytes())
    }
}
