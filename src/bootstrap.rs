//! Startup reload of persisted tables
//!
//! Serves the boot contract: read the manifest, fetch each listed schema
//! blob, and hand the opaque bytes back to the schema layer. The storage
//! layer never parses or validates schema bytes.
//!
//! Per-entry failures are logged and skipped; one broken entry never
//! aborts the rest of the manifest.

use bytes::Bytes;

use crate::codec::TABLES_PREFIX;
use crate::error::Result;
use crate::store::Storage;

/// One table recovered from the manifest at startup
#[derive(Debug, Clone)]
pub struct PersistedTable {
    /// Table name (schema key with the tables prefix stripped)
    pub name: String,

    /// Default-family key the schema blob lives under
    pub schema_key: String,

    /// Serialized schema, opaque to the storage layer
    pub schema: Bytes,
}

/// Load every table listed in the manifest
///
/// Entries whose schema blob is missing or empty are warned about and
/// skipped. Deserialization and registration stay with the caller.
pub fn load_persisted_tables(storage: &Storage) -> Result<Vec<PersistedTable>> {
    let mut tables = Vec::new();

    for schema_key in storage.manifest().entries()? {
        let blob = match storage.get_row(schema_key.as_bytes())? {
            Some(blob) if !blob.is_empty() => blob,
            _ => {
                tracing::warn!(
                    schema_key = %schema_key,
                    "manifest entry has no persisted schema, skipping"
                );
                continue;
            }
        };

        let name = schema_key
            .strip_prefix(TABLES_PREFIX)
            .unwrap_or(&schema_key)
            .to_string();

        tables.push(PersistedTable {
            name,
            schema_key,
            schema: blob,
        });
    }

    tracing::info!(tables = tables.len(), "manifest reload complete");
    Ok(tables)
}
