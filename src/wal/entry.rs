//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Size of the frame header preceding each entry body:
/// LSN (8) + CRC (4) + body length (4)
pub const FRAME_HEADER_SIZE: usize = 16;

/// A single record inside a WAL entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WalRecord {
    /// Put a key-value pair into a column family
    Put {
        family: String,
        key: Vec<u8>,
        value: Vec<u8>,
    },

    /// Delete a key from a column family
    Delete { family: String, key: Vec<u8> },

    /// Delete the key range `[start, end)` from a column family
    DeleteRange {
        family: String,
        start: Vec<u8>,
        end: Vec<u8>,
    },

    /// Create a column family
    CreateFamily { name: String },

    /// Drop a column family and all of its data
    DropFamily { name: String },
}

/// A single entry in the WAL
///
/// An entry is the unit of atomicity: either the whole record list is
/// replayed at recovery or (for a torn tail) none of it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// Timestamp (unix millis) when the entry was created
    pub timestamp: u64,

    /// The records to apply
    pub records: Vec<WalRecord>,
}

impl WalEntry {
    /// Create a new entry stamped with the current wall clock
    pub fn new(lsn: u64, records: Vec<WalRecord>) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            timestamp,
            records,
        }
    }

    /// Serialize the entry body (everything except the frame header)
    pub fn encode_body(&self) -> Result<Vec<u8>> {
        bincode::serialize(&(self.timestamp, &self.records))
            .map_err(|e| StoreError::Serialization(format!("WAL entry encode: {}", e)))
    }

    /// Deserialize an entry body read from a frame with the given LSN
    pub fn decode_body(lsn: u64, body: &[u8]) -> Result<Self> {
        let (timestamp, records): (u64, Vec<WalRecord>) = bincode::deserialize(body)
            .map_err(|e| StoreError::Serialization(format!("WAL entry decode: {}", e)))?;

        Ok(Self {
            lsn,
            timestamp,
            records,
        })
    }

    /// CRC32 checksum over an encoded body
    pub fn compute_crc(body: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(body);
        hasher.finalize()
    }
}
