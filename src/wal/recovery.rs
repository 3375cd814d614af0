//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{Result, StoreError};

use super::{WalEntry, WalReader};

/// Handles WAL recovery after a crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries found (recovery stops at the first one;
    /// frames have no resynchronization marker to skip past)
    pub entries_corrupted: u64,

    /// Last valid LSN (0 when the log was empty)
    pub last_lsn: u64,

    /// Whether the file was truncated to drop a torn or corrupt tail
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// Reads valid entries in order until a clean EOF or the first corrupt
    /// frame. A corrupt frame and everything after it is truncated away so
    /// the next append starts from a consistent tail.
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let mut reader = WalReader::open(path)?;
        let mut entries = Vec::new();
        let mut result = RecoveryResult {
            entries_recovered: 0,
            entries_corrupted: 0,
            last_lsn: 0,
            was_truncated: false,
        };

        loop {
            match reader.read_entry() {
                Ok(Some(entry)) => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                    entries.push(entry);
                }
                Ok(None) => break,
                Err(StoreError::WalCorruption(reason)) => {
                    tracing::warn!(
                        %reason,
                        offset = reader.offset(),
                        "WAL corruption, truncating tail"
                    );
                    result.entries_corrupted += 1;
                    result.was_truncated = true;

                    let good_end = reader.offset();
                    drop(reader);
                    let file = OpenOptions::new().write(true).open(path)?;
                    file.set_len(good_end)?;
                    file.sync_all()?;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok((entries, result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let mut reader = WalReader::open(path)?;
        let mut result = RecoveryResult {
            entries_recovered: 0,
            entries_corrupted: 0,
            last_lsn: 0,
            was_truncated: false,
        };

        loop {
            match reader.read_entry() {
                Ok(Some(entry)) => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                }
                Ok(None) => break,
                Err(StoreError::WalCorruption(_)) => {
                    result.entries_corrupted += 1;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(result)
    }
}
