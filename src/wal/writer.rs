//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::WalSyncStrategy;
use crate::error::{Result, StoreError};

use super::{WalEntry, WalRecord};

/// Writes entries to the WAL file
pub struct WalWriter {
    /// Buffered writer positioned at the end of the file
    writer: BufWriter<File>,

    /// LSN the next appended entry will carry
    next_lsn: u64,

    /// How often to fsync
    sync_strategy: WalSyncStrategy,

    /// Entries appended since the last fsync
    unsynced_entries: usize,
}

impl WalWriter {
    /// Open a WAL file for appending
    ///
    /// `next_lsn` continues the sequence established by recovery
    /// (last recovered LSN + 1, or 1 for a fresh log).
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy, next_lsn: u64) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            next_lsn,
            sync_strategy,
            unsynced_entries: 0,
        })
    }

    /// Create a fresh, empty WAL, discarding any existing content
    ///
    /// Used after recovery has been compacted into a new snapshot.
    pub fn create(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            next_lsn: 1,
            sync_strategy,
            unsynced_entries: 0,
        })
    }

    /// Append one entry holding the given records; returns its LSN
    ///
    /// The frame is `LSN (8) | CRC (4) | Len (4) | body`, CRC computed over
    /// the body. The records list must not be empty.
    pub fn append(&mut self, records: Vec<WalRecord>) -> Result<u64> {
        if records.is_empty() {
            return Err(StoreError::WalWrite("empty record list".to_string()));
        }

        let lsn = self.next_lsn;
        let entry = WalEntry::new(lsn, records);
        let body = entry.encode_body()?;
        let crc = WalEntry::compute_crc(&body);

        self.writer.write_all(&lsn.to_le_bytes())?;
        self.writer.write_all(&crc.to_le_bytes())?;
        self.writer.write_all(&(body.len() as u32).to_le_bytes())?;
        self.writer.write_all(&body)?;

        self.next_lsn += 1;
        self.unsynced_entries += 1;
        self.maybe_sync()?;

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.unsynced_entries = 0;
        Ok(())
    }

    /// Get the LSN the next entry will be assigned
    pub fn next_lsn(&self) -> u64 {
        self.next_lsn
    }

    fn maybe_sync(&mut self) -> Result<()> {
        match self.sync_strategy {
            WalSyncStrategy::EveryWrite => self.sync(),
            WalSyncStrategy::EveryNEntries { count } => {
                if self.unsynced_entries >= count {
                    self.sync()
                } else {
                    // Keep the OS page cache current even between fsyncs
                    self.writer.flush()?;
                    Ok(())
                }
            }
        }
    }
}
