//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{Result, StoreError};

use super::{WalEntry, FRAME_HEADER_SIZE};

/// Upper bound on a single entry body; larger lengths are treated as frame
/// corruption rather than attempted allocations.
const MAX_BODY_LEN: u32 = 1 << 30;

/// Reads entries sequentially from a WAL file
pub struct WalReader {
    reader: BufReader<File>,

    /// Byte offset of the end of the last successfully read entry
    offset: u64,
}

impl WalReader {
    /// Open a WAL file for reading from the beginning
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            offset: 0,
        })
    }

    /// Read the next entry
    ///
    /// Returns `Ok(None)` at a clean end of file. A torn frame header, a
    /// short body, a CRC mismatch, or an undecodable body all surface as
    /// `StoreError::WalCorruption`; the offset of the last good entry stays
    /// available through [`offset`](Self::offset) so recovery can truncate
    /// there.
    pub fn read_entry(&mut self) -> Result<Option<WalEntry>> {
        let mut header = [0u8; FRAME_HEADER_SIZE];
        match self.reader.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                // Either a clean EOF (no bytes) or a torn header. read_exact
                // does not say which, so probe: if we are exactly at the end
                // of the file it was clean.
                return if self.at_file_end()? {
                    Ok(None)
                } else {
                    Err(StoreError::WalCorruption(
                        "torn frame header at end of log".to_string(),
                    ))
                };
            }
            Err(e) => return Err(e.into()),
        }

        let lsn = u64::from_le_bytes(header[0..8].try_into().unwrap());
        let crc = u32::from_le_bytes(header[8..12].try_into().unwrap());
        let len = u32::from_le_bytes(header[12..16].try_into().unwrap());

        if len == 0 || len > MAX_BODY_LEN {
            return Err(StoreError::WalCorruption(format!(
                "implausible body length {} at lsn {}",
                len, lsn
            )));
        }

        let mut body = vec![0u8; len as usize];
        self.reader.read_exact(&mut body).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                StoreError::WalCorruption(format!("torn body at lsn {}", lsn))
            } else {
                StoreError::Io(e)
            }
        })?;

        if WalEntry::compute_crc(&body) != crc {
            return Err(StoreError::WalCorruption(format!(
                "CRC mismatch at lsn {}",
                lsn
            )));
        }

        let entry = WalEntry::decode_body(lsn, &body)?;
        self.offset += (FRAME_HEADER_SIZE + body.len()) as u64;
        Ok(Some(entry))
    }

    /// Byte offset just past the last successfully read entry
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn at_file_end(&mut self) -> Result<bool> {
        let len = self.reader.get_ref().metadata()?.len();
        Ok(self.offset == len)
    }
}
