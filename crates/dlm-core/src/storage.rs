//! Target file for a single transfer.
//!
//! The target is written in place at its final path. Creating it truncates
//! whatever is there; reconciliation has already decided that any existing
//! content is a stale partial.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Sequential writer that counts the bytes it has written.
pub struct TargetFile {
    file: File,
    written: u64,
}

impl TargetFile {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self { file, written: 0 })
    }

    pub fn append(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush file data to disk.
    pub fn sync(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_all()
    }
}
