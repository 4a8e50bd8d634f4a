//! What is already on disk at an item's target path.

use std::io;
use std::path::Path;

use crate::probe::LocalProbe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalState {
    Absent,
    /// Shorter than expected: an interrupted earlier attempt.
    StalePartial { found: u64, expected: u64 },
    /// At least the expected length.
    Complete { found: u64, expected: u64 },
}

pub fn inspect(probe: &dyn LocalProbe, path: &Path, expected: u64) -> io::Result<LocalState> {
    if !probe.exists(path) {
        return Ok(LocalState::Absent);
    }
    let found = probe.size(path)?;
    if found < expected {
        Ok(LocalState::StalePartial { found, expected })
    } else {
        Ok(LocalState::Complete { found, expected })
    }
}
