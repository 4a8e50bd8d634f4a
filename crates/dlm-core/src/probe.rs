//! Local filesystem probe used by reconciliation of previously downloaded files.

use std::io;
use std::path::Path;

/// Minimal view of the local filesystem the selection pipeline needs.
pub trait LocalProbe: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn size(&self, path: &Path) -> io::Result<u64>;
    fn delete(&self, path: &Path) -> io::Result<()>;
}

/// Probe backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl LocalProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_probe_sees_size_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.mkv");
        assert!(!FsProbe.exists(&path));
        std::fs::write(&path, vec![0u8; 42]).unwrap();
        assert!(FsProbe.exists(&path));
        assert_eq!(FsProbe.size(&path).unwrap(), 42);
        FsProbe.delete(&path).unwrap();
        assert!(!FsProbe.exists(&path));
    }

    #[test]
    fn directories_are_not_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!FsProbe.exists(dir.path()));
    }
}
