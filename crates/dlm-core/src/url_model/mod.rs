//! Local target naming for remote items.
//!
//! Every admitted item is written to `download_dir / file_name`. The name comes
//! from the item's display name, then the last URI path segment, then a stable
//! hash of the identity, always sanitized for Linux.

mod path;
mod sanitize;

pub use path::filename_from_url_path;
pub use sanitize::sanitize_filename_for_linux;

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::model::Item;

/// File name an item is stored under inside the download directory.
pub fn target_file_name(item: &Item) -> String {
    let from_display = sanitize_filename_for_linux(&item.display_name);
    if !from_display.is_empty() {
        return from_display;
    }
    if let Some(segment) = filename_from_url_path(item.source_uri()) {
        let from_uri = sanitize_filename_for_linux(&segment);
        if !from_uri.is_empty() {
            return from_uri;
        }
    }
    let digest = Sha256::digest(item.identity.as_bytes());
    format!("item-{}", &hex::encode(digest)[..12])
}

/// Full local path for an item under `download_dir`.
pub fn target_path(download_dir: &Path, item: &Item) -> PathBuf {
    download_dir.join(target_file_name(item))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_wins() {
        let item = Item::new("Show S01E02.mkv", "https://dl.example/x/abc", 1);
        assert_eq!(target_file_name(&item), "Show_S01E02.mkv");
    }

    #[test]
    fn falls_back_to_uri_segment() {
        let item = Item::new("..", "https://dl.example/files/movie.mkv?sig=1", 1);
        assert_eq!(target_file_name(&item), "movie.mkv");
    }

    #[test]
    fn falls_back_to_identity_hash() {
        let item = Item::new("", "https://dl.example/", 1);
        let name = target_file_name(&item);
        assert!(name.starts_with("item-"));
        assert_eq!(name.len(), "item-".len() + 12);
        assert_eq!(name, target_file_name(&item.clone()));
    }

    #[test]
    fn path_is_inside_download_dir() {
        let item = Item::new("../../etc/passwd", "https://dl.example/p", 1);
        let p = target_path(Path::new("/data/dl"), &item);
        assert_eq!(p.parent(), Some(Path::new("/data/dl")));
    }
}
