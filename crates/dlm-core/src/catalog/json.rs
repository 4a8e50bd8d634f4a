//! Catalog read from a local JSON file.
//!
//! ```json
//! [{"id": "1", "name": "Show.S01E02.1080p", "size": 500,
//!   "items": [{"name": "a.1080p.mkv", "uri": "https://dl.example/a", "size": 300}]}]
//! ```
//! `size` on a batch is optional and defaults to the sum of its items.

use std::path::PathBuf;

use serde::Deserialize;

use super::{CatalogError, CatalogFetch, CatalogProvider};
use crate::model::{Batch, Item};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileBatch {
    id: String,
    name: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    items: Vec<FileItem>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileItem {
    name: String,
    uri: String,
    size: u64,
}

pub fn parse_batches(body: &[u8]) -> Result<Vec<Batch>, CatalogError> {
    let raw: Vec<FileBatch> = serde_json::from_slice(body)?;
    Ok(raw
        .into_iter()
        .map(|b| {
            let items: Vec<Item> = b
                .items
                .into_iter()
                .map(|i| Item::new(i.name, i.uri, i.size))
                .collect();
            Batch {
                id: b.id,
                display_name: b.name,
                total_size: b
                    .size
                    .unwrap_or_else(|| items.iter().map(|i| i.expected_length).sum()),
                items,
            }
        })
        .collect())
}

#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogProvider for JsonCatalog {
    fn fetch_batches(&self) -> CatalogFetch {
        let parsed = std::fs::read(&self.path)
            .map_err(CatalogError::from)
            .and_then(|body| parse_batches(&body));
        match parsed {
            Ok(batches) => CatalogFetch::ok(batches),
            Err(e) => CatalogFetch::failed(e),
        }
    }
}
