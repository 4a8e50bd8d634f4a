//! Catalog providers: where the run's batches come from.
//!
//! A provider is called once per run. Failures are not fatal: the provider
//! returns whatever it managed to fetch together with the error, and the run
//! continues with that.

mod furk;
mod http;
mod json;

pub use furk::{parse_batch_items, parse_batch_list, FurkCatalog, RemoteBatch};
pub use json::{parse_batches, JsonCatalog};

use thiserror::Error;

use crate::model::Batch;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Transport(#[from] curl::Error),
    #[error("catalog request returned HTTP {0}")]
    Http(u32),
    #[error("catalog response has unexpected shape: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog API reported an error: '{0}'")]
    Api(String),
    #[error("invalid catalog endpoint: {0}")]
    Endpoint(String),
    #[error("catalog file: {0}")]
    Io(#[from] std::io::Error),
}

/// Batches fetched so far, plus the error that cut the fetch short (if any).
#[derive(Debug, Default)]
pub struct CatalogFetch {
    pub batches: Vec<Batch>,
    pub error: Option<CatalogError>,
}

impl CatalogFetch {
    pub fn ok(batches: Vec<Batch>) -> Self {
        Self {
            batches,
            error: None,
        }
    }

    pub fn failed(error: CatalogError) -> Self {
        Self {
            batches: Vec::new(),
            error: Some(error),
        }
    }
}

/// Source of remote batches. Blocking; callers run it off the async runtime.
pub trait CatalogProvider: Send + Sync {
    fn fetch_batches(&self) -> CatalogFetch;
}

/// Fixed, in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    batches: Vec<Batch>,
}

impl StaticCatalog {
    pub fn new(batches: Vec<Batch>) -> Self {
        Self { batches }
    }
}

impl CatalogProvider for StaticCatalog {
    fn fetch_batches(&self) -> CatalogFetch {
        CatalogFetch::ok(self.batches.clone())
    }
}
