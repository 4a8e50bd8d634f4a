//! Furk.net seedbox API.
//!
//! `file/get` lists the ready batches; `file/get?t_files=1&info_hash=..`
//! returns one batch's files. The API is loose with numeric types, so sizes
//! and ids are accepted both as JSON numbers and as numeric strings.

use serde::{Deserialize, Deserializer};
use url::Url;

use super::http::get_body;
use super::{CatalogError, CatalogFetch, CatalogProvider};
use crate::model::{Batch, Item};

#[derive(Debug, Deserialize)]
struct ListResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    files: Vec<RemoteBatch>,
}

/// One entry of the ready batch list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteBatch {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    pub info_hash: String,
    pub name: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    files: Vec<RemoteDetails>,
}

#[derive(Debug, Deserialize)]
struct RemoteDetails {
    #[serde(default)]
    t_files: Vec<RemoteItem>,
}

#[derive(Debug, Deserialize)]
struct RemoteItem {
    name: String,
    url_dl: String,
    #[serde(deserialize_with = "lenient_u64")]
    size: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    match NumberOrString::deserialize(d)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match NumberOrString::deserialize(d)? {
        NumberOrString::Number(n) => n.to_string(),
        NumberOrString::String(s) => s,
    })
}

fn check_status(status: &str, error: Option<String>) -> Result<(), CatalogError> {
    if status == "ok" {
        Ok(())
    } else {
        Err(CatalogError::Api(
            error.unwrap_or_else(|| format!("status '{}'", status)),
        ))
    }
}

/// Parse the ready batch list.
pub fn parse_batch_list(body: &[u8]) -> Result<Vec<RemoteBatch>, CatalogError> {
    let resp: ListResponse = serde_json::from_slice(body)?;
    check_status(&resp.status, resp.error)?;
    Ok(resp.files)
}

/// Parse one batch's file details into items.
///
/// Anything but exactly one file entry yields no items.
pub fn parse_batch_items(body: &[u8]) -> Result<Vec<Item>, CatalogError> {
    let resp: DetailsResponse = serde_json::from_slice(body)?;
    check_status(&resp.status, resp.error)?;
    let mut files = resp.files;
    if files.len() != 1 {
        return Ok(Vec::new());
    }
    let details = files.remove(0);
    Ok(details
        .t_files
        .into_iter()
        .map(|f| Item::new(f.name, f.url_dl, f.size))
        .collect())
}

/// Furk.net API client.
#[derive(Debug, Clone)]
pub struct FurkCatalog {
    endpoint: Url,
    api_key: String,
}

impl FurkCatalog {
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> Result<Self, CatalogError> {
        let endpoint = Url::parse(endpoint).map_err(|e| CatalogError::Endpoint(e.to_string()))?;
        if endpoint.cannot_be_a_base() {
            return Err(CatalogError::Endpoint(endpoint.to_string()));
        }
        Ok(Self {
            endpoint,
            api_key: api_key.into(),
        })
    }

    /// `{endpoint}/file/get?api_key=..&pretty=1` plus `extra` query pairs.
    pub(crate) fn file_get_url(&self, extra: &[(&str, &str)]) -> Result<Url, CatalogError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::Endpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(["file", "get"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api_key", &self.api_key);
            query.append_pair("pretty", "1");
            for (k, v) in extra {
                query.append_pair(k, v);
            }
        }
        Ok(url)
    }

    fn fetch_items(&self, info_hash: &str) -> Result<Vec<Item>, CatalogError> {
        let url = self.file_get_url(&[("t_files", "1"), ("info_hash", info_hash)])?;
        parse_batch_items(&get_body(&url)?)
    }
}

impl CatalogProvider for FurkCatalog {
    fn fetch_batches(&self) -> CatalogFetch {
        let list = self
            .file_get_url(&[])
            .and_then(|url| get_body(&url))
            .and_then(|body| parse_batch_list(&body));
        let remote = match list {
            Ok(remote) => remote,
            Err(e) => return CatalogFetch::failed(e),
        };

        let mut fetch = CatalogFetch::default();
        for rb in remote {
            tracing::trace!("{} - {}", rb.name, rb.id);
            let items = match self.fetch_items(&rb.info_hash) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("cannot list files of '{}': {}", rb.name, e);
                    fetch.error = Some(e);
                    Vec::new()
                }
            };
            fetch.batches.push(Batch {
                id: rb.id,
                display_name: rb.name,
                total_size: rb.size,
                items,
            });
        }
        fetch
    }
}
