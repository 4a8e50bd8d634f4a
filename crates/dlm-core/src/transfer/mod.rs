//! Byte transfer of one item: transports and the per-item worker.
//!
//! A [`Transport`] performs the blocking byte copy from a source URI to a
//! local path and reports through a [`TransferMonitor`]; the async worker
//! drives it off the runtime, turns its result into a terminal status, and
//! records completions in the ledger.

mod error;
mod http;
mod simulate;
mod worker;

pub use error::TransferError;
pub use http::CurlTransport;
pub use simulate::SimulatedTransport;
pub use worker::{run_transfer, TransferOutcome};

use std::path::PathBuf;

/// What to fetch and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub source_uri: String,
    pub target_path: PathBuf,
    pub expected_length: u64,
}

/// Observer a transport reports to while bytes flow.
pub trait TransferMonitor: Send + Sync {
    /// Total bytes received so far for this transfer.
    fn on_received(&self, received_bytes: u64);

    /// Checked on every chunk and progress tick; false means abort now.
    fn is_alive(&self) -> bool;
}

/// Blocking byte mover. Called from a blocking worker thread.
pub trait Transport: Send + Sync {
    /// Stream `request.source_uri` into `request.target_path`, overwriting it.
    /// Returns the number of bytes written.
    fn fetch(
        &self,
        request: &TransferRequest,
        monitor: &dyn TransferMonitor,
    ) -> Result<u64, TransferError>;

    /// Simulated transports produce placeholders; their completions are not
    /// recorded in the ledger.
    fn is_simulated(&self) -> bool {
        false
    }
}
