//! Per-transfer failure type.

use thiserror::Error;

/// Why one transfer failed. Every variant leaves the item `Failed`; nothing is retried.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Curl reported an error (timeout, connection, TLS, ...).
    #[error("{0}")]
    Transport(#[from] curl::Error),
    /// Response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Transfer ended with a different byte count than the catalog announced.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// Local write failed (disk full, permission denied, ...).
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    /// The process stopped being alive mid-transfer.
    #[error("transfer aborted: process is shutting down")]
    Aborted,
    /// The blocking transfer task panicked or was cancelled.
    #[error("transfer task failed: {0}")]
    Task(String),
}

impl TransferError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, TransferError::Aborted)
    }
}
