//! Progress reporting for transfers (bytes received, throughput, ETA).
//!
//! Workers emit [`ProgressEvent`]s; the [`ProgressAggregator`] folds them into
//! per-transfer and overall views that a display can poll with `snapshot()`.
//! Events for different identities may arrive in any order.

mod aggregator;
mod rolling_log;
mod stats;

pub use aggregator::{AggregateView, ProgressAggregator, TransferSnapshot};
pub use rolling_log::{RollingLog, ROLLING_LOG_CAPACITY};
pub use stats::TransferStats;

use crate::model::{Identity, ItemStatus};

/// Transport-neutral progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started {
        identity: Identity,
        display_name: String,
        expected_length: u64,
    },
    Progress {
        identity: Identity,
        received_bytes: u64,
        percentage: u8,
    },
    Finished {
        identity: Identity,
        status: ItemStatus,
    },
}

impl ProgressEvent {
    pub fn identity(&self) -> &str {
        match self {
            ProgressEvent::Started { identity, .. }
            | ProgressEvent::Progress { identity, .. }
            | ProgressEvent::Finished { identity, .. } => identity,
        }
    }
}

/// Whole-number completion percentage in `0..=100`. An empty expected length
/// counts as complete.
pub fn percentage(received: u64, expected: u64) -> u8 {
    if expected == 0 {
        return 100;
    }
    let pct = (received as u128 * 100) / expected as u128;
    pct.min(100) as u8
}
