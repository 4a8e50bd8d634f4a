//! Per-item transfer task.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use super::{TransferError, TransferMonitor, TransferRequest, Transport};
use crate::config::LogLevel;
use crate::context::RunContext;
use crate::model::{Identity, ItemStatus};
use crate::progress::{percentage, ProgressEvent};
use crate::selection::Candidate;

/// Minimum byte delta between two progress events when the percentage is unchanged.
const PROGRESS_STEP_BYTES: u64 = 256 * 1024;

/// Terminal result of one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub identity: Identity,
    pub status: ItemStatus,
    pub error: Option<String>,
}

impl TransferOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == ItemStatus::Completed
    }
}

/// Bridges transport callbacks to progress events. Drops events that would not
/// move the display.
struct WorkerMonitor {
    identity: Identity,
    expected_length: u64,
    ctx: RunContext,
    last_bytes: AtomicU64,
    last_percent: AtomicU8,
}

impl WorkerMonitor {
    fn new(identity: Identity, expected_length: u64, ctx: RunContext) -> Self {
        Self {
            identity,
            expected_length,
            ctx,
            last_bytes: AtomicU64::new(0),
            last_percent: AtomicU8::new(0),
        }
    }
}

impl TransferMonitor for WorkerMonitor {
    fn on_received(&self, received_bytes: u64) {
        let pct = percentage(received_bytes, self.expected_length);
        let last_pct = self.last_percent.load(Ordering::Relaxed);
        let last_bytes = self.last_bytes.load(Ordering::Relaxed);
        if pct == last_pct && received_bytes.saturating_sub(last_bytes) < PROGRESS_STEP_BYTES {
            return;
        }
        self.last_percent.store(pct, Ordering::Relaxed);
        self.last_bytes.store(received_bytes, Ordering::Relaxed);
        self.ctx.emit(ProgressEvent::Progress {
            identity: self.identity.clone(),
            received_bytes,
            percentage: pct,
        });
    }

    fn is_alive(&self) -> bool {
        self.ctx.is_alive()
    }
}

/// Transfer one candidate to completion or failure.
///
/// The blocking transport runs on the blocking pool. On success the identity is
/// recorded in the ledger (unless the transport is simulated) before the item
/// is reported `Completed`. Never panics; a panicking transport yields `Failed`.
pub async fn run_transfer(
    candidate: Candidate,
    transport: Arc<dyn Transport>,
    ctx: RunContext,
) -> TransferOutcome {
    let Candidate { item, target_path } = candidate;
    let identity = item.identity.clone();
    let display_name = item.display_name.clone();

    ctx.emit(ProgressEvent::Started {
        identity: identity.clone(),
        display_name: display_name.clone(),
        expected_length: item.expected_length,
    });
    tracing::debug!(
        "transfer {} -> {}",
        item.source_uri(),
        target_path.display()
    );

    let request = TransferRequest {
        source_uri: item.source_uri().to_string(),
        target_path,
        expected_length: item.expected_length,
    };
    let monitor = WorkerMonitor::new(identity.clone(), item.expected_length, ctx.clone());
    let blocking = transport.clone();
    let result = tokio::task::spawn_blocking(move || blocking.fetch(&request, &monitor))
        .await
        .map_err(|e| TransferError::Task(e.to_string()))
        .and_then(|r| r);

    match result {
        Ok(received) => {
            if !transport.is_simulated() {
                if let Err(e) = ctx.ledger.add(&identity).await {
                    ctx.log_line(
                        LogLevel::Warn,
                        format!("Could not record {} as downloaded: {:#}", display_name, e),
                    );
                }
            }
            ctx.emit(ProgressEvent::Progress {
                identity: identity.clone(),
                received_bytes: received,
                percentage: percentage(received, item.expected_length),
            });
            ctx.emit(ProgressEvent::Finished {
                identity: identity.clone(),
                status: ItemStatus::Completed,
            });
            ctx.log_line(
                LogLevel::Info,
                format!("Finished downloading: {}", display_name),
            );
            ctx.sink.on_completion_notify(&identity, &display_name);
            TransferOutcome {
                identity,
                status: ItemStatus::Completed,
                error: None,
            }
        }
        Err(e) => {
            if e.is_aborted() {
                ctx.log_line(
                    LogLevel::Warn,
                    format!("Program closed, download aborted: {}", display_name),
                );
            } else {
                ctx.log_line(
                    LogLevel::Error,
                    format!("Download failed: {}: {}", display_name, e),
                );
            }
            ctx.emit(ProgressEvent::Finished {
                identity: identity.clone(),
                status: ItemStatus::Failed,
            });
            TransferOutcome {
                identity,
                status: ItemStatus::Failed,
                error: Some(e.to_string()),
            }
        }
    }
}
