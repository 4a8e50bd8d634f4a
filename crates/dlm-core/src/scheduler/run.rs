//! One scheduler run: dispatch every candidate, then wait for the transfers to drain.

use std::sync::Arc;

use tokio::task::JoinSet;

use super::{SchedulerError, SlotPool};
use crate::context::RunContext;
use crate::model::{Identity, ItemStatus};
use crate::selection::Candidate;
use crate::transfer::{run_transfer, TransferOutcome, Transport};

/// What happened to each candidate handed to [`TransferScheduler::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub completed: Vec<Identity>,
    pub failed: Vec<(Identity, String)>,
    /// Never started because the process stopped being alive.
    pub not_dispatched: Vec<Identity>,
    pub peak_active: usize,
}

impl RunReport {
    fn record(&mut self, outcome: TransferOutcome) {
        match outcome.status {
            ItemStatus::Completed => self.completed.push(outcome.identity),
            _ => self.failed.push((
                outcome.identity,
                outcome.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }
}

/// Single-use scheduler. Holds no state beyond one run.
pub struct TransferScheduler {
    slots: SlotPool,
    transport: Arc<dyn Transport>,
}

impl TransferScheduler {
    pub fn new(max_concurrent: usize, transport: Arc<dyn Transport>) -> Self {
        Self {
            slots: SlotPool::new(max_concurrent),
            transport,
        }
    }

    /// Dispatch `candidates` in order, at most `max_concurrent` at a time.
    ///
    /// Returns once every candidate was dispatched (or skipped after liveness
    /// dropped) and every started transfer reached a terminal state. Transfer
    /// failures are reported in the [`RunReport`]; only a broken slot
    /// invariant yields an error.
    pub async fn run(
        self,
        candidates: Vec<Candidate>,
        ctx: &RunContext,
    ) -> Result<RunReport, SchedulerError> {
        let total: u64 = candidates.iter().map(|c| c.item.expected_length).sum();
        ctx.progress.on_total_expected(total);
        tracing::debug!(
            "scheduling {} transfers, {} slots",
            candidates.len(),
            self.slots.capacity()
        );

        let mut report = RunReport::default();
        let mut join_set = JoinSet::new();

        for candidate in candidates {
            if !ctx.is_alive() {
                report.not_dispatched.push(candidate.item.identity);
                continue;
            }
            let guard = self.slots.acquire(&candidate.item.identity).await?;
            // Slot waits can be long; liveness may have changed meanwhile.
            if !ctx.is_alive() {
                drop(guard);
                report.not_dispatched.push(candidate.item.identity);
                continue;
            }

            let identity = candidate.item.identity.clone();
            let transport = Arc::clone(&self.transport);
            let ctx = ctx.clone();
            join_set.spawn(async move {
                let _slot = guard;
                let progress = Arc::clone(&ctx.progress);
                match tokio::spawn(run_transfer(candidate, transport, ctx)).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        progress.on_finished(&identity, ItemStatus::Failed);
                        TransferOutcome {
                            identity,
                            status: ItemStatus::Failed,
                            error: Some(format!("transfer task failed: {}", e)),
                        }
                    }
                }
            });

            while let Some(done) = join_set.try_join_next() {
                collect(&mut report, done);
            }
        }

        while let Some(done) = join_set.join_next().await {
            collect(&mut report, done);
        }

        report.peak_active = self.slots.peak();
        if !report.not_dispatched.is_empty() {
            tracing::warn!(
                "{} downloads not started: program closed",
                report.not_dispatched.len()
            );
        }
        Ok(report)
    }
}

fn collect(report: &mut RunReport, done: Result<TransferOutcome, tokio::task::JoinError>) {
    match done {
        Ok(outcome) => report.record(outcome),
        Err(e) => tracing::error!("transfer supervisor task failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use crate::model::Item;
    use crate::transfer::{TransferError, TransferMonitor, TransferRequest};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records concurrency and start order; fails targets whose name starts with "bad".
    #[derive(Default)]
    struct CountingTransport {
        current: AtomicUsize,
        max_seen: AtomicUsize,
        started: Mutex<Vec<String>>,
    }

    impl Transport for CountingTransport {
        fn fetch(
            &self,
            request: &TransferRequest,
            monitor: &dyn TransferMonitor,
        ) -> Result<u64, TransferError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);
            self.started
                .lock()
                .unwrap()
                .push(request.source_uri.clone());
            std::thread::sleep(Duration::from_millis(20));
            self.current.fetch_sub(1, Ordering::SeqCst);

            let name = request.target_path.file_name().unwrap().to_string_lossy();
            if name.starts_with("bad") {
                return Err(TransferError::Http(500));
            }
            monitor.on_received(request.expected_length);
            Ok(request.expected_length)
        }
    }

    fn candidates(dir: &Path, names: &[&str]) -> Vec<Candidate> {
        names
            .iter()
            .map(|n| Candidate {
                item: Item::new(*n, format!("https://dl.example/{}", n), 10),
                target_path: dir.join(n),
            })
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_never_exceeds_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context().await;
        let transport = Arc::new(CountingTransport::default());
        let names = ["a", "b", "c", "d", "e", "f", "g"];

        let report = TransferScheduler::new(2, transport.clone())
            .run(candidates(dir.path(), &names), &ctx)
            .await
            .unwrap();

        assert_eq!(report.completed.len(), names.len());
        assert!(transport.max_seen.load(Ordering::SeqCst) <= 2);
        assert!(report.peak_active <= 2);
        assert_eq!(ctx.ledger.len(), names.len());
        assert_eq!(ctx.progress.snapshot().total_expected, 70);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn single_slot_runs_in_fifo_order() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context().await;
        let transport = Arc::new(CountingTransport::default());

        let report = TransferScheduler::new(1, transport.clone())
            .run(candidates(dir.path(), &["c", "a", "b"]), &ctx)
            .await
            .unwrap();

        assert_eq!(transport.max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(report.peak_active, 1);
        assert_eq!(
            *transport.started.lock().unwrap(),
            vec![
                "https://dl.example/c",
                "https://dl.example/a",
                "https://dl.example/b"
            ]
        );
        assert_eq!(
            report.completed,
            vec![
                "https://dl.example/c",
                "https://dl.example/a",
                "https://dl.example/b"
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn one_failure_does_not_stop_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context().await;

        let report = TransferScheduler::new(2, Arc::new(CountingTransport::default()))
            .run(candidates(dir.path(), &["a", "bad", "c"]), &ctx)
            .await
            .unwrap();

        assert_eq!(report.completed.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "https://dl.example/bad");
        assert_eq!(report.failed[0].1, "HTTP 500");
        assert!(!ctx.ledger.contains("https://dl.example/bad"));
    }

    #[tokio::test]
    async fn empty_run_returns_immediately() {
        let ctx = test_context().await;
        let report = TransferScheduler::new(3, Arc::new(CountingTransport::default()))
            .run(Vec::new(), &ctx)
            .await
            .unwrap();
        assert_eq!(report, RunReport::default());
    }

    /// Requests shutdown on its first transfer, then behaves like an aborted transport.
    struct ShutdownTransport {
        liveness: crate::control::Liveness,
    }

    impl Transport for ShutdownTransport {
        fn fetch(
            &self,
            _request: &TransferRequest,
            monitor: &dyn TransferMonitor,
        ) -> Result<u64, TransferError> {
            self.liveness.request_shutdown();
            if monitor.is_alive() {
                Ok(0)
            } else {
                Err(TransferError::Aborted)
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_aborts_in_flight_and_stops_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context().await;
        let transport = Arc::new(ShutdownTransport {
            liveness: ctx.liveness.clone(),
        });

        let report = TransferScheduler::new(1, transport)
            .run(candidates(dir.path(), &["a", "b", "c"]), &ctx)
            .await
            .unwrap();

        assert!(report.completed.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(
            report.not_dispatched,
            vec!["https://dl.example/b", "https://dl.example/c"]
        );
        assert!(ctx.ledger.is_empty());
    }
}
