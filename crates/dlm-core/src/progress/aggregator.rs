//! Live per-transfer and aggregate progress for one run.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::rolling_log::RollingLog;
use super::stats::TransferStats;
use super::{percentage, ProgressEvent};
use crate::model::{Identity, ItemStatus};

#[derive(Debug)]
struct Entry {
    display_name: String,
    expected_bytes: u64,
    received_bytes: u64,
    status: ItemStatus,
    started_at: Instant,
    finished_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<Identity, Entry>,
    /// Identities in the order they were first seen.
    order: Vec<Identity>,
    total_expected: u64,
    first_started: Option<Instant>,
}

impl State {
    fn entry_mut(&mut self, identity: &str, at: Instant) -> &mut Entry {
        if !self.entries.contains_key(identity) {
            self.order.push(identity.to_string());
            self.first_started.get_or_insert(at);
        }
        self.entries.entry(identity.to_string()).or_insert_with(|| Entry {
            display_name: identity.to_string(),
            expected_bytes: 0,
            received_bytes: 0,
            status: ItemStatus::Transferring,
            started_at: at,
            finished_at: None,
        })
    }

    /// Clock end for the aggregate: the last finish once nothing is in flight.
    fn run_end(&self, now: Instant) -> Instant {
        let in_flight = self
            .entries
            .values()
            .any(|e| e.status == ItemStatus::Transferring);
        if in_flight {
            return now;
        }
        self.entries
            .values()
            .filter_map(|e| e.finished_at)
            .max()
            .unwrap_or(now)
    }
}

/// View of one transfer at snapshot time.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSnapshot {
    pub identity: Identity,
    pub display_name: String,
    pub status: ItemStatus,
    pub received_bytes: u64,
    pub expected_bytes: u64,
    pub percentage: u8,
    pub throughput_bps: Option<f64>,
    pub eta_secs: Option<f64>,
}

/// View of the whole run at snapshot time.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateView {
    /// Every transfer seen this run, first-seen order.
    pub transfers: Vec<TransferSnapshot>,
    pub total_received: u64,
    pub total_expected: u64,
    pub percentage: f64,
    pub throughput_bps: Option<f64>,
    pub eta_secs: Option<f64>,
    pub elapsed_secs: f64,
    /// Most recent log lines, oldest first.
    pub recent_log: Vec<String>,
}

impl AggregateView {
    /// Transfers still in flight.
    pub fn active(&self) -> impl Iterator<Item = &TransferSnapshot> {
        self.transfers
            .iter()
            .filter(|t| t.status == ItemStatus::Transferring)
    }
}

/// Shared by every worker of a run (behind an `Arc`); all methods take `&self`.
#[derive(Debug, Default)]
pub struct ProgressAggregator {
    state: Mutex<State>,
    log: Mutex<RollingLog>,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn apply(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started {
                identity,
                display_name,
                expected_length,
            } => self.on_started(identity, display_name, *expected_length),
            ProgressEvent::Progress {
                identity,
                received_bytes,
                percentage,
            } => self.on_progress(identity, *received_bytes, *percentage),
            ProgressEvent::Finished { identity, status } => self.on_finished(identity, *status),
        }
    }

    /// Sum of expected lengths over the run's candidates.
    pub fn on_total_expected(&self, total: u64) {
        self.state().total_expected = total;
    }

    pub fn on_started(&self, identity: &str, display_name: &str, expected_length: u64) {
        self.on_started_at(identity, display_name, expected_length, Instant::now());
    }

    pub(crate) fn on_started_at(
        &self,
        identity: &str,
        display_name: &str,
        expected_length: u64,
        at: Instant,
    ) {
        let mut state = self.state();
        let entry = state.entry_mut(identity, at);
        entry.display_name = display_name.to_string();
        entry.expected_bytes = expected_length;
        entry.started_at = at;
    }

    /// Record received bytes. Unknown identities are tracked from now on.
    /// `percentage` is advisory; the snapshot recomputes it from the byte counts.
    pub fn on_progress(&self, identity: &str, received_bytes: u64, _percentage: u8) {
        let mut state = self.state();
        let entry = state.entry_mut(identity, Instant::now());
        entry.received_bytes = if entry.expected_bytes > 0 {
            received_bytes.min(entry.expected_bytes)
        } else {
            received_bytes
        };
    }

    pub fn on_finished(&self, identity: &str, status: ItemStatus) {
        self.on_finished_at(identity, status, Instant::now());
    }

    pub(crate) fn on_finished_at(&self, identity: &str, status: ItemStatus, at: Instant) {
        let mut state = self.state();
        let entry = state.entry_mut(identity, at);
        if entry.status.can_advance_to(status) {
            entry.status = status;
            entry.finished_at = Some(at);
        }
    }

    pub fn push_log(&self, line: impl Into<String>) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }

    pub fn snapshot(&self) -> AggregateView {
        self.snapshot_at(Instant::now())
    }

    pub(crate) fn snapshot_at(&self, now: Instant) -> AggregateView {
        let recent_log = self
            .log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_vec();
        let state = self.state();

        let transfers: Vec<TransferSnapshot> = state
            .order
            .iter()
            .filter_map(|id| state.entries.get(id).map(|e| (id, e)))
            .map(|(identity, e)| {
                let end = e.finished_at.unwrap_or(now);
                let stats = TransferStats {
                    received_bytes: e.received_bytes,
                    expected_bytes: e.expected_bytes,
                    elapsed_secs: end.saturating_duration_since(e.started_at).as_secs_f64(),
                };
                TransferSnapshot {
                    identity: identity.clone(),
                    display_name: e.display_name.clone(),
                    status: e.status,
                    received_bytes: e.received_bytes,
                    expected_bytes: e.expected_bytes,
                    percentage: percentage(e.received_bytes, e.expected_bytes),
                    throughput_bps: stats.bytes_per_sec(),
                    eta_secs: stats.eta_secs(),
                }
            })
            .collect();

        let total_received: u64 = state.entries.values().map(|e| e.received_bytes).sum();
        let end = state.run_end(now);
        let overall = TransferStats {
            received_bytes: total_received,
            expected_bytes: state.total_expected,
            elapsed_secs: state
                .first_started
                .map(|t| end.saturating_duration_since(t).as_secs_f64())
                .unwrap_or(0.0),
        };

        AggregateView {
            transfers,
            total_received,
            total_expected: state.total_expected,
            percentage: overall.percent(),
            throughput_bps: overall.bytes_per_sec(),
            eta_secs: overall.eta_secs(),
            elapsed_secs: overall.elapsed_secs,
            recent_log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn per_transfer_eta_math() {
        let agg = ProgressAggregator::new();
        let t0 = Instant::now();
        agg.on_total_expected(1000);
        agg.on_started_at("a", "a.mkv", 1000, t0);
        agg.on_progress("a", 500, 50);

        let view = agg.snapshot_at(t0 + Duration::from_secs(10));
        let a = &view.transfers[0];
        assert_eq!(a.percentage, 50);
        assert_eq!(a.throughput_bps, Some(50.0));
        assert_eq!(a.eta_secs, Some(10.0));
        assert_eq!(view.total_received, 500);
        assert_eq!(view.percentage, 50.0);
        assert_eq!(view.throughput_bps, Some(50.0));
    }

    #[test]
    fn zero_elapsed_reports_unknown() {
        let agg = ProgressAggregator::new();
        let t0 = Instant::now();
        agg.on_started_at("a", "a.mkv", 1000, t0);
        agg.on_progress("a", 10, 1);
        let view = agg.snapshot_at(t0);
        assert_eq!(view.transfers[0].throughput_bps, None);
        assert_eq!(view.transfers[0].eta_secs, None);
        assert_eq!(view.throughput_bps, None);
    }

    #[test]
    fn aggregate_sums_active_and_completed() {
        let agg = ProgressAggregator::new();
        let t0 = Instant::now();
        agg.on_total_expected(3000);
        agg.on_started_at("a", "a", 1000, t0);
        agg.on_started_at("b", "b", 2000, t0);
        agg.on_progress("a", 1000, 100);
        agg.on_finished("a", ItemStatus::Completed);
        agg.on_progress("b", 500, 25);

        let view = agg.snapshot_at(t0 + Duration::from_secs(5));
        assert_eq!(view.total_received, 1500);
        assert_eq!(view.percentage, 50.0);
        assert_eq!(view.throughput_bps, Some(300.0));
        assert_eq!(view.eta_secs, Some(5.0));
        let active: Vec<_> = view.active().map(|t| t.identity.as_str()).collect();
        assert_eq!(active, vec!["b"]);
    }

    #[test]
    fn aggregate_clock_stops_at_last_finish() {
        let agg = ProgressAggregator::new();
        let t0 = Instant::now();
        agg.on_total_expected(2000);
        agg.on_started_at("a", "a", 1000, t0);
        agg.on_started_at("b", "b", 1000, t0);
        agg.on_progress("a", 1000, 100);
        agg.on_progress("b", 1000, 100);
        agg.on_finished_at("a", ItemStatus::Completed, t0 + Duration::from_secs(4));
        agg.on_finished_at("b", ItemStatus::Completed, t0 + Duration::from_secs(10));

        let view = agg.snapshot_at(t0 + Duration::from_secs(100));
        assert_eq!(view.elapsed_secs, 10.0);
        assert_eq!(view.throughput_bps, Some(200.0));
        assert_eq!(view.percentage, 100.0);
    }

    #[test]
    fn aggregate_clock_runs_while_any_in_flight() {
        let agg = ProgressAggregator::new();
        let t0 = Instant::now();
        agg.on_started_at("a", "a", 10, t0);
        agg.on_started_at("b", "b", 10, t0);
        agg.on_finished_at("a", ItemStatus::Completed, t0 + Duration::from_secs(2));

        let view = agg.snapshot_at(t0 + Duration::from_secs(7));
        assert_eq!(view.elapsed_secs, 7.0);
    }

    #[test]
    fn empty_total_is_complete() {
        let agg = ProgressAggregator::new();
        let view = agg.snapshot();
        assert_eq!(view.percentage, 100.0);
        assert!(view.transfers.is_empty());
    }

    #[test]
    fn tolerates_progress_before_start_across_identities() {
        let agg = ProgressAggregator::new();
        agg.apply(&ProgressEvent::Progress {
            identity: "b".into(),
            received_bytes: 20,
            percentage: 0,
        });
        agg.apply(&ProgressEvent::Started {
            identity: "a".into(),
            display_name: "a.mkv".into(),
            expected_length: 100,
        });
        agg.apply(&ProgressEvent::Started {
            identity: "b".into(),
            display_name: "b.mkv".into(),
            expected_length: 40,
        });
        let view = agg.snapshot();
        let names: Vec<_> = view.transfers.iter().map(|t| t.display_name.as_str()).collect();
        assert_eq!(names, vec!["b.mkv", "a.mkv"]);
        assert_eq!(view.transfers[0].percentage, 50);
    }

    #[test]
    fn received_never_exceeds_expected() {
        let agg = ProgressAggregator::new();
        agg.on_started("a", "a", 100);
        agg.on_progress("a", 150, 100);
        assert_eq!(agg.snapshot().transfers[0].received_bytes, 100);
    }

    #[test]
    fn terminal_status_sticks() {
        let agg = ProgressAggregator::new();
        agg.on_started("a", "a", 10);
        agg.on_finished("a", ItemStatus::Failed);
        agg.on_finished("a", ItemStatus::Completed);
        assert_eq!(agg.snapshot().transfers[0].status, ItemStatus::Failed);
    }

    #[test]
    fn log_is_part_of_snapshot() {
        let agg = ProgressAggregator::new();
        for i in 0..7 {
            agg.push_log(format!("{i}"));
        }
        assert_eq!(agg.snapshot().recent_log, vec!["2", "3", "4", "5", "6"]);
    }
}
