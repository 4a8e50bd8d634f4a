//! Per-run context handed to every component that reports progress.
//!
//! Built once per run and passed by reference (cloned into worker tasks);
//! there is no global UI/state object.

use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::config::LogLevel;
use crate::control::Liveness;
use crate::ledger::Ledger;
use crate::model::Identity;
use crate::progress::{ProgressAggregator, ProgressEvent};

/// Display/notification side of the process. Every call is fire-and-forget.
pub trait PresentationSink: Send + Sync {
    /// Extra liveness gate; a sink that cannot render any more returns false.
    fn is_alive(&self) -> bool {
        true
    }

    fn on_progress_event(&self, _event: &ProgressEvent) {}

    fn on_log_line(&self, _line: &str) {}

    fn on_completion_notify(&self, _identity: &Identity, _display_name: &str) {}
}

/// Sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {}

#[derive(Clone)]
pub struct RunContext {
    pub ledger: Ledger,
    pub progress: Arc<ProgressAggregator>,
    pub sink: Arc<dyn PresentationSink>,
    pub liveness: Liveness,
}

impl RunContext {
    pub fn new(
        ledger: Ledger,
        progress: Arc<ProgressAggregator>,
        sink: Arc<dyn PresentationSink>,
        liveness: Liveness,
    ) -> Self {
        Self {
            ledger,
            progress,
            sink,
            liveness,
        }
    }

    /// False once shutdown was requested, the heartbeat lapsed, or the sink gave up.
    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive() && self.sink.is_alive()
    }

    /// Feed an event to the aggregator and the sink.
    pub fn emit(&self, event: ProgressEvent) {
        self.progress.apply(&event);
        self.sink.on_progress_event(&event);
    }

    /// Log through `tracing` and append the line to the rolling display log.
    pub fn log_line(&self, level: LogLevel, message: impl AsRef<str>) {
        let message = message.as_ref();
        match level {
            LogLevel::Trace => tracing::trace!("{}", message),
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }
        let line = format_log_line(Local::now(), level, message);
        self.sink.on_log_line(&line);
        self.progress.push_log(line);
    }
}

/// `[HH:MM:SS] [LVL]: message`, local wall clock.
pub fn format_log_line(at: DateTime<Local>, level: LogLevel, message: &str) -> String {
    format!("[{}] [{}]: {}", at.format("%H:%M:%S"), level.tag(), message)
}

#[cfg(test)]
pub(crate) async fn test_context() -> RunContext {
    let ledger = crate::ledger::open_memory().await.unwrap();
    RunContext::new(
        ledger,
        Arc::new(ProgressAggregator::new()),
        Arc::new(NullSink),
        Liveness::new(),
    )
}
