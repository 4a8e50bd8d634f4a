//! Process-wide liveness: one flag that halts new dispatch and tells in-flight
//! transfers to abort.
//!
//! Liveness combines an explicit shutdown request (e.g. Ctrl-C) with an
//! optional heartbeat. When a heartbeat is configured, the display side calls
//! [`Liveness::beat`] on every render tick and the process counts as dead once
//! no beat arrived within the timeout.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Heartbeat {
    origin: Instant,
    last_beat_ms: AtomicU64,
    timeout: Duration,
}

impl Heartbeat {
    fn elapsed_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn is_fresh(&self) -> bool {
        let since = self
            .elapsed_ms()
            .saturating_sub(self.last_beat_ms.load(Ordering::Acquire));
        Duration::from_millis(since) < self.timeout
    }
}

#[derive(Debug, Default)]
struct LivenessInner {
    shutdown: AtomicBool,
    heartbeat: Option<Heartbeat>,
}

/// Cloneable handle; all clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct Liveness {
    inner: Arc<LivenessInner>,
}

impl Liveness {
    /// Alive until `request_shutdown` is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Alive while beats keep arriving within `timeout` and no shutdown was requested.
    /// Counts as freshly beaten at creation.
    pub fn with_heartbeat(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(LivenessInner {
                shutdown: AtomicBool::new(false),
                heartbeat: Some(Heartbeat {
                    origin: Instant::now(),
                    last_beat_ms: AtomicU64::new(0),
                    timeout,
                }),
            }),
        }
    }

    /// Record a keep-alive from the display side. No-op without a heartbeat.
    pub fn beat(&self) {
        if let Some(hb) = &self.inner.heartbeat {
            hb.last_beat_ms.store(hb.elapsed_ms(), Ordering::Release);
        }
    }

    /// Stop dispatching and abort in-flight transfers.
    pub fn request_shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Release);
    }

    pub fn is_alive(&self) -> bool {
        if self.inner.shutdown.load(Ordering::Acquire) {
            return false;
        }
        self.inner
            .heartbeat
            .as_ref()
            .map(Heartbeat::is_fresh)
            .unwrap_or(true)
    }
}
