//! Dry-run transport: creates an empty placeholder instead of touching the network.

use std::time::{Duration, Instant};

use super::{TransferError, TransferMonitor, TransferRequest, Transport};
use crate::storage::TargetFile;

const POLL: Duration = Duration::from_millis(50);

/// Holds its slot for `delay` (checking liveness) and writes a zero-byte file.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedTransport {
    delay: Duration,
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::with_delay(Duration::from_secs(1))
    }
}

impl SimulatedTransport {
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Transport for SimulatedTransport {
    fn fetch(
        &self,
        request: &TransferRequest,
        monitor: &dyn TransferMonitor,
    ) -> Result<u64, TransferError> {
        tracing::warn!("simulating download: {}", request.target_path.display());
        TargetFile::create(&request.target_path)?.sync()?;

        let deadline = Instant::now() + self.delay;
        loop {
            if !monitor.is_alive() {
                return Err(TransferError::Aborted);
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(POLL.min(deadline - now));
        }
        monitor.on_received(0);
        Ok(0)
    }

    fn is_simulated(&self) -> bool {
        true
    }
}
