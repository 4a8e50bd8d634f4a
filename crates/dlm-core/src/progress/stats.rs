//! Throughput and ETA math for one transfer or for a whole run.

/// Bytes received against bytes expected over an elapsed time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferStats {
    pub received_bytes: u64,
    pub expected_bytes: u64,
    pub elapsed_secs: f64,
}

impl TransferStats {
    /// Bytes per second, or `None` while no time has elapsed.
    pub fn bytes_per_sec(&self) -> Option<f64> {
        if self.elapsed_secs <= 0.0 {
            return None;
        }
        Some(self.received_bytes as f64 / self.elapsed_secs)
    }

    /// Seconds remaining at the current rate. `Some(0.0)` when done, `None`
    /// when the rate is unknown or zero.
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.expected_bytes.saturating_sub(self.received_bytes);
        if remaining == 0 {
            return Some(0.0);
        }
        match self.bytes_per_sec() {
            Some(rate) if rate > 0.0 => Some(remaining as f64 / rate),
            _ => None,
        }
    }

    /// Percent complete in `[0.0, 100.0]`; an empty total counts as complete.
    pub fn percent(&self) -> f64 {
        if self.expected_bytes == 0 {
            return 100.0;
        }
        (100.0 * self.received_bytes as f64 / self.expected_bytes as f64).min(100.0)
    }
}
