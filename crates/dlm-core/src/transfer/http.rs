//! Single-stream HTTP GET transport.
//!
//! Writes the response body sequentially to the target file, reports the
//! running byte count after every chunk, and aborts as soon as the monitor
//! reports the process is no longer alive.

use std::cell::Cell;
use std::time::Duration;

use super::{TransferError, TransferMonitor, TransferRequest, Transport};
use crate::storage::TargetFile;

/// Curl easy-handle transport with low-speed detection instead of a hard timeout.
#[derive(Debug, Clone, Copy)]
pub struct CurlTransport {
    pub connect_timeout: Duration,
    /// Abort when throughput stays below this many bytes/s ...
    pub low_speed_limit: u32,
    /// ... for this long.
    pub low_speed_time: Duration,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
        }
    }
}

impl Transport for CurlTransport {
    fn fetch(
        &self,
        request: &TransferRequest,
        monitor: &dyn TransferMonitor,
    ) -> Result<u64, TransferError> {
        let mut target = TargetFile::create(&request.target_path)?;

        let mut easy = curl::easy::Easy::new();
        easy.url(&request.source_uri)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.fail_on_error(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.low_speed_limit(self.low_speed_limit)?;
        easy.low_speed_time(self.low_speed_time)?;
        // Enables the progress callback, which is where stalled transfers notice shutdown.
        easy.progress(true)?;

        let aborted = Cell::new(false);
        let mut storage_error: Option<std::io::Error> = None;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                if !monitor.is_alive() {
                    aborted.set(true);
                    return Ok(0);
                }
                match target.append(data) {
                    Ok(()) => {
                        monitor.on_received(target.written());
                        Ok(data.len())
                    }
                    Err(e) => {
                        storage_error = Some(e);
                        Ok(0)
                    }
                }
            })?;
            transfer.progress_function(|_, _, _, _| {
                if monitor.is_alive() {
                    true
                } else {
                    aborted.set(true);
                    false
                }
            })?;
            transfer.perform()
        };

        if let Err(e) = performed {
            if aborted.get() {
                return Err(TransferError::Aborted);
            }
            if e.is_write_error() {
                if let Some(io_err) = storage_error.take() {
                    return Err(TransferError::Storage(io_err));
                }
            }
            if e.is_http_returned_error() {
                let code = easy.response_code()?;
                return Err(TransferError::Http(code));
            }
            return Err(TransferError::Transport(e));
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(TransferError::Http(code));
        }

        let received = target.written();
        if request.expected_length > 0 && received != request.expected_length {
            return Err(TransferError::PartialTransfer {
                expected: request.expected_length,
                received,
            });
        }
        target.sync()?;
        Ok(received)
    }
}
