//! FIFO admission of candidates into a bounded number of concurrent transfers.

mod error;
mod run;
mod slots;

pub use error::SchedulerError;
pub use run::{RunReport, TransferScheduler};
pub use slots::{SlotGuard, SlotPool};
