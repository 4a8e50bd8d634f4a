use thiserror::Error;

use crate::model::Identity;

/// Internal invariant violations. Any of these ends the run.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("slot overflow: {active} active transfers with capacity {capacity}")]
    SlotOverflow { active: usize, capacity: usize },
    #[error("identity admitted twice: {0}")]
    DuplicateAdmission(Identity),
    #[error("slot pool closed")]
    SlotsClosed,
}
