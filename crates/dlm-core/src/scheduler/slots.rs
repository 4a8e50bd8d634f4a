//! Bounded pool of transfer slots.
//!
//! A permit is the right to run one transfer. The active map mirrors the
//! permits handed out and is checked against capacity on every admission.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::SchedulerError;
use crate::model::Identity;

struct Inner {
    capacity: usize,
    semaphore: Arc<Semaphore>,
    active: Mutex<HashMap<Identity, Instant>>,
    peak: AtomicUsize,
}

#[derive(Clone)]
pub struct SlotPool {
    inner: Arc<Inner>,
}

impl SlotPool {
    /// Pool with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Inner {
                capacity,
                semaphore: Arc::new(Semaphore::new(capacity)),
                active: Mutex::new(HashMap::new()),
                peak: AtomicUsize::new(0),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Wait for a free slot and register `identity` as active.
    pub async fn acquire(&self, identity: &str) -> Result<SlotGuard, SchedulerError> {
        let permit = Arc::clone(&self.inner.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| SchedulerError::SlotsClosed)?;

        let mut active = self
            .inner
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if active.contains_key(identity) {
            return Err(SchedulerError::DuplicateAdmission(identity.to_string()));
        }
        if active.len() >= self.inner.capacity {
            return Err(SchedulerError::SlotOverflow {
                active: active.len() + 1,
                capacity: self.inner.capacity,
            });
        }
        active.insert(identity.to_string(), Instant::now());
        self.inner.peak.fetch_max(active.len(), Ordering::Relaxed);

        Ok(SlotGuard {
            pool: Arc::clone(&self.inner),
            identity: identity.to_string(),
            _permit: permit,
        })
    }

    pub fn active_count(&self) -> usize {
        self.inner
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Highest number of simultaneously active slots seen.
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::Relaxed)
    }
}

/// Held for the lifetime of one transfer; releases the slot when dropped.
pub struct SlotGuard {
    pool: Arc<Inner>,
    identity: Identity,
    _permit: OwnedSemaphorePermit,
}

impl SlotGuard {
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        // The map entry goes before the permit (dropped after this body).
        self.pool
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.identity);
    }
}
