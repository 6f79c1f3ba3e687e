//! Self-submitting dispatcher
//!
//! Adapter that wraps a client implementation and enforces at most one
//! outstanding submission per logical job. `submit()` calls are coalesced
//! while a submission is pending: intermediate triggers are lost, but every
//! trigger is eventually followed by at least one dispatch of the wrapped
//! implementation (edge-triggered, level-latched).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use jobpool_core::{Dispatch, Job};

use crate::pool::WorkerPool;

/// Latch shared between the dispatcher handle and the pool's queue entries
struct Coalesced<I> {
    submitted: AtomicBool,
    implementation: I,
}

impl<I: Dispatch> Dispatch for Coalesced<I> {
    fn dispatch(&self) {
        // Clear the latch before running the implementation, so a dispatch
        // that triggers its own wrapper enqueues a fresh submission instead
        // of being swallowed. A failed exchange means the handle was
        // dropped and this queue entry is stale.
        if self
            .submitted
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.implementation.dispatch();
        }
    }
}

/// Handle wrapping a client implementation for coalesced submission
///
/// The handle owns the implementation; the pool's queue and timer only ever
/// hold the internal latch object, so dropping the handle is what ends the
/// logical job: the drop clears the latch and revokes any outstanding copy,
/// waiting for an in-flight dispatch to finish.
pub struct SelfSubmittingDispatcher<I: Dispatch + 'static> {
    pool: Arc<WorkerPool>,
    inner: Arc<Coalesced<I>>,
}

impl<I: Dispatch + 'static> SelfSubmittingDispatcher<I> {
    /// Wrap `implementation` for submission into `pool`
    pub fn new(pool: Arc<WorkerPool>, implementation: I) -> Self {
        Self {
            pool,
            inner: Arc::new(Coalesced {
                submitted: AtomicBool::new(false),
                implementation,
            }),
        }
    }

    /// Trigger a dispatch of the wrapped implementation
    ///
    /// No-op while a submission is already outstanding; the pending
    /// dispatch covers this trigger too.
    pub fn submit(&self) {
        if self
            .inner
            .submitted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.pool.submit(self.job());
        }
    }

    /// Trigger a dispatch at the absolute time `at`
    pub fn schedule(&self, at: Instant) {
        if self
            .inner
            .submitted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.pool.schedule(at, self.job());
        }
    }

    /// The queue-side view of this dispatcher
    ///
    /// Identity is stable for the lifetime of the handle.
    pub fn job(&self) -> Job {
        Job::new(self.inner.clone())
    }

    /// Access the wrapped implementation
    pub fn implementation(&self) -> &I {
        &self.inner.implementation
    }
}

impl<I: Dispatch + 'static> Drop for SelfSubmittingDispatcher<I> {
    fn drop(&mut self) {
        self.inner.submitted.store(false, Ordering::Release);
        let _ = self.pool.revoke(&self.job(), None);
    }
}
