//! Timer subsystem
//!
//! A single dedicated thread owns an ordered collection of (absolute-time,
//! job) entries. Expired entries are handed to a sink, which in the worker
//! pool feeds the handle queue.
//!
//! # Architecture
//!
//! ```text
//!   schedule(at, job) ──┐
//!                       ▼
//!               ┌───────────────┐   wake on earlier head
//!               │ ScheduleStore │◄──────────────────────┐
//!               └───────────────┘                       │
//!                       │ claim due entry               │
//!                       ▼                               │
//!                 timer thread ──fire──► sink(job) ──► HandleQueue
//! ```
//!
//! # Revocation race
//!
//! The timer thread claims a due entry under the store lock and fires it
//! outside the lock. `revoke` therefore either removes the entry before the
//! claim (and the job never fires) or misses it because the claim already
//! happened; there is no window where both observe the entry.

mod entry;
mod store;
mod worker;

pub use entry::TimerKey;
pub use store::{ScheduleStats, ScheduleStore};
pub use worker::{spawn_timer_thread, TimerThreadHandle};

use std::sync::Arc;
use std::time::Instant;

use jobpool_core::Job;

/// Handle over the ordered store and its dedicated thread
///
/// Dropping the timer shuts the thread down; entries still parked in the
/// store are dropped with it, releasing their job references.
pub struct Timer {
    store: Arc<ScheduleStore>,
    worker: Option<TimerThreadHandle>,
}

impl Timer {
    /// Start the timer thread; expired jobs are passed to `sink`
    pub fn start<F>(sink: F, thread_name: &str, stack_size: Option<usize>) -> Self
    where
        F: Fn(Job) + Send + 'static,
    {
        let store = Arc::new(ScheduleStore::new());
        let worker = spawn_timer_thread(store.clone(), sink, thread_name, stack_size);

        Self {
            store,
            worker: Some(worker),
        }
    }

    /// Park a job until the absolute time `at`
    ///
    /// Wakes the timer thread when the new entry precedes the current head.
    pub fn schedule(&self, at: Instant, job: Job) {
        self.store.schedule(at, job);
    }

    /// Remove the first parked entry wrapping the same dispatchable
    ///
    /// Returns whether an entry was removed. `false` also covers the case
    /// where the timer thread already claimed the entry; callers then check
    /// the queue and the executor slots.
    pub fn revoke(&self, job: &Job) -> bool {
        self.store.revoke(job)
    }

    /// OS identity of the timer thread
    pub fn thread_id(&self) -> u64 {
        self.worker.as_ref().map_or(0, |w| w.thread_id())
    }

    /// Number of parked entries
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if no entries are parked
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Lifetime schedule/fire/revoke counters
    pub fn stats(&self) -> ScheduleStats {
        self.store.stats()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.store.shutdown();
        if let Some(worker) = self.worker.take() {
            worker.join();
        }
    }
}
