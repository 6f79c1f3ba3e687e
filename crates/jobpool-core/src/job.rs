//! The `Dispatch` trait and the `Job` handle wrapper
//!
//! Clients hand the pool reference-counted dispatchables (`Arc<dyn Dispatch>`).
//! The pool never stores them bare: every queue entry, timer entry and
//! in-flight dispatch goes through a `Job`, a cheap clonable wrapper that
//! carries the dispatchable's identity for equality and revocation.

use std::fmt;
use std::sync::Arc;

use crate::id::JobId;
use crate::queue::HandleQueue;

/// A unit of work supplied by a client
///
/// `dispatch()` is called exactly once per successful submission, on
/// whichever executor thread extracts the job from the handle queue.
/// Implementations manage their own failures; a panic escaping `dispatch()`
/// is a fault that takes the process down.
pub trait Dispatch: Send + Sync {
    /// Execute the unit of work
    fn dispatch(&self);
}

/// Handle wrapper around a shared dispatchable
///
/// Two jobs are equal iff they wrap the same underlying allocation; the
/// allocation address doubles as the [`JobId`] revocation key. Clones share
/// ownership of the dispatchable.
#[derive(Clone)]
pub struct Job {
    handle: Arc<dyn Dispatch>,
}

impl Job {
    /// Wrap a dispatchable in a job handle
    pub fn new(handle: Arc<dyn Dispatch>) -> Self {
        Self { handle }
    }

    /// Stable identity of the wrapped dispatchable
    ///
    /// Valid for the lifetime of the allocation, i.e. as long as any clone
    /// of the originating `Arc` is alive.
    #[inline]
    pub fn identity(&self) -> JobId {
        JobId::new(Arc::as_ptr(&self.handle) as *const () as u64)
    }

    /// Invoke the dispatchable exactly once
    ///
    /// Consumes the job so the pool's reference is released as soon as the
    /// dispatch returns.
    pub fn dispatch(self) {
        self.handle.dispatch();
    }

    /// Timer expiry: hand the job over to the handle queue
    ///
    /// Consumes the job; the timer's reference moves into the queue. The
    /// entry is single-shot, nothing is rescheduled.
    pub fn on_timer_fire(self, queue: &HandleQueue) {
        let _ = queue.insert(self);
    }
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Job {}

impl std::hash::Hash for Job {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").field("id", &self.identity()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    impl Dispatch for Counter {
        fn dispatch(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_identity_stable_across_clones() {
        let job = Job::new(Arc::new(Counter(AtomicUsize::new(0))));
        let copy = job.clone();

        assert_eq!(job.identity(), copy.identity());
        assert_eq!(job, copy);
    }

    #[test]
    fn test_distinct_dispatchables_distinct_identity() {
        let a = Job::new(Arc::new(Counter(AtomicUsize::new(0))));
        let b = Job::new(Arc::new(Counter(AtomicUsize::new(0))));

        assert_ne!(a.identity(), b.identity());
        assert_ne!(a, b);
    }

    #[test]
    fn test_dispatch_releases_reference() {
        let target = Arc::new(Counter(AtomicUsize::new(0)));
        let job = Job::new(target.clone());

        assert_eq!(Arc::strong_count(&target), 2);
        job.dispatch();
        assert_eq!(Arc::strong_count(&target), 1);
        assert_eq!(target.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_timer_fire_moves_into_queue() {
        let target = Arc::new(Counter(AtomicUsize::new(0)));
        let job = Job::new(target.clone());
        let queue = HandleQueue::new();
        queue.enable();

        job.on_timer_fire(&queue);

        assert_eq!(queue.len(), 1);
        assert_eq!(Arc::strong_count(&target), 2);
        assert_eq!(target.0.load(Ordering::SeqCst), 0);
    }
}
