//! Ordered schedule store
//!
//! A `BTreeMap` keyed by (deadline, sequence) holds parked jobs in firing
//! order. Revocation must remove exactly the first entry wrapping a given
//! dispatchable, which rules out lazy-cancellation tricks; the map gives
//! ordered iteration for the identity walk and O(log n) removal.
//!
//! The store owns the condvar the timer thread sleeps on: `schedule` only
//! signals when the new entry becomes the head, `shutdown` wakes the thread
//! for good.

use std::collections::BTreeMap;
use std::sync::{Condvar, Mutex};
use std::time::Instant;

use jobpool_core::Job;

use crate::timer::entry::TimerKey;

struct StoreInner {
    entries: BTreeMap<TimerKey, Job>,
    shutdown: bool,

    // Lifetime counters
    scheduled: u64,
    fired: u64,
    revoked: u64,
}

/// Ordered collection of parked jobs, shared between producers and the
/// timer thread
pub struct ScheduleStore {
    inner: Mutex<StoreInner>,
    changed: Condvar,
}

impl ScheduleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                entries: BTreeMap::new(),
                shutdown: false,
                scheduled: 0,
                fired: 0,
                revoked: 0,
            }),
            changed: Condvar::new(),
        }
    }

    /// Insert an entry; wakes the timer thread if it becomes the new head
    pub fn schedule(&self, due: Instant, job: Job) {
        let mut inner = self.inner.lock().unwrap();
        let new_head = inner
            .entries
            .keys()
            .next()
            .map_or(true, |head| due < head.due);

        inner.entries.insert(TimerKey::next(due), job);
        inner.scheduled += 1;
        drop(inner);

        if new_head {
            self.changed.notify_one();
        }
    }

    /// Remove the first entry wrapping the same dispatchable
    ///
    /// "First" is in firing order. Returns whether an entry was removed.
    pub fn revoke(&self, job: &Job) -> bool {
        let id = job.identity();
        let mut inner = self.inner.lock().unwrap();

        let key = inner
            .entries
            .iter()
            .find(|(_, parked)| parked.identity() == id)
            .map(|(key, _)| *key);

        match key {
            Some(key) => {
                inner.entries.remove(&key);
                inner.revoked += 1;
                true
            }
            None => false,
        }
    }

    /// Block until the next entry is due, then claim it
    ///
    /// Returns `None` when the store has been shut down. The claim happens
    /// under the store lock; a revoker that arrives later misses the entry.
    pub fn wait_next(&self) -> Option<Job> {
        let mut inner = self.inner.lock().unwrap();

        loop {
            if inner.shutdown {
                return None;
            }

            let now = Instant::now();
            match inner.entries.keys().next().copied() {
                None => {
                    inner = self.changed.wait(inner).unwrap();
                }
                Some(head) if head.due <= now => {
                    let job = inner.entries.remove(&head).unwrap();
                    inner.fired += 1;
                    return Some(job);
                }
                Some(head) => {
                    let timeout = head.due - now;
                    inner = self.changed.wait_timeout(inner, timeout).unwrap().0;
                }
            }
        }
    }

    /// Wake the timer thread and make `wait_next` return `None`
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.shutdown = true;
        drop(inner);
        self.changed.notify_all();
    }

    /// Number of parked entries
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    /// Check if no entries are parked
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().entries.is_empty()
    }

    /// Deadline of the head entry, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        let inner = self.inner.lock().unwrap();
        inner.entries.keys().next().map(|key| key.due)
    }

    /// Lifetime counters snapshot
    pub fn stats(&self) -> ScheduleStats {
        let inner = self.inner.lock().unwrap();
        ScheduleStats {
            active: inner.entries.len(),
            scheduled: inner.scheduled,
            fired: inner.fired,
            revoked: inner.revoked,
        }
    }
}

impl Default for ScheduleStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifetime counters for the schedule store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    /// Currently parked entries
    pub active: usize,
    /// Entries scheduled (lifetime)
    pub scheduled: u64,
    /// Entries fired (lifetime)
    pub fired: u64,
    /// Entries revoked (lifetime)
    pub revoked: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use jobpool_core::Dispatch;

    struct Nop;
    impl Dispatch for Nop {
        fn dispatch(&self) {}
    }

    fn job() -> Job {
        Job::new(Arc::new(Nop))
    }

    #[test]
    fn test_claim_in_deadline_order() {
        let store = ScheduleStore::new();
        let now = Instant::now();

        let a = job();
        let b = job();
        store.schedule(now + Duration::from_millis(2), a.clone());
        store.schedule(now, b.clone());

        // Both are due by the time we wait.
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.wait_next().unwrap(), b);
        assert_eq!(store.wait_next().unwrap(), a);
    }

    #[test]
    fn test_equal_deadline_fifo() {
        let store = ScheduleStore::new();
        let due = Instant::now();

        let a = job();
        let b = job();
        store.schedule(due, a.clone());
        store.schedule(due, b.clone());

        assert_eq!(store.wait_next().unwrap(), a);
        assert_eq!(store.wait_next().unwrap(), b);
    }

    #[test]
    fn test_revoke_first_matching_only() {
        let store = ScheduleStore::new();
        let now = Instant::now();

        let target = job();
        store.schedule(now + Duration::from_secs(60), target.clone());
        store.schedule(now + Duration::from_secs(120), target.clone());

        assert!(store.revoke(&target));
        assert_eq!(store.len(), 1);
        assert!(store.revoke(&target));
        assert!(store.is_empty());
        assert!(!store.revoke(&target));
    }

    #[test]
    fn test_shutdown_unblocks_waiter() {
        let store = Arc::new(ScheduleStore::new());
        let waiter = {
            let store = store.clone();
            std::thread::spawn(move || store.wait_next())
        };

        std::thread::sleep(Duration::from_millis(20));
        store.shutdown();
        assert!(waiter.join().unwrap().is_none());
    }

    #[test]
    fn test_stats() {
        let store = ScheduleStore::new();
        let target = job();

        store.schedule(Instant::now(), job());
        store.schedule(Instant::now() + Duration::from_secs(60), target.clone());

        store.wait_next().unwrap();
        store.revoke(&target);

        let stats = store.stats();
        assert_eq!(stats.scheduled, 2);
        assert_eq!(stats.fired, 1);
        assert_eq!(stats.revoked, 1);
        assert_eq!(stats.active, 0);
    }

    #[test]
    fn test_next_deadline() {
        let store = ScheduleStore::new();
        assert!(store.next_deadline().is_none());

        let due = Instant::now() + Duration::from_secs(1);
        store.schedule(due, job());
        assert_eq!(store.next_deadline(), Some(due));
    }
}
