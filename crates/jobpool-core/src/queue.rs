//! Blocking FIFO of jobs with enable/disable gating
//!
//! The handle queue is the handoff point between producers (submitters and
//! the timer thread) and consumers (minions and the joined thread).
//!
//! # Gating
//!
//! The queue starts disabled. While disabled, insertions are retained but
//! reported as [`PoolError::Disabled`], and extractors unblock immediately
//! with the same outcome; jobs accumulated while the gate is down are
//! dispatched once the queue is re-enabled. `disable()` wakes every blocked
//! extractor.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::{PoolError, PoolResult};
use crate::job::Job;

struct QueueInner {
    fifo: VecDeque<Job>,
    enabled: bool,
}

/// Multi-producer / multi-consumer job queue
///
/// Unbounded: `insert` never blocks. Ordering within the queue is FIFO
/// across successful single-threaded insertions; cross-thread insertion
/// order is whatever the internal mutex serializes.
pub struct HandleQueue {
    inner: Mutex<QueueInner>,
    ready: Condvar,
}

impl HandleQueue {
    /// Create a new, disabled queue
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                fifo: VecDeque::new(),
                enabled: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Append a job to the tail
    ///
    /// Never blocks. The job is retained even while the queue is disabled;
    /// the `Disabled` outcome only reports that the gate is down.
    pub fn insert(&self, job: Job) -> PoolResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.fifo.push_back(job);
        let enabled = inner.enabled;
        drop(inner);

        self.ready.notify_one();

        if enabled {
            Ok(())
        } else {
            Err(PoolError::Disabled)
        }
    }

    /// Pop the front job, blocking up to `wait` if the queue is empty
    ///
    /// `None` waits forever. Returns `Disabled` if the gate is down at call
    /// time or drops during the wait, even when jobs are queued.
    pub fn extract(&self, wait: Option<Duration>) -> PoolResult<Job> {
        let deadline = wait.map(|d| Instant::now() + d);
        let mut inner = self.inner.lock().unwrap();

        loop {
            if !inner.enabled {
                return Err(PoolError::Disabled);
            }
            if let Some(job) = inner.fifo.pop_front() {
                return Ok(job);
            }

            inner = match deadline {
                None => self.ready.wait(inner).unwrap(),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(PoolError::Timeout);
                    }
                    self.ready.wait_timeout(inner, deadline - now).unwrap().0
                }
            };
        }
    }

    /// Remove the first queued job with the same identity
    ///
    /// Returns whether a matching entry was removed.
    pub fn remove(&self, job: &Job) -> bool {
        let id = job.identity();
        let mut inner = self.inner.lock().unwrap();

        match inner.fifo.iter().position(|j| j.identity() == id) {
            Some(index) => {
                inner.fifo.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of queued jobs
    pub fn len(&self) -> u32 {
        self.inner.lock().unwrap().fifo.len() as u32
    }

    /// Check if no jobs are queued
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().fifo.is_empty()
    }

    /// Raise the gate; idempotent
    pub fn enable(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.enabled = true;
        drop(inner);
        self.ready.notify_all();
    }

    /// Drop the gate and wake all blocked extractors; idempotent
    pub fn disable(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.enabled = false;
        drop(inner);
        self.ready.notify_all();
    }

    /// Check the gate
    pub fn is_enabled(&self) -> bool {
        self.inner.lock().unwrap().enabled
    }
}

impl Default for HandleQueue {
    fn default() -> Self {
        Self::new()
    }
}
