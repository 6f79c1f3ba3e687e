//! Per-executor running-job registry
//!
//! Each executor slot owns a `WorkerStatus`. The executor records the job
//! identity for the duration of its dispatch; revokers use
//! `wait_for_job_done` to block until a specific running job has finished.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::{PoolError, PoolResult};
use crate::id::JobId;

/// Running-job slot with a wait-for-completion latch
///
/// The running id is `JobId::NONE` exactly while the slot is idle. Waiters
/// sleep on the condvar, which releases the mutex atomically; `job_finished`
/// can therefore always acquire it to clear the id and signal.
pub struct WorkerStatus {
    running: Mutex<JobId>,
    done: Condvar,
}

impl WorkerStatus {
    /// Create an idle status slot
    pub fn new() -> Self {
        Self {
            running: Mutex::new(JobId::NONE),
            done: Condvar::new(),
        }
    }

    /// Record that a dispatch has begun
    pub fn job_started(&self, id: JobId) {
        debug_assert!(id.is_some());
        let mut running = self.running.lock().unwrap();
        debug_assert!(running.is_none(), "slot already occupied");
        *running = id;
    }

    /// Record that the dispatch has finished and wake all waiters
    pub fn job_finished(&self) {
        let mut running = self.running.lock().unwrap();
        *running = JobId::NONE;
        drop(running);
        self.done.notify_all();
    }

    /// Identity of the job currently dispatching in this slot
    pub fn running_job(&self) -> JobId {
        *self.running.lock().unwrap()
    }

    /// Block until the given job is no longer running in this slot
    ///
    /// Returns `UnknownKey` if `id` is not the running job at call time,
    /// `Timeout` if the bounded wait elapses first, `Ok` once the job has
    /// finished. `None` waits forever.
    pub fn wait_for_job_done(&self, id: JobId, wait: Option<Duration>) -> PoolResult<()> {
        if id.is_none() {
            return Err(PoolError::UnknownKey);
        }

        let deadline = wait.map(|d| Instant::now() + d);
        let mut running = self.running.lock().unwrap();

        if *running != id {
            return Err(PoolError::UnknownKey);
        }

        // Condvar loop: re-check after every wake, the wait releases the
        // mutex so job_finished can get in.
        while *running == id {
            running = match deadline {
                None => self.done.wait(running).unwrap(),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(PoolError::Timeout);
                    }
                    self.done.wait_timeout(running, deadline - now).unwrap().0
                }
            };
        }

        Ok(())
    }
}

impl Default for WorkerStatus {
    fn default() -> Self {
        Self::new()
    }
}
