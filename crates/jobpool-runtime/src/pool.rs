//! The worker pool composition root
//!
//! Owns the handle queue, the timer, the per-slot status registry and the
//! counters, and exposes the submit / schedule / revoke / snapshot / run /
//! stop / join surface.
//!
//! # Slot roster
//!
//! ```text
//! slot 0          - timer thread
//! slot 1          - the thread borrowed via join()
//! slots 2..N-1    - pool-owned minions
//! ```
//!
//! # Revocation protocol
//!
//! A job can sit in the timer, the queue, or an executor slot. `revoke`
//! checks all three, cheapest first, and runs every check even after a hit
//! because a job submitted twice can occupy two places at once. The
//! executor check doubles as wait-for-completion: the per-slot wait budget
//! applies to each slot in turn, so the total wait can reach N times the
//! budget.
//!
//! # Lock ordering
//!
//! Timer store, queue and status mutexes are only ever taken sequentially,
//! never nested.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use jobpool_core::constants::{JOINED_SLOT, TIMER_SLOT};
use jobpool_core::{
    jdebug, HandleQueue, Job, MinionState, PoolError, PoolMetadata, PoolResult, PoolState,
    Snapshot, WorkerStatus,
};

use crate::config::PoolConfig;
use crate::minion::Minion;
use crate::os_thread_id;
use crate::timer::{ScheduleStats, Timer};

/// State shared between the pool handle, its minions and the timer sink
pub(crate) struct PoolCore {
    pub(crate) queue: HandleQueue,
    pub(crate) statuses: Box<[WorkerStatus]>,
    pub(crate) metadata: PoolMetadata,
    state: AtomicU8,
}

impl PoolCore {
    fn new(slots: u8) -> Self {
        Self {
            queue: HandleQueue::new(),
            statuses: (0..slots).map(|_| WorkerStatus::new()).collect(),
            metadata: PoolMetadata::new(slots),
            state: AtomicU8::new(PoolState::Constructed as u8),
        }
    }

    pub(crate) fn state(&self) -> PoolState {
        PoolState::from(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: PoolState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Executor loop for one roster slot
    ///
    /// Runs on a minion thread or, for slot 1, on the thread that called
    /// `join()`. Returns once the queue reports disabled.
    pub(crate) fn process(&self, slot: u8) {
        self.metadata.record_thread(slot, os_thread_id());
        let status = &self.statuses[slot as usize];

        while self.state().is_running() {
            let job = match self.queue.extract(None) {
                Ok(job) => job,
                Err(_) => break,
            };

            status.job_started(job.identity());
            self.metadata.dispatch_started(slot);

            job.dispatch();

            self.metadata.dispatch_finished();
            status.job_finished();
        }
    }
}

/// Most recently constructed pool, for the process-wide accessor
static ACTIVE: Mutex<Option<Weak<WorkerPool>>> = Mutex::new(None);

/// Fixed-size pool of executor threads with delayed scheduling and
/// revocation
///
/// Constructed with a total slot count N >= 2: one timer thread, one slot
/// reserved for the thread that calls [`join`](WorkerPool::join), and N-2
/// pool-owned minions. The timer thread runs from construction to drop;
/// minions run between [`run`](WorkerPool::run) and
/// [`stop`](WorkerPool::stop).
pub struct WorkerPool {
    core: Arc<PoolCore>,
    timer: Timer,
    minions: Mutex<Vec<Minion>>,
    config: PoolConfig,
}

impl WorkerPool {
    /// Build a pool and register it as the process-wide instance
    ///
    /// The queue gate stays down until `run()`.
    pub fn new(config: PoolConfig) -> PoolResult<Arc<Self>> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let core = Arc::new(PoolCore::new(config.threads));

        let sink_core = core.clone();
        let timer = Timer::start(
            move |job: Job| job.on_timer_fire(&sink_core.queue),
            &format!("{}-timer", config.thread_name_prefix),
            config.stack_size,
        );

        let pool = Arc::new(Self {
            core,
            timer,
            minions: Mutex::new(Vec::new()),
            config,
        });

        *ACTIVE.lock().unwrap() = Some(Arc::downgrade(&pool));
        Ok(pool)
    }

    /// Process-wide accessor for the active pool
    ///
    /// # Panics
    ///
    /// Panics when called before a pool is constructed or after it is
    /// dropped; that is a programming error, not a runtime condition.
    pub fn instance() -> Arc<WorkerPool> {
        ACTIVE
            .lock()
            .unwrap()
            .as_ref()
            .and_then(Weak::upgrade)
            .expect("no active worker pool")
    }

    /// Check whether a pool is currently registered
    pub fn is_available() -> bool {
        ACTIVE
            .lock()
            .unwrap()
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some()
    }

    /// Enqueue a job for dispatch
    ///
    /// Never blocks. Duplicate submissions are accepted and dispatch once
    /// per submission. Jobs submitted while the pool is stopped are
    /// retained until the next `run()`.
    pub fn submit(&self, job: Job) {
        let _ = self.core.queue.insert(job);
    }

    /// Park a job in the timer until the absolute time `at`
    ///
    /// A deferred `submit`: on expiry the job moves into the queue.
    pub fn schedule(&self, at: Instant, job: Job) {
        self.timer.schedule(at, job);
    }

    /// Cancel a pending job, or wait out a running one
    ///
    /// Checks the timer, the queue, then every executor slot; `wait` is the
    /// budget spent per slot (`None` waits forever). Returns `Unavailable`
    /// when no copy of the job was found anywhere.
    pub fn revoke(&self, job: &Job, wait: Option<Duration>) -> PoolResult<()> {
        let mut found = self.timer.revoke(job);

        // A second submission can sit in the queue even after a timer hit.
        if self.core.queue.remove(job) {
            found = true;
        }

        // Slot 0 is the timer thread, never an executor.
        let id = job.identity();
        for slot in JOINED_SLOT..self.core.metadata.slots() {
            if self.core.statuses[slot as usize]
                .wait_for_job_done(id, wait)
                .is_ok()
            {
                found = true;
            }
        }

        if found {
            Ok(())
        } else {
            Err(PoolError::Unavailable)
        }
    }

    /// Point-in-time counter view
    ///
    /// Lock-free reads; the counters are monotonic and may lag.
    pub fn snapshot(&self) -> Snapshot {
        self.core.metadata.snapshot(self.core.queue.len())
    }

    /// Lifetime timer counters
    pub fn timer_stats(&self) -> ScheduleStats {
        self.timer.stats()
    }

    /// Raise the queue gate and start the minions
    ///
    /// Legal from `Constructed` or `Stopped`; minions are spawned fresh on
    /// every call.
    pub fn run(&self) -> PoolResult<()> {
        let mut minions = self.minions.lock().unwrap();

        if !self.core.state().can_run() {
            return Err(PoolError::AlreadyRunning);
        }

        self.core.set_state(PoolState::Running);
        self.core.queue.enable();

        for slot in (JOINED_SLOT + 1)..self.core.metadata.slots() {
            minions.push(Minion::spawn(
                self.core.clone(),
                slot,
                &self.config.thread_name_prefix,
                self.config.stack_size,
            ));
        }

        jdebug!(
            "pool running: {} slots, {} minions",
            self.core.metadata.slots(),
            minions.len()
        );
        Ok(())
    }

    /// Drop the queue gate and collect the minions
    ///
    /// Wakes every blocked extractor; running jobs complete first. Queued
    /// jobs are retained for the next `run()`. No-op when not running.
    pub fn stop(&self) -> PoolResult<()> {
        let mut minions = self.minions.lock().unwrap();

        if !self.core.state().is_running() {
            return Ok(());
        }

        self.core.set_state(PoolState::Stopping);
        self.core.queue.disable();

        for minion in minions.drain(..) {
            minion.join();
        }

        self.core.set_state(PoolState::Stopped);
        jdebug!("pool stopped");
        Ok(())
    }

    /// Lend the calling thread to the pool as the slot-1 executor
    ///
    /// Returns when the queue is disabled.
    pub fn join(&self) {
        self.core.process(JOINED_SLOT);
    }

    /// OS thread id occupying a roster slot
    ///
    /// Slot 0 is the timer; slot 1 reports 0 until a thread has joined;
    /// minion slots report 0 until their thread enters its loop. Unknown
    /// slots report 0.
    pub fn id(&self, slot: u8) -> u64 {
        if slot == TIMER_SLOT {
            self.timer.thread_id()
        } else if slot < self.core.metadata.slots() {
            self.core.metadata.thread_id(slot)
        } else {
            0
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> PoolState {
        self.core.state()
    }

    /// Lifecycle states of the pool-owned minions
    ///
    /// Empty outside a run: `stop()` collects the minions it spawned.
    pub fn minion_states(&self) -> Vec<MinionState> {
        self.minions.lock().unwrap().iter().map(|m| m.state()).collect()
    }

    /// Total slot count
    pub fn slots(&self) -> u8 {
        self.core.metadata.slots()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let _ = self.stop();

        // Unregister; the weak entry is already dead at this point.
        let mut active = ACTIVE.lock().unwrap();
        if active.as_ref().map_or(false, |weak| weak.upgrade().is_none()) {
            *active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    use jobpool_core::Dispatch;

    struct CountJob(AtomicUsize);

    impl CountJob {
        fn new() -> Arc<Self> {
            Arc::new(Self(AtomicUsize::new(0)))
        }

        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl Dispatch for CountJob {
        fn dispatch(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct SleepJob {
        delay: Duration,
        completed: AtomicUsize,
    }

    impl Dispatch for SleepJob {
        fn dispatch(&self) {
            thread::sleep(self.delay);
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct RecordJob {
        label: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Dispatch for RecordJob {
        fn dispatch(&self) {
            self.order.lock().unwrap().push(self.label);
        }
    }

    fn pool(threads: u8) -> Arc<WorkerPool> {
        WorkerPool::new(PoolConfig::new().threads(threads)).unwrap()
    }

    /// Poll until `cond` holds; the counters lag the executors, so tests
    /// wait on the exact observation they assert.
    fn wait_until(budget: Duration, mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + budget;
        while !cond() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_rejects_single_slot_config() {
        let result = WorkerPool::new(PoolConfig::new().threads(1));
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_submit_dispatch_counts() {
        let pool = pool(3);
        pool.run().unwrap();

        let jobs: Vec<_> = (0..1000).map(|_| CountJob::new()).collect();
        for target in &jobs {
            pool.submit(Job::new(target.clone()));
        }

        wait_until(Duration::from_secs(10), || {
            jobs.iter().map(|j| j.count()).sum::<usize>() == 1000
        });

        let snapshot = pool.snapshot();
        assert_eq!(snapshot.pending, 0);
        assert_eq!(snapshot.total_dispatched(), 1000);

        pool.stop().unwrap();
    }

    #[test]
    fn test_schedule_fires_in_time_order() {
        // One minion so dispatch order mirrors queue order.
        let pool = pool(3);
        pool.run().unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        let record = |label| {
            Job::new(Arc::new(RecordJob {
                label,
                order: order.clone(),
            }))
        };

        let t0 = Instant::now();
        pool.schedule(t0 + Duration::from_millis(60), record("a"));
        pool.schedule(t0 + Duration::from_millis(15), record("b"));
        pool.schedule(t0 + Duration::from_millis(35), record("c"));

        wait_until(Duration::from_secs(5), || order.lock().unwrap().len() == 3);

        assert_eq!(*order.lock().unwrap(), vec!["b", "c", "a"]);
        pool.stop().unwrap();
    }

    #[test]
    fn test_revoke_queued_job() {
        // Executors stay down: jobs are retained behind the gate.
        let pool = pool(3);

        let a = CountJob::new();
        let b = CountJob::new();
        let job_a = Job::new(a.clone());

        pool.submit(job_a.clone());
        pool.submit(Job::new(b.clone()));

        assert!(pool.revoke(&job_a, Some(Duration::ZERO)).is_ok());

        pool.run().unwrap();
        wait_until(Duration::from_secs(5), || b.count() == 1);

        // A sat ahead of B in the queue; it was removed, not dispatched.
        assert_eq!(a.count(), 0);
        pool.stop().unwrap();
    }

    #[test]
    fn test_revoke_timed_job() {
        let pool = pool(3);
        pool.run().unwrap();

        let a = CountJob::new();
        let job_a = Job::new(a.clone());
        pool.schedule(Instant::now() + Duration::from_secs(1), job_a.clone());

        thread::sleep(Duration::from_millis(10));
        assert!(pool.revoke(&job_a, Some(Duration::ZERO)).is_ok());

        thread::sleep(Duration::from_millis(100));
        assert_eq!(a.count(), 0);
        assert_eq!(pool.timer_stats().revoked, 1);

        pool.stop().unwrap();
    }

    #[test]
    fn test_revoke_waits_for_running_job() {
        let pool = pool(3);
        pool.run().unwrap();

        let target = Arc::new(SleepJob {
            delay: Duration::from_millis(150),
            completed: AtomicUsize::new(0),
        });
        let job = Job::new(target.clone());
        pool.submit(job.clone());

        // Wait until a minion has picked it up.
        let deadline = Instant::now() + Duration::from_secs(2);
        while pool.snapshot().occupation == 0 {
            assert!(Instant::now() < deadline, "job never started");
            thread::sleep(Duration::from_millis(2));
        }

        let started = Instant::now();
        let result = pool.revoke(&job, Some(Duration::from_millis(500)));
        let waited = started.elapsed();

        assert!(result.is_ok());
        assert!(waited < Duration::from_millis(500), "waited {:?}", waited);
        assert_eq!(target.completed.load(Ordering::SeqCst), 1);

        pool.stop().unwrap();
    }

    #[test]
    fn test_revoke_unknown_job() {
        let pool = pool(3);
        pool.run().unwrap();

        let job = Job::new(CountJob::new());
        let result = pool.revoke(&job, Some(Duration::ZERO));
        assert_eq!(result.unwrap_err(), PoolError::Unavailable);

        pool.stop().unwrap();
    }

    #[test]
    fn test_no_leaked_references_after_drain() {
        let pool = pool(3);
        pool.run().unwrap();

        let target = CountJob::new();
        pool.submit(Job::new(target.clone()));

        wait_until(Duration::from_secs(5), || target.count() == 1);
        // Stop joins the minions, so the dispatched job handle is dropped
        // by the time it returns.
        pool.stop().unwrap();

        assert_eq!(Arc::strong_count(&target), 1);
    }

    #[test]
    fn test_stop_and_restart_dispatches_retained_jobs() {
        let pool = pool(3);
        pool.run().unwrap();
        pool.stop().unwrap();

        // Submitted against a stopped pool: retained behind the gate.
        let target = CountJob::new();
        pool.submit(Job::new(target.clone()));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(target.count(), 0);

        pool.run().unwrap();
        wait_until(Duration::from_secs(5), || target.count() == 1);

        pool.stop().unwrap();
    }

    #[test]
    fn test_run_twice_rejected() {
        let pool = pool(3);
        pool.run().unwrap();
        assert_eq!(pool.run().unwrap_err(), PoolError::AlreadyRunning);
        pool.stop().unwrap();

        // Stop is idempotent.
        pool.stop().unwrap();
        assert_eq!(pool.state(), PoolState::Stopped);
    }

    #[test]
    fn test_join_binds_slot_one() {
        let pool = pool(2);
        pool.run().unwrap();

        let target = CountJob::new();
        pool.submit(Job::new(target.clone()));

        let joined = {
            let pool = pool.clone();
            thread::spawn(move || pool.join())
        };

        wait_until(Duration::from_secs(5), || target.count() == 1);
        assert_ne!(pool.id(1), 0);

        pool.stop().unwrap();
        joined.join().unwrap();
    }

    #[test]
    fn test_slot_thread_ids() {
        let pool = pool(3);
        pool.run().unwrap();

        // Timer id is recorded at spawn.
        assert_ne!(pool.id(0), 0);

        // Minion ids appear once their loops start.
        let deadline = Instant::now() + Duration::from_secs(2);
        while pool.id(2) == 0 {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(5));
        }

        assert_ne!(pool.id(0), pool.id(2));
        assert_eq!(pool.id(99), 0);

        pool.stop().unwrap();
    }

    #[test]
    fn test_minion_states_follow_lifecycle() {
        let pool = pool(4);
        assert!(pool.minion_states().is_empty());

        pool.run().unwrap();
        assert_eq!(pool.minion_states().len(), 2);

        // Both minions settle into their drain loops.
        let deadline = Instant::now() + Duration::from_secs(2);
        while pool
            .minion_states()
            .iter()
            .any(|s| *s != MinionState::Running)
        {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(5));
        }

        pool.stop().unwrap();
        assert!(pool.minion_states().is_empty());
    }

    #[test]
    fn test_process_wide_accessor() {
        let _pool = pool(3);
        assert!(WorkerPool::is_available());

        // The registry tracks the most recent construction; parallel tests
        // may have registered their own pool since, but whichever pool is
        // current must be live.
        let current = WorkerPool::instance();
        assert!(current.slots() >= jobpool_core::constants::MIN_SLOTS);
    }
}
