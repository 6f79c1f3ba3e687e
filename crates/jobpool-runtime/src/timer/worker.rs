//! Timer thread
//!
//! Single thread that blocks on the schedule store and delivers expired
//! jobs to a sink. The sink runs outside the store lock, so a slow handoff
//! never delays a concurrent `schedule` or `revoke`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use jobpool_core::{jdebug, Job};

use crate::os_thread_id;
use crate::timer::store::ScheduleStore;

/// Handle to a running timer thread
pub struct TimerThreadHandle {
    handle: Option<JoinHandle<()>>,
    thread_id: Arc<AtomicU64>,
}

impl TimerThreadHandle {
    /// OS identity of the timer thread
    pub fn thread_id(&self) -> u64 {
        self.thread_id.load(Ordering::Acquire)
    }

    /// Wait for the thread to exit
    ///
    /// The caller shuts the store down first; joining without that blocks
    /// until the store does it.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Spawn the timer thread
///
/// The thread loops on `store.wait_next()` and passes every claimed job to
/// `sink` until the store is shut down.
pub fn spawn_timer_thread<F>(
    store: Arc<ScheduleStore>,
    sink: F,
    thread_name: &str,
    stack_size: Option<usize>,
) -> TimerThreadHandle
where
    F: Fn(Job) + Send + 'static,
{
    let thread_id = Arc::new(AtomicU64::new(0));
    let id_slot = thread_id.clone();

    let mut builder = thread::Builder::new().name(thread_name.to_string());
    if let Some(stack_size) = stack_size {
        builder = builder.stack_size(stack_size);
    }

    let handle = builder
        .spawn(move || {
            id_slot.store(os_thread_id(), Ordering::Release);
            jdebug!("timer thread up");

            while let Some(job) = store.wait_next() {
                sink(job);
            }

            jdebug!("timer thread down");
        })
        .expect("failed to spawn timer thread");

    // Let the thread record its identity before the handle is used.
    while thread_id.load(Ordering::Acquire) == 0 {
        thread::yield_now();
    }

    TimerThreadHandle {
        handle: Some(handle),
        thread_id,
    }
}
