//! # jobpool-runtime
//!
//! Thread-owning runtime for the jobpool execution engine.
//!
//! This crate provides:
//! - The timer subsystem (ordered store + dedicated thread)
//! - Minion threads draining the handle queue
//! - The `WorkerPool` composition root
//! - The self-submitting dispatcher adapter
//!
//! Core types (jobs, queue, status, counters) live in `jobpool-core`.

pub mod config;
pub mod timer;
pub mod minion;
pub mod pool;
pub mod dispatcher;

// Re-exports
pub use config::PoolConfig;
pub use dispatcher::SelfSubmittingDispatcher;
pub use pool::WorkerPool;
pub use timer::{ScheduleStats, Timer};

/// OS identity of the calling thread
#[inline]
pub(crate) fn os_thread_id() -> u64 {
    unsafe { libc::pthread_self() as u64 }
}
