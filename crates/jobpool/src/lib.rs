//! # jobpool - Concurrent Job Execution Core
//!
//! Fixed-size worker pool that accepts unit-of-work submissions from many
//! producers, dispatches them across a bounded set of executor threads,
//! supports time-delayed scheduling, and permits safe revocation of pending
//! or in-flight jobs with observable wait semantics.
//!
//! ## Quick Start
//!
//! ```ignore
//! use jobpool::{Dispatch, Job, PoolConfig, WorkerPool};
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//!
//! struct Ping;
//!
//! impl Dispatch for Ping {
//!     fn dispatch(&self) {
//!         println!("ping");
//!     }
//! }
//!
//! fn main() {
//!     let pool = WorkerPool::new(PoolConfig::new().threads(4)).unwrap();
//!     pool.run().unwrap();
//!
//!     // Immediate dispatch
//!     pool.submit(Job::new(Arc::new(Ping)));
//!
//!     // Delayed dispatch, revocable until it fires
//!     let delayed = Job::new(Arc::new(Ping));
//!     pool.schedule(Instant::now() + Duration::from_millis(100), delayed.clone());
//!     pool.revoke(&delayed, None).unwrap();
//!
//!     pool.stop().unwrap();
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!   submit(job) ─────────────────────────────┐
//!                                            ▼
//!   schedule(at, job) ──► Timer ──fire──► HandleQueue
//!                        (slot 0)            │
//!                         ┌──────────────────┼──────────────────┐
//!                         ▼                  ▼                  ▼
//!                   joined thread        Minion             Minion
//!                      (slot 1)         (slot 2)       ...  (slot N-1)
//!                         │                  │                  │
//!                         └── WorkerStatus per slot, counters ──┘
//! ```
//!
//! `revoke(job, wait)` checks the timer, then the queue, then waits (per
//! slot, up to `wait`) for a running copy to finish.

// Re-export core types
pub use jobpool_core::{
    Dispatch, HandleQueue, Job, JobId, MinionState, PoolError, PoolMetadata, PoolResult,
    PoolState, Snapshot, WorkerStatus,
};

// Re-export the runtime surface
pub use jobpool_runtime::{PoolConfig, ScheduleStats, SelfSubmittingDispatcher, Timer, WorkerPool};

// Re-export leveled logging macros and their controls
pub use jobpool_core::{jdebug, jerror, jinfo, jtrace, jwarn};
pub use jobpool_core::jprint::{init as init_logging, set_log_level, LogLevel};

/// Roster constants (slot indices, bounds)
pub use jobpool_core::constants;
