//! Minion threads
//!
//! A minion is a pool-owned OS thread that drains the handle queue for one
//! roster slot. Minions terminate when the queue reports disabled; `run()`
//! respawns a fresh set, so a stopped pool can be started again.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use jobpool_core::MinionState;

use crate::pool::PoolCore;

/// One executor thread bound to a roster slot
pub struct Minion {
    slot: u8,
    state: Arc<AtomicU8>,
    handle: Option<JoinHandle<()>>,
}

impl Minion {
    /// Spawn an executor for `slot`
    pub(crate) fn spawn(
        core: Arc<PoolCore>,
        slot: u8,
        name_prefix: &str,
        stack_size: Option<usize>,
    ) -> Self {
        let state = Arc::new(AtomicU8::new(MinionState::Idle as u8));
        let thread_state = state.clone();

        let mut builder = thread::Builder::new().name(format!("{}-minion-{}", name_prefix, slot));
        if let Some(stack_size) = stack_size {
            builder = builder.stack_size(stack_size);
        }

        let handle = builder
            .spawn(move || {
                thread_state.store(MinionState::Running as u8, Ordering::Release);
                core.process(slot);
                thread_state.store(MinionState::Blocked as u8, Ordering::Release);
            })
            .expect("failed to spawn minion thread");

        Self {
            slot,
            state,
            handle: Some(handle),
        }
    }

    /// Roster slot this minion drains
    #[inline]
    pub fn slot(&self) -> u8 {
        self.slot
    }

    /// Current lifecycle state
    pub fn state(&self) -> MinionState {
        MinionState::from(self.state.load(Ordering::Acquire))
    }

    /// Wait for the thread to terminate
    ///
    /// The caller disables the queue first; joining without that blocks
    /// until something else does.
    pub(crate) fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.state.store(MinionState::Stopped as u8, Ordering::Release);
    }
}
