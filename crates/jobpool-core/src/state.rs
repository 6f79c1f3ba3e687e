//! Pool and minion lifecycle enums

use core::fmt;

/// Lifecycle state of the worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PoolState {
    /// Built but never run; the queue gate is down
    Constructed = 0,

    /// Minions are draining the queue
    Running = 1,

    /// `stop()` in progress; minions are being collected
    Stopping = 2,

    /// Minions collected; `run()` may be called again
    Stopped = 3,
}

impl PoolState {
    /// Check if executors should keep draining the queue
    #[inline]
    pub const fn is_running(&self) -> bool {
        matches!(self, PoolState::Running)
    }

    /// Check if `run()` is a legal transition from this state
    #[inline]
    pub const fn can_run(&self) -> bool {
        matches!(self, PoolState::Constructed | PoolState::Stopped)
    }
}

impl From<u8> for PoolState {
    fn from(v: u8) -> Self {
        match v {
            0 => PoolState::Constructed,
            1 => PoolState::Running,
            2 => PoolState::Stopping,
            _ => PoolState::Stopped,
        }
    }
}

impl From<PoolState> for u8 {
    fn from(state: PoolState) -> u8 {
        state as u8
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolState::Constructed => write!(f, "constructed"),
            PoolState::Running => write!(f, "running"),
            PoolState::Stopping => write!(f, "stopping"),
            PoolState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Lifecycle state of a single minion thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MinionState {
    /// Spawned, not yet in the drain loop
    Idle = 0,

    /// Draining the queue
    Running = 1,

    /// Drain loop exited, thread about to terminate
    Blocked = 2,

    /// Thread collected
    Stopped = 3,
}

impl MinionState {
    /// Check if the minion has left its drain loop
    #[inline]
    pub const fn is_settled(&self) -> bool {
        matches!(self, MinionState::Blocked | MinionState::Stopped)
    }
}

impl From<u8> for MinionState {
    fn from(v: u8) -> Self {
        match v {
            0 => MinionState::Idle,
            1 => MinionState::Running,
            2 => MinionState::Blocked,
            _ => MinionState::Stopped,
        }
    }
}

impl From<MinionState> for u8 {
    fn from(state: MinionState) -> u8 {
        state as u8
    }
}
