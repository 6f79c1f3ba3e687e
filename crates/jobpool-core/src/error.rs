//! Error types for pool operations

use core::fmt;

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors reported by pool operations
///
/// Every user-visible operation returns one of these explicitly; the core
/// never fails by unwinding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Revocation target was not found in the timer, the queue or any
    /// executor slot
    Unavailable,

    /// Wait-for-done called with an id that is not the running job of
    /// that slot
    UnknownKey,

    /// A bounded wait elapsed without the awaited condition
    Timeout,

    /// Queue operation attempted while the queue is disabled
    Disabled,

    /// Pool is already running
    AlreadyRunning,

    /// Configuration rejected by validation
    InvalidConfig(&'static str),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Unavailable => write!(f, "job not found"),
            PoolError::UnknownKey => write!(f, "no such job in this slot"),
            PoolError::Timeout => write!(f, "operation timed out"),
            PoolError::Disabled => write!(f, "queue disabled"),
            PoolError::AlreadyRunning => write!(f, "pool already running"),
            PoolError::InvalidConfig(why) => write!(f, "invalid configuration: {}", why),
        }
    }
}

impl std::error::Error for PoolError {}
