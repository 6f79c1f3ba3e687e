//! Job identity type

use core::fmt;

/// Unique identifier for a dispatchable job
///
/// This is the address of the wrapped dispatchable allocation, stable for
/// its whole lifetime and therefore usable as the revocation key. The zero
/// value is reserved as a sentinel for "no job" (a live allocation never
/// sits at address zero).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Sentinel value indicating no job
    pub const NONE: JobId = JobId(0);

    /// Create a new JobId from a raw value
    #[inline]
    pub const fn new(id: u64) -> Self {
        JobId(id)
    }

    /// Get the raw u64 value
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Check if this is the NONE sentinel
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Check if this is a valid job ID
    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }
}

impl From<u64> for JobId {
    #[inline]
    fn from(id: u64) -> Self {
        JobId(id)
    }
}

impl From<JobId> for u64 {
    #[inline]
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "JobId(NONE)")
        } else {
            write!(f, "JobId({:#x})", self.0)
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "{:#x}", self.0)
        }
    }
}

impl Default for JobId {
    fn default() -> Self {
        JobId::NONE
    }
}
