//! Pool metadata: occupation and per-slot dispatch counters
//!
//! One `SlotStats` per roster slot, each on its own cache line to avoid
//! false sharing between executors. Counters are monotonic and read
//! lock-free; a snapshot may lag the executors by a few increments.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::constants::CACHE_LINE_SIZE;

/// Per-slot counters (cache-line aligned)
///
/// Layout (64 bytes):
/// ```text
/// 0x00: thread_id   (u64) - OS thread id occupying this slot
/// 0x08: dispatched  (u32) - jobs dispatched from this slot, monotonic
/// 0x0C: padding     (52 bytes)
/// ```
#[repr(C, align(64))]
pub struct SlotStats {
    /// OS thread id occupying this slot (0 until recorded)
    pub thread_id: AtomicU64,

    /// Jobs dispatched from this slot, monotonic
    pub dispatched: AtomicU32,

    _padding: [u8; 52],
}

impl SlotStats {
    const fn new() -> Self {
        Self {
            thread_id: AtomicU64::new(0),
            dispatched: AtomicU32::new(0),
            _padding: [0; 52],
        }
    }
}

const _: () = {
    assert!(core::mem::size_of::<SlotStats>() == CACHE_LINE_SIZE);
    assert!(core::mem::align_of::<SlotStats>() == CACHE_LINE_SIZE);
};

/// Counter block owned by the pool
pub struct PoolMetadata {
    slots: u8,
    occupation: AtomicU32,
    stats: Box<[SlotStats]>,
}

impl PoolMetadata {
    /// Create a counter block for `slots` roster entries
    pub fn new(slots: u8) -> Self {
        Self {
            slots,
            occupation: AtomicU32::new(0),
            stats: (0..slots).map(|_| SlotStats::new()).collect(),
        }
    }

    /// Number of roster slots
    #[inline]
    pub fn slots(&self) -> u8 {
        self.slots
    }

    /// Count a dispatch beginning in `slot`
    #[inline]
    pub fn dispatch_started(&self, slot: u8) {
        self.stats[slot as usize]
            .dispatched
            .fetch_add(1, Ordering::Relaxed);
        self.occupation.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a dispatch completing
    #[inline]
    pub fn dispatch_finished(&self) {
        let previous = self.occupation.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(previous > 0, "occupation underflow");
    }

    /// Currently-executing job count
    #[inline]
    pub fn occupation(&self) -> u32 {
        self.occupation.load(Ordering::Relaxed)
    }

    /// Lifetime dispatch count of one slot
    #[inline]
    pub fn dispatched(&self, slot: u8) -> u32 {
        self.stats[slot as usize].dispatched.load(Ordering::Relaxed)
    }

    /// Record the OS thread id occupying `slot`
    #[inline]
    pub fn record_thread(&self, slot: u8, thread_id: u64) {
        self.stats[slot as usize]
            .thread_id
            .store(thread_id, Ordering::Relaxed);
    }

    /// OS thread id occupying `slot` (0 until recorded)
    #[inline]
    pub fn thread_id(&self, slot: u8) -> u64 {
        self.stats[slot as usize].thread_id.load(Ordering::Relaxed)
    }

    /// Point-in-time view of the counters
    pub fn snapshot(&self, pending: u32) -> Snapshot {
        Snapshot {
            slots: self.slots,
            pending,
            occupation: self.occupation(),
            per_slot: self.stats.iter().map(|s| s.dispatched.load(Ordering::Relaxed)).collect(),
        }
    }
}

/// Point-in-time counter view returned by `snapshot()`
///
/// Counters are monotonic and read without locking; the view may lag
/// concurrent dispatches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Number of roster slots
    pub slots: u8,

    /// Queued jobs at snapshot time
    pub pending: u32,

    /// Jobs executing at snapshot time
    pub occupation: u32,

    /// Lifetime dispatch count per slot
    pub per_slot: Vec<u32>,
}

impl Snapshot {
    /// Total jobs dispatched across all slots
    pub fn total_dispatched(&self) -> u64 {
        self.per_slot.iter().map(|&c| c as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_stats_size() {
        assert_eq!(core::mem::size_of::<SlotStats>(), 64);
        assert_eq!(core::mem::align_of::<SlotStats>(), 64);
    }

    #[test]
    fn test_dispatch_counting() {
        let metadata = PoolMetadata::new(4);

        metadata.dispatch_started(2);
        metadata.dispatch_started(3);
        assert_eq!(metadata.occupation(), 2);

        metadata.dispatch_finished();
        assert_eq!(metadata.occupation(), 1);

        metadata.dispatch_finished();
        assert_eq!(metadata.occupation(), 0);

        // Per-slot counters stay monotonic.
        assert_eq!(metadata.dispatched(2), 1);
        assert_eq!(metadata.dispatched(3), 1);
        assert_eq!(metadata.dispatched(0), 0);
    }

    #[test]
    fn test_thread_id_recording() {
        let metadata = PoolMetadata::new(3);
        assert_eq!(metadata.thread_id(1), 0);

        metadata.record_thread(1, 0xbeef);
        assert_eq!(metadata.thread_id(1), 0xbeef);
    }

    #[test]
    fn test_snapshot() {
        let metadata = PoolMetadata::new(3);
        metadata.dispatch_started(2);

        let snapshot = metadata.snapshot(5);
        assert_eq!(snapshot.slots, 3);
        assert_eq!(snapshot.pending, 5);
        assert_eq!(snapshot.occupation, 1);
        assert_eq!(snapshot.per_slot, vec![0, 0, 1]);
        assert_eq!(snapshot.total_dispatched(), 1);
    }
}
