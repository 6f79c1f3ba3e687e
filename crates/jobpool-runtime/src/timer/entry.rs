//! Ordering key for timer entries

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Store key: absolute deadline plus an insertion sequence number
///
/// The sequence number makes keys unique and gives entries with equal
/// deadlines a stable firing order (first scheduled fires first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimerKey {
    /// When the entry fires
    pub due: Instant,

    /// Insertion order tie-breaker, process-wide monotone
    pub seq: u64,
}

impl TimerKey {
    /// Allocate the next key for deadline `due`
    pub fn next(due: Instant) -> Self {
        static SEQUENCE: AtomicU64 = AtomicU64::new(1);
        Self {
            due,
            seq: SEQUENCE.fetch_add(1, Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_orders_by_deadline_first() {
        let now = Instant::now();
        let late = TimerKey::next(now + Duration::from_millis(50));
        let early = TimerKey::next(now + Duration::from_millis(10));

        assert!(early < late);
    }

    #[test]
    fn test_equal_deadlines_keep_insertion_order() {
        let due = Instant::now() + Duration::from_millis(10);
        let first = TimerKey::next(due);
        let second = TimerKey::next(due);

        assert!(first < second);
    }

    #[test]
    fn test_keys_unique() {
        let due = Instant::now();
        let keys: Vec<_> = (0..100).map(|_| TimerKey::next(due)).collect();
        let unique: std::collections::BTreeSet<_> = keys.iter().collect();
        assert_eq!(keys.len(), unique.len());
    }
}
