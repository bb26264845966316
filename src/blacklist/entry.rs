//! Heap entries and their expiry ordering.

use crate::queue::Priority;

/// One revocation record as stored in the expiry heap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapEntry<K, V> {
    /// The blacklisted key
    pub key: K,
    /// Expiry in milliseconds since the Unix epoch
    pub expires_at_ms: u64,
    /// Optional payload carried alongside the key
    pub value: Option<V>,
}

impl<K, V> HeapEntry<K, V> {
    /// Creates a new entry.
    pub fn new(key: K, expires_at_ms: u64, value: Option<V>) -> Self {
        Self {
            key,
            expires_at_ms,
            value,
        }
    }

    /// Checks whether this entry has expired at `now_ms`.
    ///
    /// An entry expiring exactly at `now_ms` is still live.
    #[inline]
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.expires_at_ms < now_ms
    }
}

/// Earliest expiry first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByExpiry;

impl<K, V> Priority<HeapEntry<K, V>> for ByExpiry {
    #[inline]
    fn outranks(&self, a: &HeapEntry<K, V>, b: &HeapEntry<K, V>) -> bool {
        a.expires_at_ms < b.expires_at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::PriorityQueue;

    #[test]
    fn test_is_expired_at_is_strict() {
        let entry: HeapEntry<&str, ()> = HeapEntry::new("k", 100, None);

        assert!(!entry.is_expired_at(99));
        assert!(!entry.is_expired_at(100));
        assert!(entry.is_expired_at(101));
    }

    #[test]
    fn test_by_expiry_orders_earliest_first() {
        let mut queue = PriorityQueue::new(ByExpiry);
        queue.push([
            HeapEntry::new("late", 300, Some(3)),
            HeapEntry::new("early", 100, Some(1)),
            HeapEntry::new("middle", 200, None),
        ]);

        let keys: Vec<_> = std::iter::from_fn(|| queue.pop()).map(|e| e.key).collect();
        assert_eq!(keys, vec!["early", "middle", "late"]);
    }
}
