use std::sync::atomic::{AtomicU64, Ordering};

/// Entity kinds that draw from their own ID sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Category,
    File,
}

/// Per-kind monotonic ID counters. IDs start at 1 and are never reused.
#[derive(Debug)]
pub struct IdAllocator {
    user: AtomicU64,
    category: AtomicU64,
    file: AtomicU64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            user: AtomicU64::new(1),
            category: AtomicU64::new(1),
            file: AtomicU64::new(1),
        }
    }

    /// Returns the current counter value for `kind` and advances it.
    pub fn next_id(&self, kind: EntityKind) -> u64 {
        let counter = match kind {
            EntityKind::User => &self.user,
            EntityKind::Category => &self.category,
            EntityKind::File => &self.file,
        };
        counter.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn kinds_have_independent_sequences() {
        let ids = IdAllocator::new();
        assert_eq!(ids.next_id(EntityKind::Category), 1);
        assert_eq!(ids.next_id(EntityKind::Category), 2);
        assert_eq!(ids.next_id(EntityKind::File), 1);
        assert_eq!(ids.next_id(EntityKind::User), 1);
        assert_eq!(ids.next_id(EntityKind::Category), 3);
    }

    #[test]
    fn concurrent_allocation_never_repeats() {
        let ids = Arc::new(IdAllocator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = ids.clone();
                std::thread::spawn(move || {
                    (0..500).map(|_| ids.next_id(EntityKind::File)).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {}", id);
            }
        }
        assert_eq!(seen.len(), 4000);
        assert_eq!(ids.next_id(EntityKind::File), 4001);
    }
}
