// src/repositories/id_allocator.rs

use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::Id;

const FIRST_ID: Id = 1;

/// Monotonic id source for in-memory tables.
///
/// Ids start at 1 and are never handed out twice until `reset`.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicI64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicI64::new(FIRST_ID),
        }
    }

    pub fn next_id(&self) -> Id {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// Test support: the next id handed out is 1 again
    pub fn reset(&self) {
        self.next.store(FIRST_ID, Ordering::SeqCst);
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let ids = IdAllocator::new();
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.next_id(), 3);
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let ids = IdAllocator::new();
        ids.next_id();
        ids.next_id();
        ids.reset();
        assert_eq!(ids.next_id(), 1);
    }

    #[test]
    fn test_concurrent_allocation_never_repeats() {
        let ids = Arc::new(IdAllocator::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..250).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "id {} handed out twice", id);
            }
        }
        assert_eq!(seen.len(), 1000);
        assert_eq!(seen.iter().min(), Some(&1));
        assert_eq!(seen.iter().max(), Some(&1000));
    }
}
