// Copyright (c) 2025 Pueo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Registry of first-character subtrees and their locks.
//!
//! The table doubles as the child collection of the synthetic index root. It is
//! published as an immutable map behind an atomic pointer: lookups never lock,
//! and registering a new first character copies the map under a table-wide mutex
//! after re-checking that no other writer got there first.

use std::sync::Arc;

use arc_swap::ArcSwap;
use fnv::FnvBuildHasher;
use hashbrown::HashMap;
use parking_lot::Mutex;
use tracing::debug;

use super::store::Subtree;

/// Immutable snapshot of every registered subtree.
pub(crate) type SubtreeMap<V> = HashMap<char, Arc<Subtree<V>>, FnvBuildHasher>;

pub(crate) struct SubtreeLockTable<V> {
    /// Current snapshot, replaced wholesale on registration
    entries: ArcSwap<SubtreeMap<V>>,

    /// Serialises registration of new first characters
    registration: Mutex<()>,
}

impl<V> SubtreeLockTable<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(SubtreeMap::default()),
            registration: Mutex::new(()),
        }
    }

    pub(crate) fn get(&self, first: char) -> Option<Arc<Subtree<V>>> {
        self.entries.load().get(&first).cloned()
    }

    /// Returns the subtree for `first`, registering it if needed.
    ///
    /// Racing callers for the same new character all receive the same subtree.
    pub(crate) fn get_or_register(&self, first: char) -> Arc<Subtree<V>> {
        if let Some(subtree) = self.get(first) {
            return subtree;
        }

        let _guard = self.registration.lock();
        if let Some(subtree) = self.get(first) {
            return subtree;
        }

        let subtree = Arc::new(Subtree::new(first));
        let mut next = SubtreeMap::clone(&self.entries.load());
        next.insert(first, Arc::clone(&subtree));
        self.entries.store(Arc::new(next));
        debug!(first = %first, subtrees = self.len(), "registered subtree");
        subtree
    }

    /// The map as of this instant; later registrations are not visible in it.
    pub(crate) fn snapshot(&self) -> Arc<SubtreeMap<V>> {
        self.entries.load_full()
    }

    /// Number of registered first characters.
    pub(crate) fn len(&self) -> usize {
        self.entries.load().len()
    }

    /// Sum of the per-subtree key counters.
    pub(crate) fn key_count(&self) -> usize {
        self.entries
            .load()
            .values()
            .map(|subtree| subtree.key_count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_registration_is_idempotent() {
        let table: SubtreeLockTable<u32> = SubtreeLockTable::new();
        assert!(table.get('a').is_none());

        let first = table.get_or_register('a');
        let second = table.get_or_register('a');
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(table.len(), 1);
        assert_eq!(first.first(), 'a');
    }

    #[test]
    fn test_snapshot_does_not_see_later_registrations() {
        let table: SubtreeLockTable<u32> = SubtreeLockTable::new();
        table.get_or_register('a');
        let snapshot = table.snapshot();

        table.get_or_register('b');
        assert_eq!(snapshot.len(), 1);
        assert_eq!(table.snapshot().len(), 2);
    }

    #[test]
    fn test_racing_registration_creates_one_subtree() {
        const THREADS: usize = 8;
        let table: Arc<SubtreeLockTable<u32>> = Arc::new(SubtreeLockTable::new());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let table = Arc::clone(&table);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    table.get_or_register('q')
                })
            })
            .collect();

        let subtrees: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for subtree in &subtrees[1..] {
            assert!(Arc::ptr_eq(&subtrees[0], subtree));
        }
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_key_count_sums_subtrees() {
        let table: SubtreeLockTable<u32> = SubtreeLockTable::new();
        let a = table.get_or_register('a');
        let b = table.get_or_register('b');
        a.writer().insert(&['a', 'x'], 1).unwrap();
        a.writer().insert(&['a', 'y'], 2).unwrap();
        b.writer().insert(&['b'], 3).unwrap();
        assert_eq!(table.key_count(), 3);
    }
}
