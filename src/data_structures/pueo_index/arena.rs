// Copyright (c) 2025 Pueo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Chunked node arena backing one first-character subtree.
//!
//! Nodes reference their parent and children by dense index rather than by
//! pointer. Storage grows in fixed-size chunks: a slot is written once when it is
//! first handed out and the list of chunks is swapped atomically on growth, so
//! readers can resolve an index without taking the subtree lock. Unlinked slots
//! are recycled through a free list owned by the writer.

use std::sync::Arc;

use arc_swap::ArcSwap;
use once_cell::sync::OnceCell;

use super::node::{Label, NodeId, TrieNode};

const CHUNK_SHIFT: usize = 6;
const CHUNK_LEN: usize = 1 << CHUNK_SHIFT;
const CHUNK_MASK: usize = CHUNK_LEN - 1;

struct Chunk<V> {
    slots: Box<[OnceCell<Arc<TrieNode<V>>>]>,
}

impl<V> Chunk<V> {
    fn new() -> Self {
        Self {
            slots: (0..CHUNK_LEN).map(|_| OnceCell::new()).collect(),
        }
    }
}

/// Writer-side allocation state.
///
/// Only ever touched while the owning subtree's mutex is held.
#[derive(Debug, Default)]
pub(crate) struct ArenaCursor {
    /// Next never-used slot
    next: usize,

    /// Unlinked slots ready for reuse
    free: Vec<NodeId>,
}

#[cfg(test)]
impl ArenaCursor {
    /// Number of slots currently holding linked nodes.
    pub(crate) fn live(&self) -> usize {
        self.next - self.free.len()
    }
}

/// Append-only, chunked storage for trie nodes.
pub(crate) struct NodeArena<V> {
    chunks: ArcSwap<Vec<Arc<Chunk<V>>>>,
}

impl<V> NodeArena<V> {
    pub(crate) fn new() -> Self {
        Self {
            chunks: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Resolves an index to its node, lock-free.
    ///
    /// Returns `None` for slots that were never handed out in the current
    /// generation of the arena.
    pub(crate) fn get(&self, id: NodeId) -> Option<Arc<TrieNode<V>>> {
        let idx = id as usize;
        let chunks = self.chunks.load();
        chunks
            .get(idx >> CHUNK_SHIFT)?
            .slots
            .get(idx & CHUNK_MASK)?
            .get()
            .cloned()
    }

    /// Upper bound on the number of slots readers can currently resolve.
    pub(crate) fn capacity(&self) -> usize {
        self.chunks.load().len() * CHUNK_LEN
    }

    /// Hands out a slot for a new node, preferring recycled ones.
    pub(crate) fn alloc(&self, cursor: &mut ArenaCursor, label: Label, parent: NodeId) -> NodeId {
        while let Some(id) = cursor.free.pop() {
            if let Some(node) = self.get(id) {
                node.reinit(label, parent);
                return id;
            }
        }

        let idx = cursor.next;
        let chunk_idx = idx >> CHUNK_SHIFT;
        let mut chunks = self.chunks.load_full();
        if chunk_idx >= chunks.len() {
            let mut grown = Vec::clone(&chunks);
            grown.push(Arc::new(Chunk::new()));
            let grown = Arc::new(grown);
            self.chunks.store(Arc::clone(&grown));
            chunks = grown;
        }

        // Fresh slots are handed out exactly once per arena generation
        let _ = chunks[chunk_idx].slots[idx & CHUNK_MASK].set(Arc::new(TrieNode::new(label, parent)));
        cursor.next += 1;
        idx as NodeId
    }

    /// Returns an unlinked node's slot to the free list.
    pub(crate) fn release(&self, cursor: &mut ArenaCursor, id: NodeId) {
        if let Some(node) = self.get(id) {
            node.clear();
        }
        cursor.free.push(id);
    }

    /// Starts a new generation: every previous slot becomes unreachable.
    ///
    /// Readers that loaded the old chunk list keep a consistent view of it until
    /// they drop their handles.
    pub(crate) fn reset(&self, cursor: &mut ArenaCursor) {
        self.chunks.store(Arc::new(Vec::new()));
        *cursor = ArenaCursor::default();
    }
}

#[cfg(test)]
mod tests {
    use super::super::node::NO_PARENT;
    use super::*;

    #[test]
    fn test_alloc_and_get() {
        let arena: NodeArena<u32> = NodeArena::new();
        let mut cursor = ArenaCursor::default();

        let root = arena.alloc(&mut cursor, Label::single('a'), NO_PARENT);
        let child = arena.alloc(&mut cursor, Label::single('b'), root);

        assert_eq!(root, 0);
        assert_eq!(child, 1);
        assert_eq!(cursor.live(), 2);
        assert_eq!(arena.get(child).map(|n| n.parent()), Some(root));
        assert!(arena.get(2).is_none());
    }

    #[test]
    fn test_growth_across_chunks() {
        let arena: NodeArena<u32> = NodeArena::new();
        let mut cursor = ArenaCursor::default();

        let count = CHUNK_LEN * 3 + 5;
        for i in 0..count {
            let id = arena.alloc(&mut cursor, Label::single('x'), NO_PARENT);
            assert_eq!(id as usize, i);
        }

        assert!(arena.capacity() >= count);
        assert!(arena.get((count - 1) as NodeId).is_some());
        assert!(arena.get(count as NodeId).is_none());
    }

    #[test]
    fn test_release_recycles_slots() {
        let arena: NodeArena<u32> = NodeArena::new();
        let mut cursor = ArenaCursor::default();

        let _root = arena.alloc(&mut cursor, Label::single('a'), NO_PARENT);
        let leaf = arena.alloc(&mut cursor, Label::single('b'), 0);
        if let Some(node) = arena.get(leaf) {
            node.put_values(vec![1]);
        }

        arena.release(&mut cursor, leaf);
        assert_eq!(cursor.live(), 1);

        let reused = arena.alloc(&mut cursor, Label::single('c'), 0);
        assert_eq!(reused, leaf);
        let node = arena.get(reused).unwrap();
        assert_eq!(node.edge(), 'c');
        assert!(!node.is_terminal());
    }

    #[test]
    fn test_reset_starts_new_generation() {
        let arena: NodeArena<u32> = NodeArena::new();
        let mut cursor = ArenaCursor::default();
        arena.alloc(&mut cursor, Label::single('a'), NO_PARENT);
        let stale = arena.get(0).unwrap();

        arena.reset(&mut cursor);
        assert!(arena.get(0).is_none());
        assert_eq!(cursor.live(), 0);

        // Handles taken before the reset stay usable
        assert_eq!(stale.edge(), 'a');
    }
}
