// Copyright (c) 2025 Pueo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Radix trie storage for a single first-character subtree.
//!
//! Every key starting with the same character lives in one [`Subtree`]. Lookups
//! walk it lock-free, comparing whole labels per step. Mutations go through a
//! [`SubtreeWriter`], which can only be obtained by taking the subtree's mutex,
//! and re-establish path compression before releasing it:
//!
//! * inserting below a label that diverges part way through splits the label,
//!   moving the original tail (with its values and children) into a new child;
//! * removing a key prunes childless non-terminal nodes upwards and merges a
//!   non-terminal node left with a single child into that child.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::trace;

use super::arena::{ArenaCursor, NodeArena};
use super::error::{IndexError, IndexResult};
use super::node::{ChildMap, Label, NodeId, TrieNode, NO_PARENT, ROOT_ID};

/// What an insertion changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InsertOutcome {
    /// The key did not exist before
    NewKey,
    /// The key existed and gained a value
    NewValue,
    /// The key already carried this value
    Duplicate,
}

/// All keys sharing one first character, plus the lock serialising their writers.
pub(crate) struct Subtree<V> {
    /// First character of every key in this subtree
    first: char,

    /// Node storage, readable without the lock
    arena: NodeArena<V>,

    /// Writer lock and allocation state
    writer: Mutex<ArenaCursor>,

    /// Number of terminal nodes
    keys: AtomicUsize,
}

impl<V> Subtree<V> {
    /// Creates a subtree whose root is vacant.
    pub(crate) fn new(first: char) -> Self {
        let arena = NodeArena::new();
        let mut cursor = ArenaCursor::default();
        arena.alloc(&mut cursor, Label::single(first), NO_PARENT);
        Self {
            first,
            arena,
            writer: Mutex::new(cursor),
            keys: AtomicUsize::new(0),
        }
    }

    pub(crate) fn first(&self) -> char {
        self.first
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<Arc<TrieNode<V>>> {
        self.arena.get(id)
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.load(Ordering::Acquire)
    }

    /// Upper bound on the number of nodes, used to cap upward walks.
    pub(crate) fn node_capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Finds the terminal node for `key` without locking.
    ///
    /// Labels are compared as whole slices, one node per step.
    pub(crate) fn locate(&self, key: &[char]) -> Option<NodeId> {
        let mut id = ROOT_ID;
        let mut pos = 0;
        loop {
            let node = self.node(id)?;
            let label = node.label();
            let end = pos + label.len();
            if end > key.len() || key[pos..end] != *label.chars() {
                return None;
            }
            if end == key.len() {
                return node.is_terminal().then_some(id);
            }
            id = node.child(key[end])?;
            pos = end;
        }
    }

    /// Takes the subtree lock.
    pub(crate) fn writer(&self) -> SubtreeWriter<'_, V> {
        SubtreeWriter {
            subtree: self,
            cursor: self.writer.lock(),
        }
    }

    /// Walks the subtree and reports the first broken structural invariant.
    pub(crate) fn check_structure(&self) -> IndexResult<()> {
        let violation = |message: String| {
            Err(IndexError::StructureViolation(format!(
                "subtree '{}': {message}",
                self.first
            )))
        };

        let mut stack = vec![(ROOT_ID, NO_PARENT)];
        let mut terminals = 0;
        let mut visited = 0;
        while let Some((id, expected_parent)) = stack.pop() {
            visited += 1;
            if visited > self.node_capacity() {
                return violation("cycle between nodes".to_string());
            }
            let Some(node) = self.node(id) else {
                return violation(format!("dangling node {id}"));
            };
            let label = node.label();
            if node.parent() != expected_parent {
                return violation(format!("node '{label}' has a stale parent link"));
            }

            let children = node.children();
            if node.is_terminal() {
                terminals += 1;
            } else if id == ROOT_ID {
                if children.len() == 1 {
                    return violation(format!("root '{label}' has a single child"));
                }
            } else if children.len() < 2 {
                return violation(format!(
                    "non-terminal node '{label}' has {} children",
                    children.len()
                ));
            }

            for (&edge, &child_id) in children.iter() {
                match self.node(child_id) {
                    Some(child) if child.edge() == edge => stack.push((child_id, id)),
                    Some(_) => return violation(format!("child under '{edge}' has another edge")),
                    None => return violation(format!("dangling child {child_id}")),
                }
            }
        }

        if terminals != self.key_count() {
            return violation(format!(
                "{terminals} terminal nodes but {} counted keys",
                self.key_count()
            ));
        }
        Ok(())
    }
}

/// Exclusive access to one subtree's structure.
pub(crate) struct SubtreeWriter<'a, V> {
    subtree: &'a Subtree<V>,
    cursor: MutexGuard<'a, ArenaCursor>,
}

impl<V: Clone + PartialEq> SubtreeWriter<'_, V> {
    /// Associates `value` with `key`; `key` must start with the subtree's character.
    pub(crate) fn insert(&mut self, key: &[char], value: V) -> IndexResult<InsertOutcome> {
        debug_assert_eq!(key.first(), Some(&self.subtree.first));

        let root = self.node(ROOT_ID)?;
        if root.is_vacant() {
            root.set_label(Label::new(key));
            root.put_values(vec![value]);
            self.subtree.keys.fetch_add(1, Ordering::AcqRel);
            return Ok(InsertOutcome::NewKey);
        }

        let mut id = ROOT_ID;
        let mut node = root;
        let mut pos = 0;
        loop {
            let label = node.label();
            let common = label.common_prefix_len(&key[pos..]);

            if common < label.len() {
                self.split(id, &node, common)?;
                if pos + common == key.len() {
                    node.put_values(vec![value]);
                } else {
                    self.attach_leaf(id, &node, &key[pos + common..], value);
                }
                self.subtree.keys.fetch_add(1, Ordering::AcqRel);
                return Ok(InsertOutcome::NewKey);
            }

            pos += label.len();
            if pos == key.len() {
                return Ok(self.add_value(&node, value));
            }

            match node.child(key[pos]) {
                Some(child_id) => {
                    node = self.node(child_id)?;
                    id = child_id;
                }
                None => {
                    self.attach_leaf(id, &node, &key[pos..], value);
                    self.subtree.keys.fetch_add(1, Ordering::AcqRel);
                    return Ok(InsertOutcome::NewKey);
                }
            }
        }
    }

    /// Removes `key` and returns every value it carried.
    pub(crate) fn remove_key(&mut self, key: &[char]) -> IndexResult<Option<Arc<Vec<V>>>> {
        let Some(id) = self.subtree.locate(key) else {
            return Ok(None);
        };
        let node = self.node(id)?;
        let removed = node.take_values();
        if removed.is_some() {
            self.subtree.keys.fetch_sub(1, Ordering::AcqRel);
            self.prune(id)?;
        }
        Ok(removed)
    }

    /// Removes a single association; the key goes away with its last value.
    pub(crate) fn remove_value(&mut self, key: &[char], value: &V) -> IndexResult<bool> {
        let Some(id) = self.subtree.locate(key) else {
            return Ok(false);
        };
        let node = self.node(id)?;
        let Some(values) = node.values() else {
            return Ok(false);
        };
        if !values.contains(value) {
            return Ok(false);
        }

        let remaining: Vec<V> = values.iter().filter(|v| *v != value).cloned().collect();
        if remaining.is_empty() {
            node.set_values(None);
            self.subtree.keys.fetch_sub(1, Ordering::AcqRel);
            self.prune(id)?;
        } else {
            node.put_values(remaining);
        }
        Ok(true)
    }

    /// Drops every key, returning how many there were.
    pub(crate) fn reset(&mut self) -> usize {
        let removed = self.subtree.keys.swap(0, Ordering::AcqRel);
        self.subtree.arena.reset(&mut self.cursor);
        self.subtree
            .arena
            .alloc(&mut self.cursor, Label::single(self.subtree.first), NO_PARENT);
        removed
    }

    fn node(&self, id: NodeId) -> IndexResult<Arc<TrieNode<V>>> {
        self.subtree.node(id).ok_or(IndexError::DanglingNode {
            first: self.subtree.first,
            id,
        })
    }

    fn add_value(&self, node: &TrieNode<V>, value: V) -> InsertOutcome {
        match node.values() {
            None => {
                node.put_values(vec![value]);
                self.subtree.keys.fetch_add(1, Ordering::AcqRel);
                InsertOutcome::NewKey
            }
            Some(values) if values.contains(&value) => InsertOutcome::Duplicate,
            Some(values) => {
                let mut next = Vec::with_capacity(values.len() + 1);
                next.extend(values.iter().cloned());
                next.push(value);
                node.put_values(next);
                InsertOutcome::NewValue
            }
        }
    }

    /// Links a fully built leaf holding `rest` below `parent`.
    fn attach_leaf(&mut self, parent_id: NodeId, parent: &TrieNode<V>, rest: &[char], value: V) {
        let label = Label::new(rest);
        let edge = label.edge();
        let leaf_id = self.subtree.arena.alloc(&mut self.cursor, label, parent_id);
        if let Some(leaf) = self.subtree.node(leaf_id) {
            leaf.put_values(vec![value]);
        }
        parent.insert_child(edge, leaf_id);
    }

    /// Breaks `node`'s label at `at`.
    ///
    /// The node keeps the head of its label and becomes non-terminal; a new child
    /// takes the tail along with the node's former values and children.
    fn split(&mut self, id: NodeId, node: &TrieNode<V>, at: usize) -> IndexResult<()> {
        let label = node.label();
        let (head, tail) = label.split_at(at);
        let tail_edge = tail.edge();
        let moved_children = node.children();

        let tail_id = self.subtree.arena.alloc(&mut self.cursor, tail, id);
        let tail_node = self.node(tail_id)?;
        tail_node.set_values(node.values());
        tail_node.set_children(ChildMap::clone(&moved_children));
        for &grandchild in moved_children.values() {
            self.node(grandchild)?.set_parent(tail_id);
        }

        let mut children = ChildMap::default();
        children.insert(tail_edge, tail_id);
        node.set_children(children);
        node.set_values(None);
        node.set_label(head);

        trace!(subtree = %self.subtree.first, label = %label, at, "split compressed label");
        Ok(())
    }

    /// Folds `child_id`, the only child of a non-terminal `node`, into `node`.
    fn merge(&mut self, id: NodeId, node: &TrieNode<V>, child_id: NodeId) -> IndexResult<()> {
        let child = self.node(child_id)?;
        let grandchildren = child.children();
        for &grandchild in grandchildren.values() {
            self.node(grandchild)?.set_parent(id);
        }

        let merged = node.label().concat(&child.label());
        node.set_values(child.values());
        node.set_children(ChildMap::clone(&grandchildren));
        node.set_label(merged);
        self.subtree.arena.release(&mut self.cursor, child_id);

        trace!(subtree = %self.subtree.first, label = %node.label(), "merged single child");
        Ok(())
    }

    /// Restores compression after `id` stopped being terminal.
    fn prune(&mut self, id: NodeId) -> IndexResult<()> {
        let mut current = id;
        loop {
            let node = self.node(current)?;
            if node.is_terminal() {
                return Ok(());
            }

            let children = node.children();
            match children.len() {
                0 if current == ROOT_ID => {
                    node.set_label(Label::single(self.subtree.first));
                    trace!(subtree = %self.subtree.first, "subtree emptied");
                    return Ok(());
                }
                0 => {
                    let parent_id = node.parent();
                    let parent = self.node(parent_id)?;
                    parent.remove_child(node.edge());
                    self.subtree.arena.release(&mut self.cursor, current);
                    trace!(subtree = %self.subtree.first, label = %node.label(), "pruned empty node");
                    current = parent_id;
                }
                1 => {
                    if let Some(&only) = children.values().next() {
                        self.merge(current, &node, only)?;
                    }
                    return Ok(());
                }
                _ => return Ok(()),
            }
        }
    }
}
