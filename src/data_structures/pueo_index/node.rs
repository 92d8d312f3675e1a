// Copyright (c) 2025 Pueo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Node implementation for the Pueo index.
//!
//! A node owns one edge character plus an optional compressed suffix, the set of
//! values for the key ending at it, its children keyed by edge character, and the
//! index of its parent inside the subtree arena. Every field that a writer can
//! change is held behind an atomically swapped snapshot, so readers never block
//! and always see a complete (if possibly stale) version of each field.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use fnv::FnvBuildHasher;
use hashbrown::HashMap;

/// Dense index of a node inside its subtree arena.
pub(crate) type NodeId = u32;

/// The subtree root always lives in the first arena slot.
pub(crate) const ROOT_ID: NodeId = 0;

/// Parent marker for subtree roots, whose parent is the synthetic index root.
pub(crate) const NO_PARENT: NodeId = NodeId::MAX;

/// Children of a node, keyed by their edge character.
pub(crate) type ChildMap = HashMap<char, NodeId, FnvBuildHasher>;

/// The characters a node contributes to every key below it.
///
/// The first character is the edge character; the remainder is the compressed
/// suffix folded into the node. A label is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Label {
    chars: Box<[char]>,
}

impl Label {
    /// Creates a label from a non-empty run of characters.
    pub(crate) fn new(chars: &[char]) -> Self {
        debug_assert!(!chars.is_empty(), "labels always carry an edge character");
        Self {
            chars: chars.into(),
        }
    }

    /// Creates a label holding only an edge character.
    pub(crate) fn single(edge: char) -> Self {
        Self {
            chars: Box::new([edge]),
        }
    }

    pub(crate) fn edge(&self) -> char {
        self.chars[0]
    }

    /// The compressed suffix following the edge character.
    #[cfg(test)]
    pub(crate) fn suffix(&self) -> &[char] {
        &self.chars[1..]
    }

    pub(crate) fn chars(&self) -> &[char] {
        &self.chars
    }

    pub(crate) fn len(&self) -> usize {
        self.chars.len()
    }

    /// Number of leading characters shared with `key`.
    pub(crate) fn common_prefix_len(&self, key: &[char]) -> usize {
        self.chars
            .iter()
            .zip(key.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Splits the label into `[..at]` and `[at..]`.
    ///
    /// `at` must fall strictly inside the label so both halves keep an edge.
    pub(crate) fn split_at(&self, at: usize) -> (Label, Label) {
        debug_assert!(at > 0 && at < self.chars.len());
        let (head, tail) = self.chars.split_at(at);
        (Label::new(head), Label::new(tail))
    }

    /// Folds `other` onto the end of this label.
    pub(crate) fn concat(&self, other: &Label) -> Label {
        let mut chars = Vec::with_capacity(self.len() + other.len());
        chars.extend_from_slice(&self.chars);
        chars.extend_from_slice(&other.chars);
        Self {
            chars: chars.into_boxed_slice(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.chars.iter() {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// A node in the Pueo radix trie.
///
/// Writers replace whole field snapshots (copy-on-write); readers load them
/// without taking any lock. `values` is `Some` exactly when the node is terminal
/// and the stored vector is never empty.
pub(crate) struct TrieNode<V> {
    /// Edge character plus compressed suffix
    label: ArcSwap<Label>,

    /// Children keyed by their edge character
    children: ArcSwap<ChildMap>,

    /// Values for the key ending at this node, present only for terminals
    values: ArcSwapOption<Vec<V>>,

    /// Arena index of the parent, `NO_PARENT` for the subtree root
    parent: AtomicU32,
}

impl<V> TrieNode<V> {
    /// Creates a non-terminal, childless node.
    pub(crate) fn new(label: Label, parent: NodeId) -> Self {
        Self {
            label: ArcSwap::from_pointee(label),
            children: ArcSwap::from_pointee(ChildMap::default()),
            values: ArcSwapOption::empty(),
            parent: AtomicU32::new(parent),
        }
    }

    /// Reinitialises a recycled node so it can be linked somewhere else.
    pub(crate) fn reinit(&self, label: Label, parent: NodeId) {
        self.values.store(None);
        self.children.store(Arc::new(ChildMap::default()));
        self.parent.store(parent, Ordering::Release);
        self.label.store(Arc::new(label));
    }

    /// Drops the node's values and children once it has been unlinked.
    pub(crate) fn clear(&self) {
        self.values.store(None);
        self.children.store(Arc::new(ChildMap::default()));
    }

    pub(crate) fn label(&self) -> Arc<Label> {
        self.label.load_full()
    }

    pub(crate) fn set_label(&self, label: Label) {
        self.label.store(Arc::new(label));
    }

    pub(crate) fn edge(&self) -> char {
        self.label.load().edge()
    }

    /// Snapshot of the child map at the instant of the call.
    pub(crate) fn children(&self) -> Arc<ChildMap> {
        self.children.load_full()
    }

    pub(crate) fn child(&self, edge: char) -> Option<NodeId> {
        self.children.load().get(&edge).copied()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.load().len()
    }

    pub(crate) fn set_children(&self, children: ChildMap) {
        self.children.store(Arc::new(children));
    }

    /// Publishes a new child map containing `edge -> id`.
    pub(crate) fn insert_child(&self, edge: char, id: NodeId) {
        let mut next = ChildMap::clone(&self.children.load());
        next.insert(edge, id);
        self.children.store(Arc::new(next));
    }

    /// Publishes a new child map without `edge`.
    pub(crate) fn remove_child(&self, edge: char) -> Option<NodeId> {
        let mut next = ChildMap::clone(&self.children.load());
        let removed = next.remove(&edge);
        self.children.store(Arc::new(next));
        removed
    }

    /// Snapshot of the value set, `None` when the node is not terminal.
    pub(crate) fn values(&self) -> Option<Arc<Vec<V>>> {
        self.values.load_full()
    }

    pub(crate) fn set_values(&self, values: Option<Arc<Vec<V>>>) {
        self.values.store(values.filter(|values| !values.is_empty()));
    }

    /// Replaces the value set, clearing the terminal marker for an empty set.
    pub(crate) fn put_values(&self, values: Vec<V>) {
        self.set_values(Some(Arc::new(values)));
    }

    /// Removes and returns the value set, clearing the terminal marker.
    pub(crate) fn take_values(&self) -> Option<Arc<Vec<V>>> {
        self.values.swap(None)
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.values.load().is_some()
    }

    /// A node is vacant when it carries no key and leads nowhere.
    pub(crate) fn is_vacant(&self) -> bool {
        !self.is_terminal() && self.child_count() == 0
    }

    pub(crate) fn parent(&self) -> NodeId {
        self.parent.load(Ordering::Acquire)
    }

    pub(crate) fn set_parent(&self, parent: NodeId) {
        self.parent.store(parent, Ordering::Release);
    }
}

impl<V> fmt::Debug for TrieNode<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrieNode")
            .field("label", &self.label().to_string())
            .field("terminal", &self.is_terminal())
            .field("children", &self.child_count())
            .field("parent", &self.parent())
            .finish()
    }
}
