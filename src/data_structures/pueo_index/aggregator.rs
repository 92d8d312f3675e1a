// Copyright (c) 2025 Pueo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Bounded, deduplicated collection of search results.

use fnv::FnvHashSet;
use serde::Serialize;

use super::node::{NodeId, NO_PARENT, ROOT_ID};
use super::store::Subtree;

/// A key matched by a search, with the values stored under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit<V> {
    /// The stored key
    pub key: String,

    /// Values associated with the key at the time it was collected
    pub values: Vec<V>,
}

/// Accumulates hits for one search call.
///
/// The same node can be reached through several edit paths; it is reported at
/// most once. Once `limit` hits are held, further offers are refused.
#[derive(Debug)]
pub(crate) struct ResultAggregator<V> {
    hits: Vec<SearchHit<V>>,
    emitted: FnvHashSet<(char, NodeId)>,
    limit: usize,
}

impl<V: Clone> ResultAggregator<V> {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            hits: Vec::with_capacity(limit.min(64)),
            emitted: FnvHashSet::default(),
            limit,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.hits.len()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.hits.len() >= self.limit
    }

    /// Records the key ending at `id` if it is terminal and not yet reported.
    ///
    /// Returns `true` when a hit was added.
    pub(crate) fn offer(&mut self, subtree: &Subtree<V>, id: NodeId) -> bool {
        let marker = (subtree.first(), id);
        if self.is_full() || self.emitted.contains(&marker) {
            return false;
        }
        let Some(values) = subtree.node(id).and_then(|node| node.values()) else {
            return false;
        };
        let Some(key) = reconstruct_key(subtree, id) else {
            return false;
        };

        self.emitted.insert(marker);
        self.hits.push(SearchHit {
            key,
            values: values.as_ref().clone(),
        });
        true
    }

    /// Offers every terminal node at or below `id`.
    pub(crate) fn offer_subtree(&mut self, subtree: &Subtree<V>, id: NodeId) {
        let mut stack = vec![id];
        let mut seen = FnvHashSet::default();
        while let Some(current) = stack.pop() {
            if self.is_full() {
                return;
            }
            if !seen.insert(current) {
                continue;
            }
            let Some(node) = subtree.node(current) else {
                continue;
            };
            if node.is_terminal() {
                self.offer(subtree, current);
            }
            stack.extend(node.children().values().copied());
        }
    }

    pub(crate) fn into_hits(self) -> Vec<SearchHit<V>> {
        self.hits
    }
}

/// Rebuilds the key ending at `id` by following parent links to the subtree root.
///
/// Returns `None` if a concurrent mutation left the chain without a root.
pub(crate) fn reconstruct_key<V>(subtree: &Subtree<V>, id: NodeId) -> Option<String> {
    let mut labels = Vec::new();
    let mut current = id;
    let max_steps = subtree.node_capacity();

    for _ in 0..=max_steps {
        let node = subtree.node(current)?;
        labels.push(node.label());
        if current == ROOT_ID {
            let mut key = String::new();
            for label in labels.iter().rev() {
                key.extend(label.chars());
            }
            return Some(key);
        }
        current = node.parent();
        if current == NO_PARENT {
            return None;
        }
    }
    None
}
