// Copyright (c) 2025 Pueo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Budgeted edit-distance search over the compressed trie.
//!
//! The search is a backtracking walk driven by an explicit work stack. A state
//! is a position in the trie (the synthetic root, or an offset inside a node's
//! label), a position in the query, the remaining typo budget and the phrase term
//! being matched.
//!
//! Edge characters branch into match, substitution, insertion and deletion moves.
//! The rest of a label, its compressed suffix, is aligned against the query in
//! one step with an edit matrix: every query end position the label can be
//! consumed against within budget becomes a new state at the node end.
//!
//! Phrase queries start with their first term only. Once that term is used up at
//! a term boundary in the trie, the next term is appended and the walk goes on
//! from the same place with the extra budget that term brings. If nothing new is
//! found below an extension, the keys matching the leading terms are reported
//! instead.

use fnv::FnvHashMap;

use super::aggregator::ResultAggregator;
use super::distance::EditMatrix;
use super::lock_table::SubtreeMap;
use super::node::{NodeId, TrieNode, ROOT_ID};
use super::store::Subtree;

/// Default typo budget for a search term of the given length.
///
/// Grows with the natural logarithm of the term length and never exceeds
/// `max_distance`: terms of one or two characters get no typos, 3 to 7
/// characters get one, 8 to 20 get two.
///
/// ```
/// use pueo_lib::data_structures::pueo_index::fuzziness_for;
///
/// assert_eq!(fuzziness_for("ab", 3), 0);
/// assert_eq!(fuzziness_for("hello", 3), 1);
/// assert_eq!(fuzziness_for("typewriter", 3), 2);
/// assert_eq!(fuzziness_for("typewriter", 1), 1);
/// ```
pub fn fuzziness_for(term: &str, max_distance: usize) -> usize {
    let len = term.chars().count();
    if len == 0 {
        return 0;
    }
    ((len as f64).ln().floor() as usize).min(max_distance)
}

/// Whether matches must end on a stored key or may continue below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchMode {
    /// The whole query must match a whole key
    Exact,
    /// The query must match the start of a key
    Prefix,
}

/// A query split into terms, rejoined with the phrase separator.
#[derive(Debug, Clone)]
pub(crate) struct Phrase {
    chars: Vec<char>,

    /// Exclusive end of each term inside `chars`
    term_ends: Vec<usize>,

    /// Budget each term adds once it is appended
    term_budgets: Vec<usize>,

    separator: char,
}

impl Phrase {
    /// Splits `query` on whitespace.
    ///
    /// With `heuristic` set, every term brings `fuzziness_for(term, max_distance)`;
    /// otherwise the first term carries `max_distance` and later terms nothing.
    /// Returns `None` when the query holds no terms.
    pub(crate) fn parse(query: &str, separator: char, max_distance: usize, heuristic: bool) -> Option<Self> {
        let mut chars = Vec::with_capacity(query.len());
        let mut term_ends = Vec::new();
        let mut term_budgets = Vec::new();

        for (i, term) in query.split_whitespace().enumerate() {
            if i > 0 {
                chars.push(separator);
            }
            chars.extend(term.chars());
            term_ends.push(chars.len());
            term_budgets.push(match (heuristic, i) {
                (true, _) => fuzziness_for(term, max_distance),
                (false, 0) => max_distance,
                (false, _) => 0,
            });
        }

        if term_ends.is_empty() {
            return None;
        }
        Some(Self {
            chars,
            term_ends,
            term_budgets,
            separator,
        })
    }

    /// Treats the whole of `query`, whitespace included, as one term.
    pub(crate) fn single(query: &[char], budget: usize, separator: char) -> Self {
        Self {
            chars: query.to_vec(),
            term_ends: vec![query.len()],
            term_budgets: vec![budget],
            separator,
        }
    }

    /// The in-flight query while matching `term`: every term up to and including it.
    fn query(&self, term: usize) -> &[char] {
        let end = self.term_ends.get(term).copied().unwrap_or(self.chars.len());
        &self.chars[..end]
    }

    fn has_next(&self, term: usize) -> bool {
        term + 1 < self.term_ends.len()
    }

    fn budget_for(&self, term: usize) -> usize {
        self.term_budgets.get(term).copied().unwrap_or(0)
    }

    pub(crate) fn len(&self) -> usize {
        self.chars.len()
    }

    pub(crate) fn term_count(&self) -> usize {
        self.term_ends.len()
    }

    /// Budget available once every term has been appended.
    pub(crate) fn total_budget(&self) -> usize {
        self.term_budgets.iter().sum()
    }
}

/// Position in the trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Cursor {
    /// Above every subtree
    Root,
    /// `offset` characters into the label of node `id` of subtree `first`
    Node { first: char, id: NodeId, offset: usize },
}

#[derive(Debug, Clone, Copy)]
struct State {
    cursor: Cursor,
    pos: usize,
    budget: usize,
    term: usize,
}

enum Frame {
    Visit(State),
    /// Appends the next term: records the result count, then searches on from `next`
    Extend { state: State, next: State },
    /// Popped once the extension above it is done; `found` is the result count
    /// taken when that extension started
    Checkpoint { state: State, found: usize },
}

/// One search call over a snapshot of the subtree table.
pub(crate) struct FuzzySearch<'a, V> {
    subtrees: &'a SubtreeMap<V>,
    phrase: &'a Phrase,
    mode: SearchMode,

    /// Best budget seen per (cursor, query position, term)
    memo: FnvHashMap<(Cursor, usize, usize), usize>,
    visited: usize,
}

impl<'a, V: Clone> FuzzySearch<'a, V> {
    pub(crate) fn new(subtrees: &'a SubtreeMap<V>, phrase: &'a Phrase, mode: SearchMode) -> Self {
        Self {
            subtrees,
            phrase,
            mode,
            memo: FnvHashMap::default(),
            visited: 0,
        }
    }

    /// Runs the search to completion or until `results` is full.
    ///
    /// Returns the number of states expanded.
    pub(crate) fn run(mut self, results: &mut ResultAggregator<V>) -> usize {
        let mut stack = vec![Frame::Visit(State {
            cursor: Cursor::Root,
            pos: 0,
            budget: self.phrase.budget_for(0),
            term: 0,
        })];

        while let Some(frame) = stack.pop() {
            if results.is_full() {
                break;
            }
            match frame {
                Frame::Visit(state) => self.visit(state, &mut stack, results),
                Frame::Extend { state, next } => {
                    // Frames pushed after this one have already run, so only the
                    // extension's own work lands above the checkpoint
                    stack.push(Frame::Checkpoint {
                        state,
                        found: results.len(),
                    });
                    stack.push(Frame::Visit(next));
                }
                Frame::Checkpoint { state, found } => {
                    if results.len() == found {
                        self.roll_back(state, results);
                    }
                }
            }
        }
        self.visited
    }

    fn visit(&mut self, state: State, stack: &mut Vec<Frame>, results: &mut ResultAggregator<V>) {
        let key = (state.cursor, state.pos, state.term);
        if self.memo.get(&key).is_some_and(|&best| best >= state.budget) {
            return;
        }
        self.memo.insert(key, state.budget);
        self.visited += 1;

        let subtrees = self.subtrees;
        match state.cursor {
            Cursor::Root => self.expand_root(state, stack, results),
            Cursor::Node { first, id, offset } => {
                let Some(subtree) = subtrees.get(&first) else {
                    return;
                };
                let Some(node) = subtree.node(id) else {
                    return;
                };
                let label = node.label();
                if offset < label.len() {
                    self.expand_label(state, subtree, id, &label.chars()[offset..], stack, results);
                } else {
                    self.expand_node_end(state, subtree, id, &node, stack, results);
                }
            }
        }
    }

    /// The synthetic root: its children are the subtree roots.
    fn expand_root(&self, state: State, stack: &mut Vec<Frame>, results: &mut ResultAggregator<V>) {
        let query = self.phrase.query(state.term);
        if state.pos == query.len() && self.mode == SearchMode::Prefix {
            for subtree in self.subtrees.values() {
                results.offer_subtree(subtree, ROOT_ID);
            }
            return;
        }

        if state.budget > 0 && state.pos < query.len() {
            stack.push(Frame::Visit(State {
                pos: state.pos + 1,
                budget: state.budget - 1,
                ..state
            }));
        }
        for &first in self.subtrees.keys() {
            let cursor = Cursor::Node {
                first,
                id: ROOT_ID,
                offset: 1,
            };
            push_edge(state, first, cursor, query, stack);
        }
    }

    fn expand_node_end(
        &mut self,
        state: State,
        subtree: &Subtree<V>,
        id: NodeId,
        node: &TrieNode<V>,
        stack: &mut Vec<Frame>,
        results: &mut ResultAggregator<V>,
    ) {
        let phrase = self.phrase;
        let query = phrase.query(state.term);
        let n = query.len();

        if state.pos == n {
            if phrase.has_next(state.term) {
                self.extend_phrase(state, stack);
            } else {
                match self.mode {
                    SearchMode::Prefix => {
                        results.offer_subtree(subtree, id);
                        return;
                    }
                    SearchMode::Exact => {
                        results.offer(subtree, id);
                    }
                }
            }
        }

        if state.budget > 0 && state.pos < n {
            stack.push(Frame::Visit(State {
                pos: state.pos + 1,
                budget: state.budget - 1,
                ..state
            }));
        }
        for (&edge, &child) in node.children().iter() {
            let cursor = Cursor::Node {
                first: subtree.first(),
                id: child,
                offset: 1,
            };
            push_edge(state, edge, cursor, query, stack);
        }
    }

    /// Aligns the unread part of a label against the query in one step.
    fn expand_label(
        &mut self,
        state: State,
        subtree: &Subtree<V>,
        id: NodeId,
        rest: &[char],
        stack: &mut Vec<Frame>,
        results: &mut ResultAggregator<V>,
    ) {
        let Cursor::Node { first, offset, .. } = state.cursor else {
            return;
        };
        let phrase = self.phrase;
        let query = phrase.query(state.term);
        let n = query.len();
        let remaining = n - state.pos;
        let r = rest.len();

        // Query characters beyond r + budget cannot align with the label within budget
        let window = remaining.min(r + state.budget);
        let matrix = EditMatrix::new(rest, &query[state.pos..state.pos + window]);

        if window == remaining {
            // The query can run out strictly inside this label
            for k in 0..r {
                let cost = matrix.get(k, window);
                if cost > state.budget {
                    continue;
                }
                match self.mode {
                    SearchMode::Prefix => {
                        results.offer_subtree(subtree, id);
                        return;
                    }
                    SearchMode::Exact
                        if phrase.has_next(state.term) && rest[k] == phrase.separator =>
                    {
                        let boundary = State {
                            cursor: Cursor::Node {
                                first,
                                id,
                                offset: offset + k,
                            },
                            pos: n,
                            budget: state.budget - cost,
                            term: state.term,
                        };
                        self.extend_phrase(boundary, stack);
                    }
                    SearchMode::Exact => {}
                }
            }
        }

        if remaining + state.budget >= r {
            for e in 0..=window {
                let cost = matrix.get(r, e);
                if cost <= state.budget {
                    stack.push(Frame::Visit(State {
                        cursor: Cursor::Node {
                            first,
                            id,
                            offset: offset + r,
                        },
                        pos: state.pos + e,
                        budget: state.budget - cost,
                        term: state.term,
                    }));
                }
            }
        }
    }

    /// Appends the next term at a term boundary and searches on from there.
    fn extend_phrase(&self, state: State, stack: &mut Vec<Frame>) {
        let term = state.term + 1;
        let next = State {
            term,
            budget: state.budget + self.phrase.budget_for(term),
            ..state
        };
        let key = (next.cursor, next.pos, next.term);
        if self.memo.get(&key).is_some_and(|&best| best >= next.budget) {
            return;
        }

        stack.push(Frame::Extend { state, next });
    }

    /// Reports the keys matched by the leading terms at a fruitless extension.
    fn roll_back(&self, state: State, results: &mut ResultAggregator<V>) {
        let Cursor::Node { first, id, offset } = state.cursor else {
            return;
        };
        let Some(subtree) = self.subtrees.get(&first) else {
            return;
        };
        let Some(node) = subtree.node(id) else {
            return;
        };

        let separator = self.phrase.separator;
        let label = node.label();
        match label.chars().get(offset) {
            Some(&c) if c == separator => results.offer_subtree(subtree, id),
            Some(_) => {}
            None => {
                results.offer(subtree, id);
                if let Some(child) = node.child(separator) {
                    results.offer_subtree(subtree, child);
                }
            }
        }
    }
}

/// Schedules the moves that consume a child's edge character.
fn push_edge(state: State, edge: char, cursor: Cursor, query: &[char], stack: &mut Vec<Frame>) {
    if state.pos < query.len() {
        if query[state.pos] == edge {
            stack.push(Frame::Visit(State {
                cursor,
                pos: state.pos + 1,
                ..state
            }));
        } else if state.budget > 0 {
            // substitution
            stack.push(Frame::Visit(State {
                cursor,
                pos: state.pos + 1,
                budget: state.budget - 1,
                ..state
            }));
        }
    }
    if state.budget > 0 {
        // insertion: the key has a character the query lacks
        stack.push(Frame::Visit(State {
            cursor,
            budget: state.budget - 1,
            ..state
        }));
    }
}
