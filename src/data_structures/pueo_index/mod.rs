// Copyright (c) 2025 Pueo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Pueo Index Implementation
//!
//! A concurrent, typo-tolerant index mapping string keys to sets of values,
//! built on a path-compressed (radix) trie.
//!
//! Key features:
//! * Exact lookup, prefix matching and bounded edit-distance search
//! * Multi-word phrase search with per-term typo budgets
//! * Writers under different first characters never block each other
//! * Lock-free readers that see each node as a consistent snapshot
//!
//! Keys are partitioned by their first character. Each partition is a separate
//! subtree with its own lock; registering a new first character briefly takes a
//! table-wide lock. Readers never lock: they may observe a tree that is part way
//! through a concurrent mutation elsewhere, but never a torn node.
//!
//! [`levenshtein`] and [`fuzziness_for`] are exported for callers that want to
//! rank or filter hits by the same distance and budget the index searches with.
//!
//! # Examples
//!
//! ```
//! use pueo_lib::data_structures::pueo_index::PueoIndex;
//!
//! let index = PueoIndex::new();
//! index.add("hello", 1).unwrap();
//! index.add("help", 2).unwrap();
//! index.add("hell", 3).unwrap();
//!
//! let hits = index.search("helo", 1, 10, false).unwrap();
//! assert_eq!(hits.len(), 3);
//!
//! let hits = index.match_prefix("hel", 0, 10).unwrap();
//! assert_eq!(hits.len(), 3);
//!
//! // Every fuzzy hit lies within the requested distance of the query
//! use pueo_lib::data_structures::pueo_index::levenshtein;
//!
//! let hits = index.search("helo", 1, 10, false).unwrap();
//! assert!(hits.iter().all(|hit| levenshtein(&hit.key, "helo") <= 1));
//! ```

mod aggregator;
mod arena;
mod config;
mod distance;
mod error;
mod fuzzy;
mod lock_table;
mod node;
mod store;

use std::borrow::Cow;
use std::fmt;

use tracing::debug;

pub use aggregator::SearchHit;
pub use config::IndexConfig;
pub use distance::levenshtein;
pub use error::{IndexError, IndexResult};
pub use fuzzy::fuzziness_for;

use aggregator::ResultAggregator;
use fuzzy::{FuzzySearch, Phrase, SearchMode};
use lock_table::SubtreeLockTable;
use node::ROOT_ID;
use store::InsertOutcome;

/// Concurrent key to multi-value index with fuzzy search.
///
/// All operations take `&self`; share the index between threads with an `Arc`.
pub struct PueoIndex<V> {
    /// First-character subtrees and their locks
    table: SubtreeLockTable<V>,

    /// Configuration options
    config: IndexConfig,
}

impl<V> PueoIndex<V> {
    /// Creates a new empty index with default configuration.
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    /// Creates a new empty index with the specified configuration.
    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            table: SubtreeLockTable::new(),
            config,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Number of distinct keys.
    ///
    /// Sums per-subtree counters without locking, so a concurrent writer's
    /// change may or may not be included.
    pub fn len(&self) -> usize {
        self.table.key_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of first characters ever seen, including ones whose keys were all removed.
    pub fn subtree_count(&self) -> usize {
        self.table.len()
    }

    /// Checks the radix compression invariants of every subtree.
    pub fn validate_structure(&self) -> IndexResult<()> {
        for subtree in self.table.snapshot().values() {
            subtree.check_structure()?;
        }
        Ok(())
    }

    fn normalize<'k>(&self, key: &'k str) -> Cow<'k, str> {
        if self.config.case_sensitive() {
            Cow::Borrowed(key)
        } else {
            Cow::Owned(key.to_lowercase())
        }
    }

    fn key_chars(&self, key: &str) -> IndexResult<Vec<char>> {
        if key.is_empty() {
            return Err(IndexError::EmptyKey);
        }
        Ok(self.normalize(key).chars().collect())
    }
}

impl<V: Clone + PartialEq> PueoIndex<V> {
    /// Associates `value` with `key`.
    ///
    /// Returns `true` when the association is new and `false` when the key
    /// already carried an identical value.
    pub fn add<K: AsRef<str>>(&self, key: K, value: V) -> IndexResult<bool> {
        let chars = self.key_chars(key.as_ref())?;
        let subtree = self.table.get_or_register(chars[0]);
        let outcome = subtree.writer().insert(&chars, value)?;
        Ok(outcome != InsertOutcome::Duplicate)
    }

    /// Removes `key` with all its values.
    ///
    /// Returns the removed values, or an empty vector if the key was absent.
    pub fn remove<K: AsRef<str>>(&self, key: K) -> IndexResult<Vec<V>> {
        let chars = self.key_chars(key.as_ref())?;
        let Some(subtree) = self.table.get(chars[0]) else {
            return Ok(Vec::new());
        };
        let removed = subtree.writer().remove_key(&chars)?;
        Ok(removed.map(|values| values.as_ref().clone()).unwrap_or_default())
    }

    /// Removes a single association.
    ///
    /// Returns `false` if `key` does not carry `value`. The key itself goes away
    /// together with its last value.
    pub fn remove_value<K: AsRef<str>>(&self, key: K, value: &V) -> IndexResult<bool> {
        let chars = self.key_chars(key.as_ref())?;
        let Some(subtree) = self.table.get(chars[0]) else {
            return Ok(false);
        };
        let removed = subtree.writer().remove_value(&chars, value)?;
        Ok(removed)
    }

    /// Values stored under `key`, empty if it is absent.
    pub fn get<K: AsRef<str>>(&self, key: K) -> IndexResult<Vec<V>> {
        let chars = self.key_chars(key.as_ref())?;
        let values = self.table.get(chars[0]).and_then(|subtree| {
            let id = subtree.locate(&chars)?;
            subtree.node(id)?.values()
        });
        Ok(values.map(|values| values.as_ref().clone()).unwrap_or_default())
    }

    pub fn contains<K: AsRef<str>>(&self, key: K) -> IndexResult<bool> {
        let chars = self.key_chars(key.as_ref())?;
        Ok(self
            .table
            .get(chars[0])
            .is_some_and(|subtree| subtree.locate(&chars).is_some()))
    }

    /// Finds keys within `max_distance` edits of `query`.
    ///
    /// Whitespace-separated terms are matched as a phrase against keys whose
    /// terms are joined by the configured separator. With `use_heuristic_fuzziness`
    /// each term gets [`fuzziness_for`] typos, capped at `max_distance`; without
    /// it the whole budget goes to the first term.
    ///
    /// # Errors
    ///
    /// * [`IndexError::EmptyQuery`] for a blank query
    /// * [`IndexError::InvalidLimit`] when `max_results` is zero
    /// * [`IndexError::QueryTooShort`] when the query has at most one character
    ///   or no more characters than `max_distance`
    pub fn search<Q: AsRef<str>>(
        &self,
        query: Q,
        max_distance: usize,
        max_results: usize,
        use_heuristic_fuzziness: bool,
    ) -> IndexResult<Vec<SearchHit<V>>> {
        let query = self.normalize(query.as_ref().trim());
        if query.is_empty() {
            return Err(IndexError::EmptyQuery);
        }
        if max_results == 0 {
            return Err(IndexError::InvalidLimit);
        }
        let Some(phrase) = Phrase::parse(
            &query,
            self.config.phrase_separator(),
            max_distance,
            use_heuristic_fuzziness,
        ) else {
            return Err(IndexError::EmptyQuery);
        };

        let length = phrase.len();
        if length <= 1 || length <= max_distance {
            return Err(IndexError::QueryTooShort {
                query: query.into_owned(),
                length,
                max_distance,
            });
        }

        let snapshot = self.table.snapshot();
        let mut results = ResultAggregator::new(max_results);
        let visited = FuzzySearch::new(&snapshot, &phrase, SearchMode::Exact).run(&mut results);
        let hits = results.into_hits();

        debug!(
            query = %query,
            max_distance,
            terms = phrase.term_count(),
            budget = phrase.total_budget(),
            hits = hits.len(),
            visited,
            "fuzzy search"
        );
        Ok(hits)
    }

    /// Searches with the configured default distance, limit and heuristic.
    pub fn search_with_defaults<Q: AsRef<str>>(&self, query: Q) -> IndexResult<Vec<SearchHit<V>>> {
        self.search(
            query,
            self.config.default_max_distance(),
            self.config.default_max_results(),
            self.config.use_heuristic_fuzziness(),
        )
    }

    /// Finds keys starting with something within `max_distance` edits of `prefix`.
    ///
    /// # Errors
    ///
    /// * [`IndexError::EmptyQuery`] for an empty prefix
    /// * [`IndexError::InvalidLimit`] when `max_results` is zero
    /// * [`IndexError::QueryTooShort`] when the prefix has no more characters
    ///   than `max_distance`
    pub fn match_prefix<P: AsRef<str>>(
        &self,
        prefix: P,
        max_distance: usize,
        max_results: usize,
    ) -> IndexResult<Vec<SearchHit<V>>> {
        let prefix = self.normalize(prefix.as_ref());
        if prefix.is_empty() {
            return Err(IndexError::EmptyQuery);
        }
        if max_results == 0 {
            return Err(IndexError::InvalidLimit);
        }

        let chars: Vec<char> = prefix.chars().collect();
        if chars.len() <= max_distance {
            return Err(IndexError::QueryTooShort {
                query: prefix.into_owned(),
                length: chars.len(),
                max_distance,
            });
        }

        let phrase = Phrase::single(&chars, max_distance, self.config.phrase_separator());
        let snapshot = self.table.snapshot();
        let mut results = ResultAggregator::new(max_results);
        let visited = FuzzySearch::new(&snapshot, &phrase, SearchMode::Prefix).run(&mut results);
        let hits = results.into_hits();

        debug!(prefix = %prefix, max_distance, hits = hits.len(), visited, "prefix search");
        Ok(hits)
    }

    /// Every stored key, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut results = ResultAggregator::new(usize::MAX);
        for subtree in self.table.snapshot().values() {
            results.offer_subtree(subtree, ROOT_ID);
        }
        let mut keys: Vec<String> = results.into_hits().into_iter().map(|hit| hit.key).collect();
        keys.sort_unstable();
        keys
    }

    /// Removes every key.
    ///
    /// Each subtree is emptied under its own lock, so keys added concurrently
    /// under a subtree that was already cleared survive.
    pub fn clear(&self) {
        let mut removed = 0;
        for subtree in self.table.snapshot().values() {
            removed += subtree.writer().reset();
        }
        debug!(removed, "cleared index");
    }
}

impl<V> Default for PueoIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for PueoIndex<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PueoIndex")
            .field("keys", &self.len())
            .field("subtrees", &self.subtree_count())
            .field("config", &self.config)
            .finish()
    }
}
