// Copyright (c) 2025 Pueo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Configuration for the Pueo index.

use serde::{Deserialize, Serialize};

/// Configuration for the Pueo index.
///
/// Controls key normalisation and the defaults used by
/// [`PueoIndex::search_with_defaults`](super::PueoIndex::search_with_defaults).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Whether keys, queries and prefixes keep their case
    /// When false everything is lowercased before use
    case_sensitive: bool,

    /// Edit distance used when the caller does not supply one
    default_max_distance: usize,

    /// Result cap used when the caller does not supply one
    default_max_results: usize,

    /// Whether multi-term queries derive per-term budgets from term length
    use_heuristic_fuzziness: bool,

    /// Character joining the terms of a phrase inside stored keys
    phrase_separator: char,
}

impl IndexConfig {
    /// Create a new default configuration.
    ///
    /// Default values:
    /// - case_sensitive: true
    /// - default_max_distance: 1
    /// - default_max_results: 10
    /// - use_heuristic_fuzziness: true
    /// - phrase_separator: ' '
    pub fn new() -> Self {
        Self {
            case_sensitive: true,
            default_max_distance: 1,
            default_max_results: 10,
            use_heuristic_fuzziness: true,
            phrase_separator: ' ',
        }
    }

    /// Set whether the index distinguishes upper and lower case.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Set the edit distance used by default searches.
    pub fn with_default_max_distance(mut self, distance: usize) -> Self {
        self.default_max_distance = distance;
        self
    }

    /// Set the result cap used by default searches.
    ///
    /// A cap of zero would make every default search fail, so it is raised to one.
    pub fn with_default_max_results(mut self, limit: usize) -> Self {
        self.default_max_results = limit.max(1);
        self
    }

    /// Enable or disable length-derived budgets for phrase terms.
    pub fn with_heuristic_fuzziness(mut self, enabled: bool) -> Self {
        self.use_heuristic_fuzziness = enabled;
        self
    }

    /// Set the character that joins phrase terms in stored keys.
    pub fn with_phrase_separator(mut self, separator: char) -> Self {
        self.phrase_separator = separator;
        self
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn default_max_distance(&self) -> usize {
        self.default_max_distance
    }

    pub fn default_max_results(&self) -> usize {
        self.default_max_results
    }

    pub fn use_heuristic_fuzziness(&self) -> bool {
        self.use_heuristic_fuzziness
    }

    pub fn phrase_separator(&self) -> char {
        self.phrase_separator
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new()
    }
}
