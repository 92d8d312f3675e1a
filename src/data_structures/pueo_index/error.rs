//! Error types for the Pueo index.
//!
//! This module defines the error types that can occur during Pueo index operations.

/// Errors that can occur in Pueo index operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// Error when an empty key is provided.
    #[error("Empty key not allowed")]
    EmptyKey,

    /// Error when an empty query or prefix is provided.
    #[error("Empty query not allowed")]
    EmptyQuery,

    /// Error when a search asks for zero results.
    #[error("Result limit must be at least 1")]
    InvalidLimit,

    /// Error when a query leaves no discriminating characters for the distance.
    #[error("Query '{query}' of length {length} is too short for edit distance {max_distance}")]
    QueryTooShort {
        /// The rejected query.
        query: String,
        /// Its length in characters.
        length: usize,
        /// The requested edit distance.
        max_distance: usize,
    },

    /// Error when a node index no longer resolves inside its subtree.
    #[error("Node {id} not found in subtree '{first}'")]
    DanglingNode {
        /// First character of the subtree.
        first: char,
        /// The unresolved node index.
        id: u32,
    },

    /// Error when the trie breaks one of its structural invariants.
    #[error("Structure violation: {0}")]
    StructureViolation(String),
}

/// Result type for Pueo index operations.
pub type IndexResult<T> = Result<T, IndexError>;
