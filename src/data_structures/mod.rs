//! Data structures for Pueo.
//!
//! This module contains specialized data structures optimized for
//! concurrent operations:
//! - No unsafe code
//! - Lock-free readers
//! - Coarse, partitioned locking for writers

pub mod pueo_index;

// Re-export common data structures
pub use pueo_index::{IndexConfig, IndexError, IndexResult, PueoIndex, SearchHit};
