//! Pueo Library
//!
//! This library contains the core components of Pueo: a concurrent,
//! typo-tolerant key to multi-value index, the configuration and error
//! handling around it, and a bulk loader for delimited input files.
//! The library is designed to be used by the `pueo` binary, but can also
//! be used as a dependency by other projects.
//!
//! # Architecture
//!
//! - [`data_structures::pueo_index`] holds the index itself
//! - [`ingest`] feeds it from tab-separated files in parallel
//! - [`config`] and [`error`] provide the ambient configuration and error types

pub mod config;
pub mod data_structures;
pub mod error;
pub mod ingest;

// Internal modules that are not part of the public API
#[cfg(test)]
pub(crate) mod tests;

// Feature-gated modules
#[cfg(feature = "benchmarking")]
pub mod bench;

/// Version information for Pueo.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

