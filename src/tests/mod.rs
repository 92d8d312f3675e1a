//! Test modules for Pueo.
//!
//! Cross-cutting unit and property tests that need more than one module;
//! per-module tests live next to the code they exercise.

pub mod config_tests;
pub mod test_utils;

/// Shared proptest configuration for the suites in this module.
pub fn proptest_config() -> proptest::test_runner::Config {
    proptest::test_runner::Config::with_cases(64)
}
