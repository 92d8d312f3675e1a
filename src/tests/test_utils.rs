//! Test utilities and fixtures for Pueo.

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for test files.
pub fn create_test_dir() -> std::io::Result<TempDir> {
    tempfile::tempdir()
}

/// Keys over a three letter alphabet, so random keys share prefixes often.
pub fn key_strategy(max_len: usize) -> BoxedStrategy<String> {
    proptest::collection::vec(prop_oneof![Just('a'), Just('b'), Just('c')], 1..=max_len)
        .prop_map(|chars| chars.into_iter().collect())
        .boxed()
}

/// Single-term queries with a distance they are long enough for.
pub fn query_strategy() -> BoxedStrategy<(String, usize)> {
    (key_strategy(6), 0usize..=2)
        .prop_filter("query must be longer than the distance", |(query, d)| {
            query.len() > 1 && query.len() > *d
        })
        .boxed()
}

/// Key/value pairs drawn from a small key space.
pub fn entries_strategy(max_entries: usize) -> BoxedStrategy<Vec<(String, u8)>> {
    proptest::collection::vec((key_strategy(6), 0u8..4), 0..max_entries).boxed()
}

/// Test fixture owning a temporary directory and any environment variables it set.
pub struct TestFixture {
    /// Temporary directory for test files
    pub temp_dir: TempDir,
    env_vars: Vec<String>,
}

impl TestFixture {
    /// Create a new test fixture.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            temp_dir: create_test_dir()?,
            env_vars: Vec::new(),
        })
    }

    /// Set an environment variable that is removed when the fixture drops.
    pub fn set_env<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        std::env::set_var(&key, value.into());
        self.env_vars.push(key);
    }

    /// Write `contents` to `name` inside the fixture directory.
    pub fn write_file<C: AsRef<[u8]>>(&self, name: &str, contents: C) -> std::io::Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

impl Drop for TestFixture {
    fn drop(&mut self) {
        for key in &self.env_vars {
            std::env::remove_var(key);
        }
    }
}
