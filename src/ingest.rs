// Copyright (c) 2025 Pueo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Bulk loading of delimited key/value files into an index.
//!
//! Each line holds `key<DELIM>value`. A line without the delimiter is a bare
//! key whose value is its line number. Blank lines and lines starting with `#`
//! are ignored.
//!
//! Records are grouped by the first character of their key and the groups are
//! loaded in parallel, so each worker mostly writes to subtrees no other worker
//! touches.

use std::fs;
use std::path::Path;

use fnv::FnvHashMap;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info};

use crate::config::LoaderSettings;
use crate::data_structures::pueo_index::{IndexResult, PueoIndex};
use crate::error::{PueoError, PueoResult};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub value: String,
}

/// Outcome of a bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records parsed from the input
    pub records: usize,

    /// Records that created a new association
    pub added: usize,

    /// Lines dropped because their key was empty
    pub skipped: usize,
}

/// Parses `input` into records, returning them with the number of skipped lines.
pub fn parse_records(input: &str, delimiter: char) -> (Vec<Record>, usize) {
    let mut records = Vec::new();
    let mut skipped = 0;

    for (i, raw) in input.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = match line.split_once(delimiter) {
            Some((key, value)) => (key.trim(), value.trim().to_string()),
            None => (line.trim(), (i + 1).to_string()),
        };
        if key.is_empty() {
            skipped += 1;
            continue;
        }

        records.push(Record {
            key: key.to_string(),
            value,
        });
    }

    (records, skipped)
}

/// Loads every record of `input` into `index`.
pub fn load_str(
    index: &PueoIndex<String>,
    input: &str,
    settings: &LoaderSettings,
) -> PueoResult<LoadReport> {
    let (records, skipped) = parse_records(input, settings.field_delimiter);
    let total = records.len();

    let mut groups: FnvHashMap<char, Vec<Record>> = FnvHashMap::default();
    for record in records {
        if let Some(first) = record.key.chars().next() {
            groups.entry(first).or_default().push(record);
        }
    }
    let groups: Vec<Vec<Record>> = groups.into_values().collect();

    let workers = settings.effective_workers();
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| PueoError::Custom(format!("Failed to start loader threads: {e}")))?;

    let added: Vec<usize> = pool.install(|| {
        groups
            .par_iter()
            .map(|group| load_group(index, group))
            .collect::<IndexResult<Vec<usize>>>()
    })?;
    let added: usize = added.into_iter().sum();

    info!(
        records = total,
        added,
        skipped,
        groups = groups.len(),
        workers,
        "loaded records"
    );

    Ok(LoadReport {
        records: total,
        added,
        skipped,
    })
}

/// Reads `path` and loads it into `index`.
pub fn load_file<P: AsRef<Path>>(
    index: &PueoIndex<String>,
    path: P,
    settings: &LoaderSettings,
) -> PueoResult<LoadReport> {
    let path = path.as_ref();
    let input = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = input.len(), "read input file");
    load_str(index, &input, settings)
}

fn load_group(index: &PueoIndex<String>, group: &[Record]) -> IndexResult<usize> {
    let mut added = 0;
    for record in group {
        if index.add(&record.key, record.value.clone())? {
            added += 1;
        }
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_records() {
        let input = "hello\t1\n\n# comment\nhelp\t2\r\nbare key\n\tno key\n";
        let (records, skipped) = parse_records(input, '\t');

        assert_eq!(
            records,
            vec![
                Record {
                    key: "hello".to_string(),
                    value: "1".to_string()
                },
                Record {
                    key: "help".to_string(),
                    value: "2".to_string()
                },
                Record {
                    key: "bare key".to_string(),
                    value: "5".to_string()
                },
            ]
        );
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_parse_custom_delimiter() {
        let (records, _) = parse_records("new york,city\nnewark,city", ',');
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, "new york");
        assert_eq!(records[1].value, "city");
    }

    #[test]
    fn test_parallel_load() {
        let mut input = String::new();
        for first in 'a'..='z' {
            for i in 0..20 {
                input.push_str(&format!("{first}word{i}\t{i}\n"));
            }
        }
        // Repeated association is not added twice
        input.push_str("aword0\t0\n");

        let index = PueoIndex::new();
        let settings = LoaderSettings {
            worker_threads: 4,
            ..LoaderSettings::default()
        };
        let report = load_str(&index, &input, &settings).unwrap();

        assert_eq!(report.records, 26 * 20 + 1);
        assert_eq!(report.added, 26 * 20);
        assert_eq!(index.len(), 26 * 20);
        assert_eq!(index.get("mword7").unwrap(), vec!["7".to_string()]);
        index.validate_structure().unwrap();
    }

    #[test]
    fn test_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.tsv");
        fs::write(&path, "hello\t1\nhelp\t2\nhell\t3\n").unwrap();

        let index = PueoIndex::new();
        let report = load_file(&index, &path, &LoaderSettings::default()).unwrap();
        assert_eq!(report.added, 3);
        assert!(index.contains("hell").unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let index = PueoIndex::new();
        let result = load_file(&index, "/nonexistent/words.tsv", &LoaderSettings::default());
        assert!(matches!(result, Err(PueoError::Io(_))));
    }
}
