// Copyright (c) 2025 Pueo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Levenshtein edit distance.

use smallvec::SmallVec;

/// Standard Levenshtein distance between two strings, counted in chars.
///
/// Uses the two-row dynamic programming formulation.
///
/// ```
/// use pueo_lib::data_structures::pueo_index::levenshtein;
///
/// assert_eq!(levenshtein("kitten", "sitting"), 3);
/// assert_eq!(levenshtein("helo", "hello"), 1);
/// ```
pub fn levenshtein(source: &str, target: &str) -> usize {
    let source: SmallVec<[char; 32]> = source.chars().collect();
    let target: SmallVec<[char; 32]> = target.chars().collect();

    let m = source.len();
    let n = target.len();
    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev_row: SmallVec<[usize; 32]> = (0..=n).collect();
    let mut curr_row: SmallVec<[usize; 32]> = SmallVec::from_elem(0, n + 1);

    for i in 1..=m {
        curr_row[0] = i;
        for j in 1..=n {
            let cost = usize::from(source[i - 1] != target[j - 1]);
            curr_row[j] = (prev_row[j] + 1) // deletion
                .min(curr_row[j - 1] + 1) // insertion
                .min(prev_row[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[n]
}

/// Full edit matrix between a run of label characters and a query window.
///
/// `get(k, e)` is the distance between the first `k` label characters and the
/// first `e` query characters. The last row therefore gives the cost of
/// consuming the whole label against every query prefix, and the last column the
/// cost of consuming the whole window against every label prefix.
#[derive(Debug)]
pub(crate) struct EditMatrix {
    cols: usize,
    cells: Vec<usize>,
}

impl EditMatrix {
    pub(crate) fn new(label: &[char], query: &[char]) -> Self {
        let rows = label.len() + 1;
        let cols = query.len() + 1;
        let mut cells = vec![0; rows * cols];

        for (e, cell) in cells.iter_mut().enumerate().take(cols) {
            *cell = e;
        }
        for k in 1..rows {
            cells[k * cols] = k;
            for e in 1..cols {
                let cost = usize::from(label[k - 1] != query[e - 1]);
                let up = cells[(k - 1) * cols + e] + 1;
                let left = cells[k * cols + e - 1] + 1;
                let diagonal = cells[(k - 1) * cols + e - 1] + cost;
                cells[k * cols + e] = up.min(left).min(diagonal);
            }
        }

        Self { cols, cells }
    }

    pub(crate) fn get(&self, k: usize, e: usize) -> usize {
        self.cells[k * self.cols + e]
    }
}
