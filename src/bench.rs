//! Benchmarking helpers for Pueo.
//!
//! Deterministic corpus generation shared by the criterion benches, so runs
//! are comparable across machines and commits.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data_structures::pueo_index::PueoIndex;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Seeded source of words, phrases and typos.
#[derive(Debug, Clone)]
pub struct WordGenerator {
    rng: StdRng,
}

impl WordGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn letter(&mut self) -> char {
        ALPHABET[self.rng.gen_range(0..ALPHABET.len())] as char
    }

    /// Returns a lowercase word with a length in `min_len..=max_len`.
    pub fn word(&mut self, min_len: usize, max_len: usize) -> String {
        let len = self.rng.gen_range(min_len..=max_len.max(min_len));
        (0..len).map(|_| self.letter()).collect()
    }

    /// Returns `terms` words joined by single spaces.
    pub fn phrase(&mut self, terms: usize) -> String {
        (0..terms)
            .map(|_| self.word(3, 9))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns `word` with one character replaced, as a typo of it.
    pub fn typo(&mut self, word: &str) -> String {
        let mut chars: Vec<char> = word.chars().collect();
        if chars.is_empty() {
            return String::new();
        }
        let at = self.rng.gen_range(0..chars.len());
        chars[at] = self.letter();
        chars.into_iter().collect()
    }
}

/// Generates `count` words from `seed`.
pub fn dictionary(count: usize, seed: u64) -> Vec<String> {
    let mut generator = WordGenerator::new(seed);
    (0..count).map(|_| generator.word(4, 12)).collect()
}

/// Generates `count` phrases of two or three terms from `seed`.
pub fn phrases(count: usize, seed: u64) -> Vec<String> {
    let mut generator = WordGenerator::new(seed);
    (0..count)
        .map(|i| generator.phrase(2 + i % 2))
        .collect()
}

/// Builds an index mapping each key to its position.
pub fn build_index(keys: &[String]) -> PueoIndex<usize> {
    let index = PueoIndex::new();
    for (i, key) in keys.iter().enumerate() {
        // Generated keys are never empty
        let _ = index.add(key, i);
    }
    index
}

/// Renders keys as loader input with the position as the value.
pub fn tsv(keys: &[String]) -> String {
    let mut out = String::new();
    for (i, key) in keys.iter().enumerate() {
        out.push_str(key);
        out.push('\t');
        out.push_str(&i.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        assert_eq!(dictionary(50, 7), dictionary(50, 7));
        assert_ne!(dictionary(50, 7), dictionary(50, 8));
        assert!(dictionary(100, 1)
            .iter()
            .all(|w| (4..=12).contains(&w.len())));
    }

    #[test]
    fn test_phrase_term_counts() {
        let phrases = phrases(10, 3);
        assert_eq!(phrases[0].split(' ').count(), 2);
        assert_eq!(phrases[1].split(' ').count(), 3);
    }

    #[test]
    fn test_typo_keeps_length() {
        let mut generator = WordGenerator::new(11);
        let typo = generator.typo("keyboard");
        assert_eq!(typo.chars().count(), 8);
    }
}
