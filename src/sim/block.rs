//! Word Block
//!
//! Wraps one tokenized program line into a queryable structure.
//!
//! `G` and `L` letters behave as boolean flags per distinct value
//! ("G1", "L2"); every other letter carries a scalar. Accessors return
//! absent sentinels rather than failing.

use std::collections::{BTreeMap, BTreeSet};

use crate::parser::{Word, WordLine};

/// Queryable view of one program line's words
#[derive(Debug, Clone, PartialEq)]
pub struct WordBlock {
    raw: String,
    words: Vec<Word>,
    /// Compound flag words like "G1", "G28.1", "L20"
    flags: BTreeSet<String>,
    /// Last value per scalar letter
    scalars: BTreeMap<char, f64>,
    letters: BTreeSet<char>,
}

/// Render a compound word like "G28.1" from its letter and value
pub fn compound(letter: char, value: f64) -> String {
    format!("{}{}", letter, value)
}

impl WordBlock {
    pub fn new(words: &[Word], raw: &str) -> Self {
        let mut flags = BTreeSet::new();
        let mut scalars = BTreeMap::new();
        let mut letters = BTreeSet::new();

        for word in words {
            letters.insert(word.letter);
            match word.letter {
                'G' | 'L' => {
                    flags.insert(compound(word.letter, word.value));
                }
                _ => {
                    scalars.insert(word.letter, word.value);
                }
            }
        }

        Self {
            raw: raw.to_string(),
            words: words.to_vec(),
            flags,
            scalars,
            letters,
        }
    }

    pub fn from_line(line: &WordLine) -> Self {
        Self::new(&line.words, &line.raw)
    }

    /// True if a compound word like "G1" or "L2" was present
    pub fn has(&self, word: &str) -> bool {
        self.flags.contains(word)
    }

    /// True if any word with this letter occurred, regardless of value
    pub fn has_letter(&self, letter: char) -> bool {
        self.letters.contains(&letter)
    }

    /// Scalar value for a non-G/L letter, if present
    pub fn get(&self, letter: char) -> Option<f64> {
        self.scalars.get(&letter).copied()
    }

    /// Ordered distinct axis letters appearing on this line
    pub fn axes_present(&self, labels: &[char]) -> Vec<char> {
        let mut seen = BTreeSet::new();
        self.words
            .iter()
            .map(|w| w.letter)
            .filter(|l| labels.contains(l))
            .filter(|l| seen.insert(*l))
            .collect()
    }

    /// Fast-path signal: the line's only G word is G0 or G1 and no
    /// spindle/tool/misc words are present, so full modal-group
    /// scanning can be skipped.
    pub fn is_simple_motion(&self) -> bool {
        if self.flags.len() != 1 {
            return false;
        }
        if !(self.has("G0") || self.has("G1")) {
            return false;
        }
        !['M', 'T', 'S', 'P'].iter().any(|&l| self.has_letter(l))
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}
