//! Popular-password dictionary, bucketed by length.
//!
//! Immutable once built. The estimator only ever sees it through an `Arc`, so
//! one instance can back any number of concurrent estimates.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::sync::{Arc, OnceLock};

use flate2::read::GzDecoder;
use log::debug;

use crate::error::{Error, Result};

/// Words shorter than this are never useful as dictionary patterns.
pub const MIN_WORD_LEN: usize = 3;

const BUILTIN_WORDS: &str = include_str!("../../data/popular_passwords.txt");

#[derive(Debug, Clone, Default)]
pub struct PopularPasswords {
    by_length: HashMap<usize, HashSet<String>>,
    max_length: usize,
}

static BUILTIN: OnceLock<Arc<PopularPasswords>> = OnceLock::new();

impl PopularPasswords {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from words; each is lowercased and bucketed by char count.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dict = Self::default();
        for w in words {
            dict.insert(w.as_ref());
        }
        dict
    }

    /// One word per line; blank lines and `#` comments are skipped.
    pub fn from_text(text: &str) -> Self {
        Self::from_words(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        )
    }

    /// Gzip-compressed UTF-8 word list.
    pub fn from_gzip(data: &[u8]) -> Result<Self> {
        let mut text = String::new();
        GzDecoder::new(data)
            .read_to_string(&mut text)
            .map_err(|e| Error::invalid(format!("dictionary is not gzip UTF-8 text: {e}")))?;
        Ok(Self::from_text(&text))
    }

    /// The list shipped with the crate, loaded on first use.
    pub fn builtin() -> Arc<PopularPasswords> {
        Arc::clone(BUILTIN.get_or_init(|| {
            let dict = Self::from_text(BUILTIN_WORDS);
            debug!(
                "popular password dictionary loaded: {} words, longest {}",
                dict.len(),
                dict.max_length
            );
            Arc::new(dict)
        }))
    }

    fn insert(&mut self, word: &str) {
        let lower = lowercase_word(word);
        let len = lower.chars().count();
        if len < MIN_WORD_LEN {
            return;
        }
        if self.by_length.entry(len).or_default().insert(lower) {
            self.max_length = self.max_length.max(len);
        }
    }

    pub fn len(&self) -> usize {
        self.by_length.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_length.is_empty()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn contains_length(&self, len: usize) -> bool {
        self.by_length.contains_key(&len)
    }

    /// Number of words with exactly `len` chars.
    pub fn size_for_length(&self, len: usize) -> u64 {
        self.by_length.get(&len).map_or(0, |s| s.len() as u64)
    }

    /// If `word` (already lowercase) is in the list, the size of its bucket.
    pub fn lookup(&self, word: &[char]) -> Option<u64> {
        let bucket = self.by_length.get(&word.len())?;
        let s: String = word.iter().collect();
        bucket.contains(&s).then_some(bucket.len() as u64)
    }
}

/// Single-char lowercase mapping; chars whose lowercase form expands to
/// several code points are kept as-is.
pub fn lower_char(ch: char) -> char {
    let mut it = ch.to_lowercase();
    match (it.next(), it.next()) {
        (Some(l), None) => l,
        _ => ch,
    }
}

fn lowercase_word(word: &str) -> String {
    word.chars().map(lower_char).collect()
}
