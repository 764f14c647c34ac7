//! Adaptive entropy coders used to price a segmentation.
//!
//! An [`EntropyEncoder`] only counts symbols; [`EntropyEncoder::output_size`]
//! reports how many bits an ideal coder would need for the counted sequence
//! given the weighting scheme. Symbols seen more often than
//! `occ_excl_threshold` gain extra weight, which rewards reuse.

use std::collections::HashMap;

use super::char_class::CharClass;

#[derive(Debug, Clone)]
pub struct EntropyEncoder {
    alphabet: Vec<char>,
    counts: HashMap<char, u64>,
    base_weight: u64,
    char_weight: u64,
    occ_excl_threshold: u64,
}

impl EntropyEncoder {
    pub fn new(
        alphabet: Vec<char>,
        base_weight: u64,
        char_weight: u64,
        occ_excl_threshold: u64,
    ) -> Self {
        Self {
            alphabet,
            counts: HashMap::new(),
            base_weight,
            char_weight,
            occ_excl_threshold,
        }
    }

    pub fn contains(&self, ch: char) -> bool {
        self.alphabet.contains(&ch)
    }

    pub fn write(&mut self, ch: char) {
        *self.counts.entry(ch).or_insert(0) += 1;
    }

    fn weight_of(&self, count: u64) -> u64 {
        if count > self.occ_excl_threshold {
            self.base_weight + (count - self.occ_excl_threshold) * self.char_weight
        } else {
            self.base_weight
        }
    }

    /// Ideal coded size in bits of everything written so far.
    pub fn output_size(&self) -> f64 {
        let base_total = self.base_weight * self.alphabet.len() as u64;
        let total = self
            .counts
            .values()
            .filter(|&&u| u > self.occ_excl_threshold)
            .fold(base_total, |acc, &u| {
                acc + (u - self.occ_excl_threshold) * self.char_weight
            });
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;

        // Alphabet order keeps the floating-point sum reproducible.
        let mut size = 0.0;
        for ch in &self.alphabet {
            let Some(&u) = self.counts.get(ch) else {
                continue;
            };
            let w = self.weight_of(u) as f64;
            size -= u as f64 * (w / total).log2();
        }
        size
    }
}

/// One [`EntropyEncoder`] per modelled character class.
#[derive(Debug, Clone)]
pub struct MultiEntropyEncoder {
    encoders: Vec<(CharClass, EntropyEncoder)>,
}

impl MultiEntropyEncoder {
    /// Per-class coders with base weight 1, char weight `floor(sqrt(|class|))`
    /// and threshold 1. [`CharClass::Other`] gets none.
    pub fn for_char_classes() -> Self {
        let encoders = CharClass::ALL
            .iter()
            .filter_map(|&class| {
                let members = class.members()?;
                let weight = (f64::from(class.alphabet_size())).sqrt().floor() as u64;
                Some((class, EntropyEncoder::new(members, 1, weight, 1)))
            })
            .collect();
        Self { encoders }
    }

    /// Count `ch` in its class coder. Returns false when no coder covers it.
    pub fn write(&mut self, class: CharClass, ch: char) -> bool {
        match self.encoders.iter_mut().find(|(c, _)| *c == class) {
            Some((_, enc)) if enc.contains(ch) => {
                enc.write(ch);
                true
            }
            _ => false,
        }
    }

    pub fn output_size(&self) -> f64 {
        self.encoders.iter().map(|(_, e)| e.output_size()).sum()
    }
}
