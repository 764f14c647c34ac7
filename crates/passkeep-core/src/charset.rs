//! Ordered, duplicate-free character sets for password generation.

use std::collections::HashSet;
use std::fmt;

use crate::error::{Error, Result};

pub const UPPER_CASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWER_CASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const DIGITS: &str = "0123456789";
pub const UPPER_CONSONANTS: &str = "BCDFGHJKLMNPQRSTVWXYZ";
pub const LOWER_CONSONANTS: &str = "bcdfghjklmnpqrstvwxyz";
pub const UPPER_VOWELS: &str = "AEIOU";
pub const LOWER_VOWELS: &str = "aeiou";
pub const PUNCTUATION: &str = ",.;:";
pub const BRACKETS: &str = "[]{}()<>";
pub const PRINTABLE_ASCII_SPECIAL: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";
pub const UPPER_HEX: &str = "0123456789ABCDEF";
pub const LOWER_HEX: &str = "0123456789abcdef";
/// Never allowed in generated passwords.
pub const INVALID: &str = "\t\r\n";
pub const LOOK_ALIKE: &str = "O0l1I|";

/// U+00A1..=U+00AC and U+00AE..=U+00FF (soft hyphen excluded).
pub fn high_ansi_chars() -> String {
    ('\u{A1}'..='\u{AC}').chain('\u{AE}'..='\u{FF}').collect()
}

/// Printable ASCII specials without dash, underscore, space and brackets.
pub fn special_chars() -> String {
    let mut cs = CharSet::new();
    cs.add_range('!', '/');
    cs.add_range(':', '@');
    cs.add_range('[', '`');
    cs.add_str("|~");
    cs.remove_str("-_ ");
    cs.remove_str(BRACKETS);
    cs.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharSet {
    chars: Vec<char>,
    members: HashSet<char>,
}

impl CharSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_chars(s: &str) -> Self {
        let mut cs = Self::new();
        cs.add_str(s);
        cs
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    pub fn contains(&self, ch: char) -> bool {
        self.members.contains(&ch)
    }

    pub fn contains_all(&self, s: &str) -> bool {
        s.chars().all(|c| self.contains(c))
    }

    pub fn add(&mut self, ch: char) {
        if ch != '\0' && self.members.insert(ch) {
            self.chars.push(ch);
        }
    }

    pub fn add_str(&mut self, s: &str) {
        for ch in s.chars() {
            self.add(ch);
        }
    }

    pub fn add_range(&mut self, min: char, max: char) {
        for ch in min..=max {
            self.add(ch);
        }
    }

    /// Add a named range. Unknown identifiers are an error.
    ///
    /// | id | chars |
    /// |----|-------|
    /// | `a` / `A` / `U` | lower+digits / lower+upper+digits / upper+digits |
    /// | `c` / `C` / `z` | lower / both / upper consonants |
    /// | `v` / `V` / `Z` | lower / both / upper vowels |
    /// | `l` / `L` / `u` | lower / both / upper letters |
    /// | `d`, `h`, `H` | digits, lower hex, upper hex |
    /// | `p`, `b`, `s` | punctuation, brackets, printable specials |
    /// | `S` | all printable ASCII |
    /// | `x` | high ANSI |
    pub fn add_named(&mut self, id: char) -> Result<()> {
        match id {
            'a' => self.add_all(&[LOWER_CASE, DIGITS]),
            'A' => self.add_all(&[LOWER_CASE, UPPER_CASE, DIGITS]),
            'U' => self.add_all(&[UPPER_CASE, DIGITS]),
            'c' => self.add_str(LOWER_CONSONANTS),
            'C' => self.add_all(&[LOWER_CONSONANTS, UPPER_CONSONANTS]),
            'z' => self.add_str(UPPER_CONSONANTS),
            'd' => self.add_str(DIGITS),
            'h' => self.add_str(LOWER_HEX),
            'H' => self.add_str(UPPER_HEX),
            'l' => self.add_str(LOWER_CASE),
            'L' => self.add_all(&[LOWER_CASE, UPPER_CASE]),
            'u' => self.add_str(UPPER_CASE),
            'p' => self.add_str(PUNCTUATION),
            'b' => self.add_str(BRACKETS),
            's' => self.add_str(PRINTABLE_ASCII_SPECIAL),
            'S' => self.add_all(&[UPPER_CASE, LOWER_CASE, DIGITS, PRINTABLE_ASCII_SPECIAL]),
            'v' => self.add_str(LOWER_VOWELS),
            'V' => self.add_all(&[LOWER_VOWELS, UPPER_VOWELS]),
            'Z' => self.add_str(UPPER_VOWELS),
            'x' => self.add_str(&high_ansi_chars()),
            other => return Err(Error::invalid(format!("unknown character set id '{other}'"))),
        }
        Ok(())
    }

    fn add_all(&mut self, parts: &[&str]) {
        for p in parts {
            self.add_str(p);
        }
    }

    pub fn remove(&mut self, ch: char) -> bool {
        if self.members.remove(&ch) {
            self.chars.retain(|&c| c != ch);
            true
        } else {
            false
        }
    }

    /// Remove every char of `s`; true only if all of them were present.
    pub fn remove_str(&mut self, s: &str) -> bool {
        let mut all = true;
        for ch in s.chars() {
            all &= self.remove(ch);
        }
        all
    }

    fn remove_if_all_exist(&mut self, s: &str) -> bool {
        self.contains_all(s) && self.remove_str(s)
    }

    /// Compact ten-flag form used by stored generator profiles, e.g.
    /// `"ULD_______"`. Covered ranges are removed from `self`; whatever is
    /// left must be stored separately.
    pub fn pack_and_remove_ranges(&mut self) -> String {
        let special = special_chars();
        let high = high_ansi_chars();
        [
            (UPPER_CASE, 'U'),
            (LOWER_CASE, 'L'),
            (DIGITS, 'D'),
            (special.as_str(), 'S'),
            (PUNCTUATION, 'P'),
            ("-", 'm'),
            ("_", 'u'),
            (" ", 's'),
            (BRACKETS, 'B'),
            (high.as_str(), 'H'),
        ]
        .into_iter()
        .map(|(set, flag)| if self.remove_if_all_exist(set) { flag } else { '_' })
        .collect()
    }

    pub fn unpack_ranges(&mut self, flags: &str) -> Result<()> {
        let flags: Vec<char> = flags.chars().collect();
        if flags.len() < 10 {
            return Err(Error::invalid("packed character ranges need 10 flags"));
        }
        let special = special_chars();
        let high = high_ansi_chars();
        let sets = [
            UPPER_CASE,
            LOWER_CASE,
            DIGITS,
            special.as_str(),
            PUNCTUATION,
            "-",
            "_",
            " ",
            BRACKETS,
            high.as_str(),
        ];
        for (flag, set) in flags.iter().zip(sets) {
            if *flag != '_' {
                self.add_str(set);
            }
        }
        Ok(())
    }
}

impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.chars {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(high_ansi_chars().chars().count(), 94);
        assert_eq!(PRINTABLE_ASCII_SPECIAL.chars().count(), 32);
        assert_eq!(special_chars(), "!\"#$%&'*+,./:;=?@\\^`|~");
    }

    #[test]
    fn test_add_keeps_order_and_dedups() {
        let mut cs = CharSet::from_chars("abca");
        cs.add('\0');
        assert_eq!(cs.to_string(), "abc");
        assert_eq!(cs.get(2), Some('c'));
        assert_eq!(cs.get(3), None);
    }

    #[test]
    fn test_remove() {
        let mut cs = CharSet::from_chars(DIGITS);
        assert!(cs.remove('5'));
        assert!(!cs.remove('5'));
        assert!(!cs.remove_str("01x"));
        assert_eq!(cs.to_string(), "2346789");
    }

    #[test]
    fn test_add_named() {
        let mut cs = CharSet::new();
        cs.add_named('A').unwrap();
        assert_eq!(cs.len(), 62);
        cs.add_named('s').unwrap();
        assert_eq!(cs.len(), 94);
        assert!(cs.add_named('?').is_err());
    }

    #[test]
    fn test_pack_unpack_ranges() {
        let mut cs = CharSet::new();
        cs.add_str(UPPER_CASE);
        cs.add_str(DIGITS);
        cs.add_str("-é");
        let packed = cs.pack_and_remove_ranges();
        assert_eq!(packed, "U_D__m____");
        assert_eq!(cs.to_string(), "é");

        let mut back = CharSet::new();
        back.unpack_ranges(&packed).unwrap();
        assert_eq!(back.len(), 26 + 10 + 1);
        assert!(back.unpack_ranges("UL").is_err());
    }
}
