//! Character classes used by the single-character patterns.

use serde::{Deserialize, Serialize};

/// Alphabet size of [`CharClass::Other`]: the 16-bit code space minus every
/// explicitly modelled class.
pub const OTHER_ALPHABET_SIZE: u32 = 0x10000 - 26 - 26 - 10 - 33 - 94;

/// Printable ASCII specials plus space.
const SPECIAL: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~ ";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CharClass {
    Lower,
    Upper,
    Digit,
    Special,
    High,
    Other,
}

impl CharClass {
    pub const ALL: [CharClass; 6] = [
        Self::Lower,
        Self::Upper,
        Self::Digit,
        Self::Special,
        Self::High,
        Self::Other,
    ];

    pub fn of(ch: char) -> Self {
        match ch {
            'a'..='z' => Self::Lower,
            'A'..='Z' => Self::Upper,
            '0'..='9' => Self::Digit,
            '\u{A1}'..='\u{AC}' | '\u{AE}'..='\u{FF}' => Self::High,
            c if SPECIAL.contains(c) => Self::Special,
            _ => Self::Other,
        }
    }

    pub fn alphabet_size(self) -> u32 {
        match self {
            Self::Lower | Self::Upper => 26,
            Self::Digit => 10,
            Self::Special => 33,
            Self::High => 94,
            Self::Other => OTHER_ALPHABET_SIZE,
        }
    }

    /// Bits needed to name one member of the class uniformly.
    pub fn cost(self) -> f64 {
        f64::from(self.alphabet_size()).log2()
    }

    /// Pattern tag written to the pattern-sequence coder.
    pub fn tag(self) -> char {
        match self {
            Self::Lower => 'L',
            Self::Upper => 'U',
            Self::Digit => 'D',
            Self::Special => 'S',
            Self::High => 'H',
            Self::Other => 'X',
        }
    }

    /// Members in code-point order; `None` for [`CharClass::Other`], which has
    /// no per-character coder.
    pub fn members(self) -> Option<Vec<char>> {
        let chars: Vec<char> = match self {
            Self::Lower => ('a'..='z').collect(),
            Self::Upper => ('A'..='Z').collect(),
            Self::Digit => ('0'..='9').collect(),
            Self::Special => {
                let mut v: Vec<char> = SPECIAL.chars().collect();
                v.sort_unstable();
                v
            }
            Self::High => ('\u{A1}'..='\u{AC}').chain('\u{AE}'..='\u{FF}').collect(),
            Self::Other => return None,
        };
        Some(chars)
    }
}

/// Cost of `ch` as a lone character of its class.
pub fn char_cost(ch: char) -> f64 {
    CharClass::of(ch).cost()
}
