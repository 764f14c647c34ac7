//! Pattern discovery.
//!
//! Every finder appends [`PatternInstance`]s to the per-position lists in a
//! fixed order: single characters, repetitions, numbers, difference
//! sequences, dictionary words. The search explores each list front to back,
//! so that order is also the tie-break between equally priced alternatives.
//!
//! The quadratic-and-worse finders (repetitions, dictionary) stop once the
//! deadline passes. Single characters are always present, so the result is
//! still a complete set of covers, just with fewer shortcuts.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::char_class::{CharClass, char_cost};
use super::dictionary::{MIN_WORD_LEN, PopularPasswords, lower_char};

/// Alphabet of the pattern-sequence coder.
pub const PATTERN_TAGS: &str = "LUDSHXWRNC";

/// Bits charged per leetspeak substitution in a dictionary match.
const LEET_COST_PER_MOD: f64 = 1.5;

/// Shortest repeated block, number or difference sequence worth reporting.
const MIN_RUN_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternClass {
    Single(CharClass),
    Repetition,
    Number,
    DiffSeq,
    Dictionary,
}

impl PatternClass {
    pub fn tag(self) -> char {
        match self {
            Self::Single(c) => c.tag(),
            Self::Dictionary => 'W',
            Self::Repetition => 'R',
            Self::Number => 'N',
            Self::DiffSeq => 'C',
        }
    }
}

impl fmt::Display for PatternClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(c) => write!(f, "char:{c:?}"),
            Self::Repetition => write!(f, "repetition"),
            Self::Number => write!(f, "number"),
            Self::DiffSeq => write!(f, "diff_seq"),
            Self::Dictionary => write!(f, "dictionary"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternInstance {
    pub start: usize,
    pub length: usize,
    pub class: PatternClass,
    pub cost: f64,
}

impl PatternInstance {
    fn new(start: usize, length: usize, class: PatternClass, cost: f64) -> Self {
        Self {
            start,
            length,
            class,
            cost,
        }
    }
}

/// All candidate patterns found before `deadline`, indexed by start position.
pub fn discover(
    password: &[char],
    dict: &PopularPasswords,
    deadline: Instant,
) -> Vec<Vec<PatternInstance>> {
    let mut by_pos: Vec<Vec<PatternInstance>> = password
        .iter()
        .enumerate()
        .map(|(i, &ch)| {
            let class = CharClass::of(ch);
            vec![PatternInstance::new(i, 1, PatternClass::Single(class), class.cost())]
        })
        .collect();

    find_repetitions(password, &mut by_pos, deadline);
    find_numbers(password, &mut by_pos);
    find_diff_seqs(password, &mut by_pos);
    find_dictionary_words(password, dict, &mut by_pos, deadline);
    by_pos
}

// ---------------------------------------------------------------------------
// Repetitions
// ---------------------------------------------------------------------------

fn blocks_equal(w: &[Option<char>], a: usize, b: usize, len: usize) -> bool {
    (0..len).all(|k| matches!((w[a + k], w[b + k]), (Some(x), Some(y)) if x == y))
}

fn erase(w: &mut [Option<char>], start: usize, len: usize) {
    w[start..start + len].fill(None);
}

/// Longest blocks first; a matched block is erased so it cannot seed or
/// join another repetition. Erased slots never compare equal.
fn find_repetitions(
    password: &[char],
    by_pos: &mut [Vec<PatternInstance>],
    deadline: Instant,
) {
    let n = password.len();
    let mut work: Vec<Option<char>> = password.iter().copied().map(Some).collect();

    for m in (MIN_RUN_LEN..=n / 2).rev() {
        for x1 in 0..=(n - 2 * m) {
            let mut found = false;
            for x2 in (x1 + m)..=(n - m) {
                if Instant::now() >= deadline {
                    return;
                }
                if blocks_equal(&work, x1, x2, m) {
                    let cost = ((x1 + 1) as f64).log2() + (m as f64).log2();
                    by_pos[x2].push(PatternInstance::new(x2, m, PatternClass::Repetition, cost));
                    erase(&mut work, x2, m);
                    found = true;
                }
            }
            if found {
                erase(&mut work, x1, m);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

fn find_numbers(password: &[char], by_pos: &mut [Vec<PatternInstance>]) {
    let n = password.len();
    let mut i = 0;
    while i < n {
        if !password[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let mut end = i;
        while end < n && password[end].is_ascii_digit() {
            end += 1;
        }
        let len = end - i;
        if len >= MIN_RUN_LEN {
            let zeros = password[i..end].iter().take_while(|&&c| c == '0').count();
            let mut cost = ((zeros + 1) as f64).log2();
            if zeros < len {
                let digits: String = password[i + zeros..end].iter().collect();
                if let Ok(value) = digits.parse::<f64>() {
                    cost += value.log2();
                }
            }
            by_pos[i].push(PatternInstance::new(i, len, PatternClass::Number, cost));
        }
        i = end;
    }
}

// ---------------------------------------------------------------------------
// Difference sequences
// ---------------------------------------------------------------------------

/// Maximal runs with a constant code-point step (`abc`, `97531`, `aaaa`).
fn find_diff_seqs(password: &[char], by_pos: &mut [Vec<PatternInstance>]) {
    let n = password.len();
    let mut diff: Option<i64> = None;
    let mut run_start = 0;

    for i in 1..=n {
        let cur = (i < n).then(|| password[i] as i64 - password[i - 1] as i64);
        if i == n || cur != diff {
            let len = i - run_start;
            if len >= MIN_RUN_LEN {
                let cost = char_cost(password[run_start]) + ((len - 1) as f64).log2();
                by_pos[run_start].push(PatternInstance::new(
                    run_start,
                    len,
                    PatternClass::DiffSeq,
                    cost,
                ));
            }
            diff = cur;
            run_start = i - 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Dictionary and leetspeak
// ---------------------------------------------------------------------------

/// Map a leetspeak or accented char to the letter it stands for.
pub fn decode_leet(ch: char) -> char {
    match ch {
        '\u{C0}'..='\u{C6}' | '\u{E0}'..='\u{E6}' => 'a',
        '\u{C8}'..='\u{CB}' | '\u{E8}'..='\u{EB}' => 'e',
        '\u{CC}'..='\u{CF}' | '\u{EC}'..='\u{EF}' => 'i',
        '\u{D2}'..='\u{D6}' | '\u{F2}'..='\u{F6}' => 'o',
        '\u{D9}'..='\u{DC}' | '\u{F9}'..='\u{FC}' => 'u',
        '4' | '@' | '?' | '^' | 'ª' => 'a',
        '8' | 'ß' => 'b',
        '(' | '{' | '[' | '<' | '¢' | '©' | 'Ç' | 'ç' => 'c',
        'Ð' | 'ð' => 'd',
        '3' | '€' | '&' | '£' => 'e',
        '6' | '9' => 'g',
        '#' => 'h',
        '1' | '!' | '|' | '¡' | '¦' => 'i',
        'Ñ' | 'ñ' => 'n',
        '0' | '*' | '¤' | '°' | 'Ø' | 'ø' => 'o',
        '®' => 'r',
        '$' | '5' | '§' => 's',
        '+' | '7' => 't',
        'µ' => 'u',
        '%' | '×' => 'x',
        '¥' | 'Ý' | 'ý' | 'ÿ' => 'y',
        '2' => 'z',
        other => other,
    }
}

/// log2 of the binomial coefficient C(n, k).
pub fn log2_binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut r = 0.0;
    for j in (n - k + 1)..=n {
        r += (j as f64).log2();
    }
    for j in 2..=k {
        r -= (j as f64).log2();
    }
    r
}

fn find_dictionary_words(
    password: &[char],
    dict: &PopularPasswords,
    by_pos: &mut [Vec<PatternInstance>],
    deadline: Instant,
) {
    let n = password.len();
    let max_len = n.min(dict.max_length());
    if max_len < MIN_WORD_LEN {
        return;
    }

    let mut lower: Vec<Option<char>> = password.iter().map(|&c| Some(lower_char(c))).collect();
    let leet: Vec<char> = password
        .iter()
        .map(|&c| lower_char(decode_leet(c)))
        .collect();

    for len in (MIN_WORD_LEN..=max_len).rev() {
        if !dict.contains_length(len) {
            continue;
        }
        for i in 0..=(n - len) {
            if Instant::now() >= deadline {
                return;
            }
            let Some(window) = lower[i..i + len].iter().copied().collect::<Option<Vec<char>>>()
            else {
                continue;
            };

            let (word, dict_size, per_mod) = match dict.lookup(&window) {
                Some(size) => (window, size, 0.0),
                None => {
                    let leet_window = &leet[i..i + len];
                    match dict.lookup(leet_window) {
                        Some(size) => (leet_window.to_vec(), size, LEET_COST_PER_MOD),
                        None => continue,
                    }
                }
            };

            let mods = word
                .iter()
                .zip(&password[i..i + len])
                .filter(|(a, b)| a != b)
                .count();
            let cost =
                (dict_size as f64).log2() + log2_binomial(len, mods) + per_mod * mods as f64;
            by_pos[i].push(PatternInstance::new(i, len, PatternClass::Dictionary, cost));
            lower[i..i + len].fill(None);
        }
    }
}
