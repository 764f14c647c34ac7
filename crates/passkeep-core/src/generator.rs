//! Character-set based password generation.
//!
//! Key material for each run comes from the pool (256 bytes), optionally
//! XORed with caller-supplied entropy such as mouse movement, and feeds a
//! ChaCha20 [`CryptoRandomStream`]. Characters are picked with
//! [`CryptoRandomStream::get_random_u64_bounded`], so every member of the
//! set is equally likely.

use log::debug;
use zeroize::Zeroizing;

use crate::charset::{CharSet, INVALID, LOOK_ALIKE};
use crate::error::{Error, Result};
use crate::pool::CryptoPool;
use crate::primitives::xor_in_place;
use crate::stream::{CrsAlgorithm, CryptoRandomStream};

/// Pool bytes used to key one generator stream.
pub const STREAM_KEY_LEN: u32 = 256;

/// Longest password `generate` will produce.
pub const MAX_PASSWORD_LEN: usize = 1 << 16;

#[derive(Debug, Clone, Default)]
pub struct PasswordProfile {
    pub length: usize,
    pub charset: CharSet,
    pub exclude_look_alike: bool,
    pub no_repeating: bool,
    /// Extra characters to drop from `charset`.
    pub exclude: String,
}

impl PasswordProfile {
    /// Profile over named ranges, e.g. `"ulds"` for letters, digits, specials.
    pub fn from_ranges(length: usize, range_ids: &str) -> Result<Self> {
        let mut charset = CharSet::new();
        for id in range_ids.chars() {
            charset.add_named(id)?;
        }
        Ok(Self {
            length,
            charset,
            ..Self::default()
        })
    }

    /// The set actually drawn from after exclusions.
    pub fn effective_charset(&self) -> CharSet {
        let mut cs = self.charset.clone();
        cs.remove_str(INVALID);
        if self.exclude_look_alike {
            cs.remove_str(LOOK_ALIKE);
        }
        if !self.exclude.is_empty() {
            cs.remove_str(&self.exclude);
        }
        cs
    }
}

/// Build the keyed stream for one generator run.
pub fn create_stream(pool: &CryptoPool, user_entropy: &[u8]) -> Result<CryptoRandomStream> {
    let mut key = Zeroizing::new(pool.get_random_bytes(STREAM_KEY_LEN)?);
    xor_in_place(&mut key, user_entropy);
    CryptoRandomStream::new(CrsAlgorithm::ChaCha20, &key)
}

/// Generate one password for `profile`.
pub fn generate(
    profile: &PasswordProfile,
    pool: &CryptoPool,
    user_entropy: &[u8],
) -> Result<Zeroizing<String>> {
    let mut stream = create_stream(pool, user_entropy)?;
    generate_with_stream(profile, &mut stream)
}

/// Generate from an existing stream; deterministic for a given stream key.
pub fn generate_with_stream(
    profile: &PasswordProfile,
    stream: &mut CryptoRandomStream,
) -> Result<Zeroizing<String>> {
    let mut cs = profile.effective_charset();
    if profile.length == 0 {
        return Ok(Zeroizing::new(String::new()));
    }
    if profile.length > MAX_PASSWORD_LEN {
        return Err(Error::invalid(format!(
            "length {} exceeds the maximum of {MAX_PASSWORD_LEN}",
            profile.length
        )));
    }
    if cs.is_empty() {
        return Err(Error::invalid("character set is empty after exclusions"));
    }
    if profile.no_repeating && profile.length > cs.len() {
        return Err(Error::invalid(format!(
            "too few characters: {} requested without repeats from a set of {}",
            profile.length,
            cs.len()
        )));
    }

    let mut out = Zeroizing::new(String::with_capacity(profile.length.saturating_mul(2)));
    for _ in 0..profile.length {
        let index = stream.get_random_u64_bounded(cs.len() as u64)? as usize;
        let ch = cs
            .get(index)
            .ok_or_else(|| Error::InternalInvariantViolation("index outside charset".into()))?;
        out.push(ch);
        if profile.no_repeating {
            cs.remove(ch);
        }
    }
    debug!(
        "generated {} chars from a set of {}",
        profile.length,
        profile.effective_charset().len()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::DIGITS;

    fn stream(key: &[u8]) -> CryptoRandomStream {
        CryptoRandomStream::new(CrsAlgorithm::ChaCha20, key).unwrap()
    }

    #[test]
    fn test_generate_length_and_alphabet() {
        let profile = PasswordProfile::from_ranges(20, "d").unwrap();
        let pw = generate(&profile, CryptoPool::global(), b"").unwrap();
        assert_eq!(pw.chars().count(), 20);
        assert!(pw.chars().all(|c| DIGITS.contains(c)));
    }

    #[test]
    fn test_same_stream_key_same_password() {
        let profile = PasswordProfile::from_ranges(16, "ulds").unwrap();
        let a = generate_with_stream(&profile, &mut stream(b"k")).unwrap();
        let b = generate_with_stream(&profile, &mut stream(b"k")).unwrap();
        assert_eq!(*a, *b);
    }

    #[test]
    fn test_no_repeating_permutation() {
        let mut profile = PasswordProfile::from_ranges(10, "d").unwrap();
        profile.no_repeating = true;
        let pw = generate_with_stream(&profile, &mut stream(b"perm")).unwrap();
        let mut chars: Vec<char> = pw.chars().collect();
        chars.sort_unstable();
        assert_eq!(chars.into_iter().collect::<String>(), DIGITS);

        profile.length = 11;
        assert!(matches!(
            generate_with_stream(&profile, &mut stream(b"perm")),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_exclusions_apply() {
        let mut profile = PasswordProfile::from_ranges(200, "d").unwrap();
        profile.exclude_look_alike = true;
        profile.exclude = "9".into();
        let pw = generate_with_stream(&profile, &mut stream(b"ex")).unwrap();
        assert!(!pw.contains(['0', '1', '9']));
        assert_eq!(profile.effective_charset().len(), 7);
    }

    #[test]
    fn test_empty_charset_rejected() {
        let mut profile = PasswordProfile::from_ranges(8, "d").unwrap();
        profile.exclude = DIGITS.into();
        assert!(generate_with_stream(&profile, &mut stream(b"e")).is_err());
        profile.length = 0;
        assert!(generate_with_stream(&profile, &mut stream(b"e")).unwrap().is_empty());
    }

    #[test]
    fn test_absurd_length_rejected() {
        let mut profile = PasswordProfile::from_ranges(usize::MAX, "d").unwrap();
        assert!(matches!(
            generate_with_stream(&profile, &mut stream(b"l")),
            Err(Error::InvalidArgument(_))
        ));
        profile.length = MAX_PASSWORD_LEN + 1;
        assert!(generate_with_stream(&profile, &mut stream(b"l")).is_err());
        profile.length = MAX_PASSWORD_LEN;
        let pw = generate_with_stream(&profile, &mut stream(b"l")).unwrap();
        assert_eq!(pw.len(), MAX_PASSWORD_LEN);
    }

    #[test]
    fn test_user_entropy_is_mixed() {
        let profile = PasswordProfile::from_ranges(32, "A").unwrap();
        let pool = CryptoPool::new();
        let a = generate(&profile, &pool, b"mouse").unwrap();
        let b = generate(&profile, &pool, b"mouse").unwrap();
        assert_ne!(*a, *b, "pool bytes must differ between runs");
    }
}
