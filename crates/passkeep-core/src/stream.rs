//! Keyed deterministic random stream.
//!
//! A [`CryptoRandomStream`] turns a seed key into an endless, reproducible
//! byte sequence. Two streams built from the same algorithm and key produce
//! identical output, which is what in-memory secret masking needs: XOR with
//! the stream to protect, XOR again with a fresh stream to recover.

use std::fmt;

use zeroize::Zeroizing;

use crate::cipher::{ArcFourVariant, ChaCha20Cipher, Salsa20Cipher, StreamCipher};
use crate::error::{Error, Result};
use crate::primitives::{hash256, hash512};

/// Fixed Salsa20 nonce for keyed streams.
pub const SALSA20_IV: [u8; 8] = [0xE8, 0x30, 0x09, 0x4B, 0x97, 0x20, 0x5D, 0x2A];

/// Largest single request accepted by [`CryptoRandomStream::get_random_bytes`].
pub const MAX_REQUEST_BYTES: u32 = i32::MAX as u32;

/// Stream algorithm identifier. The numeric values are persisted by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CrsAlgorithm {
    /// Legacy only; see [`ArcFourVariant`].
    ArcFourVariant = 1,
    Salsa20 = 2,
    ChaCha20 = 3,
}

impl TryFrom<u32> for CrsAlgorithm {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Self::ArcFourVariant),
            2 => Ok(Self::Salsa20),
            3 => Ok(Self::ChaCha20),
            0 => Err(Error::invalid("random stream algorithm 0 (null) is not usable")),
            other => Err(Error::invalid(format!(
                "unknown random stream algorithm {other}"
            ))),
        }
    }
}

impl From<CrsAlgorithm> for u32 {
    fn from(a: CrsAlgorithm) -> Self {
        a as u32
    }
}

impl fmt::Display for CrsAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArcFourVariant => write!(f, "arcfour-variant"),
            Self::Salsa20 => write!(f, "salsa20"),
            Self::ChaCha20 => write!(f, "chacha20"),
        }
    }
}

enum CipherState {
    ArcFour(ArcFourVariant),
    Salsa20(Salsa20Cipher),
    ChaCha20(ChaCha20Cipher),
}

impl CipherState {
    fn cipher(&mut self) -> &mut dyn StreamCipher {
        match self {
            Self::ArcFour(c) => c,
            Self::Salsa20(c) => c,
            Self::ChaCha20(c) => c,
        }
    }
}

/// Deterministic keyed random stream. Not meant for concurrent use.
pub struct CryptoRandomStream {
    algorithm: CrsAlgorithm,
    state: CipherState,
}

impl CryptoRandomStream {
    /// Build a stream from `key`.
    ///
    /// - ArcFour variant uses the key directly.
    /// - Salsa20 uses SHA-256(key) with a fixed nonce.
    /// - ChaCha20 splits SHA-512(key) into a 32-byte key and 12-byte nonce and
    ///   lets the block counter run past 2^32.
    pub fn new(algorithm: CrsAlgorithm, key: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::invalid("random stream key must not be empty"));
        }

        let state = match algorithm {
            CrsAlgorithm::ArcFourVariant => CipherState::ArcFour(ArcFourVariant::new(key)?),
            CrsAlgorithm::Salsa20 => {
                let k = Zeroizing::new(hash256(key));
                CipherState::Salsa20(Salsa20Cipher::new(&k[..], &SALSA20_IV)?)
            }
            CrsAlgorithm::ChaCha20 => {
                let h = Zeroizing::new(hash512(key));
                CipherState::ChaCha20(ChaCha20Cipher::new(&h[..32], &h[32..44], true)?)
            }
        };

        Ok(Self { algorithm, state })
    }

    /// Convenience for callers holding a persisted numeric algorithm id.
    pub fn from_id(algorithm_id: u32, key: &[u8]) -> Result<Self> {
        Self::new(CrsAlgorithm::try_from(algorithm_id)?, key)
    }

    pub fn algorithm(&self) -> CrsAlgorithm {
        self.algorithm
    }

    /// Overwrite `buf` with the next `buf.len()` stream bytes.
    pub fn fill_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        buf.fill(0);
        self.state.cipher().encrypt(buf)
    }

    /// XOR the next `buf.len()` stream bytes into `buf`.
    pub fn xor_into(&mut self, buf: &mut [u8]) -> Result<()> {
        self.state.cipher().encrypt(buf)
    }

    pub fn get_random_bytes(&mut self, count: u32) -> Result<Vec<u8>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if count > MAX_REQUEST_BYTES {
            return Err(Error::invalid(format!(
                "requested {count} stream bytes, limit is {MAX_REQUEST_BYTES}"
            )));
        }
        let mut out = vec![0u8; count as usize];
        self.fill_bytes(&mut out)?;
        Ok(out)
    }

    /// Next 8 stream bytes as a little-endian `u64`.
    pub fn get_random_u64(&mut self) -> Result<u64> {
        let mut b = Zeroizing::new([0u8; 8]);
        self.fill_bytes(&mut b[..])?;
        Ok(u64::from_le_bytes(*b))
    }

    /// Uniform value in `[0, max_exclusive)`.
    ///
    /// Rejection sampling: a draw `v` is kept only if it lies below the
    /// largest multiple of `max_exclusive` that fits in a `u64`, so every
    /// residue is equally likely.
    pub fn get_random_u64_bounded(&mut self, max_exclusive: u64) -> Result<u64> {
        if max_exclusive == 0 {
            return Err(Error::invalid("bound must be positive"));
        }
        loop {
            let v = self.get_random_u64()?;
            let rem = v % max_exclusive;
            if v - rem <= u64::MAX - (max_exclusive - 1) {
                return Ok(rem);
            }
        }
    }
}

impl fmt::Debug for CryptoRandomStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoRandomStream")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [CrsAlgorithm; 3] = [
        CrsAlgorithm::ArcFourVariant,
        CrsAlgorithm::Salsa20,
        CrsAlgorithm::ChaCha20,
    ];

    #[test]
    fn test_algorithm_ids() {
        for a in ALL {
            assert_eq!(CrsAlgorithm::try_from(u32::from(a)).unwrap(), a);
        }
        assert!(CrsAlgorithm::try_from(0).is_err());
        assert!(CrsAlgorithm::try_from(4).is_err());
        assert_eq!(CrsAlgorithm::ChaCha20.to_string(), "chacha20");
    }

    #[test]
    fn test_empty_key_rejected_for_all_algorithms() {
        for a in ALL {
            assert!(
                matches!(CryptoRandomStream::new(a, &[]), Err(Error::InvalidArgument(_))),
                "{a} accepted an empty key"
            );
        }
    }

    #[test]
    fn test_same_key_same_stream() {
        for a in ALL {
            let mut x = CryptoRandomStream::new(a, b"seed").unwrap();
            let mut y = CryptoRandomStream::new(a, b"seed").unwrap();
            assert_eq!(x.get_random_bytes(200).unwrap(), y.get_random_bytes(200).unwrap());
        }
    }

    #[test]
    fn test_chunking_does_not_change_stream() {
        for a in ALL {
            let mut x = CryptoRandomStream::new(a, b"chunks").unwrap();
            let mut y = CryptoRandomStream::new(a, b"chunks").unwrap();
            let whole = x.get_random_bytes(150).unwrap();
            let mut parts = Vec::new();
            for n in [1u32, 63, 2, 64, 20] {
                parts.extend(y.get_random_bytes(n).unwrap());
            }
            assert_eq!(whole, parts, "{a}");
        }
    }

    #[test]
    fn test_algorithms_diverge() {
        let mut outs = Vec::new();
        for a in ALL {
            let mut s = CryptoRandomStream::new(a, b"same key").unwrap();
            outs.push(s.get_random_bytes(32).unwrap());
        }
        assert_ne!(outs[0], outs[1]);
        assert_ne!(outs[1], outs[2]);
    }

    #[test]
    fn test_salsa20_stream_uses_hashed_key_and_fixed_iv() {
        let key = b"derivation check";
        let mut s = CryptoRandomStream::new(CrsAlgorithm::Salsa20, key).unwrap();
        let mut c = Salsa20Cipher::new(&hash256(key), &SALSA20_IV).unwrap();
        let mut expect = [0u8; 64];
        c.encrypt(&mut expect).unwrap();
        assert_eq!(s.get_random_bytes(64).unwrap(), expect.to_vec());
    }

    #[test]
    fn test_chacha20_stream_splits_sha512() {
        let key = b"derivation check";
        let h = hash512(key);
        let mut s = CryptoRandomStream::new(CrsAlgorithm::ChaCha20, key).unwrap();
        let mut c = ChaCha20Cipher::new(&h[..32], &h[32..44], true).unwrap();
        let mut expect = [0u8; 64];
        c.encrypt(&mut expect).unwrap();
        assert_eq!(s.get_random_bytes(64).unwrap(), expect.to_vec());
    }

    #[test]
    fn test_u64_is_little_endian() {
        let mut a = CryptoRandomStream::new(CrsAlgorithm::ChaCha20, b"le").unwrap();
        let mut b = CryptoRandomStream::new(CrsAlgorithm::ChaCha20, b"le").unwrap();
        let bytes = a.get_random_bytes(8).unwrap();
        let v = b.get_random_u64().unwrap();
        assert_eq!(v.to_le_bytes().to_vec(), bytes);
    }

    #[test]
    fn test_bounded_zero_rejected() {
        let mut s = CryptoRandomStream::new(CrsAlgorithm::ChaCha20, b"k").unwrap();
        assert!(matches!(
            s.get_random_u64_bounded(0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_bounded_one_is_always_zero() {
        let mut s = CryptoRandomStream::new(CrsAlgorithm::Salsa20, b"k").unwrap();
        for _ in 0..100 {
            assert_eq!(s.get_random_u64_bounded(1).unwrap(), 0);
        }
    }

    #[test]
    fn test_bounded_stays_in_range() {
        let mut s = CryptoRandomStream::new(CrsAlgorithm::ChaCha20, b"range").unwrap();
        for bound in [2u64, 3, 7, 10, 1000, u64::MAX / 2 + 1, u64::MAX] {
            for _ in 0..200 {
                assert!(s.get_random_u64_bounded(bound).unwrap() < bound);
            }
        }
    }

    #[test]
    fn test_zero_count_leaves_stream_untouched() {
        let mut a = CryptoRandomStream::new(CrsAlgorithm::ArcFourVariant, b"k").unwrap();
        let mut b = CryptoRandomStream::new(CrsAlgorithm::ArcFourVariant, b"k").unwrap();
        assert!(a.get_random_bytes(0).unwrap().is_empty());
        assert_eq!(a.get_random_bytes(16).unwrap(), b.get_random_bytes(16).unwrap());
    }

    #[test]
    fn test_xor_into_masks_and_unmasks() {
        let secret = b"hunter2".to_vec();
        let mut buf = secret.clone();
        CryptoRandomStream::new(CrsAlgorithm::ChaCha20, b"mask")
            .unwrap()
            .xor_into(&mut buf)
            .unwrap();
        assert_ne!(buf, secret);
        CryptoRandomStream::new(CrsAlgorithm::ChaCha20, b"mask")
            .unwrap()
            .xor_into(&mut buf)
            .unwrap();
        assert_eq!(buf, secret);
    }
}
