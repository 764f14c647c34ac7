//! Hashing and key-stretching helpers.
//!
//! Everything that turns arbitrary bytes into fixed-size key material goes
//! through this module: the pool folds entropy with [`hash512`], the random
//! stream derives cipher keys with [`hash256`] / [`hash512`], and callers that
//! need a key of an unusual length use [`resize_key`].

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Output length of [`hash256`].
pub const HASH256_LEN: usize = 32;
/// Output length of [`hash512`].
pub const HASH512_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Digests
// ---------------------------------------------------------------------------

/// SHA-256 of `data`. The empty slice is valid input.
pub fn hash256(data: &[u8]) -> [u8; HASH256_LEN] {
    Sha256::digest(data).into()
}

/// SHA-512 of `data`.
pub fn hash512(data: &[u8]) -> [u8; HASH512_LEN] {
    Sha512::digest(data).into()
}

/// HMAC-SHA-256 with an arbitrary-length key.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; HASH256_LEN]> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| Error::InternalInvariantViolation(format!("HMAC-SHA-256 key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

// ---------------------------------------------------------------------------
// Key resizing
// ---------------------------------------------------------------------------

/// Derive exactly `output_len` bytes of key material from `input`.
///
/// - up to 32 bytes: truncated SHA-256
/// - up to 64 bytes: truncated SHA-512
/// - longer: HMAC-SHA-256 in counter mode, keyed with SHA-512(`input`),
///   over the little-endian 64-bit block index
///
/// Deterministic for a given `(input, output_len)`.
pub fn resize_key(input: &[u8], output_len: usize) -> Result<Zeroizing<Vec<u8>>> {
    if output_len == 0 {
        return Ok(Zeroizing::new(Vec::new()));
    }

    if output_len <= HASH256_LEN {
        let mut digest = hash256(input);
        let out = Zeroizing::new(digest[..output_len].to_vec());
        digest.zeroize();
        return Ok(out);
    }

    let mut digest = hash512(input);
    if output_len <= HASH512_LEN {
        let out = Zeroizing::new(digest[..output_len].to_vec());
        digest.zeroize();
        return Ok(out);
    }

    let keyed = HmacSha256::new_from_slice(&digest)
        .map_err(|e| Error::InternalInvariantViolation(format!("HMAC-SHA-256 key: {e}")));
    digest.zeroize();
    let keyed = keyed?;

    let mut out = Zeroizing::new(Vec::with_capacity(output_len));
    let mut block_index: u64 = 0;
    while out.len() < output_len {
        let mut mac = keyed.clone();
        mac.update(&block_index.to_le_bytes());
        let mut block: [u8; HASH256_LEN] = mac.finalize().into_bytes().into();
        let take = (output_len - out.len()).min(HASH256_LEN);
        out.extend_from_slice(&block[..take]);
        block.zeroize();
        block_index += 1;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Byte helpers
// ---------------------------------------------------------------------------

/// XOR `src` into `dest`, cycling `src` when it is shorter.
pub fn xor_in_place(dest: &mut [u8], src: &[u8]) {
    if src.is_empty() {
        return;
    }
    for (d, s) in dest.iter_mut().zip(src.iter().cycle()) {
        *d ^= s;
    }
}

/// Decode an upper- or lowercase hex string. Used by known-answer tests.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>> {
    if !hex.is_ascii() {
        return Err(Error::invalid("hex string must be ASCII"));
    }
    if hex.len() % 2 != 0 {
        return Err(Error::invalid("hex string has odd length"));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| Error::invalid(format!("bad hex digit near offset {i}")))
        })
        .collect()
}
