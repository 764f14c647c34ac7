//! Stream ciphers backing [`CryptoRandomStream`](crate::stream::CryptoRandomStream).
//!
//! Each cipher is a plain state machine: construct it with key material, then
//! XOR keystream into caller buffers with [`StreamCipher::encrypt`]. None of
//! them are meant to be shared between threads; wrap one in a lock if you must.
//! All state is wiped on drop.

pub mod arcfour;
pub mod chacha20;
pub mod salsa20;

pub use arcfour::ArcFourVariant;
pub use chacha20::ChaCha20Cipher;
pub use salsa20::Salsa20Cipher;

use crate::error::Result;

/// Size of one Salsa20 / ChaCha20 keystream block.
pub const BLOCK_LEN: usize = 64;

/// "expand 32-byte k"
pub(crate) const SIGMA: [u32; 4] = [0x6170_7865, 0x3320_646E, 0x7962_2D32, 0x6B20_6574];

/// A keystream generator that XORs its output into a buffer.
pub trait StreamCipher: Send {
    /// XOR the next `buf.len()` keystream bytes into `buf`.
    fn encrypt(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Identical to [`encrypt`](Self::encrypt); stream ciphers are symmetric.
    fn decrypt(&mut self, buf: &mut [u8]) -> Result<()> {
        self.encrypt(buf)
    }

    /// Short algorithm name for logs.
    fn name(&self) -> &'static str;
}

/// Read `count` little-endian words out of `bytes`.
pub(crate) fn load_words_le<const N: usize>(bytes: &[u8]) -> [u32; N] {
    let mut words = [0u32; N];
    for (w, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *w = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

/// Serialize the 16-word block output.
pub(crate) fn store_block_le(words: &[u32; 16], out: &mut [u8; BLOCK_LEN]) {
    for (chunk, w) in out.chunks_exact_mut(4).zip(words.iter()) {
        chunk.copy_from_slice(&w.to_le_bytes());
    }
}

/// Shared buffered-keystream loop for the 64-byte block ciphers.
///
/// `pos == BLOCK_LEN` means the buffer is spent; `refill` must write a fresh
/// block into it.
pub(crate) fn xor_buffered<F>(
    buf: &mut [u8],
    block: &mut [u8; BLOCK_LEN],
    pos: &mut usize,
    mut refill: F,
) -> Result<()>
where
    F: FnMut(&mut [u8; BLOCK_LEN]) -> Result<()>,
{
    let mut offset = 0;
    while offset < buf.len() {
        if *pos == BLOCK_LEN {
            refill(block)?;
            *pos = 0;
        }
        let take = (BLOCK_LEN - *pos).min(buf.len() - offset);
        for (b, k) in buf[offset..offset + take]
            .iter_mut()
            .zip(&block[*pos..*pos + take])
        {
            *b ^= k;
        }
        *pos += take;
        offset += take;
    }
    Ok(())
}
