//! ChaCha20 as specified in RFC 7539: 256-bit key, 96-bit nonce, 32-bit block
//! counter.
//!
//! With `large_counter` the block counter carries into the first nonce word,
//! which makes a nonce whose first four bytes are zero behave like the original
//! 64-bit-counter construction by D. J. Bernstein.

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{BLOCK_LEN, SIGMA, StreamCipher, load_words_le, store_block_le, xor_buffered};
use crate::error::{Error, Result};

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 12;

#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ChaCha20Cipher {
    state: [u32; 16],
    block: [u8; BLOCK_LEN],
    pos: usize,
    large_counter: bool,
    /// Set once the 32-bit counter wrapped without `large_counter`.
    exhausted: bool,
}

impl ChaCha20Cipher {
    pub fn new(key: &[u8], iv: &[u8], large_counter: bool) -> Result<Self> {
        if key.len() != KEY_LEN {
            return Err(Error::invalid(format!(
                "ChaCha20 key must be {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        if iv.len() != IV_LEN {
            return Err(Error::invalid(format!(
                "ChaCha20 IV must be {IV_LEN} bytes, got {}",
                iv.len()
            )));
        }

        let k: [u32; 8] = load_words_le(key);
        let n: [u32; 3] = load_words_le(iv);
        let mut state = [0u32; 16];
        state[..4].copy_from_slice(&SIGMA);
        state[4..12].copy_from_slice(&k);
        state[12] = 0;
        state[13..].copy_from_slice(&n);

        Ok(Self {
            state,
            block: [0u8; BLOCK_LEN],
            pos: BLOCK_LEN,
            large_counter,
            exhausted: false,
        })
    }

    /// Position the keystream at byte `offset` from the start.
    ///
    /// `offset` must be a multiple of 64 and address a block reachable with
    /// the 32-bit counter.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        if offset % BLOCK_LEN as u64 != 0 {
            return Err(Error::invalid(format!(
                "ChaCha20 seek offset {offset} is not block aligned"
            )));
        }
        let block_index = offset / BLOCK_LEN as u64;
        let counter = u32::try_from(block_index).map_err(|_| {
            Error::invalid(format!("ChaCha20 seek offset {offset} exceeds the block counter"))
        })?;
        self.state[12] = counter;
        self.exhausted = false;
        self.pos = BLOCK_LEN;
        self.block.zeroize();
        Ok(())
    }

    fn next_block(
        state: &mut [u32; 16],
        large_counter: bool,
        exhausted: &mut bool,
        out: &mut [u8; BLOCK_LEN],
    ) -> Result<()> {
        if *exhausted {
            return Err(Error::invalid(
                "ChaCha20 block counter exhausted; too much data for one key/IV",
            ));
        }

        let mut x = *state;
        for _ in 0..10 {
            quarter_round(&mut x, 0, 4, 8, 12);
            quarter_round(&mut x, 1, 5, 9, 13);
            quarter_round(&mut x, 2, 6, 10, 14);
            quarter_round(&mut x, 3, 7, 11, 15);

            quarter_round(&mut x, 0, 5, 10, 15);
            quarter_round(&mut x, 1, 6, 11, 12);
            quarter_round(&mut x, 2, 7, 8, 13);
            quarter_round(&mut x, 3, 4, 9, 14);
        }
        for (xi, si) in x.iter_mut().zip(state.iter()) {
            *xi = xi.wrapping_add(*si);
        }
        store_block_le(&x, out);
        x.zeroize();

        state[12] = state[12].wrapping_add(1);
        if state[12] == 0 {
            if large_counter {
                state[13] = state[13].wrapping_add(1);
            } else {
                *exhausted = true;
            }
        }
        Ok(())
    }
}

#[inline(always)]
fn quarter_round(x: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(16);
    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(12);
    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(8);
    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(7);
}

impl StreamCipher for ChaCha20Cipher {
    fn encrypt(&mut self, buf: &mut [u8]) -> Result<()> {
        let state = &mut self.state;
        let exhausted = &mut self.exhausted;
        let large_counter = self.large_counter;
        xor_buffered(buf, &mut self.block, &mut self.pos, |out| {
            Self::next_block(state, large_counter, exhausted, out)
        })
    }

    fn name(&self) -> &'static str {
        "chacha20"
    }
}
