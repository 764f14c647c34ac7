//! Salsa20/20 with a 256-bit key and 64-bit nonce (eSTREAM layout).

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{BLOCK_LEN, SIGMA, StreamCipher, load_words_le, store_block_le, xor_buffered};
use crate::error::{Error, Result};

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 8;

#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Salsa20Cipher {
    state: [u32; 16],
    block: [u8; BLOCK_LEN],
    pos: usize,
}

impl Salsa20Cipher {
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        if key.len() != KEY_LEN {
            return Err(Error::invalid(format!(
                "Salsa20 key must be {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        if iv.len() != IV_LEN {
            return Err(Error::invalid(format!(
                "Salsa20 IV must be {IV_LEN} bytes, got {}",
                iv.len()
            )));
        }

        let k: [u32; 8] = load_words_le(key);
        let n: [u32; 2] = load_words_le(iv);
        let state = [
            SIGMA[0], k[0], k[1], k[2], //
            k[3], SIGMA[1], n[0], n[1], //
            0, 0, SIGMA[2], k[4], //
            k[5], k[6], k[7], SIGMA[3],
        ];

        Ok(Self {
            state,
            block: [0u8; BLOCK_LEN],
            pos: BLOCK_LEN,
        })
    }

    fn next_block(state: &mut [u32; 16], out: &mut [u8; BLOCK_LEN]) {
        let mut x = *state;
        for _ in 0..10 {
            // Column round
            quarter_round(&mut x, 0, 4, 8, 12);
            quarter_round(&mut x, 5, 9, 13, 1);
            quarter_round(&mut x, 10, 14, 2, 6);
            quarter_round(&mut x, 15, 3, 7, 11);
            // Row round
            quarter_round(&mut x, 0, 1, 2, 3);
            quarter_round(&mut x, 5, 6, 7, 4);
            quarter_round(&mut x, 10, 11, 8, 9);
            quarter_round(&mut x, 15, 12, 13, 14);
        }
        for (xi, si) in x.iter_mut().zip(state.iter()) {
            *xi = xi.wrapping_add(*si);
        }
        store_block_le(&x, out);
        x.zeroize();

        state[8] = state[8].wrapping_add(1);
        if state[8] == 0 {
            state[9] = state[9].wrapping_add(1);
        }
    }
}

#[inline(always)]
fn quarter_round(x: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    x[b] ^= x[a].wrapping_add(x[d]).rotate_left(7);
    x[c] ^= x[b].wrapping_add(x[a]).rotate_left(9);
    x[d] ^= x[c].wrapping_add(x[b]).rotate_left(13);
    x[a] ^= x[d].wrapping_add(x[c]).rotate_left(18);
}

impl StreamCipher for Salsa20Cipher {
    fn encrypt(&mut self, buf: &mut [u8]) -> Result<()> {
        let state = &mut self.state;
        xor_buffered(buf, &mut self.block, &mut self.pos, |out| {
            Self::next_block(state, out);
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "salsa20"
    }
}
