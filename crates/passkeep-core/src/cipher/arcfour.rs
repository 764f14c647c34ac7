//! ArcFour variant keystream.
//!
//! Kept for reading older protected-stream data only. The key schedule swaps
//! every state byte with index 0 instead of the running index, so the output
//! is NOT compatible with RC4. The first 512 bytes are discarded at
//! construction.

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::StreamCipher;
use crate::error::{Error, Result};

/// Number of keystream bytes thrown away after the key schedule.
pub const DISCARD_BYTES: usize = 512;

#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ArcFourVariant {
    state: [u8; 256],
    i: u8,
    j: u8,
}

impl ArcFourVariant {
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::invalid("ArcFour key must not be empty"));
        }

        let mut state = [0u8; 256];
        for (w, s) in state.iter_mut().enumerate() {
            *s = w as u8;
        }

        let mut j: u8 = 0;
        for w in 0..256 {
            j = j.wrapping_add(state[w]).wrapping_add(key[w % key.len()]);
            state.swap(0, j as usize);
        }

        let mut cipher = Self { state, i: 0, j: 0 };
        let mut discard = [0u8; DISCARD_BYTES];
        cipher.apply(&mut discard);
        discard.zeroize();
        Ok(cipher)
    }

    fn apply(&mut self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            self.i = self.i.wrapping_add(1);
            self.j = self.j.wrapping_add(self.state[self.i as usize]);
            self.state.swap(self.i as usize, self.j as usize);
            let t = self.state[self.i as usize].wrapping_add(self.state[self.j as usize]);
            *b ^= self.state[t as usize];
        }
    }
}

impl StreamCipher for ArcFourVariant {
    fn encrypt(&mut self, buf: &mut [u8]) -> Result<()> {
        self.apply(buf);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "arcfour-variant"
    }
}
