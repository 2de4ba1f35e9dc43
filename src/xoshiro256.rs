// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! xoshiro256** (Blackman & Vigna), a 64-bit generator with a 2^128 jump.
//!
//! The only 64-bit-native algorithm in the crate: 32-bit draws split one
//! output word, low half first, with the high half cached until consumed
//! or invalidated.

use crate::brng::{Brng, Snapshot};
use crate::entropy;
use crate::error::Error;
use crate::seed;

/// Jump polynomial for 2^128 steps, from the reference implementation.
const JUMP: [u64; 4] = [
    0x180ec6d33cfd0aba,
    0xd5a61266f0c9392c,
    0xa9582618e03fc9aa,
    0x39abdc4529b1661c,
];

pub struct Xoshiro256StarStar {
    s: [u64; 4],
    has_uint32: bool,
    uinteger: u32,
}

impl Xoshiro256StarStar {
    /// Create a generator from a 64-bit seed, or from OS entropy when
    /// `seed` is `None`. The seed expands through SplitMix64 into the
    /// 256-bit state (four 64-bit words; eight 32-bit wire words).
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(value) => Self::from_seed_array(&[value]),
            None => {
                let words = entropy::seed_entropy(8);
                let mut s = [0u64; 4];
                for (i, slot) in s.iter_mut().enumerate() {
                    *slot = u64::from(words[2 * i]) | (u64::from(words[2 * i + 1]) << 32);
                }
                if s.iter().all(|&w| w == 0) {
                    // The all-zero state is a fixed point.
                    return Self::from_seed_array(&[0]);
                }
                Xoshiro256StarStar {
                    s,
                    has_uint32: false,
                    uinteger: 0,
                }
            }
        }
    }

    pub fn from_seed_array(seed_words: &[u64]) -> Self {
        let expanded = seed::expand_seed(seed_words, 4);
        let mut s = [0u64; 4];
        s.copy_from_slice(&expanded);
        Xoshiro256StarStar {
            s,
            has_uint32: false,
            uinteger: 0,
        }
    }

    /// Re-seed in place; wipes the cached half-word.
    pub fn seed(&mut self, seed: Option<u64>) {
        *self = Xoshiro256StarStar::new(seed);
    }

    /// The core output function and state transition.
    fn next_word(&mut self) -> u64 {
        let result = self.s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);

        let t = self.s[1] << 17;
        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];
        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }
}

impl Brng for Xoshiro256StarStar {
    fn name(&self) -> &'static str {
        "Xoshiro256StarStar"
    }

    fn next_u32(&mut self) -> u32 {
        if self.has_uint32 {
            self.has_uint32 = false;
            return self.uinteger;
        }
        let word = self.next_word();
        self.uinteger = (word >> 32) as u32;
        self.has_uint32 = true;
        word as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_word()
    }

    fn next_double(&mut self) -> f64 {
        (self.next_word() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn next_raw(&mut self) -> u64 {
        self.next_word()
    }

    /// Advance by 2^128 outputs via the published jump polynomial. The
    /// cached half-word does not survive the jump.
    fn jump(&mut self) {
        let mut s = [0u64; 4];
        for &word in &JUMP {
            for b in 0..64 {
                if (word >> b) & 1 == 1 {
                    for (dst, src) in s.iter_mut().zip(self.s.iter()) {
                        *dst ^= src;
                    }
                }
                self.next_word();
            }
        }
        self.s = s;
        self.has_uint32 = false;
        self.uinteger = 0;
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::Xoshiro256StarStar {
            s: self.s,
            has_uint32: self.has_uint32,
            uinteger: self.uinteger,
        }
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), Error> {
        match snapshot {
            Snapshot::Xoshiro256StarStar {
                s,
                has_uint32,
                uinteger,
            } => {
                self.s = *s;
                self.has_uint32 = *has_uint32;
                self.uinteger = *uinteger;
                Ok(())
            }
            other => Err(Error::SnapshotTagMismatch {
                expected: "Xoshiro256StarStar",
                found: other.brng(),
            }),
        }
    }
}
