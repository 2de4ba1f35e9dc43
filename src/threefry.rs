// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! ThreeFry-4x32: a counter-based generator built on the 20-round
//! Threefry-4x32 block cipher from the Random123 suite.
//!
//! Output is a keyed function of a 128-bit counter, so the stream can be
//! repositioned in O(1): `advance` adds to the counter, `jump` strides by
//! 2^64 blocks for parallel stream partitioning.

use crate::brng::{Brng, Snapshot};
use crate::entropy;
use crate::error::Error;
use crate::seed;

const BUFFER_SIZE: usize = 4;
/// Skein key-schedule parity constant, 32-bit variant.
const PARITY: u32 = 0x1bd1_1bda;
/// Rotation schedule for Threefry-4x32, repeating every eight rounds.
const ROTATIONS: [[u32; 2]; 8] = [
    [10, 26],
    [11, 21],
    [13, 27],
    [23, 5],
    [6, 20],
    [17, 11],
    [25, 10],
    [18, 20],
];

/// One 20-round Threefry-4x32 block: encrypt `counter` under `key`.
pub fn threefry4x32(counter: [u32; 4], key: [u32; 4]) -> [u32; 4] {
    let ks = [
        key[0],
        key[1],
        key[2],
        key[3],
        PARITY ^ key[0] ^ key[1] ^ key[2] ^ key[3],
    ];
    let mut x = [
        counter[0].wrapping_add(ks[0]),
        counter[1].wrapping_add(ks[1]),
        counter[2].wrapping_add(ks[2]),
        counter[3].wrapping_add(ks[3]),
    ];
    for round in 0..20 {
        let [r0, r1] = ROTATIONS[round % 8];
        if round % 2 == 0 {
            x[0] = x[0].wrapping_add(x[1]);
            x[1] = x[1].rotate_left(r0) ^ x[0];
            x[2] = x[2].wrapping_add(x[3]);
            x[3] = x[3].rotate_left(r1) ^ x[2];
        } else {
            x[0] = x[0].wrapping_add(x[3]);
            x[3] = x[3].rotate_left(r0) ^ x[0];
            x[2] = x[2].wrapping_add(x[1]);
            x[1] = x[1].rotate_left(r1) ^ x[2];
        }
        if round % 4 == 3 {
            let s = round / 4 + 1;
            for i in 0..4 {
                x[i] = x[i].wrapping_add(ks[(s + i) % 5]);
            }
            x[3] = x[3].wrapping_add(s as u32);
        }
    }
    x
}

#[derive(Debug)]
pub struct ThreeFry32 {
    counter: [u32; 4],
    key: [u32; 4],
    buffer: [u32; 4],
    buffer_pos: usize,
}

impl ThreeFry32 {
    /// Create a generator from a seed, an explicit 128-bit key, or OS
    /// entropy when both are absent. Providing both a seed and a key is a
    /// conflict and is rejected before any state is built; so is a counter
    /// wider than 128 bits (unrepresentable here, checked for snapshots).
    pub fn new(
        seed: Option<u64>,
        counter: Option<u128>,
        key: Option<u128>,
    ) -> Result<Self, Error> {
        if seed.is_some() && key.is_some() {
            return Err(Error::ConflictingSeedAndKey);
        }
        let key_words = match key {
            Some(value) => to_quad(&seed::int_to_words(value, "key", 128)?),
            None => match seed {
                Some(value) => key_from_seed(&[value]),
                None => to_quad(&entropy::seed_entropy(4)),
            },
        };
        let counter_words = to_quad(&seed::int_to_words(counter.unwrap_or(0), "counter", 128)?);
        Ok(ThreeFry32 {
            counter: counter_words,
            key: key_words,
            buffer: [0; BUFFER_SIZE],
            buffer_pos: BUFFER_SIZE,
        })
    }

    /// Create a generator from a multi-word seed (key derived by SplitMix64
    /// expansion, exactly as the scalar path derives it from `[seed]`).
    pub fn from_seed_array(seed: &[u64], counter: Option<u128>) -> Result<Self, Error> {
        let counter_words = to_quad(&seed::int_to_words(counter.unwrap_or(0), "counter", 128)?);
        Ok(ThreeFry32 {
            counter: counter_words,
            key: key_from_seed(seed),
            buffer: [0; BUFFER_SIZE],
            buffer_pos: BUFFER_SIZE,
        })
    }

    /// Re-seed in place: derive a fresh key (from entropy when `seed` is
    /// absent), reset the counter to zero and drop any buffered outputs.
    pub fn seed(&mut self, seed: Option<u64>) {
        self.key = match seed {
            Some(value) => key_from_seed(&[value]),
            None => to_quad(&entropy::seed_entropy(4)),
        };
        self.counter = [0; 4];
        self.buffer_pos = BUFFER_SIZE;
    }

    /// Add `delta` to the counter modulo 2^128 and invalidate the buffer.
    /// Consecutive advances sum: `advance(a); advance(b)` repositions the
    /// stream exactly like `advance(a + b)`.
    pub fn advance(&mut self, delta: u128) {
        let counter = seed::words_to_int(&self.counter).wrapping_add(delta);
        for (i, word) in self.counter.iter_mut().enumerate() {
            *word = (counter >> (32 * i)) as u32;
        }
        self.buffer_pos = BUFFER_SIZE;
    }

    /// Stride `iter` blocks of 2^64: `jump_by(iter)` is
    /// `advance(iter * 2^64)`. `iter` is a `u64`, so the product always
    /// fits the 128-bit counter; larger strides go through [`advance`].
    ///
    /// [`advance`]: ThreeFry32::advance
    pub fn jump_by(&mut self, iter: u64) {
        self.advance(u128::from(iter) << 64);
    }

    fn refill(&mut self) {
        self.buffer = threefry4x32(self.counter, self.key);
        // Counter of the next block, word 0 first, carry propagated.
        for word in self.counter.iter_mut() {
            let (next, carry) = word.overflowing_add(1);
            *word = next;
            if !carry {
                break;
            }
        }
        self.buffer_pos = 0;
    }
}

/// Derive the four key words from a seed array: SplitMix64 expansion to two
/// 64-bit words, then the little-endian wire split.
fn key_from_seed(seed_words: &[u64]) -> [u32; 4] {
    let expanded = seed::expand_seed(seed_words, 2);
    let low = seed::u64_to_words(expanded[0]);
    let high = seed::u64_to_words(expanded[1]);
    [low[0], low[1], high[0], high[1]]
}

fn to_quad(words: &[u32]) -> [u32; 4] {
    let mut out = [0u32; 4];
    out.copy_from_slice(&words[..4]);
    out
}

impl Brng for ThreeFry32 {
    fn name(&self) -> &'static str {
        "ThreeFry32"
    }

    fn next_u32(&mut self) -> u32 {
        if self.buffer_pos == BUFFER_SIZE {
            self.refill();
        }
        let out = self.buffer[self.buffer_pos];
        self.buffer_pos += 1;
        out
    }

    fn next_u64(&mut self) -> u64 {
        let high = self.next_u32();
        let low = self.next_u32();
        (u64::from(high) << 32) | u64::from(low)
    }

    fn next_double(&mut self) -> f64 {
        let a = self.next_u32() >> 5;
        let b = self.next_u32() >> 6;
        (f64::from(a) * 67_108_864.0 + f64::from(b)) / 9_007_199_254_740_992.0
    }

    fn next_raw(&mut self) -> u64 {
        u64::from(self.next_u32())
    }

    fn jump(&mut self) {
        self.jump_by(1);
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::ThreeFry32 {
            counter: self.counter,
            key: self.key,
            buffer: self.buffer,
            buffer_pos: self.buffer_pos as u32,
        }
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), Error> {
        match snapshot {
            Snapshot::ThreeFry32 {
                counter,
                key,
                buffer,
                buffer_pos,
            } => {
                if *buffer_pos > BUFFER_SIZE as u32 {
                    return Err(Error::SnapshotFieldOutOfRange { field: "buffer_pos" });
                }
                self.counter = *counter;
                self.key = *key;
                self.buffer = *buffer;
                self.buffer_pos = *buffer_pos as usize;
                Ok(())
            }
            other => Err(Error::SnapshotTagMismatch {
                expected: "ThreeFry32",
                found: other.brng(),
            }),
        }
    }
}
