// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! MT19937 Mersenne Twister, bit-exact against the Matsumoto-Nishimura
//! reference for both the scalar and the array seeding path.

use std::sync::OnceLock;

use crate::brng::{Brng, Snapshot};
use crate::entropy;
use crate::error::Error;
use crate::gf2::{self, Gf2Poly};

const N: usize = 624;
const M: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

/// Degree of the recurrence, i.e. the dimension of the state over GF(2).
const DEGREE: usize = 19937;

pub struct Mt19937 {
    key: [u32; N],
    pos: usize,
}

impl Mt19937 {
    /// Create a generator from a 32-bit scalar seed, or from OS entropy
    /// when `seed` is `None`. Seeds above 2^32 - 1 are rejected before any
    /// state is built.
    pub fn new(seed: Option<u64>) -> Result<Self, Error> {
        let mut rng = Mt19937 {
            key: [0; N],
            pos: N,
        };
        rng.seed(seed)?;
        Ok(rng)
    }

    /// Create a generator via the reference `init_by_array` procedure.
    pub fn from_seed_array(seed: &[u64]) -> Result<Self, Error> {
        let mut rng = Mt19937 {
            key: [0; N],
            pos: N,
        };
        rng.seed_from_array(seed)?;
        Ok(rng)
    }

    /// Re-seed in place. Validation happens before any mutation.
    pub fn seed(&mut self, seed: Option<u64>) -> Result<(), Error> {
        match seed {
            Some(value) => {
                if value > u64::from(u32::MAX) {
                    return Err(Error::SeedOutOfRange {
                        name: "seed",
                        bits: 32,
                    });
                }
                self.seed_scalar(value as u32);
                Ok(())
            }
            None => {
                // Entropy words go through init_by_array, which always
                // leaves a non-degenerate state.
                let words = entropy::seed_entropy(8);
                let words: Vec<u64> = words.into_iter().map(u64::from).collect();
                self.seed_from_array(&words)
            }
        }
    }

    /// Knuth LCG initialization from the reference `init_genrand`.
    fn seed_scalar(&mut self, seed: u32) {
        self.key[0] = seed;
        for i in 1..N {
            self.key[i] = 1_812_433_253u32
                .wrapping_mul(self.key[i - 1] ^ (self.key[i - 1] >> 30))
                .wrapping_add(i as u32);
        }
        self.pos = N;
    }

    /// Reference `init_by_array`. Every element must fit in 32 bits; the
    /// whole array is validated before the state is touched.
    pub fn seed_from_array(&mut self, seed: &[u64]) -> Result<(), Error> {
        if seed.iter().any(|&w| w > u64::from(u32::MAX)) {
            return Err(Error::SeedOutOfRange {
                name: "seed",
                bits: 32,
            });
        }
        self.seed_scalar(19_650_218);
        let key_length = seed.len().max(1);
        let seed_word = |j: usize| if j < seed.len() { seed[j] as u32 } else { 0 };

        let mut i = 1usize;
        let mut j = 0usize;
        for _ in 0..N.max(key_length) {
            self.key[i] = (self.key[i]
                ^ (self.key[i - 1] ^ (self.key[i - 1] >> 30)).wrapping_mul(1_664_525))
            .wrapping_add(seed_word(j))
            .wrapping_add(j as u32);
            i += 1;
            j += 1;
            if i >= N {
                self.key[0] = self.key[N - 1];
                i = 1;
            }
            if j >= key_length {
                j = 0;
            }
        }
        for _ in 0..N - 1 {
            self.key[i] = (self.key[i]
                ^ (self.key[i - 1] ^ (self.key[i - 1] >> 30)).wrapping_mul(1_566_083_941))
            .wrapping_sub(i as u32);
            i += 1;
            if i >= N {
                self.key[0] = self.key[N - 1];
                i = 1;
            }
        }
        self.key[0] = 0x8000_0000;
        self.pos = N;
        Ok(())
    }

    /// Regenerate the block in place, exactly as the reference does.
    fn twist(&mut self) {
        for i in 0..N {
            let y = (self.key[i] & UPPER_MASK) | (self.key[(i + 1) % N] & LOWER_MASK);
            self.key[i] =
                self.key[(i + M) % N] ^ (y >> 1) ^ if y & 1 == 1 { MATRIX_A } else { 0 };
        }
        self.pos = 0;
    }

    /// The state as a sliding window of the next 624 recurrence words:
    /// the unread tail of the current block, then the partially twisted
    /// head of the next one. Basis for the jump's linear algebra.
    fn windowed(&self) -> [u32; N] {
        let p = self.pos;
        let mut next = [0u32; N];
        for t in 0..p {
            let lower = if t + 1 < N { self.key[t + 1] } else { next[0] };
            let y = (self.key[t] & UPPER_MASK) | (lower & LOWER_MASK);
            let m = if t + M < N {
                self.key[t + M]
            } else {
                next[t + M - N]
            };
            next[t] = m ^ (y >> 1) ^ if y & 1 == 1 { MATRIX_A } else { 0 };
        }
        let mut window = [0u32; N];
        window[..N - p].copy_from_slice(&self.key[p..]);
        window[N - p..].copy_from_slice(&next[..p]);
        window
    }
}

impl Brng for Mt19937 {
    fn name(&self) -> &'static str {
        "MT19937"
    }

    fn next_u32(&mut self) -> u32 {
        if self.pos >= N {
            self.twist();
        }
        let mut y = self.key[self.pos];
        self.pos += 1;
        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^ (y >> 18)
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

    /// Advance by 2^128 outputs in O(degree) time.
    ///
    /// Applies `x^(2^128 - 1) mod phi` to the state window by Horner's rule
    /// and re-enters one word in, so every word subsequently read or twisted
    /// came out of the recurrence with all 32 bits defined.
    fn jump(&mut self) {
        let poly = jump_poly();
        let base = self.windowed();
        let mut acc = Window::zero();
        for i in (0..=poly.degree()).rev() {
            acc.step();
            if poly.bit(i) {
                acc.xor_state(&base);
            }
        }
        for (j, word) in self.key.iter_mut().enumerate() {
            *word = acc.get(j);
        }
        self.pos = 1;
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::Mt19937 {
            key: self.key.to_vec(),
            pos: self.pos as u32,
        }
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), Error> {
        match snapshot {
            Snapshot::Mt19937 { key, pos } => {
                if key.len() != N {
                    return Err(Error::SnapshotFieldOutOfRange { field: "key" });
                }
                if *pos > N as u32 {
                    return Err(Error::SnapshotFieldOutOfRange { field: "pos" });
                }
                self.key.copy_from_slice(key);
                self.pos = *pos as usize;
                Ok(())
            }
            other => Err(Error::SnapshotTagMismatch {
                expected: "MT19937",
                found: other.brng(),
            }),
        }
    }
}

/// Sliding recurrence window backing the jump: a circular buffer of 624
/// words advanced one recurrence step at a time.
struct Window {
    buf: [u32; N],
    head: usize,
}

impl Window {
    fn zero() -> Self {
        Window {
            buf: [0; N],
            head: 0,
        }
    }

    fn get(&self, j: usize) -> u32 {
        self.buf[(self.head + j) % N]
    }

    fn step(&mut self) {
        let y = (self.get(0) & UPPER_MASK) | (self.get(1) & LOWER_MASK);
        let word = self.get(M) ^ (y >> 1) ^ if y & 1 == 1 { MATRIX_A } else { 0 };
        self.buf[self.head] = word;
        self.head = (self.head + 1) % N;
    }

    fn xor_state(&mut self, base: &[u32; N]) {
        for (j, &w) in base.iter().enumerate() {
            self.buf[(self.head + j) % N] ^= w;
        }
    }
}

/// `x^(2^128 - 1) mod phi`, where `phi` is the characteristic polynomial of
/// the recurrence. Computed once per process: Berlekamp-Massey on 2 * 19937
/// output bits recovers `phi` (the recurrence has maximal period, so any
/// nonzero output bit has it as minimal polynomial), 128 modular squarings
/// give `x^(2^128)`, and one multiply by `x^-1 = (phi + 1) / x` lands the
/// exponent.
fn jump_poly() -> &'static Gf2Poly {
    static JUMP_POLY: OnceLock<Gf2Poly> = OnceLock::new();
    JUMP_POLY.get_or_init(|| {
        let mut probe = Mt19937 {
            key: [0; N],
            pos: N,
        };
        probe.seed_scalar(5489);
        let n_bits = 2 * DEGREE;
        let mut seq = vec![0u64; n_bits / 64 + 1];
        for t in 0..n_bits {
            if probe.next_u32() & 1 == 1 {
                seq[t / 64] |= 1 << (t % 64);
            }
        }
        let phi = gf2::berlekamp_massey(&seq, n_bits).reciprocal();
        debug_assert_eq!(phi.degree(), DEGREE);

        let mut power = Gf2Poly::zero(DEGREE);
        power.set_bit(1);
        for _ in 0..128 {
            power = power.square_mod(&phi);
        }
        let mut inv_x = phi.clone();
        inv_x.clear_bit(0);
        let inv_x = inv_x.shr(1);
        power.mul_mod(&inv_x, &phi)
    })
}
