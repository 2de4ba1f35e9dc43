// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Seed marshalling: canonical conversions between integers and
//! little-endian 32-bit word arrays, and SplitMix64 seed-array expansion.
//!
//! Every counter, key and multi-word seed in the crate goes through these
//! functions, so the wire form is defined exactly once:
//! `word[i] = (value >> (32 * i)) & 0xffff_ffff`.

use crate::error::Error;
use crate::splitmix::SplitMix64;

/// Convert a non-negative integer into `total_bits / 32` little-endian
/// 32-bit words. Fails if the value does not fit in `total_bits`.
pub fn int_to_words(value: u128, name: &'static str, total_bits: u32) -> Result<Vec<u32>, Error> {
    debug_assert!(total_bits % 32 == 0 && total_bits <= 128);
    if total_bits < 128 && (value >> total_bits) != 0 {
        return Err(Error::SeedOutOfRange {
            name,
            bits: total_bits,
        });
    }
    Ok((0..total_bits / 32)
        .map(|i| (value >> (32 * i)) as u32)
        .collect())
}

/// Inverse of [`int_to_words`] for up to four words.
pub fn words_to_int(words: &[u32]) -> u128 {
    debug_assert!(words.len() <= 4);
    words
        .iter()
        .enumerate()
        .fold(0u128, |acc, (i, &w)| acc | (u128::from(w) << (32 * i)))
}

/// Split one `u64` into its low and high 32-bit wire words, low first.
pub fn u64_to_words(value: u64) -> [u32; 2] {
    [value as u32, (value >> 32) as u32]
}

/// Expand a seed array into `n_words` generator state words.
///
/// A single SplitMix64 stream starts from state zero; each slot advances the
/// stream once and XORs the draw with `seed[i]` while seed words remain.
/// A scalar seed `s` and the one-element array `[s]` therefore produce
/// identical expansions.
pub fn expand_seed(seed: &[u64], n_words: usize) -> Vec<u64> {
    let mut stream = SplitMix64::new(0);
    (0..n_words)
        .map(|i| {
            let word = stream.next_u64();
            if i < seed.len() {
                word ^ seed[i]
            } else {
                word
            }
        })
        .collect()
}
