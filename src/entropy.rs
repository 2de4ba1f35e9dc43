// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Seed-word acquisition from the operating system, with a deterministic
//! clock-based fallback for hosts where the OS source is unavailable.

use chrono::Utc;
use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::error::Error;
use crate::splitmix::SplitMix64;

/// Read `n_words` 32-bit words from the OS entropy source.
///
/// Fails with [`Error::EntropyUnavailable`] when the OS source cannot be
/// read; callers that can tolerate weaker seeds should use [`seed_entropy`].
pub fn random_entropy(n_words: usize) -> Result<Vec<u32>, Error> {
    let mut words = Vec::with_capacity(n_words);
    for _ in 0..n_words {
        let word = OsRng
            .try_next_u32()
            .map_err(|_| Error::EntropyUnavailable)?;
        words.push(word);
    }
    Ok(words)
}

/// Produce `n_words` fallback seed words from the wall clock and process id,
/// whitened through SplitMix64. Not unpredictable; last resort only.
pub fn fallback_entropy(n_words: usize) -> Vec<u32> {
    let now = Utc::now();
    let nanos = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros());
    let mut mixer = SplitMix64::new((nanos as u64) ^ (u64::from(std::process::id()) << 32));
    let mut words = Vec::with_capacity(n_words);
    while words.len() < n_words {
        let wide = mixer.next_u64();
        words.push(wide as u32);
        if words.len() < n_words {
            words.push((wide >> 32) as u32);
        }
    }
    words
}

/// Read seed words from the OS, falling back to the clock-based source.
pub fn seed_entropy(n_words: usize) -> Vec<u32> {
    random_entropy(n_words).unwrap_or_else(|_| fallback_entropy(n_words))
}
