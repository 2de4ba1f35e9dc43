// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! The uniform bit-generator interface.
//!
//! Every concrete algorithm implements [`Brng`]; consumers that need to mix
//! algorithms at runtime hold a [`Handle`], which owns the generator behind
//! the per-handle lock of the concurrency contract. Generator state is
//! captured and restored through the tagged [`Snapshot`] record, the sole
//! serialization format.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A raw bit generator: a deterministic integer state machine producing a
/// reproducible stream of words.
///
/// Identical seed inputs on a cold generator yield identical infinite
/// sequences for every method here, across platforms and executions. The
/// `next_*` primitives never lock; callers batching draws hold the owning
/// [`Handle`]'s guard for the whole batch.
pub trait Brng: Send {
    /// Algorithm name, also the snapshot tag.
    fn name(&self) -> &'static str;

    /// Next 32-bit word. 64-bit generators serve the low half of one
    /// 64-bit draw first and cache the high half.
    fn next_u32(&mut self) -> u32;

    /// Next 64-bit word. 32-bit generators concatenate two draws,
    /// high word first.
    fn next_u64(&mut self) -> u64;

    /// Uniform double in `[0, 1)` with 53 random bits.
    ///
    /// 64-bit generators use `(word >> 11) / 2^53`; 32-bit generators pair
    /// two draws as `((a >> 5) * 2^26 + (b >> 6)) / 2^53`. The conversion is
    /// fixed per algorithm and never drifts.
    fn next_double(&mut self) -> f64;

    /// One native output word, zero-extended to 64 bits.
    fn next_raw(&mut self) -> u64;

    /// Advance the state as if a fixed large number of outputs had been
    /// consumed (2^128 outputs for MT19937 and Xoshiro256**, 2^64 blocks
    /// for ThreeFry32). Used to partition one seed into parallel streams.
    fn jump(&mut self);

    /// Capture the complete state, including any width-adapter buffer.
    fn snapshot(&self) -> Snapshot;

    /// Replace the state with `snapshot`. Rejects a mismatched tag or
    /// out-of-range field before any mutation.
    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), Error>;
}

impl Brng for Box<dyn Brng> {
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn next_u32(&mut self) -> u32 {
        (**self).next_u32()
    }
    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }
    fn next_double(&mut self) -> f64 {
        (**self).next_double()
    }
    fn next_raw(&mut self) -> u64 {
        (**self).next_raw()
    }
    fn jump(&mut self) {
        (**self).jump()
    }
    fn snapshot(&self) -> Snapshot {
        (**self).snapshot()
    }
    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), Error> {
        (**self).restore(snapshot)
    }
}

/// Tagged, serializable capture of one generator's complete state.
///
/// The tag is the algorithm name; restoring a snapshot into a generator of
/// a different algorithm fails. Field layout follows each algorithm's
/// documented state exactly, so snapshots double as a stable wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "brng")]
pub enum Snapshot {
    #[serde(rename = "MT19937")]
    Mt19937 { key: Vec<u32>, pos: u32 },
    #[serde(rename = "ThreeFry32")]
    ThreeFry32 {
        counter: [u32; 4],
        key: [u32; 4],
        buffer: [u32; 4],
        buffer_pos: u32,
    },
    #[serde(rename = "Xoshiro256StarStar")]
    Xoshiro256StarStar {
        s: [u64; 4],
        has_uint32: bool,
        uinteger: u32,
    },
}

impl Snapshot {
    /// The algorithm tag carried by this snapshot.
    pub fn brng(&self) -> &'static str {
        match self {
            Snapshot::Mt19937 { .. } => "MT19937",
            Snapshot::ThreeFry32 { .. } => "ThreeFry32",
            Snapshot::Xoshiro256StarStar { .. } => "Xoshiro256StarStar",
        }
    }
}

/// Owning handle around one generator: opaque state plus the per-handle
/// lock consumers acquire around any batch of draws they need atomic.
///
/// A handle is deliberately not `Clone`; state is never aliased between
/// handles. Independent handles are freely usable from distinct threads.
pub struct Handle {
    inner: Mutex<Box<dyn Brng>>,
}

impl Handle {
    pub fn new(brng: Box<dyn Brng>) -> Self {
        Handle {
            inner: Mutex::new(brng),
        }
    }

    /// Acquire the handle's lock. Draws made through the guard are totally
    /// ordered and cannot interleave with other consumers of this handle.
    pub fn lock(&self) -> MutexGuard<'_, Box<dyn Brng>> {
        self.inner.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Tear the handle down and reclaim the generator.
    pub fn into_inner(self) -> Box<dyn Brng> {
        self.inner
            .into_inner()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}
