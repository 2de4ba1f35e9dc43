// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Reproducible bit generators with legacy distribution sampling.
//!
//! A family of interchangeable raw generators (MT19937, ThreeFry-4x32,
//! xoshiro256**) behind the [`Brng`] trait: bit-exact seeding, in-place
//! jump/advance for parallel stream partitioning, buffering between 32-bit
//! and 64-bit consumers, and tagged state snapshots. On top of it,
//! [`distributions::LegacyGenerator`] maps uniform output to the legacy
//! distribution catalogue while preserving the exact order of underlying
//! uniform draws.
//!
//! Each generator is an owned value; wrap one in a [`Handle`] to share it
//! between consumers behind the per-handle lock. Handles never share state,
//! so distinct handles are safe to drive from distinct threads.

pub mod brng;
pub mod distributions;
pub mod entropy;
pub mod error;
mod gf2;
pub mod mt19937;
pub mod seed;
pub mod splitmix;
pub mod threefry;
pub mod xoshiro256;

pub use brng::{Brng, Handle, Snapshot};
pub use distributions::LegacyGenerator;
pub use error::Error;
pub use mt19937::Mt19937;
pub use splitmix::SplitMix64;
pub use threefry::ThreeFry32;
pub use xoshiro256::Xoshiro256StarStar;
