// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Error kinds for seeding, snapshot restore and entropy acquisition.
//! All validation happens before any generator state is touched.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A seed, counter, key or snapshot field does not fit its bit width.
    #[error("{name} must be a non-negative integer of at most {bits} bits")]
    SeedOutOfRange { name: &'static str, bits: u32 },
    /// ThreeFry accepts a seed or an explicit key, never both.
    #[error("seed and key cannot both be provided")]
    ConflictingSeedAndKey,
    /// A snapshot was offered to a generator of a different algorithm.
    #[error("snapshot is tagged {found:?}, receiver is {expected:?}")]
    SnapshotTagMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// A snapshot field is structurally invalid (wrong length, bad position).
    #[error("snapshot field {field:?} is out of range")]
    SnapshotFieldOutOfRange { field: &'static str },
    /// The OS entropy source failed and no fallback was permitted.
    #[error("no entropy source available")]
    EntropyUnavailable,
}
