use crate::identity::ReplicaIdentity;
use thiserror::Error;

/// Errors returned while configuring or restoring an allocator.
///
/// Allocation and release never fail; every variant here is raised before
/// the allocator hands out its first key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("replica count must be at least 1")]
    ZeroReplicas,
    #[error("invalid replica index {index}; expected 0..{count}")]
    IndexOutOfRange { index: u64, count: u64 },
    #[error("hostname has no trailing ordinal: '{0}'")]
    MissingOrdinal(String),
    #[error("hostname ordinal does not fit in 64 bits: '{0}'")]
    OrdinalOverflow(String),
    #[error("invalid key length {length}; expected {min}..={max}")]
    InvalidLength { length: usize, min: usize, max: usize },
    #[error("key space for length {0} does not fit in 64 bits")]
    SpaceOverflow(usize),
    #[error("snapshot belongs to {found}, allocator is configured as {expected}")]
    IdentityMismatch {
        expected: ReplicaIdentity,
        found: ReplicaIdentity,
    },
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}
