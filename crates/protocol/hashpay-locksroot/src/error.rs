//! Error types for the locksroot accumulator.

use hashpay_crypto::Hash;
use thiserror::Error;

/// Result type for locksroot operations.
pub type LocksrootResult<T> = std::result::Result<T, LocksrootError>;

/// Errors from the locksroot accumulator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LocksrootError {
    /// A lock with this hashlock is already pending
    #[error("duplicate hashlock: {0}")]
    DuplicateHashlock(Hash),

    /// No pending lock has this hashlock
    #[error("lock not included: {0}")]
    LockNotIncluded(Hash),

    /// A proof was requested over an empty set
    #[error("no pending locks")]
    EmptySet,
}
