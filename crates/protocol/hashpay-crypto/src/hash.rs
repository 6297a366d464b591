//! Keccak-256 hashing.
//!
//! The netting contract hashes with the EVM `sha3` opcode, which is
//! Keccak-256 (the pre-standard padding), not FIPS-202 SHA3-256. Every
//! digest in the protocol goes through this module so both sides agree.

use sha3::{Digest, Keccak256};

use crate::Hash;

/// Compute the Keccak-256 digest of the given bytes.
///
/// # Example
/// ```
/// use hashpay_crypto::keccak256;
///
/// let hash = keccak256(b"");
/// assert_eq!(
///     hash.to_string(),
///     "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
/// );
/// ```
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    Hash(hasher.finalize().into())
}

/// Compute the Keccak-256 digest of several byte slices, in order.
///
/// Equivalent to hashing their concatenation without allocating it.
pub fn keccak256_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    Hash(hasher.finalize().into())
}
