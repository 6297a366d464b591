//! Locks and secrets.
//!
//! A [`Lock`] makes part of a transfer conditional on the reveal of a
//! [`Secret`] before a block height. The secret is the only authorization
//! that releases the locked amount.

use hashpay_crypto::{keccak256, BlockNumber, Hash};
use serde::{Deserialize, Serialize};

use crate::constants::{AMOUNT_FIELD_LEN, LOCK_ENCODED_LEN};
use crate::Amount;

/// A conditional payment descriptor.
///
/// Immutable once created and identified by its hashlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lock {
    /// Amount released when the secret is revealed
    pub amount: Amount,
    /// Last block at which the lock can be claimed
    pub expiration: BlockNumber,
    /// `keccak256(secret)`
    pub hashlock: Hash,
}

impl Lock {
    /// Create a new lock.
    pub fn new(amount: Amount, expiration: BlockNumber, hashlock: Hash) -> Self {
        Self {
            amount,
            expiration,
            hashlock,
        }
    }

    /// Packed form used for the lock hash:
    /// `amount (32, BE) || expiration (8, BE) || hashlock (32)`.
    pub fn as_bytes(&self) -> [u8; LOCK_ENCODED_LEN] {
        let mut out = [0u8; LOCK_ENCODED_LEN];
        out[AMOUNT_FIELD_LEN - 8..AMOUNT_FIELD_LEN].copy_from_slice(&self.amount.to_be_bytes());
        out[AMOUNT_FIELD_LEN..AMOUNT_FIELD_LEN + 8].copy_from_slice(&self.expiration.to_be_bytes());
        out[AMOUNT_FIELD_LEN + 8..].copy_from_slice(&self.hashlock.0);
        out
    }

    /// Leaf value committed to by the locksroot.
    pub fn lock_hash(&self) -> Hash {
        keccak256(&self.as_bytes())
    }

    /// Whether the lock can no longer be claimed at `block`.
    pub fn is_expired(&self, block: BlockNumber) -> bool {
        block > self.expiration
    }

    /// Whether `secret` unlocks this lock.
    pub fn is_unlocked_by(&self, secret: &Secret) -> bool {
        secret.hashlock() == self.hashlock
    }
}

/// A hashlock pre-image.
///
/// Any byte string is a valid secret. The reveal message carries exactly
/// 32 bytes, see [`Secret::to_fixed`].
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Secret(pub Vec<u8>);

impl Secret {
    /// Create a secret from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The hashlock this secret opens.
    pub fn hashlock(&self) -> Hash {
        keccak256(&self.0)
    }

    /// Raw pre-image bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The 32-byte wire form, if the secret has exactly that length.
    pub fn to_fixed(&self) -> Option<[u8; 32]> {
        self.0.as_slice().try_into().ok()
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<[u8; 32]> for Secret {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes.to_vec())
    }
}

// Secrets are bearer authorizations; keep them out of logs.
impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret(hashlock={:?})", self.hashlock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_bytes_layout() {
        let hashlock = Hash([0xab; 32]);
        let lock = Lock::new(0x0102, 0x0a, hashlock);
        let bytes = lock.as_bytes();

        assert_eq!(bytes.len(), 72);
        assert!(bytes[..30].iter().all(|&b| b == 0));
        assert_eq!(&bytes[30..32], &[0x01, 0x02]);
        assert_eq!(&bytes[32..40], &10u64.to_be_bytes());
        assert_eq!(&bytes[40..], &[0xab; 32]);
    }

    #[test]
    fn test_lock_hash_depends_on_every_field() {
        let base = Lock::new(50, 10, Secret::from("s").hashlock());
        let other_amount = Lock::new(51, 10, base.hashlock);
        let other_expiration = Lock::new(50, 11, base.hashlock);
        let other_hashlock = Lock::new(50, 10, Secret::from("t").hashlock());

        assert_ne!(base.lock_hash(), other_amount.lock_hash());
        assert_ne!(base.lock_hash(), other_expiration.lock_hash());
        assert_ne!(base.lock_hash(), other_hashlock.lock_hash());
        assert_eq!(base.lock_hash(), Lock::new(50, 10, base.hashlock).lock_hash());
    }

    #[test]
    fn test_expiration_boundary() {
        let lock = Lock::new(1, 10, Hash::ZERO);
        assert!(!lock.is_expired(5));
        assert!(!lock.is_expired(10));
        assert!(lock.is_expired(11));
    }

    #[test]
    fn test_secret_unlocks_matching_lock() {
        let secret = Secret::from("s");
        let lock = Lock::new(50, 10, secret.hashlock());
        assert!(lock.is_unlocked_by(&secret));
        assert!(!lock.is_unlocked_by(&Secret::from("x")));
    }

    #[test]
    fn test_secret_fixed_form() {
        assert!(Secret::from("short").to_fixed().is_none());
        let fixed = Secret::from([7u8; 32]);
        assert_eq!(fixed.to_fixed(), Some([7u8; 32]));
    }

    #[test]
    fn test_secret_debug_hides_preimage() {
        let debug = format!("{:?}", Secret::from("hunter2"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_lock_serde_json() {
        let lock = Lock::new(50, 10, Secret::from("s").hashlock());
        let json = serde_json::to_string(&lock).unwrap();
        let back: Lock = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lock);
    }
}
