//! Cryptographic primitives for the Hashpay transfer protocol.
//!
//! This crate provides the primitives shared by the codec and the channel
//! ledger. They match what the on-chain netting contract checks:
//!
//! - **Hashing**: Keccak-256 (the contract's `sha3`)
//! - **Identity**: secp256k1 keypairs and 20-byte account addresses
//! - **Signatures**: recoverable ECDSA, serialized as `r || s || v`
//!
//! # Example
//!
//! ```
//! use hashpay_crypto::{generate_identity, keccak256, recover, sign};
//!
//! let (private_key, address) = generate_identity();
//!
//! let body = b"transfer body";
//! let signature = sign(&private_key, body).unwrap();
//! assert_eq!(recover(body, &signature).unwrap(), address);
//!
//! let digest = keccak256(body);
//! assert_eq!(digest.0.len(), 32);
//! ```

mod error;
mod hash;
mod identity;
mod serde_impl;
mod signature;

pub use error::CryptoError;
pub use hash::{keccak256, keccak256_concat};
pub use identity::{
    address_from_private_key, address_from_string, address_to_string, generate_identity,
    private_key_from_seed,
};
pub use signature::{recover, recover_digest, sign, sign_digest, verify};

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a serialized recoverable signature: `r (32) || s (32) || v (1)`.
pub const SIGNATURE_LENGTH: usize = 65;

/// A 32-byte Keccak-256 digest.
///
/// Used for hashlocks, lock hashes, locksroots and message digests.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// The all-zero hash.
    pub const ZERO: Hash = Hash([0u8; 32]);

    /// Create a Hash from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes of the hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hash({})", short_hex(&self.0))
    }
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A 20-byte account address.
///
/// Derived as the last 20 bytes of `keccak256(uncompressed_public_key[1..])`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create an Address from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes of the address.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", address_to_string(self))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", address_to_string(self))
    }
}

impl std::str::FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        address_from_string(s)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A secp256k1 private key (32 bytes).
///
/// Validity against the curve order is checked when the key is used, so an
/// invalid key surfaces as an error at signing time.
/// Implements Zeroize + ZeroizeOnDrop to clear key material from memory.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; 32]);

impl PrivateKey {
    /// Create a PrivateKey from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes of the private key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to a secp256k1 SecretKey.
    pub(crate) fn to_secret_key(&self) -> Result<secp256k1::SecretKey, CryptoError> {
        secp256k1::SecretKey::from_slice(&self.0).map_err(|_| CryptoError::InvalidPrivateKey)
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateKey([REDACTED])")
    }
}

/// A recoverable ECDSA signature: `r (32) || s (32) || v (1)`.
///
/// `v` is the recovery id plus 27, as expected by `ecrecover`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Placeholder carried by a transfer that has not been signed yet.
    pub const EMPTY: Signature = Signature([0u8; SIGNATURE_LENGTH]);

    /// Create a Signature from raw bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes of the signature.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Whether this is the unsigned placeholder.
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; SIGNATURE_LENGTH]
    }

    /// The `v` byte.
    pub fn v(&self) -> u8 {
        self.0[64]
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", short_hex(&self.0))
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Block height as observed on the settlement chain.
pub type BlockNumber = u64;

/// Hex of the first 8 bytes, for Debug output.
fn short_hex(bytes: &[u8]) -> String {
    hex::encode(&bytes[..8]) + "..."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_display() {
        let hash = keccak256(b"test");
        let s = format!("{}", hash);
        assert_eq!(s.len(), 64); // 32 bytes as hex
    }

    #[test]
    fn test_address_display() {
        let (_, address) = generate_identity();
        let s = format!("{}", address);
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 42);
    }

    #[test]
    fn test_hash_ordering_is_bytewise() {
        let low = Hash([0x00; 32]);
        let mut high_bytes = [0x00; 32];
        high_bytes[0] = 0x01;
        let high = Hash(high_bytes);
        assert!(low < high);
    }

    #[test]
    fn test_signature_empty_placeholder() {
        assert!(Signature::EMPTY.is_empty());
        assert!(Signature::default().is_empty());
    }

    #[test]
    fn test_private_key_debug_redacted() {
        let (private_key, _) = generate_identity();
        let debug = format!("{:?}", private_key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&hex::encode(private_key.as_bytes())));
    }

    #[test]
    fn test_private_key_implements_zeroize() {
        let (mut private_key, _) = generate_identity();
        assert!(private_key.0.iter().any(|&b| b != 0));

        private_key.zeroize();
        assert!(
            private_key.0.iter().all(|&b| b == 0),
            "PrivateKey bytes should be zeroed after zeroize()"
        );
    }
}
