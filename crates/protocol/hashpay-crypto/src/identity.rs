//! Identity management.
//!
//! Provides secp256k1 keypair generation and address derivation.
//!
//! An address is derived from the uncompressed public key:
//! ```text
//! Address = keccak256(public_key[1..65])[12..32]
//! ```
//!
//! Human-readable format: `0x` + 40 lowercase hex digits

use rand::rngs::OsRng;
use secp256k1::{PublicKey, SecretKey, SECP256K1};

use crate::error::CryptoError;
use crate::{keccak256, Address, PrivateKey};

/// Human-readable address prefix
const ADDRESS_PREFIX: &str = "0x";

/// Generate a new secp256k1 identity.
///
/// Uses the operating system's cryptographically secure random number generator.
///
/// # Example
/// ```
/// use hashpay_crypto::{address_from_private_key, generate_identity};
///
/// let (private_key, address) = generate_identity();
/// assert_eq!(address_from_private_key(&private_key).unwrap(), address);
/// ```
pub fn generate_identity() -> (PrivateKey, Address) {
    let secret_key = SecretKey::new(&mut OsRng);
    let public_key = PublicKey::from_secret_key(SECP256K1, &secret_key);

    let private_key = PrivateKey::from_bytes(secret_key.secret_bytes());
    (private_key, address_from_public_key(&public_key))
}

/// Derive a private key deterministically from a seed.
///
/// The key is `keccak256(seed)`. Used for reproducible test and benchmark
/// identities; never for real funds.
///
/// # Errors
/// `InvalidPrivateKey` in the negligible case that the digest is not a
/// valid scalar.
pub fn private_key_from_seed(seed: &[u8]) -> Result<PrivateKey, CryptoError> {
    let key = PrivateKey::from_bytes(keccak256(seed).0);
    key.to_secret_key()?;
    Ok(key)
}

/// Derive the address controlled by a private key.
///
/// # Errors
/// `InvalidPrivateKey` if the key is zero or not below the curve order.
pub fn address_from_private_key(private_key: &PrivateKey) -> Result<Address, CryptoError> {
    let secret_key = private_key.to_secret_key()?;
    let public_key = PublicKey::from_secret_key(SECP256K1, &secret_key);
    Ok(address_from_public_key(&public_key))
}

/// Derive an address from a secp256k1 public key.
pub(crate) fn address_from_public_key(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash.0[12..]);
    Address(address)
}

/// Convert an address to its human-readable string format.
///
/// Format: `0x` + lowercase hex
pub fn address_to_string(address: &Address) -> String {
    format!("{}{}", ADDRESS_PREFIX, hex::encode(address.0))
}

/// Parse a human-readable address string.
///
/// The `0x` prefix is optional; hex digits are case-insensitive.
///
/// # Errors
/// - `InvalidHex` if the hex decoding fails
/// - `InvalidLength` if the decoded data isn't 20 bytes
///
/// # Example
/// ```
/// use hashpay_crypto::{address_from_string, address_to_string, generate_identity};
///
/// let (_, address) = generate_identity();
/// let encoded = address_to_string(&address);
/// assert_eq!(address_from_string(&encoded).unwrap(), address);
/// ```
pub fn address_from_string(s: &str) -> Result<Address, CryptoError> {
    let hex_part = s.strip_prefix(ADDRESS_PREFIX).unwrap_or(s);
    if hex_part.is_empty() {
        return Err(CryptoError::InvalidAddressFormat(
            "Missing hex digits".to_string(),
        ));
    }

    let decoded = hex::decode(hex_part).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;

    if decoded.len() != 20 {
        return Err(CryptoError::InvalidLength {
            expected: 20,
            actual: decoded.len(),
        });
    }

    let mut address = [0u8; 20];
    address.copy_from_slice(&decoded);
    Ok(Address(address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_identity_matches_derivation() {
        let (private_key, address) = generate_identity();
        assert_eq!(address_from_private_key(&private_key).unwrap(), address);
    }

    #[test]
    fn test_known_address_vector() {
        // Private key 0x...01 controls the well-known generator-point address.
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        let address = address_from_private_key(&PrivateKey::from_bytes(bytes)).unwrap();
        assert_eq!(
            address_to_string(&address),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_seeded_key_is_deterministic() {
        let a = private_key_from_seed(b"speed:0").unwrap();
        let b = private_key_from_seed(b"speed:0").unwrap();
        let c = private_key_from_seed(b"speed:1").unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn test_zero_key_rejected() {
        let result = address_from_private_key(&PrivateKey::from_bytes([0u8; 32]));
        assert_eq!(result, Err(CryptoError::InvalidPrivateKey));
    }

    #[test]
    fn test_address_roundtrip_without_prefix() {
        let (_, address) = generate_identity();
        let encoded = hex::encode(address.0);
        assert_eq!(address_from_string(&encoded).unwrap(), address);
    }

    #[test]
    fn test_address_wrong_length() {
        let result = address_from_string("0xabcd");
        assert!(matches!(
            result,
            Err(CryptoError::InvalidLength {
                expected: 20,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_address_invalid_hex() {
        let result = address_from_string("0xzz");
        assert!(matches!(result, Err(CryptoError::InvalidHex(_))));
    }
}
