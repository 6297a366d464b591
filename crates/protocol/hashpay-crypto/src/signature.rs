//! Signature creation and recovery.
//!
//! Protocol messages are signed with recoverable secp256k1 ECDSA over the
//! Keccak-256 digest of the message body:
//! ```text
//! signature = ECDSA_Sign_Recoverable(private_key, keccak256(body))
//! ```
//!
//! The receiver never needs the signer's public key: the signer's address is
//! recovered from the signature and compared against the expected party.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, SECP256K1};

use crate::error::CryptoError;
use crate::identity::address_from_public_key;
use crate::{keccak256, Address, Hash, PrivateKey, Signature, SIGNATURE_LENGTH};

/// Offset added to the recovery id in the `v` byte.
const V_OFFSET: u8 = 27;

/// Sign a message body with a private key.
///
/// The body is hashed with Keccak-256, then the digest is signed.
///
/// # Errors
/// `InvalidPrivateKey` if the key is zero or not below the curve order.
///
/// # Example
/// ```
/// use hashpay_crypto::{generate_identity, sign, verify};
///
/// let (private_key, address) = generate_identity();
/// let body = b"Hello, channel!";
/// let signature = sign(&private_key, body).unwrap();
/// assert!(verify(&address, body, &signature));
/// ```
pub fn sign(private_key: &PrivateKey, body: &[u8]) -> Result<Signature, CryptoError> {
    sign_digest(private_key, &keccak256(body))
}

/// Sign a precomputed 32-byte digest.
pub fn sign_digest(private_key: &PrivateKey, digest: &Hash) -> Result<Signature, CryptoError> {
    let secret_key = private_key.to_secret_key()?;
    let message = Message::from_digest(digest.0);

    let recoverable = SECP256K1.sign_ecdsa_recoverable(&message, &secret_key);
    let (recovery_id, compact) = recoverable.serialize_compact();

    let mut bytes = [0u8; SIGNATURE_LENGTH];
    bytes[..64].copy_from_slice(&compact);
    bytes[64] = recovery_id.to_i32() as u8 + V_OFFSET;
    Ok(Signature(bytes))
}

/// Recover the signer of a message body.
///
/// # Errors
/// - `InvalidRecoveryId` if `v` is not one of 0, 1, 27, 28
/// - `InvalidSignature` if `r`/`s` are malformed or recovery fails
pub fn recover(body: &[u8], signature: &Signature) -> Result<Address, CryptoError> {
    recover_digest(&keccak256(body), signature)
}

/// Recover the signer of a precomputed digest.
pub fn recover_digest(digest: &Hash, signature: &Signature) -> Result<Address, CryptoError> {
    let v = signature.v();
    let recovery_id = match v {
        0 | 1 => v,
        27 | 28 => v - V_OFFSET,
        other => return Err(CryptoError::InvalidRecoveryId(other)),
    };
    let recovery_id = RecoveryId::from_i32(i32::from(recovery_id))
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    let recoverable = RecoverableSignature::from_compact(&signature.0[..64], recovery_id)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    let message = Message::from_digest(digest.0);
    let public_key = SECP256K1
        .recover_ecdsa(&message, &recoverable)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    Ok(address_from_public_key(&public_key))
}

/// Verify that `signature` over `body` was produced by `address`.
///
/// # Returns
/// `true` if recovery succeeds and yields `address`, `false` otherwise.
pub fn verify(address: &Address, body: &[u8], signature: &Signature) -> bool {
    matches!(recover(body, signature), Ok(signer) if signer == *address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_identity;

    #[test]
    fn test_sign_recover() {
        let (private_key, address) = generate_identity();
        let body = b"test message";
        let signature = sign(&private_key, body).unwrap();
        assert_eq!(recover(body, &signature).unwrap(), address);
    }

    #[test]
    fn test_v_byte_uses_ecrecover_offset() {
        let (private_key, _) = generate_identity();
        let signature = sign(&private_key, b"body").unwrap();
        assert!(signature.v() == 27 || signature.v() == 28);
    }

    #[test]
    fn test_raw_recovery_id_accepted() {
        let (private_key, address) = generate_identity();
        let body = b"raw v";
        let mut signature = sign(&private_key, body).unwrap();
        signature.0[64] -= V_OFFSET;
        assert_eq!(recover(body, &signature).unwrap(), address);
    }

    #[test]
    fn test_wrong_key_fails() {
        let (private_key1, _) = generate_identity();
        let (_, address2) = generate_identity();
        let signature = sign(&private_key1, b"test message").unwrap();
        assert!(!verify(&address2, b"test message", &signature));
    }

    #[test]
    fn test_tampered_message_fails() {
        let (private_key, address) = generate_identity();
        let signature = sign(&private_key, b"test message").unwrap();
        assert!(!verify(&address, b"different message", &signature));
    }

    #[test]
    fn test_invalid_recovery_id() {
        let (private_key, _) = generate_identity();
        let mut signature = sign(&private_key, b"body").unwrap();
        signature.0[64] = 35;
        assert_eq!(
            recover(b"body", &signature),
            Err(CryptoError::InvalidRecoveryId(35))
        );
    }

    #[test]
    fn test_empty_signature_does_not_recover() {
        assert!(recover(b"body", &Signature::EMPTY).is_err());
    }

    #[test]
    fn test_invalid_key_cannot_sign() {
        let result = sign(&PrivateKey::from_bytes([0u8; 32]), b"body");
        assert_eq!(result, Err(CryptoError::InvalidPrivateKey));
    }
}
