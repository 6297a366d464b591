//! Error types for hashpay-crypto

use thiserror::Error;

/// Errors that can occur in cryptographic operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Private key is zero or not below the curve order
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Signature bytes do not form a valid recoverable signature
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// The `v` byte is not a recognised recovery id
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// Invalid address string format
    #[error("Invalid address format: {0}")]
    InvalidAddressFormat(String),

    /// Invalid hex encoding
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    /// Invalid byte length
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
