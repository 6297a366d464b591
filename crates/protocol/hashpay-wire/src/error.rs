//! Error types for the wire codec.

use hashpay_crypto::{Address, CryptoError};
use hashpay_types::ErrorCode;
use thiserror::Error;

use crate::message::MessageType;

/// Result type for codec operations.
pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Errors that can occur when encoding, decoding or signing a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// Input was empty
    #[error("empty message")]
    Empty,

    /// Unrecognized command id
    #[error("unknown message type: {0}")]
    UnknownMessageType(u8),

    /// Input is shorter or longer than the layout of its type
    #[error("invalid {message_type} length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Type named by the command id
        message_type: MessageType,
        /// Exact size of that type
        expected: usize,
        /// Bytes received
        got: usize,
    },

    /// Ran out of bytes while reading a field
    #[error("truncated message: expected at least {expected} bytes, got {got}")]
    Truncated {
        /// Bytes needed
        expected: usize,
        /// Bytes available
        got: usize,
    },

    /// Padding after the command id is not zero
    #[error("non-zero padding")]
    NonZeroPadding,

    /// A 32-byte amount field does not fit the local amount type
    #[error("amount field {0} overflows 64 bits")]
    AmountOverflow(&'static str),

    /// A transfer was expected but another message type was decoded
    #[error("expected a transfer, got {0}")]
    NotATransfer(MessageType),

    /// A reveal message carries exactly 32 secret bytes
    #[error("secret must be 32 bytes, got {0}")]
    SecretLength(usize),

    /// The private key could not sign
    #[error("signing failed: {0}")]
    Signing(CryptoError),

    /// The signature could not be recovered
    #[error("invalid signature: {0}")]
    InvalidSignature(CryptoError),

    /// The signature recovers to a different address
    #[error("signer mismatch: expected {expected}, got {got}")]
    SignerMismatch {
        /// Address the message should come from
        expected: Address,
        /// Address recovered from the signature
        got: Address,
    },
}

impl CodecError {
    /// Whether this is a decoding failure; the message should be dropped.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            CodecError::Empty
                | CodecError::UnknownMessageType(_)
                | CodecError::InvalidLength { .. }
                | CodecError::Truncated { .. }
                | CodecError::NonZeroPadding
                | CodecError::AmountOverflow(_)
                | CodecError::NotATransfer(_)
                | CodecError::SecretLength(_)
        )
    }

    /// Map to the protocol error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CodecError::Signing(_) => ErrorCode::SigningFailed,
            CodecError::InvalidSignature(_) | CodecError::SignerMismatch { .. } => {
                ErrorCode::InvalidSignature
            }
            _ => ErrorCode::MalformedMessage,
        }
    }
}
