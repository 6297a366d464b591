//! Error types for the channel layer.
//!
//! Every validation failure leaves the ledger unchanged. No variant is a
//! warning: the caller decides whether to drop, resync or dispute.

use hashpay_crypto::{Address, BlockNumber, Hash};
use hashpay_types::{Amount, ChannelState, ErrorCode, Nonce};
use hashpay_wire::CodecError;
use thiserror::Error;

/// Result type for channel operations.
pub type ChannelResult<T> = std::result::Result<T, ChannelError>;

/// Errors that can occur while creating, registering or resolving transfers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ChannelError {
    // =========================================================================
    // Channel Errors
    // =========================================================================
    /// No channel with this partner.
    #[error("channel not found: {0}")]
    ChannelNotFound(Address),

    /// A channel with this partner already exists.
    #[error("channel already exists: {0}")]
    ChannelAlreadyExists(Address),

    /// The channel does not accept this operation in its current state.
    #[error("channel is {0}")]
    ChannelClosed(ChannelState),

    /// Transfer names an asset or recipient outside this channel.
    #[error("transfer does not belong to this channel: {0}")]
    ChannelMismatch(String),

    /// Illegal lifecycle transition.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidStateTransition {
        /// Current state
        from: ChannelState,
        /// Requested state
        to: ChannelState,
    },

    /// Combined deposit is below the configured minimum.
    #[error("deposit {provided} below minimum {minimum}")]
    DepositTooLow {
        /// Combined deposit of both ends
        provided: Amount,
        /// Configured minimum
        minimum: Amount,
    },

    /// Combined deposit does not fit in an `Amount`.
    #[error("combined deposit {ours} + {partner} overflows")]
    DepositOverflow {
        /// Our deposit
        ours: Amount,
        /// Partner deposit
        partner: Amount,
    },

    // =========================================================================
    // Transfer Validation Errors
    // =========================================================================
    /// Nonce is stale, replayed, or skips ahead.
    #[error("invalid nonce: expected {expected}, got {got}")]
    InvalidNonce {
        /// Next nonce of the sending end
        expected: Nonce,
        /// Nonce carried by the transfer
        got: Nonce,
    },

    /// Signature is unrecoverable or from the wrong party.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Locksroot does not match the pending locks after this transfer.
    #[error("invalid locksroot: expected {expected}, got {got}")]
    InvalidLocksroot {
        /// Locally recomputed locksroot
        expected: Hash,
        /// Locksroot carried by the transfer
        got: Hash,
    },

    /// Amount exceeds what the sending end can still pay.
    #[error("insufficient capacity: requested {requested}, available {available}")]
    InsufficientCapacity {
        /// Transferred delta plus new lock amount
        requested: Amount,
        /// Distributable balance of the sending end
        available: Amount,
    },

    /// A transfer tried to lower the cumulative transferred amount.
    #[error("transferred amount decreased from {previous} to {got}")]
    TransferredAmountDecreased {
        /// Current transferred amount of the sending end
        previous: Amount,
        /// Transferred amount carried by the transfer
        got: Amount,
    },

    /// Lock expiration is outside the window the channel accepts.
    #[error("lock expiration {expiration} outside [{min}, {max}]")]
    InvalidExpiration {
        /// Requested expiration
        expiration: BlockNumber,
        /// Earliest acceptable expiration
        min: BlockNumber,
        /// Latest acceptable expiration
        max: BlockNumber,
    },

    // =========================================================================
    // Lock Errors
    // =========================================================================
    /// Hashlock is already pending.
    #[error("duplicate lock: {0}")]
    DuplicateLock(Hash),

    /// No pending lock has this hashlock.
    #[error("unknown lock: {0}")]
    UnknownLock(Hash),

    /// Claim arrived after the lock expired.
    #[error("lock expired at block {expiration}, current block {block}")]
    LockExpired {
        /// Lock expiration
        expiration: BlockNumber,
        /// Block of the claim
        block: BlockNumber,
    },

    /// Expire was requested before the lock expired.
    #[error("lock expires at block {expiration}, current block {block}")]
    LockNotYetExpired {
        /// Lock expiration
        expiration: BlockNumber,
        /// Block of the request
        block: BlockNumber,
    },

    // =========================================================================
    // Signing and Internal Errors
    // =========================================================================
    /// No usable key to sign with.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Codec failure while handling a message.
    #[error("codec error: {0}")]
    Codec(CodecError),

    /// A channel lock was poisoned by a panicking writer.
    #[error("channel lock poisoned")]
    LockPoisoned,
}

impl ChannelError {
    /// Create a channel mismatch error.
    pub fn mismatch(msg: impl Into<String>) -> Self {
        ChannelError::ChannelMismatch(msg.into())
    }

    /// Get the protocol error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::ChannelNotFound(_) => ErrorCode::ChannelNotFound,
            Self::ChannelAlreadyExists(_) => ErrorCode::InvalidStateTransition,
            Self::ChannelClosed(_) => ErrorCode::ChannelClosed,
            Self::ChannelMismatch(_) => ErrorCode::ChannelMismatch,
            Self::InvalidStateTransition { .. } => ErrorCode::InvalidStateTransition,
            Self::DepositTooLow { .. } => ErrorCode::InsufficientCapacity,
            Self::DepositOverflow { .. } => ErrorCode::InsufficientCapacity,

            Self::InvalidNonce { .. } => ErrorCode::InvalidNonce,
            Self::InvalidSignature(_) => ErrorCode::InvalidSignature,
            Self::InvalidLocksroot { .. } => ErrorCode::InvalidLocksroot,
            Self::InsufficientCapacity { .. } => ErrorCode::InsufficientCapacity,
            Self::TransferredAmountDecreased { .. } => ErrorCode::InsufficientCapacity,
            Self::InvalidExpiration { .. } => ErrorCode::LockExpired,

            Self::DuplicateLock(_) => ErrorCode::DuplicateLock,
            Self::UnknownLock(_) => ErrorCode::UnknownLock,
            Self::LockExpired { .. } => ErrorCode::LockExpired,
            Self::LockNotYetExpired { .. } => ErrorCode::LockNotYetExpired,

            Self::Signing(_) => ErrorCode::SigningFailed,
            Self::Codec(e) => e.error_code(),
            Self::LockPoisoned => ErrorCode::InternalError,
        }
    }

    /// Whether retrying the same call later can succeed.
    ///
    /// Capacity frees up as locks resolve, and a lock that is not yet
    /// expired will expire. A transfer that arrived ahead of its
    /// predecessor succeeds once the gap is filled.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InsufficientCapacity { .. } | Self::LockNotYetExpired { .. } => true,
            Self::InvalidNonce { expected, got } => got > expected,
            _ => false,
        }
    }

    /// Get a user-friendly suggestion for recovering from this error.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::ChannelAlreadyExists(_) => "Use the existing channel with this partner.",
            Self::DepositTooLow { .. } => "Increase the deposit or lower channel.min_deposit.",
            Self::DepositOverflow { .. } => "Lower the deposits so their sum fits in 64 bits.",
            Self::TransferredAmountDecreased { .. } => {
                "The partner sent a transfer that takes back paid funds. Flag the channel for dispute."
            }
            Self::InvalidExpiration { .. } => {
                "Pick an expiration between reveal_timeout and settle_timeout blocks from now."
            }
            Self::Codec(_) => "Drop the message; it is not a valid protocol message.",
            Self::LockPoisoned => "A writer panicked while holding the channel. Restart the node.",
            other => other
                .error_code()
                .suggestion()
                .unwrap_or("An internal error occurred. Please report this issue."),
        }
    }
}

impl From<CodecError> for ChannelError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::InvalidSignature(_) | CodecError::SignerMismatch { .. } => {
                ChannelError::InvalidSignature(err.to_string())
            }
            CodecError::Signing(e) => ChannelError::Signing(e.to_string()),
            other => ChannelError::Codec(other),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for ChannelError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        ChannelError::LockPoisoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashpay_crypto::CryptoError;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ChannelError::InvalidNonce { expected: 2, got: 1 }.error_code(),
            ErrorCode::InvalidNonce
        );
        assert_eq!(
            ChannelError::UnknownLock(Hash::ZERO).error_code(),
            ErrorCode::UnknownLock
        );
        assert_eq!(
            ChannelError::ChannelClosed(ChannelState::Settled).error_code(),
            ErrorCode::ChannelClosed
        );
    }

    #[test]
    fn test_transient() {
        assert!(ChannelError::InvalidNonce { expected: 2, got: 5 }.is_transient());
        assert!(!ChannelError::InvalidNonce { expected: 2, got: 1 }.is_transient());
        assert!(ChannelError::LockNotYetExpired { expiration: 10, block: 5 }.is_transient());
        assert!(!ChannelError::InvalidLocksroot {
            expected: Hash::ZERO,
            got: Hash::ZERO
        }
        .is_transient());
    }

    #[test]
    fn test_codec_conversion() {
        let err: ChannelError = CodecError::SignerMismatch {
            expected: Address::ZERO,
            got: Address([1; 20]),
        }
        .into();
        assert!(matches!(err, ChannelError::InvalidSignature(_)));

        let err: ChannelError = CodecError::Signing(CryptoError::InvalidPrivateKey).into();
        assert!(matches!(err, ChannelError::Signing(_)));

        let err: ChannelError = CodecError::NonZeroPadding.into();
        assert_eq!(err.error_code(), ErrorCode::MalformedMessage);
    }

    #[test]
    fn test_suggestions_nonempty() {
        assert!(!ChannelError::LockPoisoned.suggestion().is_empty());
        assert!(ChannelError::UnknownLock(Hash::ZERO)
            .suggestion()
            .contains("claimed or expired"));
    }
}
