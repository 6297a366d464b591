//! Protocol error codes.
//!
//! Every rejection a channel participant can report to its counterparty has
//! a stable numeric code. Crate-specific error enums map onto these.

use serde::{Deserialize, Serialize};

/// Protocol error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
#[non_exhaustive]
pub enum ErrorCode {
    // =========================================================================
    // Message Errors (0x0001 - 0x00FF)
    // =========================================================================
    /// Message could not be decoded
    MalformedMessage = 0x0001,
    /// Signature missing, unrecoverable, or from the wrong party
    InvalidSignature = 0x0002,
    /// No key available to sign
    SigningFailed = 0x0003,

    // =========================================================================
    // Channel Errors (0x0100 - 0x01FF)
    // =========================================================================
    /// Channel does not exist
    ChannelNotFound = 0x0100,
    /// Channel no longer accepts the operation
    ChannelClosed = 0x0101,
    /// Transfer does not belong to this channel
    ChannelMismatch = 0x0102,
    /// Nonce is stale or skips ahead
    InvalidNonce = 0x0103,
    /// Locksroot does not match the pending locks
    InvalidLocksroot = 0x0104,
    /// Amount exceeds the distributable balance
    InsufficientCapacity = 0x0105,
    /// Illegal lifecycle transition
    InvalidStateTransition = 0x0106,

    // =========================================================================
    // Lock Errors (0x0200 - 0x02FF)
    // =========================================================================
    /// Hashlock is already pending
    DuplicateLock = 0x0200,
    /// No pending lock for this hashlock
    UnknownLock = 0x0201,
    /// Lock expired before it was claimed
    LockExpired = 0x0202,
    /// Lock cannot be expired yet
    LockNotYetExpired = 0x0203,

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error
    InternalError = 0xFFFF,
}

impl ErrorCode {
    /// Returns true if this is a message-level error (0x0001-0x00FF)
    pub fn is_message_error(&self) -> bool {
        (0x0001..=0x00FF).contains(&self.code())
    }

    /// Returns true if this is a channel-related error (0x0100-0x01FF)
    pub fn is_channel_error(&self) -> bool {
        (0x0100..=0x01FF).contains(&self.code())
    }

    /// Returns true if this is a lock-related error (0x0200-0x02FF)
    pub fn is_lock_error(&self) -> bool {
        (0x0200..=0x02FF).contains(&self.code())
    }

    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get a user-friendly suggestion for recovering from this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::MalformedMessage => Some("Drop the message. The sender is not speaking this protocol version."),
            Self::InvalidSignature => Some("Reject the message. It was not signed by the channel partner."),
            Self::SigningFailed => Some("Check that the key provider holds the key for this node's address."),
            Self::ChannelNotFound => Some("Open a channel with this partner first."),
            Self::ChannelClosed => Some("Channel is closing or settled. Open a new channel to continue."),
            Self::ChannelMismatch => Some("Check the asset and recipient of the transfer."),
            Self::InvalidNonce => Some("Transfers must arrive in nonce order. Request a resync from the partner."),
            Self::InvalidLocksroot => Some("Locksroot does not match local state. Flag the channel for on-chain dispute."),
            Self::InsufficientCapacity => Some("Wait for pending locks to resolve or deposit more funds."),
            Self::InvalidStateTransition => Some("Channel lifecycle is Open, then Closing, then Settled."),
            Self::DuplicateLock => Some("Use a fresh secret for every transfer."),
            Self::UnknownLock => Some("The lock was already claimed or expired."),
            Self::LockExpired => Some("The lock expired. Expire it instead of claiming."),
            Self::LockNotYetExpired => Some("Wait until the block height passes the lock expiration."),
            Self::InternalError => Some("An internal error occurred. Please report this issue."),
        }
    }

    /// Get the error category name.
    pub fn category(&self) -> &'static str {
        if self.is_message_error() {
            "Message"
        } else if self.is_channel_error() {
            "Channel"
        } else if self.is_lock_error() {
            "Lock"
        } else {
            "Internal"
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCode::MalformedMessage => "MALFORMED_MESSAGE",
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::SigningFailed => "SIGNING_FAILED",
            ErrorCode::ChannelNotFound => "CHANNEL_NOT_FOUND",
            ErrorCode::ChannelClosed => "CHANNEL_CLOSED",
            ErrorCode::ChannelMismatch => "CHANNEL_MISMATCH",
            ErrorCode::InvalidNonce => "INVALID_NONCE",
            ErrorCode::InvalidLocksroot => "INVALID_LOCKSROOT",
            ErrorCode::InsufficientCapacity => "INSUFFICIENT_CAPACITY",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::DuplicateLock => "DUPLICATE_LOCK",
            ErrorCode::UnknownLock => "UNKNOWN_LOCK",
            ErrorCode::LockExpired => "LOCK_EXPIRED",
            ErrorCode::LockNotYetExpired => "LOCK_NOT_YET_EXPIRED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", name)
    }
}
