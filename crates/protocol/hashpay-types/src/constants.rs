//! Protocol constants.
//!
//! Command ids and message sizes are part of the wire contract with the
//! on-chain decoder and must not change.

use hashpay_crypto::{BlockNumber, Hash, SIGNATURE_LENGTH};

// =============================================================================
// Command Ids
// =============================================================================

/// Secret reveal message
pub const CMDID_SECRET: u8 = 4;

/// Direct (unconditional) transfer
pub const CMDID_DIRECT_TRANSFER: u8 = 5;

/// Two-party locked transfer
pub const CMDID_LOCKED_TRANSFER: u8 = 6;

/// Locked transfer routed through a mediator
pub const CMDID_MEDIATED_TRANSFER: u8 = 7;

/// Locked transfer returning a failed routing attempt
pub const CMDID_REFUND_TRANSFER: u8 = 8;

// =============================================================================
// Field Widths
// =============================================================================

/// Width of an amount field on the wire (uint256)
pub const AMOUNT_FIELD_LEN: usize = 32;

/// Width of the zero padding after the command id
pub const PADDING_LEN: usize = 3;

/// Packed lock: amount (32) + expiration (8) + hashlock (32)
pub const LOCK_ENCODED_LEN: usize = AMOUNT_FIELD_LEN + 8 + 32;

// =============================================================================
// Message Sizes
// =============================================================================

/// Secret message size in bytes
pub const SECRET_MESSAGE_LEN: usize = 1 + PADDING_LEN + 8 + 32 + SIGNATURE_LENGTH;

/// DirectTransfer size in bytes
pub const DIRECT_TRANSFER_LEN: usize =
    1 + PADDING_LEN + 8 + 8 + 20 + 20 + AMOUNT_FIELD_LEN + 32 + SIGNATURE_LENGTH;

/// LockedTransfer size in bytes
pub const LOCKED_TRANSFER_LEN: usize = 1
    + PADDING_LEN
    + 8
    + 8
    + 8
    + 20
    + 20
    + 32
    + AMOUNT_FIELD_LEN
    + AMOUNT_FIELD_LEN
    + 32
    + SIGNATURE_LENGTH;

/// MediatedTransfer size in bytes
pub const MEDIATED_TRANSFER_LEN: usize = LOCKED_TRANSFER_LEN + 20 + 20 + AMOUNT_FIELD_LEN;

/// RefundTransfer size in bytes (same layout as LockedTransfer)
pub const REFUND_TRANSFER_LEN: usize = LOCKED_TRANSFER_LEN;

// =============================================================================
// Locksroot
// =============================================================================

/// Locksroot of a channel end with no pending locks
pub const EMPTY_LOCKSROOT: Hash = Hash([0u8; 32]);

// =============================================================================
// Timing (in blocks)
// =============================================================================

/// Blocks a mediator needs between learning a secret and the lock expiring
pub const DEFAULT_REVEAL_TIMEOUT: BlockNumber = 3;

/// Blocks between channel close and settlement
pub const DEFAULT_SETTLE_TIMEOUT: BlockNumber = 50;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_sizes() {
        assert_eq!(SECRET_MESSAGE_LEN, 109);
        assert_eq!(DIRECT_TRANSFER_LEN, 189);
        assert_eq!(LOCKED_TRANSFER_LEN, 261);
        assert_eq!(MEDIATED_TRANSFER_LEN, 333);
        assert_eq!(REFUND_TRANSFER_LEN, 261);
        assert_eq!(LOCK_ENCODED_LEN, 72);
    }

    #[test]
    fn test_reveal_shorter_than_settle() {
        assert!(DEFAULT_REVEAL_TIMEOUT < DEFAULT_SETTLE_TIMEOUT);
    }
}
