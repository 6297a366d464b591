//! Wire contract tests for hashpay-types.
//!
//! Command ids, the lock hash and the channel state values are shared with
//! the on-chain decoder; these tests pin them.

use hashpay_crypto::keccak256;
use hashpay_types::*;

// =============================================================================
// Command Ids
// =============================================================================

#[test]
fn command_ids_are_stable() {
    assert_eq!(CMDID_SECRET, 4);
    assert_eq!(CMDID_DIRECT_TRANSFER, 5);
    assert_eq!(CMDID_LOCKED_TRANSFER, 6);
    assert_eq!(CMDID_MEDIATED_TRANSFER, 7);
    assert_eq!(CMDID_REFUND_TRANSFER, 8);
}

// =============================================================================
// Lock Hash
// =============================================================================

#[test]
fn lock_hash_is_keccak_of_packed_fields() {
    let hashlock = keccak256(b"Sikorka");
    let lock = Lock::new(1337, 5, hashlock);

    let mut packed = Vec::with_capacity(72);
    packed.extend_from_slice(&[0u8; 24]);
    packed.extend_from_slice(&1337u64.to_be_bytes());
    packed.extend_from_slice(&5u64.to_be_bytes());
    packed.extend_from_slice(&hashlock.0);

    assert_eq!(lock.lock_hash(), keccak256(&packed));
}

#[test]
fn secret_hashlock_is_keccak_of_preimage() {
    assert_eq!(Secret::from("s").hashlock(), keccak256(b"s"));
}

// =============================================================================
// Channel State
// =============================================================================

#[test]
fn channel_state_values() {
    assert_eq!(ChannelState::Open as u8, 0x00);
    assert_eq!(ChannelState::Closing as u8, 0x01);
    assert_eq!(ChannelState::Settled as u8, 0x02);
    assert_eq!(ChannelState::default(), ChannelState::Open);
}

#[test]
fn empty_locksroot_is_zero() {
    assert!(EMPTY_LOCKSROOT.is_zero());
}
