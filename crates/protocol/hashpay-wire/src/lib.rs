//! Wire codec for the Hashpay transfer protocol.
//!
//! Messages use a fixed binary layout that the on-chain netting contract
//! decodes field by field:
//!
//! ```text
//! [cmdid: u8]             # Message type
//! [padding: 3 bytes]      # Zero
//! [fields ...]            # Fixed order and width per type, big-endian
//! [signature: 65 bytes]   # r || s || v over keccak256 of everything before it
//! ```
//!
//! There is no length prefix: the command id determines the exact size.
//!
//! # Example
//!
//! ```
//! use hashpay_crypto::{generate_identity, Address, Hash, Signature};
//! use hashpay_types::{Lock, Secret};
//! use hashpay_wire::{decode_transfer, encode_transfer, Transfer, TransferHeader, TransferKind};
//!
//! let (private_key, sender) = generate_identity();
//! let lock = Lock::new(50, 10, Secret::from("s").hashlock());
//!
//! let mut transfer = Transfer::new(
//!     TransferHeader {
//!         identifier: 1,
//!         nonce: 1,
//!         asset: Address([0x11; 20]),
//!         recipient: Address([0x22; 20]),
//!         transferred_amount: 0,
//!         locksroot: lock.lock_hash(),
//!         signature: Signature::EMPTY,
//!     },
//!     TransferKind::Locked { lock },
//! );
//! transfer.sign(&private_key).unwrap();
//!
//! let bytes = encode_transfer(&transfer);
//! let decoded = decode_transfer(&bytes).unwrap();
//! assert_eq!(decoded, transfer);
//! assert_eq!(decoded.recover_signer().unwrap(), sender);
//! ```

pub mod encoding;
pub mod error;
pub mod message;

pub use encoding::{
    decode, decode_transfer, encode, encode_secret, encode_transfer, signing_hash,
};
pub use error::{CodecError, CodecResult};
pub use message::{Message, MessageType, SecretMessage, Transfer, TransferHeader, TransferKind};
