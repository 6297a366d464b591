//! Data structures for the Hashpay transfer protocol.
//!
//! This crate provides the data types shared by the codec, the locksroot
//! accumulator and the channel ledger. It contains no business logic beyond
//! the lock hash and hashlock derivation.
//!
//! # Module Organization
//!
//! - [`lock`] - Conditional payment descriptors and secrets
//! - [`channel`] - Channel lifecycle state
//! - [`constants`] - Protocol constants (command ids, message sizes, timeouts)
//! - [`error`] - Error codes shared by every crate
//!
//! # Example
//!
//! ```
//! use hashpay_types::{Lock, Secret};
//!
//! let secret = Secret::from("s");
//! let lock = Lock::new(50, 10, secret.hashlock());
//!
//! assert_eq!(lock.hashlock, secret.hashlock());
//! assert!(!lock.is_expired(10));
//! assert!(lock.is_expired(11));
//! ```
//!
//! # Type Conventions
//!
//! - Derive `Debug`, `Clone`, `PartialEq`, `Eq` where appropriate
//! - Derive `Copy` for small types
//! - Use `#[serde(rename_all = "snake_case")]` for consistent JSON
//! - Use `#[repr(u8)]` or `#[repr(u16)]` for enums with defined wire values

/// Protocol version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod channel;
pub mod constants;
pub mod error;
pub mod lock;

pub use channel::ChannelState;
pub use constants::*;
pub use error::ErrorCode;
pub use lock::{Lock, Secret};

// Re-export crypto types that appear in every data structure
pub use hashpay_crypto::{Address, BlockNumber, Hash, Signature};

/// Token amount in the smallest unit.
///
/// Carried on the wire as a 32-byte big-endian integer.
pub type Amount = u64;

/// Transfer nonce: strictly increasing per sending end of a channel.
pub type Nonce = u64;
