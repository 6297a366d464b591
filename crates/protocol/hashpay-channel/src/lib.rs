//! Channel ledger, channel manager and lock resolver for Hashpay.
//!
//! This crate holds the off-chain state of two-party payment channels:
//!
//! - [`ChannelLedger`]: validates and applies transfers for one channel
//! - [`ChannelManager`]: all channels of one asset, one lock per channel
//! - [`LockResolver`]: claims and expires pending locks as blocks pass
//!
//! Block heights and signing keys come from injected providers
//! ([`BlockHeightProvider`], [`SigningKeyProvider`]).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use hashpay_channel::{ChannelConfig, ChannelManager, InMemoryKeyProvider, ManualBlockHeight};
//! use hashpay_crypto::{generate_identity, Address};
//! use hashpay_types::Secret;
//!
//! let (key, _) = generate_identity();
//! let keys = InMemoryKeyProvider::with_key(key).unwrap();
//! let our_address = *keys.addresses().next().unwrap();
//! let chain = Arc::new(ManualBlockHeight::new(0));
//!
//! let manager = ChannelManager::new(
//!     Address([0xaa; 20]),
//!     our_address,
//!     ChannelConfig::default(),
//!     chain.clone(),
//!     Arc::new(keys),
//! );
//! let partner = Address([0x01; 20]);
//! manager.open_channel(partner, 1000, 1000).unwrap();
//!
//! let secret = Secret::from("s");
//! manager
//!     .send_locked_transfer(&partner, 50, 10, secret.hashlock(), 1)
//!     .unwrap();
//! manager.claim_locked(&partner, &secret).unwrap();
//!
//! let snapshot = manager.snapshot(&partner).unwrap();
//! assert_eq!(snapshot.ours.balance, 950);
//! assert_eq!(snapshot.partner.balance, 1050);
//! ```

pub mod chain;
pub mod config;
pub mod end_state;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod manager;
pub mod resolver;

pub use chain::{BlockHeightProvider, ManualBlockHeight};
pub use config::{ChannelConfig, ResolverConfig};
pub use end_state::{ChannelEndState, EndSnapshot};
pub use error::{ChannelError, ChannelResult};
pub use keys::{InMemoryKeyProvider, SigningKeyProvider};
pub use ledger::{ChannelLedger, ChannelSide, ChannelSnapshot, ResolvedLock};
pub use manager::{ChannelManager, SharedLedger};
pub use resolver::{LockResolver, ResolverReport};
