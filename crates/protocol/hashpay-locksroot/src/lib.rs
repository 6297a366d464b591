//! Locksroot commitment over a channel end's pending locks.
//!
//! The locksroot is the root of a binary Merkle tree whose leaves are the
//! lock hashes of all pending locks, ordered by hashlock. Pairs are hashed
//! in sorted order, so inclusion proofs carry no direction bits. An odd
//! trailing node is promoted to the next level unchanged.
//!
//! ```text
//! root([])        = 0x00..00
//! root([a])       = a
//! root([a, b])    = keccak256(min(a, b) || max(a, b))
//! root([a, b, c]) = hash_pair(hash_pair(a, b), c)
//! ```
//!
//! [`PendingLocks`] is the accumulator the ledger keeps per channel end.
//!
//! # Example
//!
//! ```
//! use hashpay_locksroot::{merkle_proof, verify_proof, PendingLocks};
//! use hashpay_types::{Lock, Secret, EMPTY_LOCKSROOT};
//!
//! let mut pending = PendingLocks::new();
//! assert_eq!(pending.root(), EMPTY_LOCKSROOT);
//!
//! let lock = Lock::new(50, 10, Secret::from("s").hashlock());
//! pending.insert(lock).unwrap();
//! assert_eq!(pending.root(), lock.lock_hash());
//!
//! let proof = merkle_proof(pending.iter(), &lock.hashlock).unwrap();
//! assert!(verify_proof(&lock, &proof, &pending.root()));
//! ```

mod error;
mod merkle;
mod pending;

pub use error::{LocksrootError, LocksrootResult};
pub use merkle::{compute_locksroot, hash_pair, merkle_proof, verify_proof, LocksrootProof};
pub use pending::PendingLocks;
