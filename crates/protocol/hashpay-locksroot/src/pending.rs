//! Pending-lock accumulator.

use std::collections::BTreeMap;

use hashpay_crypto::Hash;
use hashpay_types::{Amount, Lock};
use serde::{Deserialize, Serialize};

use crate::error::{LocksrootError, LocksrootResult};
use crate::merkle::compute_locksroot;

/// The pending locks of one channel end, keyed by hashlock.
///
/// Iteration is in ascending hashlock order, which is also the leaf order
/// of the locksroot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLocks {
    locks: BTreeMap<Hash, Lock>,
}

impl PendingLocks {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current locksroot.
    pub fn root(&self) -> Hash {
        compute_locksroot(self.locks.values())
    }

    /// Locksroot the set would have after adding `lock`, without adding it.
    ///
    /// # Errors
    /// `DuplicateHashlock` if the hashlock is already pending.
    pub fn root_with(&self, lock: &Lock) -> LocksrootResult<Hash> {
        if self.locks.contains_key(&lock.hashlock) {
            return Err(LocksrootError::DuplicateHashlock(lock.hashlock));
        }
        Ok(compute_locksroot(
            self.locks.values().chain(std::iter::once(lock)),
        ))
    }

    /// Add a lock.
    ///
    /// # Errors
    /// `DuplicateHashlock` if the hashlock is already pending.
    pub fn insert(&mut self, lock: Lock) -> LocksrootResult<()> {
        if self.locks.contains_key(&lock.hashlock) {
            return Err(LocksrootError::DuplicateHashlock(lock.hashlock));
        }
        self.locks.insert(lock.hashlock, lock);
        Ok(())
    }

    /// Remove and return the lock with `hashlock`.
    ///
    /// # Errors
    /// `LockNotIncluded` if no such lock is pending.
    pub fn remove(&mut self, hashlock: &Hash) -> LocksrootResult<Lock> {
        self.locks
            .remove(hashlock)
            .ok_or(LocksrootError::LockNotIncluded(*hashlock))
    }

    /// Look up a lock.
    pub fn get(&self, hashlock: &Hash) -> Option<&Lock> {
        self.locks.get(hashlock)
    }

    /// Whether a lock with `hashlock` is pending.
    pub fn contains(&self, hashlock: &Hash) -> bool {
        self.locks.contains_key(hashlock)
    }

    /// Sum of all pending amounts.
    pub fn total_locked(&self) -> Amount {
        self.locks
            .values()
            .fold(0, |total: Amount, lock| total.saturating_add(lock.amount))
    }

    /// Pending locks in hashlock order.
    pub fn iter(&self) -> impl Iterator<Item = &Lock> {
        self.locks.values()
    }

    /// Number of pending locks.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no lock is pending.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
