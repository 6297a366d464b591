//! Merkle tree construction and inclusion proofs.

use hashpay_crypto::{keccak256_concat, Hash};
use hashpay_types::{Lock, EMPTY_LOCKSROOT};
use serde::{Deserialize, Serialize};

use crate::error::{LocksrootError, LocksrootResult};

/// Hash two nodes together.
///
/// Orders the hashes lexicographically before combining, so the result does
/// not depend on which side each node sits.
pub fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    if a <= b {
        keccak256_concat(&[&a.0, &b.0])
    } else {
        keccak256_concat(&[&b.0, &a.0])
    }
}

/// Leaf hashes ordered by hashlock.
fn sorted_leaves<'a>(locks: impl IntoIterator<Item = &'a Lock>) -> Vec<(Hash, Hash)> {
    let mut leaves: Vec<(Hash, Hash)> = locks
        .into_iter()
        .map(|lock| (lock.hashlock, lock.lock_hash()))
        .collect();
    leaves.sort_by(|a, b| a.0.cmp(&b.0));
    leaves
}

fn next_level(hashes: &[Hash]) -> Vec<Hash> {
    hashes
        .chunks(2)
        .map(|chunk| match chunk {
            [left, right] => hash_pair(left, right),
            [single] => *single,
            _ => EMPTY_LOCKSROOT,
        })
        .collect()
}

/// Compute the locksroot of a set of locks.
///
/// Insertion order is irrelevant: leaves are sorted by hashlock first.
///
/// # Returns
/// The Merkle root, or [`EMPTY_LOCKSROOT`] for an empty set
pub fn compute_locksroot<'a>(locks: impl IntoIterator<Item = &'a Lock>) -> Hash {
    let mut hashes: Vec<Hash> = sorted_leaves(locks).into_iter().map(|(_, h)| h).collect();

    while hashes.len() > 1 {
        hashes = next_level(&hashes);
    }

    hashes.pop().unwrap_or(EMPTY_LOCKSROOT)
}

/// Inclusion proof of one lock in a locksroot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocksrootProof {
    /// Sibling hashes from the leaf level up to the root
    pub siblings: Vec<Hash>,
}

impl LocksrootProof {
    /// Number of levels the proof spans.
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Concatenated siblings, as submitted to the netting contract on unlock.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.siblings.iter().flat_map(|h| h.0).collect()
    }
}

/// Create an inclusion proof for the lock with `hashlock`.
///
/// # Errors
/// * `LocksrootError::EmptySet` if `locks` is empty
/// * `LocksrootError::LockNotIncluded` if no lock has `hashlock`
pub fn merkle_proof<'a>(
    locks: impl IntoIterator<Item = &'a Lock>,
    hashlock: &Hash,
) -> LocksrootResult<LocksrootProof> {
    let leaves = sorted_leaves(locks);
    if leaves.is_empty() {
        return Err(LocksrootError::EmptySet);
    }

    let mut index = leaves
        .iter()
        .position(|(h, _)| h == hashlock)
        .ok_or(LocksrootError::LockNotIncluded(*hashlock))?;

    let mut hashes: Vec<Hash> = leaves.into_iter().map(|(_, h)| h).collect();
    let mut siblings = Vec::new();

    while hashes.len() > 1 {
        let sibling_index = index ^ 1;
        // A promoted odd node has no sibling at this level
        if let Some(sibling) = hashes.get(sibling_index) {
            siblings.push(*sibling);
        }
        hashes = next_level(&hashes);
        index /= 2;
    }

    Ok(LocksrootProof { siblings })
}

/// Verify that `lock` is included in `root`.
pub fn verify_proof(lock: &Lock, proof: &LocksrootProof, root: &Hash) -> bool {
    let computed = proof
        .siblings
        .iter()
        .fold(lock.lock_hash(), |current, sibling| hash_pair(&current, sibling));
    computed == *root
}
