//! One end of a channel.

use std::collections::VecDeque;

use hashpay_crypto::{Address, Hash};
use hashpay_locksroot::PendingLocks;
use hashpay_types::{Amount, Lock, Nonce};
use hashpay_wire::Transfer;
use serde::Serialize;

/// State of one channel participant, as seen by both parties.
///
/// The nonce, transferred amount and pending locks describe the transfers
/// this end *sent*.
#[derive(Debug, Clone)]
pub struct ChannelEndState {
    address: Address,
    deposit: Amount,
    transferred_amount: Amount,
    nonce: Nonce,
    pending: PendingLocks,
    latest_transfer: Option<Transfer>,
    history: VecDeque<Transfer>,
}

impl ChannelEndState {
    pub(crate) fn new(address: Address, deposit: Amount) -> Self {
        Self {
            address,
            deposit,
            transferred_amount: 0,
            nonce: 0,
            pending: PendingLocks::new(),
            latest_transfer: None,
            history: VecDeque::new(),
        }
    }

    /// Participant address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// On-chain deposit.
    pub fn deposit(&self) -> Amount {
        self.deposit
    }

    /// Cumulative amount paid unconditionally to the other end.
    pub fn transferred_amount(&self) -> Amount {
        self.transferred_amount
    }

    /// Nonce of the latest applied transfer sent by this end.
    pub fn nonce(&self) -> Nonce {
        self.nonce
    }

    /// Nonce the next transfer from this end must carry.
    pub fn next_nonce(&self) -> Nonce {
        self.nonce + 1
    }

    /// Pending locks sent by this end.
    pub fn pending_locks(&self) -> &PendingLocks {
        &self.pending
    }

    /// Commitment over the pending locks.
    pub fn locksroot(&self) -> Hash {
        self.pending.root()
    }

    /// Sum of pending lock amounts.
    pub fn locked(&self) -> Amount {
        self.pending.total_locked()
    }

    /// `deposit - transferred + other.transferred`.
    pub fn balance(&self, other: &ChannelEndState) -> Amount {
        let balance = (u128::from(self.deposit) + u128::from(other.transferred_amount))
            .saturating_sub(u128::from(self.transferred_amount));
        Amount::try_from(balance).unwrap_or(Amount::MAX)
    }

    /// What this end can still pay or lock: `balance - locked`.
    pub fn distributable(&self, other: &ChannelEndState) -> Amount {
        self.balance(other).saturating_sub(self.locked())
    }

    /// Latest applied transfer sent by this end.
    pub fn latest_transfer(&self) -> Option<&Transfer> {
        self.latest_transfer.as_ref()
    }

    /// Superseded transfers, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Transfer> {
        self.history.iter()
    }

    /// Apply a fully validated transfer.
    pub(crate) fn apply(&mut self, transfer: Transfer, history_limit: usize) {
        self.nonce = transfer.header.nonce;
        self.transferred_amount = transfer.header.transferred_amount;
        if let Some(lock) = transfer.lock() {
            // Validated as non-duplicate before apply
            let _ = self.pending.insert(*lock);
        }
        if let Some(previous) = self.latest_transfer.replace(transfer) {
            self.history.push_back(previous);
            while self.history.len() > history_limit {
                self.history.pop_front();
            }
        }
    }

    /// Remove a pending lock and pay its amount to the other end.
    pub(crate) fn settle_lock(&mut self, hashlock: &Hash) -> Option<Lock> {
        let lock = self.pending.remove(hashlock).ok()?;
        self.transferred_amount = self.transferred_amount.saturating_add(lock.amount);
        Some(lock)
    }

    /// Remove a pending lock without moving value.
    pub(crate) fn drop_lock(&mut self, hashlock: &Hash) -> Option<Lock> {
        self.pending.remove(hashlock).ok()
    }
}

/// Read-only view of one end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndSnapshot {
    /// Participant address
    pub address: Address,
    /// On-chain deposit
    pub deposit: Amount,
    /// Cumulative unconditional payments to the other end
    pub transferred_amount: Amount,
    /// Nonce of the latest applied transfer
    pub nonce: Nonce,
    /// Commitment over pending locks
    pub locksroot: Hash,
    /// Sum of pending lock amounts
    pub locked: Amount,
    /// Net balance
    pub balance: Amount,
    /// Balance minus locked
    pub distributable: Amount,
    /// Pending locks in hashlock order
    pub pending_locks: Vec<Lock>,
}

impl EndSnapshot {
    pub(crate) fn capture(end: &ChannelEndState, other: &ChannelEndState) -> Self {
        Self {
            address: end.address,
            deposit: end.deposit,
            transferred_amount: end.transferred_amount,
            nonce: end.nonce,
            locksroot: end.locksroot(),
            locked: end.locked(),
            balance: end.balance(other),
            distributable: end.distributable(other),
            pending_locks: end.pending.iter().copied().collect(),
        }
    }
}
