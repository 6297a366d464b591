//! Channel ledger state machine.
//!
//! A [`ChannelLedger`] is the local record of one two-party channel for one
//! asset. Both parties run the same ledger and apply the same transfers, so
//! their views agree as long as each transfer is accepted by both or by
//! neither.
//!
//! # Lifecycle
//!
//! ```text
//! Open ──close──> Closing ──settle──> Settled
//! ```
//!
//! Transfers are only registered while `Open`. Pending locks may still be
//! claimed or expired while `Closing`.
//!
//! # Validation order
//!
//! `register_transfer` checks, in this order: channel state, asset and
//! recipient, nonce, signature, duplicate lock, locksroot, capacity. The
//! first failure is returned and nothing is applied.

use hashpay_crypto::{Address, BlockNumber, Hash};
use hashpay_locksroot::{merkle_proof, LocksrootProof};
use hashpay_types::{Amount, ChannelState, Lock, Secret};
use hashpay_wire::{Transfer, TransferHeader, TransferKind};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ChannelConfig;
use crate::end_state::{ChannelEndState, EndSnapshot};
use crate::error::{ChannelError, ChannelResult};

/// Which end of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSide {
    /// The local node
    Ours,
    /// The counterparty
    Partner,
}

/// A lock removed by a claim or an expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedLock {
    /// End that sent the lock
    pub sender: ChannelSide,
    /// The removed lock
    pub lock: Lock,
}

/// Local record of a two-party channel.
#[derive(Debug, Clone)]
pub struct ChannelLedger {
    asset: Address,
    state: ChannelState,
    closed_block: Option<BlockNumber>,
    our_state: ChannelEndState,
    partner_state: ChannelEndState,
    config: ChannelConfig,
}

impl ChannelLedger {
    /// Create an open channel.
    ///
    /// # Errors
    /// - `ChannelMismatch` if both ends have the same address
    /// - `DepositTooLow` if the combined deposit is below `config.min_deposit`
    /// - `DepositOverflow` if the combined deposit does not fit in an `Amount`
    pub fn new(
        asset: Address,
        our_address: Address,
        our_deposit: Amount,
        partner_address: Address,
        partner_deposit: Amount,
        config: ChannelConfig,
    ) -> ChannelResult<Self> {
        if our_address == partner_address {
            return Err(ChannelError::mismatch("both ends have the same address"));
        }
        let provided = our_deposit
            .checked_add(partner_deposit)
            .ok_or(ChannelError::DepositOverflow {
                ours: our_deposit,
                partner: partner_deposit,
            })?;
        if provided < config.min_deposit {
            return Err(ChannelError::DepositTooLow {
                provided,
                minimum: config.min_deposit,
            });
        }

        Ok(Self {
            asset,
            state: ChannelState::Open,
            closed_block: None,
            our_state: ChannelEndState::new(our_address, our_deposit),
            partner_state: ChannelEndState::new(partner_address, partner_deposit),
            config,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Asset this channel moves.
    pub fn asset(&self) -> Address {
        self.asset
    }

    /// Lifecycle state.
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Block at which the channel was closed.
    pub fn closed_block(&self) -> Option<BlockNumber> {
        self.closed_block
    }

    /// Channel configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Local end.
    pub fn our_state(&self) -> &ChannelEndState {
        &self.our_state
    }

    /// Counterparty end.
    pub fn partner_state(&self) -> &ChannelEndState {
        &self.partner_state
    }

    /// Balance of the local end.
    pub fn balance(&self) -> Amount {
        self.our_state.balance(&self.partner_state)
    }

    /// What the local end can still pay or lock.
    pub fn distributable(&self) -> Amount {
        self.our_state.distributable(&self.partner_state)
    }

    /// Both ends' superseded transfers, local end first.
    pub fn transfer_history(&self) -> impl Iterator<Item = &Transfer> {
        self.our_state.history().chain(self.partner_state.history())
    }

    /// Consistent read-only view.
    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            asset: self.asset,
            state: self.state,
            closed_block: self.closed_block,
            ours: EndSnapshot::capture(&self.our_state, &self.partner_state),
            partner: EndSnapshot::capture(&self.partner_state, &self.our_state),
        }
    }

    /// Inclusion proof of a pending lock in its sender's locksroot.
    ///
    /// # Errors
    /// `UnknownLock` if no end holds the lock.
    pub fn lock_proof(&self, hashlock: &Hash) -> ChannelResult<(ChannelSide, LocksrootProof)> {
        for (side, end) in self.ends() {
            if end.pending_locks().contains(hashlock) {
                let proof = merkle_proof(end.pending_locks().iter(), hashlock)
                    .map_err(|_| ChannelError::UnknownLock(*hashlock))?;
                return Ok((side, proof));
            }
        }
        Err(ChannelError::UnknownLock(*hashlock))
    }

    fn ends(&self) -> [(ChannelSide, &ChannelEndState); 2] {
        [
            (ChannelSide::Ours, &self.our_state),
            (ChannelSide::Partner, &self.partner_state),
        ]
    }

    fn end_mut(&mut self, side: ChannelSide) -> &mut ChannelEndState {
        match side {
            ChannelSide::Ours => &mut self.our_state,
            ChannelSide::Partner => &mut self.partner_state,
        }
    }

    // =========================================================================
    // Proposals
    // =========================================================================

    /// Build an unconditional transfer of `amount` to the partner.
    ///
    /// The transfer is unsigned and not applied; register it to apply.
    ///
    /// # Errors
    /// - `ChannelClosed` if the channel is not open
    /// - `InsufficientCapacity` if `amount` exceeds the distributable balance
    pub fn create_direct_transfer(
        &self,
        amount: Amount,
        identifier: u64,
    ) -> ChannelResult<Transfer> {
        self.propose(TransferKind::Direct, amount, identifier)
    }

    /// Build a transfer that locks `amount` until `expiration` under `hashlock`.
    ///
    /// The transferred amount is unchanged and the locksroot covers the
    /// pending locks plus the new one. Nothing is applied until the
    /// transfer is registered.
    ///
    /// # Errors
    /// - `ChannelClosed` if the channel is not open
    /// - `DuplicateLock` if `hashlock` is already pending on the local end
    /// - `InsufficientCapacity` if `amount` exceeds the distributable balance
    pub fn create_locked_transfer(
        &self,
        amount: Amount,
        expiration: BlockNumber,
        hashlock: Hash,
        identifier: u64,
    ) -> ChannelResult<Transfer> {
        let lock = Lock::new(amount, expiration, hashlock);
        self.propose(TransferKind::Locked { lock }, 0, identifier)
    }

    /// Build a locked transfer carrying routing information.
    ///
    /// `fee` is carried as given.
    pub fn create_mediated_transfer(
        &self,
        lock: Lock,
        identifier: u64,
        target: Address,
        initiator: Address,
        fee: Amount,
    ) -> ChannelResult<Transfer> {
        let kind = TransferKind::Mediated {
            lock,
            target,
            initiator,
            fee,
        };
        self.propose(kind, 0, identifier)
    }

    /// Build a locked transfer returning a failed routing attempt.
    pub fn create_refund_transfer(
        &self,
        amount: Amount,
        expiration: BlockNumber,
        hashlock: Hash,
        identifier: u64,
    ) -> ChannelResult<Transfer> {
        let lock = Lock::new(amount, expiration, hashlock);
        self.propose(TransferKind::Refund { lock }, 0, identifier)
    }

    fn propose(
        &self,
        kind: TransferKind,
        direct_amount: Amount,
        identifier: u64,
    ) -> ChannelResult<Transfer> {
        if !self.state.accepts_transfers() {
            return Err(ChannelError::ChannelClosed(self.state));
        }

        let ours = &self.our_state;
        let lock = match &kind {
            TransferKind::Direct => None,
            TransferKind::Locked { lock }
            | TransferKind::Mediated { lock, .. }
            | TransferKind::Refund { lock } => Some(*lock),
        };

        let locksroot = match &lock {
            Some(lock) => ours
                .pending_locks()
                .root_with(lock)
                .map_err(|_| ChannelError::DuplicateLock(lock.hashlock))?,
            None => ours.locksroot(),
        };

        let available = self.distributable();
        let requested = direct_amount
            .checked_add(lock.map_or(0, |l| l.amount))
            .ok_or(ChannelError::InsufficientCapacity {
                requested: Amount::MAX,
                available,
            })?;
        if requested > available {
            return Err(ChannelError::InsufficientCapacity {
                requested,
                available,
            });
        }

        let transferred_amount = ours.transferred_amount().checked_add(direct_amount).ok_or(
            ChannelError::InsufficientCapacity {
                requested: direct_amount,
                available,
            },
        )?;
        let header = TransferHeader {
            identifier,
            nonce: ours.next_nonce(),
            asset: self.asset,
            recipient: self.partner_state.address(),
            transferred_amount,
            locksroot,
            signature: Default::default(),
        };
        Ok(Transfer::new(header, kind))
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Validate and apply a signed transfer sent by either end.
    ///
    /// Application is all-or-nothing: on error the ledger is unchanged.
    ///
    /// # Errors
    /// `ChannelClosed`, `ChannelMismatch`, `InvalidNonce`, `InvalidSignature`,
    /// `DuplicateLock`, `InvalidLocksroot`, `TransferredAmountDecreased` or
    /// `InsufficientCapacity`, checked in that order.
    ///
    /// A lock whose hashlock is already pending on the sending end is
    /// reported as `DuplicateLock` before the locksroot is compared, since
    /// no root exists for a pending set holding the same hashlock twice.
    pub fn register_transfer(&mut self, transfer: Transfer) -> ChannelResult<()> {
        let sender = match self.validate_transfer(&transfer) {
            Ok(sender) => sender,
            Err(e) => {
                warn!(
                    asset = %self.asset,
                    nonce = transfer.header.nonce,
                    kind = %transfer.message_type(),
                    error = %e,
                    "Rejected transfer"
                );
                return Err(e);
            }
        };

        let nonce = transfer.header.nonce;
        let transferred_amount = transfer.header.transferred_amount;
        let locked_amount = transfer.lock().map(|l| l.amount);
        let history_limit = self.config.history_limit;
        self.end_mut(sender).apply(transfer, history_limit);

        debug!(
            asset = %self.asset,
            sender = ?sender,
            nonce,
            transferred_amount,
            locked_amount = ?locked_amount,
            "Applied transfer"
        );
        Ok(())
    }

    /// Run every check of [`register_transfer`](Self::register_transfer)
    /// and return the sending side.
    fn validate_transfer(&self, transfer: &Transfer) -> ChannelResult<ChannelSide> {
        if !self.state.accepts_transfers() {
            return Err(ChannelError::ChannelClosed(self.state));
        }

        let header = &transfer.header;
        if header.asset != self.asset {
            return Err(ChannelError::mismatch(format!(
                "asset {} is not {}",
                header.asset, self.asset
            )));
        }
        let (side, sender, receiver) = if header.recipient == self.partner_state.address() {
            (ChannelSide::Ours, &self.our_state, &self.partner_state)
        } else if header.recipient == self.our_state.address() {
            (ChannelSide::Partner, &self.partner_state, &self.our_state)
        } else {
            return Err(ChannelError::mismatch(format!(
                "recipient {} is not a participant",
                header.recipient
            )));
        };

        // strictly sequential nonce
        if header.nonce != sender.next_nonce() {
            return Err(ChannelError::InvalidNonce {
                expected: sender.next_nonce(),
                got: header.nonce,
            });
        }

        // signed by the sending end
        transfer.verify_signer(&sender.address())?;

        // locksroot over pending locks plus this transfer's lock, which
        // must not already be pending
        let expected_root = match transfer.lock() {
            Some(lock) => sender
                .pending_locks()
                .root_with(lock)
                .map_err(|_| ChannelError::DuplicateLock(lock.hashlock))?,
            None => sender.locksroot(),
        };
        if header.locksroot != expected_root {
            return Err(ChannelError::InvalidLocksroot {
                expected: expected_root,
                got: header.locksroot,
            });
        }

        // capacity
        if header.transferred_amount < sender.transferred_amount() {
            return Err(ChannelError::TransferredAmountDecreased {
                previous: sender.transferred_amount(),
                got: header.transferred_amount,
            });
        }
        let available = sender.distributable(receiver);
        let delta = header.transferred_amount - sender.transferred_amount();
        let requested = delta
            .checked_add(transfer.lock().map_or(0, |l| l.amount))
            .unwrap_or(Amount::MAX);
        if requested > available {
            return Err(ChannelError::InsufficientCapacity {
                requested,
                available,
            });
        }

        Ok(side)
    }

    // =========================================================================
    // Lock Resolution
    // =========================================================================

    /// Unlock every pending lock opened by `secret` at `block`.
    ///
    /// Each lock's amount moves into its sender's transferred amount. Both
    /// ends are searched; a refund can leave the same hashlock pending on
    /// each side.
    ///
    /// # Errors
    /// - `ChannelClosed` once settled
    /// - `UnknownLock` if no end holds the hashlock
    /// - `LockExpired` if every matching lock has expired
    pub fn claim_locked(
        &mut self,
        secret: &Secret,
        block: BlockNumber,
    ) -> ChannelResult<Vec<ResolvedLock>> {
        let hashlock = secret.hashlock();
        let candidates = self.matching_locks(&hashlock)?;

        let claimable: Vec<(ChannelSide, Lock)> = candidates
            .iter()
            .copied()
            .filter(|(_, lock)| !lock.is_expired(block))
            .collect();
        if claimable.is_empty() {
            let expiration = candidates.iter().map(|(_, l)| l.expiration).max().unwrap_or(0);
            return Err(ChannelError::LockExpired { expiration, block });
        }

        let mut resolved = Vec::with_capacity(claimable.len());
        for (side, lock) in claimable {
            if self.end_mut(side).settle_lock(&hashlock).is_some() {
                info!(
                    asset = %self.asset,
                    sender = ?side,
                    hashlock = %hashlock,
                    amount = lock.amount,
                    block,
                    "Claimed lock"
                );
                resolved.push(ResolvedLock { sender: side, lock });
            }
        }
        Ok(resolved)
    }

    /// Drop every pending lock with `hashlock` that expired before `block`.
    ///
    /// No value moves.
    ///
    /// # Errors
    /// - `ChannelClosed` once settled
    /// - `UnknownLock` if no end holds the hashlock
    /// - `LockNotYetExpired` if no matching lock has expired
    pub fn expire_locked(
        &mut self,
        hashlock: &Hash,
        block: BlockNumber,
    ) -> ChannelResult<Vec<ResolvedLock>> {
        let candidates = self.matching_locks(hashlock)?;

        let expired: Vec<(ChannelSide, Lock)> = candidates
            .iter()
            .copied()
            .filter(|(_, lock)| lock.is_expired(block))
            .collect();
        if expired.is_empty() {
            let expiration = candidates.iter().map(|(_, l)| l.expiration).min().unwrap_or(0);
            return Err(ChannelError::LockNotYetExpired { expiration, block });
        }

        let mut resolved = Vec::with_capacity(expired.len());
        for (side, lock) in expired {
            if self.end_mut(side).drop_lock(hashlock).is_some() {
                info!(
                    asset = %self.asset,
                    sender = ?side,
                    hashlock = %hashlock,
                    amount = lock.amount,
                    block,
                    "Expired lock"
                );
                resolved.push(ResolvedLock { sender: side, lock });
            }
        }
        Ok(resolved)
    }

    /// Pending locks of both ends, local end first.
    pub fn pending_locks(&self) -> impl Iterator<Item = (ChannelSide, &Lock)> {
        self.ends()
            .into_iter()
            .flat_map(|(side, end)| end.pending_locks().iter().map(move |lock| (side, lock)))
    }

    fn matching_locks(&self, hashlock: &Hash) -> ChannelResult<Vec<(ChannelSide, Lock)>> {
        if !self.state.accepts_lock_resolution() {
            return Err(ChannelError::ChannelClosed(self.state));
        }
        let found: Vec<(ChannelSide, Lock)> = self
            .ends()
            .into_iter()
            .filter_map(|(side, end)| end.pending_locks().get(hashlock).map(|l| (side, *l)))
            .collect();
        if found.is_empty() {
            return Err(ChannelError::UnknownLock(*hashlock));
        }
        Ok(found)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Record that the channel was closed on-chain at `block`.
    ///
    /// # Errors
    /// `InvalidStateTransition` unless the channel is open.
    pub fn close(&mut self, block: BlockNumber) -> ChannelResult<()> {
        self.transition(ChannelState::Closing)?;
        self.closed_block = Some(block);
        Ok(())
    }

    /// Record that the channel was settled on-chain.
    ///
    /// # Errors
    /// `InvalidStateTransition` unless the channel is closing.
    pub fn settle(&mut self) -> ChannelResult<()> {
        self.transition(ChannelState::Settled)
    }

    fn transition(&mut self, to: ChannelState) -> ChannelResult<()> {
        if !self.state.can_transition_to(to) {
            return Err(ChannelError::InvalidStateTransition {
                from: self.state,
                to,
            });
        }
        info!(asset = %self.asset, from = %self.state, to = %to, "Channel state changed");
        self.state = to;
        Ok(())
    }
}

/// Read-only view of a channel at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSnapshot {
    /// Asset the channel moves
    pub asset: Address,
    /// Lifecycle state
    pub state: ChannelState,
    /// Block of the on-chain close
    pub closed_block: Option<BlockNumber>,
    /// Local end
    pub ours: EndSnapshot,
    /// Counterparty end
    pub partner: EndSnapshot,
}

impl ChannelSnapshot {
    /// Sum of both ends' distributable balances and pending locks.
    ///
    /// Always equals the combined deposit.
    pub fn total_value(&self) -> Amount {
        [
            self.ours.distributable,
            self.partner.distributable,
            self.ours.locked,
            self.partner.locked,
        ]
        .into_iter()
        .fold(0, Amount::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashpay_crypto::{generate_identity, PrivateKey};
    use hashpay_locksroot::verify_proof;
    use hashpay_types::EMPTY_LOCKSROOT;

    struct Fixture {
        ours: ChannelLedger,
        theirs: ChannelLedger,
        our_key: PrivateKey,
        their_key: PrivateKey,
    }

    fn fixture(deposit: Amount) -> Fixture {
        let (our_key, our_address) = generate_identity();
        let (their_key, their_address) = generate_identity();
        let asset = Address([0xaa; 20]);
        let config = ChannelConfig::default();
        Fixture {
            ours: ChannelLedger::new(asset, our_address, deposit, their_address, deposit, config.clone())
                .unwrap(),
            theirs: ChannelLedger::new(asset, their_address, deposit, our_address, deposit, config)
                .unwrap(),
            our_key,
            their_key,
        }
    }

    impl Fixture {
        /// Create, sign and register a locked transfer on both ledgers.
        fn send_locked(&mut self, amount: Amount, expiration: BlockNumber, secret: &str) -> Transfer {
            let hashlock = Secret::from(secret).hashlock();
            let mut transfer = self
                .ours
                .create_locked_transfer(amount, expiration, hashlock, 1)
                .unwrap();
            transfer.sign(&self.our_key).unwrap();
            self.ours.register_transfer(transfer.clone()).unwrap();
            self.theirs.register_transfer(transfer.clone()).unwrap();
            transfer
        }
    }

    #[test]
    fn test_new_rejects_same_address() {
        let (_, address) = generate_identity();
        let result = ChannelLedger::new(Address::ZERO, address, 1, address, 1, ChannelConfig::default());
        assert!(matches!(result, Err(ChannelError::ChannelMismatch(_))));
    }

    #[test]
    fn test_new_rejects_low_deposit() {
        let (_, a) = generate_identity();
        let (_, b) = generate_identity();
        let config = ChannelConfig::default().with_min_deposit(100);
        let result = ChannelLedger::new(Address::ZERO, a, 40, b, 50, config);
        assert_eq!(
            result.err(),
            Some(ChannelError::DepositTooLow {
                provided: 90,
                minimum: 100
            })
        );
    }

    #[test]
    fn test_new_rejects_overflowing_deposit() {
        let (_, a) = generate_identity();
        let (_, b) = generate_identity();
        let result = ChannelLedger::new(Address::ZERO, a, u64::MAX, b, 1, ChannelConfig::default());
        assert_eq!(
            result.err(),
            Some(ChannelError::DepositOverflow {
                ours: u64::MAX,
                partner: 1
            })
        );
    }

    #[test]
    fn test_register_at_maximum_combined_deposit() {
        let (our_key, our_address) = generate_identity();
        let (their_key, their_address) = generate_identity();
        let asset = Address([0xaa; 20]);
        let config = ChannelConfig::default();
        let mut ours =
            ChannelLedger::new(asset, our_address, u64::MAX - 1, their_address, 1, config.clone())
                .unwrap();
        let mut theirs =
            ChannelLedger::new(asset, their_address, 1, our_address, u64::MAX - 1, config).unwrap();

        let mut t1 = ours.create_direct_transfer(1, 1).unwrap();
        t1.sign(&our_key).unwrap();
        ours.register_transfer(t1.clone()).unwrap();
        theirs.register_transfer(t1).unwrap();

        let mut t2 = theirs.create_direct_transfer(2, 2).unwrap();
        t2.sign(&their_key).unwrap();
        theirs.register_transfer(t2.clone()).unwrap();
        ours.register_transfer(t2).unwrap();

        assert_eq!(ours.balance(), u64::MAX);
        assert_eq!(ours.partner_state().balance(ours.our_state()), 0);
        assert_eq!(ours.snapshot().total_value(), u64::MAX);

        let mut t3 = theirs.create_direct_transfer(0, 3).unwrap();
        t3.header.transferred_amount = 3;
        t3.sign(&their_key).unwrap();
        assert!(matches!(
            ours.register_transfer(t3),
            Err(ChannelError::InsufficientCapacity { .. })
        ));
    }

    #[test]
    fn test_create_does_not_mutate() {
        let f = fixture(1000);
        let transfer = f
            .ours
            .create_locked_transfer(50, 10, Secret::from("s").hashlock(), 1)
            .unwrap();
        assert_eq!(transfer.header.nonce, 1);
        assert_eq!(transfer.header.transferred_amount, 0);
        assert_eq!(f.ours.our_state().nonce(), 0);
        assert!(f.ours.our_state().pending_locks().is_empty());
    }

    #[test]
    fn test_create_rejects_over_capacity() {
        let f = fixture(100);
        let result = f.ours.create_locked_transfer(101, 10, Secret::from("s").hashlock(), 1);
        assert_eq!(
            result.err(),
            Some(ChannelError::InsufficientCapacity {
                requested: 101,
                available: 100
            })
        );
    }

    #[test]
    fn test_create_rejects_duplicate_hashlock() {
        let mut f = fixture(1000);
        f.send_locked(10, 10, "s");
        let result = f.ours.create_locked_transfer(5, 10, Secret::from("s").hashlock(), 2);
        assert!(matches!(result, Err(ChannelError::DuplicateLock(_))));
    }

    #[test]
    fn test_direct_transfer_moves_balance() {
        let mut f = fixture(1000);
        let mut transfer = f.ours.create_direct_transfer(30, 7).unwrap();
        transfer.sign(&f.our_key).unwrap();
        f.ours.register_transfer(transfer.clone()).unwrap();
        f.theirs.register_transfer(transfer).unwrap();

        assert_eq!(f.ours.balance(), 970);
        assert_eq!(f.theirs.balance(), 1030);
        assert_eq!(f.ours.our_state().transferred_amount(), 30);
        assert_eq!(f.ours.our_state().locksroot(), EMPTY_LOCKSROOT);
    }

    #[test]
    fn test_register_rejects_replay() {
        let mut f = fixture(1000);
        let transfer = f.send_locked(10, 10, "a");
        let before = f.theirs.snapshot();

        let result = f.theirs.register_transfer(transfer);
        assert_eq!(
            result.err(),
            Some(ChannelError::InvalidNonce { expected: 2, got: 1 })
        );
        assert_eq!(f.theirs.snapshot(), before);
    }

    #[test]
    fn test_register_rejects_wrong_signer() {
        let mut f = fixture(1000);
        let mut transfer = f
            .ours
            .create_locked_transfer(10, 10, Secret::from("a").hashlock(), 1)
            .unwrap();
        transfer.sign(&f.their_key).unwrap();

        let result = f.theirs.register_transfer(transfer);
        assert!(matches!(result, Err(ChannelError::InvalidSignature(_))));
        assert_eq!(f.theirs.partner_state().nonce(), 0);
    }

    #[test]
    fn test_register_rejects_bad_locksroot() {
        let mut f = fixture(1000);
        let mut transfer = f
            .ours
            .create_locked_transfer(10, 10, Secret::from("a").hashlock(), 1)
            .unwrap();
        transfer.header.locksroot = EMPTY_LOCKSROOT;
        transfer.sign(&f.our_key).unwrap();

        let result = f.theirs.register_transfer(transfer);
        assert!(matches!(result, Err(ChannelError::InvalidLocksroot { .. })));
    }

    #[test]
    fn test_register_rejects_duplicate_lock() {
        let mut f = fixture(1000);
        f.send_locked(10, 10, "a");

        // Same hashlock again with a well-formed nonce. The header keeps the
        // current root, so the duplicate is reported ahead of the root.
        let mut transfer = f.ours.create_direct_transfer(0, 2).unwrap();
        transfer.kind = TransferKind::Locked {
            lock: Lock::new(5, 10, Secret::from("a").hashlock()),
        };
        transfer.sign(&f.our_key).unwrap();

        let result = f.theirs.register_transfer(transfer);
        assert!(matches!(result, Err(ChannelError::DuplicateLock(_))));
    }

    #[test]
    fn test_register_rejects_decreasing_transferred_amount() {
        let mut f = fixture(1000);
        let mut direct = f.ours.create_direct_transfer(30, 1).unwrap();
        direct.sign(&f.our_key).unwrap();
        f.theirs.register_transfer(direct).unwrap();

        let mut transfer = f.ours.create_direct_transfer(0, 2).unwrap();
        transfer.header.nonce = 2;
        transfer.header.transferred_amount = 10;
        transfer.sign(&f.our_key).unwrap();

        let result = f.theirs.register_transfer(transfer);
        assert_eq!(
            result.err(),
            Some(ChannelError::TransferredAmountDecreased {
                previous: 30,
                got: 10
            })
        );
    }

    #[test]
    fn test_register_rejects_over_capacity() {
        let mut f = fixture(100);
        let mut transfer = f.ours.create_direct_transfer(0, 1).unwrap();
        transfer.header.transferred_amount = 101;
        transfer.sign(&f.our_key).unwrap();

        let result = f.theirs.register_transfer(transfer);
        assert_eq!(
            result.err(),
            Some(ChannelError::InsufficientCapacity {
                requested: 101,
                available: 100
            })
        );
    }

    #[test]
    fn test_register_rejects_foreign_asset_and_recipient() {
        let mut f = fixture(1000);
        let mut transfer = f.ours.create_direct_transfer(1, 1).unwrap();
        transfer.header.asset = Address([0xbb; 20]);
        transfer.sign(&f.our_key).unwrap();
        assert!(matches!(
            f.theirs.register_transfer(transfer),
            Err(ChannelError::ChannelMismatch(_))
        ));

        let mut transfer = f.ours.create_direct_transfer(1, 1).unwrap();
        transfer.header.recipient = Address([0xcc; 20]);
        transfer.sign(&f.our_key).unwrap();
        assert!(matches!(
            f.theirs.register_transfer(transfer),
            Err(ChannelError::ChannelMismatch(_))
        ));
    }

    #[test]
    fn test_claim_moves_amount_to_sender_transferred() {
        let mut f = fixture(1000);
        f.send_locked(50, 10, "s");

        let claimed = f.ours.claim_locked(&Secret::from("s"), 5).unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].sender, ChannelSide::Ours);
        assert_eq!(f.ours.our_state().transferred_amount(), 50);

        let claimed = f.theirs.claim_locked(&Secret::from("s"), 5).unwrap();
        assert_eq!(claimed[0].sender, ChannelSide::Partner);
        assert_eq!(f.theirs.balance(), 1050);
    }

    #[test]
    fn test_claim_unknown_and_expired() {
        let mut f = fixture(1000);
        assert!(matches!(
            f.ours.claim_locked(&Secret::from("nope"), 1),
            Err(ChannelError::UnknownLock(_))
        ));

        f.send_locked(50, 10, "s");
        assert_eq!(
            f.ours.claim_locked(&Secret::from("s"), 11).err(),
            Some(ChannelError::LockExpired {
                expiration: 10,
                block: 11
            })
        );
        assert_eq!(f.ours.our_state().locked(), 50);
    }

    #[test]
    fn test_expire_boundary() {
        let mut f = fixture(1000);
        f.send_locked(50, 10, "s");
        let hashlock = Secret::from("s").hashlock();

        assert_eq!(
            f.ours.expire_locked(&hashlock, 10).err(),
            Some(ChannelError::LockNotYetExpired {
                expiration: 10,
                block: 10
            })
        );
        let expired = f.ours.expire_locked(&hashlock, 11).unwrap();
        assert_eq!(expired[0].lock.amount, 50);
        assert_eq!(f.ours.balance(), 1000);
        assert_eq!(f.ours.our_state().locksroot(), EMPTY_LOCKSROOT);
    }

    #[test]
    fn test_lock_proof_verifies() {
        let mut f = fixture(1000);
        f.send_locked(10, 10, "a");
        f.send_locked(20, 10, "b");
        f.send_locked(30, 10, "c");

        let hashlock = Secret::from("b").hashlock();
        let (side, proof) = f.theirs.lock_proof(&hashlock).unwrap();
        assert_eq!(side, ChannelSide::Partner);

        let lock = *f.theirs.partner_state().pending_locks().get(&hashlock).unwrap();
        let root = f.theirs.partner_state().locksroot();
        assert!(verify_proof(&lock, &proof, &root));
    }

    #[test]
    fn test_lifecycle() {
        let mut f = fixture(1000);
        f.send_locked(50, 10, "s");

        assert!(matches!(
            f.ours.settle(),
            Err(ChannelError::InvalidStateTransition { .. })
        ));
        f.ours.close(7).unwrap();
        assert_eq!(f.ours.closed_block(), Some(7));

        // No new transfers while closing
        assert_eq!(
            f.ours.create_direct_transfer(1, 2).err(),
            Some(ChannelError::ChannelClosed(ChannelState::Closing))
        );
        // Pending locks still resolve
        f.ours.claim_locked(&Secret::from("s"), 8).unwrap();

        f.ours.settle().unwrap();
        assert!(matches!(
            f.ours.expire_locked(&Hash::ZERO, 100),
            Err(ChannelError::ChannelClosed(ChannelState::Settled))
        ));
        assert!(matches!(
            f.ours.close(9),
            Err(ChannelError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_history_retains_superseded_transfers() {
        let mut f = fixture(1000);
        f.send_locked(1, 10, "a");
        f.send_locked(1, 10, "b");
        f.send_locked(1, 10, "c");

        let nonces: Vec<u64> = f.theirs.transfer_history().map(Transfer::nonce).collect();
        assert_eq!(nonces, vec![1, 2]);
        assert_eq!(
            f.theirs.partner_state().latest_transfer().map(Transfer::nonce),
            Some(3)
        );
    }

    #[test]
    fn test_history_limit() {
        let (our_key, our_address) = generate_identity();
        let (_, their_address) = generate_identity();
        let config = ChannelConfig::default().with_history_limit(2);
        let mut ledger =
            ChannelLedger::new(Address::ZERO, our_address, 100, their_address, 0, config).unwrap();

        for i in 0..5 {
            let mut transfer = ledger.create_direct_transfer(1, i).unwrap();
            transfer.sign(&our_key).unwrap();
            ledger.register_transfer(transfer).unwrap();
        }
        let nonces: Vec<u64> = ledger.transfer_history().map(Transfer::nonce).collect();
        assert_eq!(nonces, vec![3, 4]);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut f = fixture(1000);
        f.send_locked(50, 10, "a");
        let json = serde_json::to_value(f.theirs.snapshot()).unwrap();
        assert_eq!(json["state"], "open");
        assert_eq!(json["partner"]["locked"], 50);
        assert_eq!(json["partner"]["pending_locks"][0]["amount"], 50);
    }

    #[test]
    fn test_snapshot_total_value() {
        let mut f = fixture(1000);
        f.send_locked(50, 10, "a");
        f.send_locked(25, 10, "b");
        assert_eq!(f.ours.snapshot().total_value(), 2000);
        assert_eq!(f.theirs.snapshot().total_value(), 2000);
        assert_eq!(f.theirs.snapshot().partner.pending_locks.len(), 2);
    }
}
