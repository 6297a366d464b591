//! Helper functions for creating test fixtures.
//!
//! Provides seeded identities and pre-built two-party channels, either as
//! a pair of bare ledgers or as a pair of managers sharing a mock chain.

use hashpay_channel::{
    ChannelConfig, ChannelLedger, ChannelManager, ChannelResult, InMemoryKeyProvider, ResolvedLock,
};
use hashpay_crypto::{
    address_from_private_key, keccak256, private_key_from_seed, Address, BlockNumber, PrivateKey,
};
use hashpay_types::{Amount, Secret};
use hashpay_wire::Transfer;
use std::sync::Arc;

use crate::MockChain;

/// A channel participant with its key.
#[derive(Debug, Clone)]
pub struct Participant {
    pub key: PrivateKey,
    pub address: Address,
}

/// Deterministic identity derived from `seed`.
pub fn test_identity(seed: &str) -> Participant {
    let key = private_key_from_seed(seed.as_bytes()).unwrap();
    let address = address_from_private_key(&key).unwrap();
    Participant { key, address }
}

/// Deterministic asset address derived from `seed`.
pub fn test_asset(seed: &str) -> Address {
    let digest = keccak256(seed.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest.0[..20]);
    Address(bytes)
}

/// Which participant of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Alice,
    Bob,
}

// =============================================================================
// Ledger Pair
// =============================================================================

/// Both parties' ledgers of one channel.
///
/// Every helper that sends a transfer signs it with the sender's key and
/// registers it on both ledgers, sender first.
pub struct LedgerPair {
    pub alice: Participant,
    pub bob: Participant,
    pub alice_ledger: ChannelLedger,
    pub bob_ledger: ChannelLedger,
}

/// Create a channel between two seeded identities with default config.
pub fn ledger_pair(alice_deposit: Amount, bob_deposit: Amount) -> LedgerPair {
    ledger_pair_with_config(alice_deposit, bob_deposit, ChannelConfig::default())
}

/// Create a channel between two seeded identities.
pub fn ledger_pair_with_config(
    alice_deposit: Amount,
    bob_deposit: Amount,
    config: ChannelConfig,
) -> LedgerPair {
    let alice = test_identity("alice");
    let bob = test_identity("bob");
    let asset = test_asset("asset:0");
    let alice_ledger = ChannelLedger::new(
        asset,
        alice.address,
        alice_deposit,
        bob.address,
        bob_deposit,
        config.clone(),
    )
    .unwrap();
    let bob_ledger = ChannelLedger::new(
        asset,
        bob.address,
        bob_deposit,
        alice.address,
        alice_deposit,
        config,
    )
    .unwrap();
    LedgerPair {
        alice,
        bob,
        alice_ledger,
        bob_ledger,
    }
}

impl LedgerPair {
    /// The ledger of `party`.
    pub fn ledger(&self, party: Party) -> &ChannelLedger {
        match party {
            Party::Alice => &self.alice_ledger,
            Party::Bob => &self.bob_ledger,
        }
    }

    /// Build with `build` on the sender's ledger, sign, and register on both.
    ///
    /// Stops at the first ledger that rejects the transfer.
    pub fn send(
        &mut self,
        from: Party,
        build: impl FnOnce(&ChannelLedger) -> ChannelResult<Transfer>,
    ) -> ChannelResult<Transfer> {
        let (sender, own, other) = match from {
            Party::Alice => (&self.alice, &mut self.alice_ledger, &mut self.bob_ledger),
            Party::Bob => (&self.bob, &mut self.bob_ledger, &mut self.alice_ledger),
        };
        let mut transfer = build(own)?;
        transfer.sign(&sender.key)?;
        own.register_transfer(transfer.clone())?;
        other.register_transfer(transfer.clone())?;
        Ok(transfer)
    }

    /// Send a direct transfer from `from`.
    pub fn send_direct(&mut self, from: Party, amount: Amount) -> ChannelResult<Transfer> {
        self.send(from, |ledger| ledger.create_direct_transfer(amount, 0))
    }

    /// Send a locked transfer from `from` opened by `secret`.
    pub fn send_locked(
        &mut self,
        from: Party,
        amount: Amount,
        expiration: BlockNumber,
        secret: &Secret,
    ) -> ChannelResult<Transfer> {
        let hashlock = secret.hashlock();
        self.send(from, |ledger| {
            ledger.create_locked_transfer(amount, expiration, hashlock, 0)
        })
    }

    /// Claim `secret` on both ledgers at `block`.
    pub fn claim_both(
        &mut self,
        secret: &Secret,
        block: BlockNumber,
    ) -> ChannelResult<Vec<ResolvedLock>> {
        let resolved = self.alice_ledger.claim_locked(secret, block)?;
        self.bob_ledger.claim_locked(secret, block)?;
        Ok(resolved)
    }

    /// Assert both ledgers hold mirrored views of the channel.
    pub fn assert_consistent(&self) {
        let alice = self.alice_ledger.snapshot();
        let bob = self.bob_ledger.snapshot();
        assert_eq!(alice.ours, bob.partner, "alice's end diverged");
        assert_eq!(alice.partner, bob.ours, "bob's end diverged");
        assert_eq!(alice.state, bob.state, "channel state diverged");
    }
}

// =============================================================================
// Manager Pair
// =============================================================================

/// Two nodes with one channel between them and a shared mock chain.
pub struct ManagerPair {
    pub chain: MockChain,
    pub alice: Participant,
    pub bob: Participant,
    pub alice_manager: ChannelManager,
    pub bob_manager: ChannelManager,
}

/// Create two managers with a channel funded by `deposit` on each side.
pub fn manager_pair(deposit: Amount, config: ChannelConfig) -> ManagerPair {
    let chain = MockChain::new();
    let alice = test_identity("alice");
    let bob = test_identity("bob");
    let asset = test_asset("asset:0");

    let alice_manager = node_manager(asset, &alice, &config, &chain);
    let bob_manager = node_manager(asset, &bob, &config, &chain);
    alice_manager
        .open_channel(bob.address, deposit, deposit)
        .unwrap();
    bob_manager
        .open_channel(alice.address, deposit, deposit)
        .unwrap();

    ManagerPair {
        chain,
        alice,
        bob,
        alice_manager,
        bob_manager,
    }
}

fn node_manager(
    asset: Address,
    participant: &Participant,
    config: &ChannelConfig,
    chain: &MockChain,
) -> ChannelManager {
    let keys = InMemoryKeyProvider::with_key(participant.key.clone()).unwrap();
    ChannelManager::new(
        asset,
        participant.address,
        config.clone(),
        Arc::new(chain.clone()),
        Arc::new(keys),
    )
}

impl ManagerPair {
    /// Deliver a transfer sent by alice to bob's node.
    pub fn deliver_to_bob(&self, transfer: Transfer) -> ChannelResult<()> {
        self.bob_manager
            .register_transfer(&self.alice.address, transfer)
    }

    /// Deliver a transfer sent by bob to alice's node.
    pub fn deliver_to_alice(&self, transfer: Transfer) -> ChannelResult<()> {
        self.alice_manager
            .register_transfer(&self.bob.address, transfer)
    }
}
