//! Per-asset channel manager.
//!
//! Owns every channel ledger of one asset, keyed by partner address. Each
//! ledger sits behind its own `RwLock`: mutations of one channel are
//! serialized while different channels proceed in parallel, and snapshots
//! are taken under the read lock.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use hashpay_crypto::{Address, BlockNumber, Hash};
use hashpay_types::{Amount, Lock, Secret};
use hashpay_wire::Transfer;
use tracing::{info, warn};

use crate::chain::BlockHeightProvider;
use crate::config::ChannelConfig;
use crate::error::{ChannelError, ChannelResult};
use crate::keys::SigningKeyProvider;
use crate::ledger::{ChannelLedger, ChannelSnapshot, ResolvedLock};

/// Shared handle to one channel.
pub type SharedLedger = Arc<RwLock<ChannelLedger>>;

/// Channels of one local node for one asset.
pub struct ChannelManager {
    asset: Address,
    our_address: Address,
    config: ChannelConfig,
    chain: Arc<dyn BlockHeightProvider>,
    keys: Arc<dyn SigningKeyProvider>,
    channels: RwLock<HashMap<Address, SharedLedger>>,
}

impl ChannelManager {
    /// Create a manager with no channels.
    pub fn new(
        asset: Address,
        our_address: Address,
        config: ChannelConfig,
        chain: Arc<dyn BlockHeightProvider>,
        keys: Arc<dyn SigningKeyProvider>,
    ) -> Self {
        Self {
            asset,
            our_address,
            config,
            chain,
            keys,
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Asset managed.
    pub fn asset(&self) -> Address {
        self.asset
    }

    /// Local node address.
    pub fn our_address(&self) -> Address {
        self.our_address
    }

    /// Current block height from the provider.
    pub fn block_number(&self) -> BlockNumber {
        self.chain.block_number()
    }

    /// Register a newly opened channel with `partner`.
    ///
    /// # Errors
    /// - `ChannelAlreadyExists` if a channel with `partner` is registered
    /// - `DepositTooLow` or `ChannelMismatch` from [`ChannelLedger::new`]
    pub fn open_channel(
        &self,
        partner: Address,
        our_deposit: Amount,
        partner_deposit: Amount,
    ) -> ChannelResult<SharedLedger> {
        let mut channels = self.channels.write()?;
        if channels.contains_key(&partner) {
            return Err(ChannelError::ChannelAlreadyExists(partner));
        }
        let ledger = ChannelLedger::new(
            self.asset,
            self.our_address,
            our_deposit,
            partner,
            partner_deposit,
            self.config.clone(),
        )?;
        let shared = Arc::new(RwLock::new(ledger));
        channels.insert(partner, Arc::clone(&shared));

        info!(
            asset = %self.asset,
            partner = %partner,
            our_deposit,
            partner_deposit,
            "Opened channel"
        );
        Ok(shared)
    }

    /// Handle to the channel with `partner`.
    pub fn channel(&self, partner: &Address) -> ChannelResult<SharedLedger> {
        self.channels
            .read()?
            .get(partner)
            .cloned()
            .ok_or(ChannelError::ChannelNotFound(*partner))
    }

    /// Partners with a registered channel, in address order.
    pub fn partners(&self) -> ChannelResult<Vec<Address>> {
        let mut partners: Vec<Address> = self.channels.read()?.keys().copied().collect();
        partners.sort();
        Ok(partners)
    }

    /// Consistent read-only view of the channel with `partner`.
    pub fn snapshot(&self, partner: &Address) -> ChannelResult<ChannelSnapshot> {
        let channel = self.channel(partner)?;
        let ledger = channel.read()?;
        Ok(ledger.snapshot())
    }

    // =========================================================================
    // Outgoing Transfers
    // =========================================================================

    /// Sign `transfer` with the key of our address.
    ///
    /// # Errors
    /// `Signing` if the key provider has no key for our address.
    pub fn sign_transfer(&self, transfer: &mut Transfer) -> ChannelResult<()> {
        let key = self.keys.signing_key(&self.our_address).ok_or_else(|| {
            ChannelError::Signing(format!("no signing key for {}", self.our_address))
        })?;
        transfer.sign(&key)?;
        Ok(())
    }

    /// Build and sign a direct transfer without applying it.
    pub fn create_direct_transfer(
        &self,
        partner: &Address,
        amount: Amount,
        identifier: u64,
    ) -> ChannelResult<Transfer> {
        self.propose(partner, |ledger| ledger.create_direct_transfer(amount, identifier))
    }

    /// Build and sign a locked transfer without applying it.
    ///
    /// # Errors
    /// `InvalidExpiration` unless `expiration` lies within the reveal and
    /// settle timeouts from the current block, plus the ledger's errors.
    pub fn create_locked_transfer(
        &self,
        partner: &Address,
        amount: Amount,
        expiration: BlockNumber,
        hashlock: Hash,
        identifier: u64,
    ) -> ChannelResult<Transfer> {
        self.check_expiration(expiration)?;
        self.propose(partner, |ledger| {
            ledger.create_locked_transfer(amount, expiration, hashlock, identifier)
        })
    }

    /// Build and sign a mediated transfer without applying it.
    pub fn create_mediated_transfer(
        &self,
        partner: &Address,
        lock: Lock,
        identifier: u64,
        target: Address,
        initiator: Address,
        fee: Amount,
    ) -> ChannelResult<Transfer> {
        self.check_expiration(lock.expiration)?;
        self.propose(partner, |ledger| {
            ledger.create_mediated_transfer(lock, identifier, target, initiator, fee)
        })
    }

    /// Build and sign a refund transfer without applying it.
    pub fn create_refund_transfer(
        &self,
        partner: &Address,
        lock: Lock,
        identifier: u64,
    ) -> ChannelResult<Transfer> {
        self.check_expiration(lock.expiration)?;
        self.propose(partner, |ledger| {
            ledger.create_refund_transfer(lock.amount, lock.expiration, lock.hashlock, identifier)
        })
    }

    /// Build, sign and apply a direct transfer under one write lock.
    ///
    /// Returns the signed transfer for delivery to the partner.
    pub fn send_direct_transfer(
        &self,
        partner: &Address,
        amount: Amount,
        identifier: u64,
    ) -> ChannelResult<Transfer> {
        self.send(partner, |ledger| ledger.create_direct_transfer(amount, identifier))
    }

    /// Build, sign and apply a locked transfer under one write lock.
    pub fn send_locked_transfer(
        &self,
        partner: &Address,
        amount: Amount,
        expiration: BlockNumber,
        hashlock: Hash,
        identifier: u64,
    ) -> ChannelResult<Transfer> {
        self.check_expiration(expiration)?;
        self.send(partner, |ledger| {
            ledger.create_locked_transfer(amount, expiration, hashlock, identifier)
        })
    }

    fn check_expiration(&self, expiration: BlockNumber) -> ChannelResult<()> {
        let (min, max) = self.config.expiration_window(self.chain.block_number());
        if expiration < min || expiration > max {
            return Err(ChannelError::InvalidExpiration {
                expiration,
                min,
                max,
            });
        }
        Ok(())
    }

    fn propose(
        &self,
        partner: &Address,
        create: impl FnOnce(&ChannelLedger) -> ChannelResult<Transfer>,
    ) -> ChannelResult<Transfer> {
        let channel = self.channel(partner)?;
        let mut transfer = {
            let ledger = channel.read()?;
            create(&ledger)?
        };
        self.sign_transfer(&mut transfer)?;
        Ok(transfer)
    }

    fn send(
        &self,
        partner: &Address,
        create: impl FnOnce(&ChannelLedger) -> ChannelResult<Transfer>,
    ) -> ChannelResult<Transfer> {
        let channel = self.channel(partner)?;
        let mut ledger = channel.write()?;
        let mut transfer = create(&ledger)?;
        self.sign_transfer(&mut transfer)?;
        ledger.register_transfer(transfer.clone())?;
        Ok(transfer)
    }

    // =========================================================================
    // Ledger Mutations
    // =========================================================================

    /// Validate and apply a signed transfer on the channel with `partner`.
    ///
    /// A transfer whose lock already expired at the current block is
    /// rejected with `LockExpired` before the ledger sees it.
    pub fn register_transfer(&self, partner: &Address, transfer: Transfer) -> ChannelResult<()> {
        let channel = self.channel(partner)?;
        if let Some(lock) = transfer.lock() {
            let block = self.chain.block_number();
            if lock.is_expired(block) {
                warn!(
                    asset = %self.asset,
                    partner = %partner,
                    hashlock = %lock.hashlock,
                    expiration = lock.expiration,
                    block,
                    "Rejected transfer with expired lock"
                );
                return Err(ChannelError::LockExpired {
                    expiration: lock.expiration,
                    block,
                });
            }
        }
        let mut ledger = channel.write()?;
        ledger.register_transfer(transfer)
    }

    /// Claim the locks opened by `secret` at the current block.
    pub fn claim_locked(
        &self,
        partner: &Address,
        secret: &Secret,
    ) -> ChannelResult<Vec<ResolvedLock>> {
        let channel = self.channel(partner)?;
        let mut ledger = channel.write()?;
        ledger.claim_locked(secret, self.chain.block_number())
    }

    /// Expire the locks with `hashlock` at the current block.
    pub fn expire_locked(
        &self,
        partner: &Address,
        hashlock: &Hash,
    ) -> ChannelResult<Vec<ResolvedLock>> {
        let channel = self.channel(partner)?;
        let mut ledger = channel.write()?;
        ledger.expire_locked(hashlock, self.chain.block_number())
    }

    /// Record the on-chain close of the channel at the current block.
    pub fn close_channel(&self, partner: &Address) -> ChannelResult<()> {
        let channel = self.channel(partner)?;
        let mut ledger = channel.write()?;
        ledger.close(self.chain.block_number())
    }

    /// Record the on-chain settlement of the channel.
    pub fn settle_channel(&self, partner: &Address) -> ChannelResult<()> {
        let channel = self.channel(partner)?;
        let mut ledger = channel.write()?;
        ledger.settle()
    }

    /// Pending locks of every channel that still accepts lock resolution.
    pub fn pending_locks(&self) -> ChannelResult<Vec<(Address, Lock)>> {
        let channels: Vec<(Address, SharedLedger)> = self
            .channels
            .read()?
            .iter()
            .map(|(partner, channel)| (*partner, Arc::clone(channel)))
            .collect();

        let mut pending = Vec::new();
        for (partner, channel) in channels {
            let ledger = channel.read()?;
            if !ledger.state().accepts_lock_resolution() {
                continue;
            }
            pending.extend(ledger.pending_locks().map(|(_, lock)| (partner, *lock)));
        }
        Ok(pending)
    }
}

impl std::fmt::Debug for ChannelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelManager")
            .field("asset", &self.asset)
            .field("our_address", &self.our_address)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ManualBlockHeight;
    use crate::keys::InMemoryKeyProvider;
    use hashpay_crypto::generate_identity;

    fn manager(chain: Arc<ManualBlockHeight>) -> (ChannelManager, Address) {
        let (key, _) = generate_identity();
        let keys = InMemoryKeyProvider::with_key(key).unwrap();
        let our_address = *keys.addresses().next().unwrap();
        let manager = ChannelManager::new(
            Address([0xaa; 20]),
            our_address,
            ChannelConfig::default(),
            chain,
            Arc::new(keys),
        );
        (manager, our_address)
    }

    #[test]
    fn test_open_channel_twice() {
        let (manager, _) = manager(Arc::new(ManualBlockHeight::new(0)));
        let partner = Address([0x01; 20]);
        manager.open_channel(partner, 10, 10).unwrap();
        assert_eq!(
            manager.open_channel(partner, 10, 10).err(),
            Some(ChannelError::ChannelAlreadyExists(partner))
        );
        assert_eq!(manager.partners().unwrap(), vec![partner]);
    }

    #[test]
    fn test_unknown_channel() {
        let (manager, _) = manager(Arc::new(ManualBlockHeight::new(0)));
        let partner = Address([0x01; 20]);
        assert_eq!(
            manager.snapshot(&partner).err(),
            Some(ChannelError::ChannelNotFound(partner))
        );
    }

    #[test]
    fn test_send_direct_applies_and_signs() {
        let (manager, our_address) = manager(Arc::new(ManualBlockHeight::new(0)));
        let partner = Address([0x01; 20]);
        manager.open_channel(partner, 100, 0).unwrap();

        let transfer = manager.send_direct_transfer(&partner, 40, 1).unwrap();
        assert_eq!(transfer.recover_signer().unwrap(), our_address);

        let snapshot = manager.snapshot(&partner).unwrap();
        assert_eq!(snapshot.ours.nonce, 1);
        assert_eq!(snapshot.ours.balance, 60);
        assert_eq!(snapshot.partner.balance, 40);
    }

    #[test]
    fn test_register_rejects_expired_lock() {
        let (manager, our_address) = manager(Arc::new(ManualBlockHeight::new(10)));
        let (partner_key, partner) = generate_identity();
        manager.open_channel(partner, 100, 100).unwrap();

        let partner_ledger = ChannelLedger::new(
            manager.asset(),
            partner,
            100,
            our_address,
            100,
            ChannelConfig::default(),
        )
        .unwrap();
        let mut transfer = partner_ledger
            .create_locked_transfer(10, 9, Secret::from("s").hashlock(), 1)
            .unwrap();
        transfer.sign(&partner_key).unwrap();

        assert_eq!(
            manager.register_transfer(&partner, transfer).err(),
            Some(ChannelError::LockExpired {
                expiration: 9,
                block: 10
            })
        );
        let snapshot = manager.snapshot(&partner).unwrap();
        assert_eq!(snapshot.partner.nonce, 0);
        assert_eq!(snapshot.partner.locked, 0);

        // Still valid at its expiration block
        let mut transfer = partner_ledger
            .create_locked_transfer(10, 10, Secret::from("t").hashlock(), 2)
            .unwrap();
        transfer.sign(&partner_key).unwrap();
        manager.register_transfer(&partner, transfer).unwrap();
        assert_eq!(manager.snapshot(&partner).unwrap().partner.locked, 10);
    }

    #[test]
    fn test_expiration_window() {
        let chain = Arc::new(ManualBlockHeight::new(100));
        let (manager, _) = manager(Arc::clone(&chain));
        let partner = Address([0x01; 20]);
        manager.open_channel(partner, 100, 0).unwrap();
        let hashlock = Secret::from("s").hashlock();

        assert_eq!(
            manager.create_locked_transfer(&partner, 1, 102, hashlock, 1).err(),
            Some(ChannelError::InvalidExpiration {
                expiration: 102,
                min: 103,
                max: 150
            })
        );
        assert!(manager.create_locked_transfer(&partner, 1, 151, hashlock, 1).is_err());
        assert!(manager.create_locked_transfer(&partner, 1, 103, hashlock, 1).is_ok());
        assert!(manager.create_locked_transfer(&partner, 1, 150, hashlock, 1).is_ok());

        // Create alone leaves the ledger untouched
        assert_eq!(manager.snapshot(&partner).unwrap().ours.nonce, 0);
    }

    #[test]
    fn test_missing_key_fails_signing() {
        let chain = Arc::new(ManualBlockHeight::new(0));
        let manager = ChannelManager::new(
            Address::ZERO,
            Address([0x02; 20]),
            ChannelConfig::default(),
            chain,
            Arc::new(InMemoryKeyProvider::new()),
        );
        let partner = Address([0x01; 20]);
        manager.open_channel(partner, 10, 0).unwrap();

        assert!(matches!(
            manager.send_direct_transfer(&partner, 1, 1),
            Err(ChannelError::Signing(_))
        ));
        assert_eq!(manager.snapshot(&partner).unwrap().ours.nonce, 0);
    }

    #[test]
    fn test_claim_and_expire_use_provider_height() {
        let chain = Arc::new(ManualBlockHeight::new(0));
        let (manager, _) = manager(Arc::clone(&chain));
        let partner = Address([0x01; 20]);
        manager.open_channel(partner, 100, 0).unwrap();

        let a = Secret::from("a");
        let b = Secret::from("b");
        manager.send_locked_transfer(&partner, 10, 5, a.hashlock(), 1).unwrap();
        manager.send_locked_transfer(&partner, 20, 5, b.hashlock(), 2).unwrap();
        assert_eq!(manager.pending_locks().unwrap().len(), 2);

        chain.set(5);
        manager.claim_locked(&partner, &a).unwrap();
        assert!(matches!(
            manager.expire_locked(&partner, &b.hashlock()),
            Err(ChannelError::LockNotYetExpired { .. })
        ));

        chain.set(6);
        manager.expire_locked(&partner, &b.hashlock()).unwrap();

        let snapshot = manager.snapshot(&partner).unwrap();
        assert_eq!(snapshot.ours.transferred_amount, 10);
        assert!(snapshot.ours.pending_locks.is_empty());
    }

    #[test]
    fn test_settled_channel_has_no_resolvable_locks() {
        let chain = Arc::new(ManualBlockHeight::new(0));
        let (manager, _) = manager(Arc::clone(&chain));
        let partner = Address([0x01; 20]);
        manager.open_channel(partner, 100, 0).unwrap();
        manager
            .send_locked_transfer(&partner, 10, 5, Secret::from("a").hashlock(), 1)
            .unwrap();

        manager.close_channel(&partner).unwrap();
        assert_eq!(manager.pending_locks().unwrap().len(), 1);
        manager.settle_channel(&partner).unwrap();
        assert!(manager.pending_locks().unwrap().is_empty());
    }
}
