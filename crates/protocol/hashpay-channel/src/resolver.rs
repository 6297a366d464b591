//! Claim/expire resolver.
//!
//! Watches the block height and resolves pending locks across every
//! channel of a [`ChannelManager`]: locks past their expiration are
//! expired, and locks whose secret has been revealed are claimed.
//!
//! Claim and expiry are mutually exclusive for a hashlock. Whichever runs
//! first removes the lock, and the other then fails with `UnknownLock`,
//! which the resolver counts as skipped.
//!
//! A secret is kept until a pass has resolved its locks and none with the
//! same hashlock is left pending in the manager.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use hashpay_crypto::{Address, BlockNumber, Hash};
use hashpay_types::{Lock, Secret};
use hashpay_wire::SecretMessage;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::chain::BlockHeightProvider;
use crate::config::ResolverConfig;
use crate::error::{ChannelError, ChannelResult};
use crate::manager::ChannelManager;

/// Outcome counts of one or more resolver passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverReport {
    /// Block height of the latest pass
    pub block: BlockNumber,
    /// Locks claimed
    pub claimed: usize,
    /// Locks expired
    pub expired: usize,
    /// Locks already removed by another path
    pub skipped: usize,
    /// Resolutions that failed for any other reason
    pub failed: usize,
}

impl ResolverReport {
    /// Add another pass's counts to this one.
    pub fn merge(&mut self, other: &ResolverReport) {
        self.block = self.block.max(other.block);
        self.claimed += other.claimed;
        self.expired += other.expired;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    /// Whether the pass changed any ledger.
    pub fn is_empty(&self) -> bool {
        self.claimed == 0 && self.expired == 0
    }
}

enum Action {
    Expire,
    Claim(Secret),
}

/// Resolves pending locks as blocks pass and secrets are revealed.
pub struct LockResolver {
    chain: Arc<dyn BlockHeightProvider>,
    secrets: RwLock<HashMap<Hash, Secret>>,
    config: ResolverConfig,
}

impl LockResolver {
    /// Create a resolver reading heights from `chain`.
    pub fn new(chain: Arc<dyn BlockHeightProvider>, config: ResolverConfig) -> Self {
        Self {
            chain,
            secrets: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Record a revealed secret. Returns the hashlock it opens.
    pub fn register_secret(&self, secret: Secret) -> ChannelResult<Hash> {
        let hashlock = secret.hashlock();
        self.secrets.write()?.insert(hashlock, secret);
        debug!(hashlock = %hashlock, "Registered secret");
        Ok(hashlock)
    }

    /// Record the secret carried by a reveal message signed by `expected_signer`.
    ///
    /// # Errors
    /// `InvalidSignature` if the message was not signed by `expected_signer`.
    pub fn register_secret_message(
        &self,
        message: &SecretMessage,
        expected_signer: &Address,
    ) -> ChannelResult<Hash> {
        message.verify_signer(expected_signer)?;
        self.register_secret(message.secret())
    }

    /// The known secret for `hashlock`.
    pub fn known_secret(&self, hashlock: &Hash) -> ChannelResult<Option<Secret>> {
        Ok(self.secrets.read()?.get(hashlock).cloned())
    }

    /// Resolve every pending lock of `manager` once, at the current height.
    ///
    /// Secrets of hashlocks this pass resolved, and that are no longer
    /// pending on any channel, are dropped afterwards.
    pub fn resolve_once(&self, manager: &ChannelManager) -> ChannelResult<ResolverReport> {
        let block = self.chain.block_number();
        let mut report = ResolverReport {
            block,
            ..Default::default()
        };

        let actions: Vec<(Address, Lock, Action)> = {
            let secrets = self.secrets.read()?;
            manager
                .pending_locks()?
                .into_iter()
                .filter_map(|(partner, lock)| {
                    if lock.is_expired(block) {
                        Some((partner, lock, Action::Expire))
                    } else {
                        secrets
                            .get(&lock.hashlock)
                            .map(|secret| (partner, lock, Action::Claim(secret.clone())))
                    }
                })
                .collect()
        };

        let mut resolved = HashSet::new();
        for (partner, lock, action) in actions {
            let channel = manager.channel(&partner)?;
            let mut ledger = channel.write()?;
            let result = match &action {
                Action::Expire => ledger.expire_locked(&lock.hashlock, block),
                Action::Claim(secret) => ledger.claim_locked(secret, block),
            };
            match (result, action) {
                (Ok(locks), Action::Expire) => {
                    report.expired += locks.len();
                    resolved.insert(lock.hashlock);
                }
                (Ok(locks), Action::Claim(_)) => {
                    report.claimed += locks.len();
                    resolved.insert(lock.hashlock);
                }
                (Err(ChannelError::UnknownLock(_)), _) => {
                    report.skipped += 1;
                    resolved.insert(lock.hashlock);
                }
                (Err(e), _) => {
                    warn!(
                        partner = %partner,
                        hashlock = %lock.hashlock,
                        block,
                        error = %e,
                        "Failed to resolve lock"
                    );
                    report.failed += 1;
                }
            }
        }

        if !resolved.is_empty() {
            self.forget_resolved(manager, &resolved)?;
        }

        if !report.is_empty() {
            info!(
                block,
                claimed = report.claimed,
                expired = report.expired,
                "Resolved locks"
            );
        }
        Ok(report)
    }

    /// Drop the secrets of `resolved` hashlocks that no channel still holds.
    fn forget_resolved(
        &self,
        manager: &ChannelManager,
        resolved: &HashSet<Hash>,
    ) -> ChannelResult<()> {
        let pending: HashSet<Hash> = manager
            .pending_locks()?
            .into_iter()
            .map(|(_, lock)| lock.hashlock)
            .collect();
        let mut secrets = self.secrets.write()?;
        for hashlock in resolved.difference(&pending) {
            if secrets.remove(hashlock).is_some() {
                debug!(hashlock = %hashlock, "Forgot resolved secret");
            }
        }
        Ok(())
    }

    /// Poll the block height and resolve locks whenever it advances.
    ///
    /// Runs until `shutdown` turns true or its sender is dropped, then
    /// returns the totals of every pass.
    pub async fn run(
        &self,
        manager: &ChannelManager,
        mut shutdown: watch::Receiver<bool>,
    ) -> ChannelResult<ResolverReport> {
        let mut total = ResolverReport::default();
        if *shutdown.borrow() {
            return Ok(total);
        }

        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_block: Option<BlockNumber> = None;

        info!(
            asset = %manager.asset(),
            poll_interval = ?self.config.poll_interval,
            "Lock resolver started"
        );

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Shutdown signal received, stopping lock resolver");
                        break;
                    }
                }

                _ = ticker.tick() => {
                    let block = self.chain.block_number();
                    if last_block != Some(block) {
                        last_block = Some(block);
                        let report = self.resolve_once(manager)?;
                        total.merge(&report);
                    }
                }
            }
        }

        Ok(total)
    }
}

impl std::fmt::Debug for LockResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ManualBlockHeight;
    use crate::config::ChannelConfig;
    use crate::keys::InMemoryKeyProvider;
    use hashpay_crypto::generate_identity;
    use std::time::Duration;

    struct Fixture {
        chain: Arc<ManualBlockHeight>,
        manager: Arc<ChannelManager>,
        resolver: Arc<LockResolver>,
        partner: Address,
    }

    fn fixture() -> Fixture {
        let chain = Arc::new(ManualBlockHeight::new(0));
        let (key, _) = generate_identity();
        let keys = InMemoryKeyProvider::with_key(key).unwrap();
        let our_address = *keys.addresses().next().unwrap();
        let manager = ChannelManager::new(
            Address([0xaa; 20]),
            our_address,
            ChannelConfig::default(),
            chain.clone(),
            Arc::new(keys),
        );
        let partner = Address([0x01; 20]);
        manager.open_channel(partner, 1000, 0).unwrap();
        let resolver = LockResolver::new(
            chain.clone(),
            ResolverConfig::default().with_poll_interval(Duration::from_millis(10)),
        );
        Fixture {
            chain,
            manager: Arc::new(manager),
            resolver: Arc::new(resolver),
            partner,
        }
    }

    #[test]
    fn test_resolve_once_claims_and_expires() {
        let f = fixture();
        let a = Secret::from("a");
        let b = Secret::from("b");
        let c = Secret::from("c");
        f.manager.send_locked_transfer(&f.partner, 10, 5, a.hashlock(), 1).unwrap();
        f.manager.send_locked_transfer(&f.partner, 20, 8, b.hashlock(), 2).unwrap();
        f.manager.send_locked_transfer(&f.partner, 30, 8, c.hashlock(), 3).unwrap();

        f.resolver.register_secret(b.clone()).unwrap();
        f.chain.set(6);

        let report = f.resolver.resolve_once(&f.manager).unwrap();
        assert_eq!(report.block, 6);
        assert_eq!(report.expired, 1);
        assert_eq!(report.claimed, 1);
        assert_eq!(report.failed, 0);

        let snapshot = f.manager.snapshot(&f.partner).unwrap();
        assert_eq!(snapshot.ours.transferred_amount, 20);
        assert_eq!(snapshot.ours.pending_locks.len(), 1);

        // Nothing left to do until c expires
        let report = f.resolver.resolve_once(&f.manager).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_expired_lock_is_not_claimed() {
        let f = fixture();
        let a = Secret::from("a");
        f.manager.send_locked_transfer(&f.partner, 10, 5, a.hashlock(), 1).unwrap();
        f.resolver.register_secret(a.clone()).unwrap();
        f.chain.set(9);

        let report = f.resolver.resolve_once(&f.manager).unwrap();
        assert_eq!(report.expired, 1);
        assert_eq!(report.claimed, 0);
        assert_eq!(f.manager.snapshot(&f.partner).unwrap().ours.transferred_amount, 0);
        assert_eq!(f.resolver.known_secret(&a.hashlock()).unwrap(), None);
    }

    #[test]
    fn test_claimed_secret_is_forgotten() {
        let f = fixture();
        let a = Secret::from("a");
        let early = Secret::from("early");
        f.manager.send_locked_transfer(&f.partner, 10, 5, a.hashlock(), 1).unwrap();
        f.resolver.register_secret(a.clone()).unwrap();
        f.resolver.register_secret(early.clone()).unwrap();

        let report = f.resolver.resolve_once(&f.manager).unwrap();
        assert_eq!(report.claimed, 1);
        assert_eq!(f.resolver.known_secret(&a.hashlock()).unwrap(), None);
        // No lock for this one yet, so it is kept for a later pass
        assert_eq!(f.resolver.known_secret(&early.hashlock()).unwrap(), Some(early));
    }

    #[test]
    fn test_register_secret_message_checks_signer() {
        let f = fixture();
        let (key, signer) = generate_identity();
        let secret = Secret::from([7u8; 32]);
        let mut message = SecretMessage::new(1, &secret).unwrap();
        message.sign(&key).unwrap();

        assert!(matches!(
            f.resolver.register_secret_message(&message, &Address([0x09; 20])),
            Err(ChannelError::InvalidSignature(_))
        ));
        assert_eq!(f.resolver.known_secret(&secret.hashlock()).unwrap(), None);

        let hashlock = f.resolver.register_secret_message(&message, &signer).unwrap();
        assert_eq!(hashlock, secret.hashlock());
        assert_eq!(f.resolver.known_secret(&hashlock).unwrap(), Some(secret));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_resolves_on_new_blocks_until_shutdown() {
        let f = fixture();
        let a = Secret::from("a");
        f.manager.send_locked_transfer(&f.partner, 10, 5, a.hashlock(), 1).unwrap();

        let (tx, rx) = watch::channel(false);
        let resolver = Arc::clone(&f.resolver);
        let manager = Arc::clone(&f.manager);
        let handle = tokio::spawn(async move { resolver.run(&manager, rx).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        f.chain.set(6);
        tokio::time::sleep(Duration::from_millis(50)).await;

        tx.send(true).unwrap();
        let total = handle.await.unwrap().unwrap();
        assert_eq!(total.expired, 1);
        assert_eq!(total.block, 6);
        assert!(f.manager.pending_locks().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_returns_immediately_when_already_shut_down() {
        let f = fixture();
        let (_tx, rx) = watch::channel(true);
        let total = f.resolver.run(&f.manager, rx).await.unwrap();
        assert_eq!(total, ResolverReport::default());
    }
}
