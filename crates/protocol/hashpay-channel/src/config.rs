//! Configuration types for channels and the lock resolver.

use std::time::Duration;

use hashpay_crypto::BlockNumber;
use hashpay_types::{Amount, DEFAULT_REVEAL_TIMEOUT, DEFAULT_SETTLE_TIMEOUT};

/// Configuration for channel behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Minimum blocks between now and a new lock's expiration.
    pub reveal_timeout: BlockNumber,
    /// Maximum blocks between now and a new lock's expiration.
    pub settle_timeout: BlockNumber,
    /// Minimum combined deposit to open a channel.
    pub min_deposit: Amount,
    /// Superseded transfers kept per channel end for audit.
    pub history_limit: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            reveal_timeout: DEFAULT_REVEAL_TIMEOUT,
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
            min_deposit: 0,
            history_limit: 1024,
        }
    }
}

impl ChannelConfig {
    /// Create a channel configuration with explicit timeouts.
    pub fn new(reveal_timeout: BlockNumber, settle_timeout: BlockNumber) -> Self {
        Self {
            reveal_timeout,
            settle_timeout,
            ..Default::default()
        }
    }

    /// Set the reveal timeout.
    pub fn with_reveal_timeout(mut self, blocks: BlockNumber) -> Self {
        self.reveal_timeout = blocks;
        self
    }

    /// Set the settle timeout.
    pub fn with_settle_timeout(mut self, blocks: BlockNumber) -> Self {
        self.settle_timeout = blocks;
        self
    }

    /// Set the minimum combined deposit.
    pub fn with_min_deposit(mut self, amount: Amount) -> Self {
        self.min_deposit = amount;
        self
    }

    /// Set how many superseded transfers to keep per channel end.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Range of expirations accepted for a lock created at `block`.
    pub fn expiration_window(&self, block: BlockNumber) -> (BlockNumber, BlockNumber) {
        (
            block.saturating_add(self.reveal_timeout),
            block.saturating_add(self.settle_timeout),
        )
    }
}

/// Configuration for the background lock resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// How often to check the block height.
    pub poll_interval: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl ResolverConfig {
    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
