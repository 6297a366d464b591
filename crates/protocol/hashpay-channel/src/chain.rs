//! Block-height provider seam.
//!
//! Lock timeouts are expressed in blocks, never wall-clock time. The ledger
//! takes the height as an argument; the manager and the resolver read it
//! from an injected provider.

use std::sync::atomic::{AtomicU64, Ordering};

use hashpay_crypto::BlockNumber;

/// Source of the current settlement-chain block height.
pub trait BlockHeightProvider: Send + Sync {
    /// Latest observed block number.
    fn block_number(&self) -> BlockNumber;
}

/// Block height fed by an external watcher.
///
/// The watcher calls [`ManualBlockHeight::set`] whenever it sees a new
/// block; readers observe the value without locking.
#[derive(Debug, Default)]
pub struct ManualBlockHeight {
    height: AtomicU64,
}

impl ManualBlockHeight {
    /// Start at `height`.
    pub fn new(height: BlockNumber) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    /// Record a newly observed height. Heights never move backwards.
    pub fn set(&self, height: BlockNumber) {
        self.height.fetch_max(height, Ordering::SeqCst);
    }

    /// Advance by `blocks` and return the new height.
    pub fn advance(&self, blocks: BlockNumber) -> BlockNumber {
        self.height.fetch_add(blocks, Ordering::SeqCst) + blocks
    }
}

impl BlockHeightProvider for ManualBlockHeight {
    fn block_number(&self) -> BlockNumber {
        self.height.load(Ordering::SeqCst)
    }
}
