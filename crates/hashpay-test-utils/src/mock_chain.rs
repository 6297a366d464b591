//! Mock block-height provider for testing.
//!
//! Heights only move when a test mines blocks, so lock timeouts can be
//! driven deterministically.

use hashpay_channel::BlockHeightProvider;
use hashpay_crypto::BlockNumber;
use std::sync::{Arc, RwLock};

#[derive(Default)]
struct MockChainInner {
    /// Current block height.
    height: BlockNumber,
    /// Number of `block_number` calls served.
    queries: u64,
}

/// A mock chain whose height advances only when mined.
///
/// Uses `Arc<RwLock<...>>` internally, so it is cheap to clone and all
/// clones share the same height.
#[derive(Clone, Default)]
pub struct MockChain {
    inner: Arc<RwLock<MockChainInner>>,
}

impl MockChain {
    /// Create a chain at height 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chain at `height`.
    pub fn at(height: BlockNumber) -> Self {
        let chain = Self::new();
        chain.inner.write().unwrap().height = height;
        chain
    }

    /// Mine `blocks` blocks and return the new height.
    pub fn mine(&self, blocks: BlockNumber) -> BlockNumber {
        let mut inner = self.inner.write().unwrap();
        inner.height += blocks;
        inner.height
    }

    /// Jump to `height`. Panics if that would move the chain backwards.
    pub fn set_height(&self, height: BlockNumber) {
        let mut inner = self.inner.write().unwrap();
        assert!(height >= inner.height, "chain height cannot decrease");
        inner.height = height;
    }

    // =========================================================================
    // Assertion Helpers
    // =========================================================================

    /// Current height without counting as a query.
    pub fn height(&self) -> BlockNumber {
        self.inner.read().unwrap().height
    }

    /// Number of times a consumer asked for the height.
    pub fn queries(&self) -> u64 {
        self.inner.read().unwrap().queries
    }
}

impl BlockHeightProvider for MockChain {
    fn block_number(&self) -> BlockNumber {
        let mut inner = self.inner.write().unwrap();
        inner.queries += 1;
        inner.height
    }
}
