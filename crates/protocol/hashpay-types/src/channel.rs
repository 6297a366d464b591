//! Channel lifecycle state.

use serde::{Deserialize, Serialize};

/// Lifecycle of a channel: `Open -> Closing -> Settled`.
///
/// Closing and settlement are driven by the on-chain netting contract. The
/// ledger only records them and refuses new transfers once not `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ChannelState {
    /// Transfers are accepted
    #[default]
    Open = 0x00,
    /// Close was called on-chain; pending locks may still be resolved
    Closing = 0x01,
    /// Final balances were paid out
    Settled = 0x02,
}

impl ChannelState {
    /// Whether new transfers may be registered.
    pub fn accepts_transfers(&self) -> bool {
        matches!(self, ChannelState::Open)
    }

    /// Whether pending locks may still be claimed or expired.
    pub fn accepts_lock_resolution(&self) -> bool {
        !matches!(self, ChannelState::Settled)
    }

    /// Whether `next` is the single legal successor of this state.
    pub fn can_transition_to(&self, next: ChannelState) -> bool {
        matches!(
            (self, next),
            (ChannelState::Open, ChannelState::Closing)
                | (ChannelState::Closing, ChannelState::Settled)
        )
    }
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelState::Open => write!(f, "open"),
            ChannelState::Closing => write!(f, "closing"),
            ChannelState::Settled => write!(f, "settled"),
        }
    }
}
