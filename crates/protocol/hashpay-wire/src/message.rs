//! Message types.
//!
//! Every transfer shares a [`TransferHeader`]. The variant-specific payload
//! lives in [`TransferKind`], and the codec dispatches on that tag.

use hashpay_crypto::{Address, Hash, Signature};
use hashpay_types::constants::{
    CMDID_DIRECT_TRANSFER, CMDID_LOCKED_TRANSFER, CMDID_MEDIATED_TRANSFER, CMDID_REFUND_TRANSFER,
    CMDID_SECRET, DIRECT_TRANSFER_LEN, LOCKED_TRANSFER_LEN, MEDIATED_TRANSFER_LEN,
    REFUND_TRANSFER_LEN, SECRET_MESSAGE_LEN,
};
use hashpay_types::{Amount, Lock, Nonce, Secret};
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Message discriminator, the first byte of every encoded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MessageType {
    /// Secret reveal
    Secret = CMDID_SECRET,
    /// Unconditional transfer
    DirectTransfer = CMDID_DIRECT_TRANSFER,
    /// Two-party locked transfer
    LockedTransfer = CMDID_LOCKED_TRANSFER,
    /// Locked transfer with routing information
    MediatedTransfer = CMDID_MEDIATED_TRANSFER,
    /// Locked transfer sent back along a failed route
    RefundTransfer = CMDID_REFUND_TRANSFER,
}

impl MessageType {
    /// Parse a command id.
    pub fn from_u8(value: u8) -> CodecResult<Self> {
        match value {
            CMDID_SECRET => Ok(MessageType::Secret),
            CMDID_DIRECT_TRANSFER => Ok(MessageType::DirectTransfer),
            CMDID_LOCKED_TRANSFER => Ok(MessageType::LockedTransfer),
            CMDID_MEDIATED_TRANSFER => Ok(MessageType::MediatedTransfer),
            CMDID_REFUND_TRANSFER => Ok(MessageType::RefundTransfer),
            other => Err(CodecError::UnknownMessageType(other)),
        }
    }

    /// The command id.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Exact encoded size of a message of this type, signature included.
    pub fn encoded_len(self) -> usize {
        match self {
            MessageType::Secret => SECRET_MESSAGE_LEN,
            MessageType::DirectTransfer => DIRECT_TRANSFER_LEN,
            MessageType::LockedTransfer => LOCKED_TRANSFER_LEN,
            MessageType::MediatedTransfer => MEDIATED_TRANSFER_LEN,
            MessageType::RefundTransfer => REFUND_TRANSFER_LEN,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MessageType::Secret => "Secret",
            MessageType::DirectTransfer => "DirectTransfer",
            MessageType::LockedTransfer => "LockedTransfer",
            MessageType::MediatedTransfer => "MediatedTransfer",
            MessageType::RefundTransfer => "RefundTransfer",
        };
        write!(f, "{}", name)
    }
}

/// Fields common to every transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferHeader {
    /// Caller-chosen correlation id
    pub identifier: u64,
    /// Sequence number of the sending end
    pub nonce: Nonce,
    /// Token being moved
    pub asset: Address,
    /// Receiving end of the channel
    pub recipient: Address,
    /// Cumulative amount paid unconditionally to `recipient`
    pub transferred_amount: Amount,
    /// Commitment over the sender's pending locks, this transfer's lock included
    pub locksroot: Hash,
    /// Recoverable signature over the encoded body
    pub signature: Signature,
}

/// Variant-specific payload of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferKind {
    /// No lock; the amount is already in `transferred_amount`
    Direct,
    /// A new lock between the two channel parties
    Locked {
        /// The lock this transfer adds
        lock: Lock,
    },
    /// A new lock on the way from `initiator` to `target`
    Mediated {
        /// The lock this transfer adds
        lock: Lock,
        /// Final payee
        target: Address,
        /// Original payer
        initiator: Address,
        /// Mediation fee, carried as given
        fee: Amount,
    },
    /// A new lock returning a failed routing attempt
    Refund {
        /// The lock this transfer adds
        lock: Lock,
    },
}

/// A transfer: common header plus a tagged payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Common fields
    pub header: TransferHeader,
    /// Variant payload
    pub kind: TransferKind,
}

impl Transfer {
    /// Create an unsigned transfer.
    pub fn new(header: TransferHeader, kind: TransferKind) -> Self {
        Self { header, kind }
    }

    /// The wire discriminator of this transfer.
    pub fn message_type(&self) -> MessageType {
        match self.kind {
            TransferKind::Direct => MessageType::DirectTransfer,
            TransferKind::Locked { .. } => MessageType::LockedTransfer,
            TransferKind::Mediated { .. } => MessageType::MediatedTransfer,
            TransferKind::Refund { .. } => MessageType::RefundTransfer,
        }
    }

    /// The lock this transfer adds, if any.
    pub fn lock(&self) -> Option<&Lock> {
        match &self.kind {
            TransferKind::Direct => None,
            TransferKind::Locked { lock }
            | TransferKind::Mediated { lock, .. }
            | TransferKind::Refund { lock } => Some(lock),
        }
    }

    /// Sequence number.
    pub fn nonce(&self) -> Nonce {
        self.header.nonce
    }

    /// Whether the signature field holds the unsigned placeholder.
    pub fn is_signed(&self) -> bool {
        !self.header.signature.is_empty()
    }
}

/// Reveal of a secret to the party that can claim with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretMessage {
    /// Correlation id of the transfer the secret belongs to
    pub identifier: u64,
    /// The 32-byte pre-image
    pub secret: Hash,
    /// Recoverable signature over the encoded body
    pub signature: Signature,
}

impl SecretMessage {
    /// Create an unsigned reveal message.
    ///
    /// # Errors
    /// `SecretLength` if the secret is not exactly 32 bytes.
    pub fn new(identifier: u64, secret: &Secret) -> CodecResult<Self> {
        let fixed = secret
            .to_fixed()
            .ok_or(CodecError::SecretLength(secret.as_bytes().len()))?;
        Ok(Self {
            identifier,
            secret: Hash(fixed),
            signature: Signature::EMPTY,
        })
    }

    /// The revealed secret.
    pub fn secret(&self) -> Secret {
        Secret::from(self.secret.0)
    }

    /// The hashlock the secret opens.
    pub fn hashlock(&self) -> Hash {
        self.secret().hashlock()
    }
}

/// Any protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Message {
    /// Secret reveal
    Secret(SecretMessage),
    /// Direct, locked, mediated or refund transfer
    Transfer(Transfer),
}

impl Message {
    /// The wire discriminator.
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Secret(_) => MessageType::Secret,
            Message::Transfer(transfer) => transfer.message_type(),
        }
    }

    /// The signature field.
    pub fn signature(&self) -> &Signature {
        match self {
            Message::Secret(secret) => &secret.signature,
            Message::Transfer(transfer) => &transfer.header.signature,
        }
    }

    pub(crate) fn signature_mut(&mut self) -> &mut Signature {
        match self {
            Message::Secret(secret) => &mut secret.signature,
            Message::Transfer(transfer) => &mut transfer.header.signature,
        }
    }
}

impl From<Transfer> for Message {
    fn from(transfer: Transfer) -> Self {
        Message::Transfer(transfer)
    }
}

impl From<SecretMessage> for Message {
    fn from(secret: SecretMessage) -> Self {
        Message::Secret(secret)
    }
}
