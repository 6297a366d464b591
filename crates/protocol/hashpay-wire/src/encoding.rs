//! Fixed-layout encoding and decoding.
//!
//! # Layouts
//!
//! ```text
//! Secret (109):           cmdid pad(3) identifier(8) secret(32) signature(65)
//! DirectTransfer (189):   cmdid pad(3) nonce(8) identifier(8) asset(20) recipient(20)
//!                         transferred_amount(32) locksroot(32) signature(65)
//! LockedTransfer (261):   cmdid pad(3) nonce(8) identifier(8) expiration(8) asset(20)
//!                         recipient(20) locksroot(32) transferred_amount(32) amount(32)
//!                         hashlock(32) signature(65)
//! MediatedTransfer (333): cmdid pad(3) nonce(8) identifier(8) expiration(8) asset(20)
//!                         recipient(20) target(20) initiator(20) locksroot(32)
//!                         hashlock(32) transferred_amount(32) amount(32) fee(32)
//!                         signature(65)
//! RefundTransfer (261):   as LockedTransfer
//! ```
//!
//! Amount fields are 256-bit on the wire and 64-bit locally. A decoded
//! amount that does not fit is rejected.

use hashpay_crypto::{
    keccak256, recover_digest, sign_digest, Address, Hash, PrivateKey, Signature,
    SIGNATURE_LENGTH,
};
use hashpay_types::constants::{AMOUNT_FIELD_LEN, PADDING_LEN};
use hashpay_types::{Amount, Lock};

use crate::error::{CodecError, CodecResult};
use crate::message::{
    Message, MessageType, SecretMessage, Transfer, TransferHeader, TransferKind,
};

// =============================================================================
// Encoding
// =============================================================================

/// Encode any message, signature included.
pub fn encode(message: &Message) -> Vec<u8> {
    match message {
        Message::Secret(secret) => encode_secret(secret),
        Message::Transfer(transfer) => encode_transfer(transfer),
    }
}

/// Encode a transfer, signature included.
pub fn encode_transfer(transfer: &Transfer) -> Vec<u8> {
    let message_type = transfer.message_type();
    let header = &transfer.header;
    let mut buf = Vec::with_capacity(message_type.encoded_len());

    put_prefix(&mut buf, message_type);
    buf.extend_from_slice(&header.nonce.to_be_bytes());
    buf.extend_from_slice(&header.identifier.to_be_bytes());

    match &transfer.kind {
        TransferKind::Direct => {
            buf.extend_from_slice(&header.asset.0);
            buf.extend_from_slice(&header.recipient.0);
            put_amount(&mut buf, header.transferred_amount);
            buf.extend_from_slice(&header.locksroot.0);
        }
        TransferKind::Locked { lock } | TransferKind::Refund { lock } => {
            buf.extend_from_slice(&lock.expiration.to_be_bytes());
            buf.extend_from_slice(&header.asset.0);
            buf.extend_from_slice(&header.recipient.0);
            buf.extend_from_slice(&header.locksroot.0);
            put_amount(&mut buf, header.transferred_amount);
            put_amount(&mut buf, lock.amount);
            buf.extend_from_slice(&lock.hashlock.0);
        }
        TransferKind::Mediated {
            lock,
            target,
            initiator,
            fee,
        } => {
            buf.extend_from_slice(&lock.expiration.to_be_bytes());
            buf.extend_from_slice(&header.asset.0);
            buf.extend_from_slice(&header.recipient.0);
            buf.extend_from_slice(&target.0);
            buf.extend_from_slice(&initiator.0);
            buf.extend_from_slice(&header.locksroot.0);
            buf.extend_from_slice(&lock.hashlock.0);
            put_amount(&mut buf, header.transferred_amount);
            put_amount(&mut buf, lock.amount);
            put_amount(&mut buf, *fee);
        }
    }

    buf.extend_from_slice(&header.signature.0);
    buf
}

/// Encode a secret reveal, signature included.
pub fn encode_secret(secret: &SecretMessage) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MessageType::Secret.encoded_len());
    put_prefix(&mut buf, MessageType::Secret);
    buf.extend_from_slice(&secret.identifier.to_be_bytes());
    buf.extend_from_slice(&secret.secret.0);
    buf.extend_from_slice(&secret.signature.0);
    buf
}

fn put_prefix(buf: &mut Vec<u8>, message_type: MessageType) {
    buf.push(message_type.to_u8());
    buf.extend_from_slice(&[0u8; PADDING_LEN]);
}

fn put_amount(buf: &mut Vec<u8>, amount: Amount) {
    buf.extend_from_slice(&[0u8; AMOUNT_FIELD_LEN - 8]);
    buf.extend_from_slice(&amount.to_be_bytes());
}

/// Digest that the signature covers: keccak256 of the encoding minus its
/// trailing signature.
pub fn signing_hash(encoded: &[u8]) -> Hash {
    let body_len = encoded.len().saturating_sub(SIGNATURE_LENGTH);
    keccak256(&encoded[..body_len])
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode any message.
///
/// # Errors
/// - `Empty` on empty input
/// - `UnknownMessageType` for an unrecognized command id
/// - `InvalidLength` if the input is not exactly the size of its type
/// - `NonZeroPadding` / `AmountOverflow` for out-of-range field values
pub fn decode(bytes: &[u8]) -> CodecResult<Message> {
    let cmdid = *bytes.first().ok_or(CodecError::Empty)?;
    let message_type = MessageType::from_u8(cmdid)?;

    let expected = message_type.encoded_len();
    if bytes.len() != expected {
        return Err(CodecError::InvalidLength {
            message_type,
            expected,
            got: bytes.len(),
        });
    }

    let mut reader = Reader::new(bytes);
    reader.skip(1)?;
    if reader.take(PADDING_LEN)?.iter().any(|&b| b != 0) {
        return Err(CodecError::NonZeroPadding);
    }

    let transfer = match message_type {
        MessageType::Secret => {
            let identifier = reader.u64()?;
            let secret = reader.hash()?;
            let signature = reader.signature()?;
            return Ok(Message::Secret(SecretMessage {
                identifier,
                secret,
                signature,
            }));
        }
        MessageType::DirectTransfer => {
            let (nonce, identifier) = (reader.u64()?, reader.u64()?);
            let asset = reader.address()?;
            let recipient = reader.address()?;
            let transferred_amount = reader.amount("transferred_amount")?;
            let locksroot = reader.hash()?;
            let signature = reader.signature()?;
            Transfer::new(
                TransferHeader {
                    identifier,
                    nonce,
                    asset,
                    recipient,
                    transferred_amount,
                    locksroot,
                    signature,
                },
                TransferKind::Direct,
            )
        }
        MessageType::LockedTransfer | MessageType::RefundTransfer => {
            let (nonce, identifier) = (reader.u64()?, reader.u64()?);
            let expiration = reader.u64()?;
            let asset = reader.address()?;
            let recipient = reader.address()?;
            let locksroot = reader.hash()?;
            let transferred_amount = reader.amount("transferred_amount")?;
            let amount = reader.amount("amount")?;
            let hashlock = reader.hash()?;
            let signature = reader.signature()?;

            let lock = Lock::new(amount, expiration, hashlock);
            let kind = if message_type == MessageType::LockedTransfer {
                TransferKind::Locked { lock }
            } else {
                TransferKind::Refund { lock }
            };
            Transfer::new(
                TransferHeader {
                    identifier,
                    nonce,
                    asset,
                    recipient,
                    transferred_amount,
                    locksroot,
                    signature,
                },
                kind,
            )
        }
        MessageType::MediatedTransfer => {
            let (nonce, identifier) = (reader.u64()?, reader.u64()?);
            let expiration = reader.u64()?;
            let asset = reader.address()?;
            let recipient = reader.address()?;
            let target = reader.address()?;
            let initiator = reader.address()?;
            let locksroot = reader.hash()?;
            let hashlock = reader.hash()?;
            let transferred_amount = reader.amount("transferred_amount")?;
            let amount = reader.amount("amount")?;
            let fee = reader.amount("fee")?;
            let signature = reader.signature()?;
            Transfer::new(
                TransferHeader {
                    identifier,
                    nonce,
                    asset,
                    recipient,
                    transferred_amount,
                    locksroot,
                    signature,
                },
                TransferKind::Mediated {
                    lock: Lock::new(amount, expiration, hashlock),
                    target,
                    initiator,
                    fee,
                },
            )
        }
    };

    Ok(Message::Transfer(transfer))
}

/// Decode a message that must be a transfer.
pub fn decode_transfer(bytes: &[u8]) -> CodecResult<Transfer> {
    match decode(bytes)? {
        Message::Transfer(transfer) => Ok(transfer),
        other => Err(CodecError::NotATransfer(other.message_type())),
    }
}

/// Cursor over a length-checked message.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        let end = self.pos + n;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(CodecError::Truncated {
                expected: end,
                got: self.bytes.len(),
            })?;
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, n: usize) -> CodecResult<()> {
        self.take(n).map(|_| ())
    }

    fn array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u64(&mut self) -> CodecResult<u64> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    fn address(&mut self) -> CodecResult<Address> {
        Ok(Address(self.array()?))
    }

    fn hash(&mut self) -> CodecResult<Hash> {
        Ok(Hash(self.array()?))
    }

    fn signature(&mut self) -> CodecResult<Signature> {
        Ok(Signature(self.array()?))
    }

    fn amount(&mut self, field: &'static str) -> CodecResult<Amount> {
        let raw: [u8; AMOUNT_FIELD_LEN] = self.array()?;
        let (high, low) = raw.split_at(AMOUNT_FIELD_LEN - 8);
        if high.iter().any(|&b| b != 0) {
            return Err(CodecError::AmountOverflow(field));
        }
        let mut low_bytes = [0u8; 8];
        low_bytes.copy_from_slice(low);
        Ok(Amount::from_be_bytes(low_bytes))
    }
}

// =============================================================================
// Signing
// =============================================================================

impl Transfer {
    /// Digest the signature covers.
    pub fn signing_hash(&self) -> Hash {
        signing_hash(&encode_transfer(self))
    }

    /// Sign the transfer in place, replacing any previous signature.
    ///
    /// # Errors
    /// `Signing` if the private key is invalid.
    pub fn sign(&mut self, private_key: &PrivateKey) -> CodecResult<()> {
        let digest = self.signing_hash();
        self.header.signature = sign_digest(private_key, &digest).map_err(CodecError::Signing)?;
        Ok(())
    }

    /// Recover the address that signed this transfer.
    ///
    /// # Errors
    /// `InvalidSignature` if recovery fails.
    pub fn recover_signer(&self) -> CodecResult<Address> {
        recover_digest(&self.signing_hash(), &self.header.signature)
            .map_err(CodecError::InvalidSignature)
    }

    /// Check that `expected` signed this transfer.
    ///
    /// # Errors
    /// `InvalidSignature` if recovery fails, `SignerMismatch` if another
    /// address signed.
    pub fn verify_signer(&self, expected: &Address) -> CodecResult<()> {
        verify_recovered(self.recover_signer()?, expected)
    }
}

impl SecretMessage {
    /// Digest the signature covers.
    pub fn signing_hash(&self) -> Hash {
        signing_hash(&encode_secret(self))
    }

    /// Sign the reveal in place.
    pub fn sign(&mut self, private_key: &PrivateKey) -> CodecResult<()> {
        let digest = self.signing_hash();
        self.signature = sign_digest(private_key, &digest).map_err(CodecError::Signing)?;
        Ok(())
    }

    /// Recover the address that signed this reveal.
    pub fn recover_signer(&self) -> CodecResult<Address> {
        recover_digest(&self.signing_hash(), &self.signature).map_err(CodecError::InvalidSignature)
    }

    /// Check that `expected` signed this reveal.
    pub fn verify_signer(&self, expected: &Address) -> CodecResult<()> {
        verify_recovered(self.recover_signer()?, expected)
    }
}

impl Message {
    /// Sign the message in place.
    pub fn sign(&mut self, private_key: &PrivateKey) -> CodecResult<()> {
        let digest = signing_hash(&encode(self));
        *self.signature_mut() = sign_digest(private_key, &digest).map_err(CodecError::Signing)?;
        Ok(())
    }

    /// Recover the address that signed this message.
    pub fn recover_signer(&self) -> CodecResult<Address> {
        recover_digest(&signing_hash(&encode(self)), self.signature())
            .map_err(CodecError::InvalidSignature)
    }
}

fn verify_recovered(got: Address, expected: &Address) -> CodecResult<()> {
    if got == *expected {
        Ok(())
    } else {
        Err(CodecError::SignerMismatch {
            expected: *expected,
            got,
        })
    }
}
