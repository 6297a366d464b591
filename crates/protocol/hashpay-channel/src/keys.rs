//! Signing-key provider seam.
//!
//! The ledger never holds key material. The manager asks a provider for
//! the key of its own address each time it signs.

use std::collections::HashMap;

use hashpay_crypto::{address_from_private_key, Address, CryptoError, PrivateKey};

/// Supplies private keys by address.
pub trait SigningKeyProvider: Send + Sync {
    /// The key for `address`, if this provider holds it.
    fn signing_key(&self, address: &Address) -> Option<PrivateKey>;
}

/// Keys held in process memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyProvider {
    keys: HashMap<Address, PrivateKey>,
}

impl InMemoryKeyProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key and return its address.
    ///
    /// # Errors
    /// `InvalidPrivateKey` if the key is not a valid secp256k1 scalar.
    pub fn insert(&mut self, private_key: PrivateKey) -> Result<Address, CryptoError> {
        let address = address_from_private_key(&private_key)?;
        self.keys.insert(address, private_key);
        Ok(address)
    }

    /// Build a provider holding a single key.
    pub fn with_key(private_key: PrivateKey) -> Result<Self, CryptoError> {
        let mut provider = Self::new();
        provider.insert(private_key)?;
        Ok(provider)
    }

    /// Addresses this provider can sign for.
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.keys.keys()
    }
}

impl SigningKeyProvider for InMemoryKeyProvider {
    fn signing_key(&self, address: &Address) -> Option<PrivateKey> {
        self.keys.get(address).cloned()
    }
}
