//! Serde serialization implementations for crypto types.
//!
//! All types are serialized as hex strings for human readability in JSON,
//! and as raw bytes in binary formats.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{Address, Hash, Signature, SIGNATURE_LENGTH};

fn fixed_bytes<const N: usize, E: de::Error>(bytes: &[u8], name: &str) -> Result<[u8; N], E> {
    bytes.try_into().map_err(|_| {
        E::custom(format!(
            "{} must be {} bytes, got {}",
            name,
            N,
            bytes.len()
        ))
    })
}

fn decode_hex<E: de::Error>(s: &str) -> Result<Vec<u8>, E> {
    let hex_part = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(hex_part).map_err(E::custom)
}

macro_rules! impl_hex_serde {
    ($ty:ident, $len:expr, $name:literal, $display:expr) => {
        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&$display(self))
                } else {
                    serializer.serialize_bytes(&self.0)
                }
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let bytes = if deserializer.is_human_readable() {
                    let s = String::deserialize(deserializer)?;
                    decode_hex(&s)?
                } else {
                    Vec::<u8>::deserialize(deserializer)?
                };
                Ok($ty(fixed_bytes::<$len, D::Error>(&bytes, $name)?))
            }
        }
    };
}

impl_hex_serde!(Hash, 32, "Hash", |h: &Hash| hex::encode(h.0));
impl_hex_serde!(Address, 20, "Address", crate::address_to_string);
impl_hex_serde!(Signature, SIGNATURE_LENGTH, "Signature", |s: &Signature| {
    hex::encode(s.0)
});
