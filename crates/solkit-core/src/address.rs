//! Address encoding and decoding.
//!
//! An address is a raw 32-byte value, usually an Ed25519 public key, written
//! as Base58 text. No hashing or checksum is involved: the bytes ARE the
//! address. The same representation is used for blockhashes and durable
//! nonce values, so [`Hash`] shares the codec.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Length in bytes of an address or hash.
pub const ADDRESS_BYTES: usize = 32;

/// Longest Base58 text that can still decode to 32 bytes.
const MAX_BASE58_LEN: usize = 44;

/// A 32-byte account or program address.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_BYTES]);

impl Address {
    /// Wrap raw bytes. Usable in `const` context for well-known ids.
    pub const fn new(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; ADDRESS_BYTES] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }

    /// Whether the bytes decompress to a point on the Ed25519 curve.
    ///
    /// Keypair addresses are always on the curve; program-derived addresses
    /// never are.
    pub fn is_on_curve(&self) -> bool {
        curve25519_dalek::edwards::CompressedEdwardsY(self.0)
            .decompress()
            .is_some()
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; ADDRESS_BYTES]> for Address {
    fn from(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        decode_32(text).map(Self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// A 32-byte blockhash or durable nonce value.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Hash([u8; ADDRESS_BYTES]);

impl Hash {
    pub const fn new(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; ADDRESS_BYTES] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({self})")
    }
}

impl FromStr for Hash {
    type Err = CoreError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        decode_32(text).map(Self)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Encode 32 bytes as an address. Always succeeds.
pub fn encode(bytes: [u8; ADDRESS_BYTES]) -> Address {
    Address(bytes)
}

/// Decode Base58 text into an address.
///
/// Fails with [`CoreError::InvalidAddressFormat`] when the text contains
/// characters outside the Base58 alphabet or decodes to anything other than
/// exactly 32 bytes.
pub fn decode(text: &str) -> Result<Address, CoreError> {
    text.parse()
}

fn decode_32(text: &str) -> Result<[u8; ADDRESS_BYTES], CoreError> {
    if text.len() > MAX_BASE58_LEN {
        return Err(CoreError::InvalidAddressFormat(format!(
            "text too long: {} characters",
            text.len()
        )));
    }

    let bytes = bs58::decode(text)
        .into_vec()
        .map_err(|e| CoreError::InvalidAddressFormat(format!("base58 decode failed: {e}")))?;

    bytes.try_into().map_err(|v: Vec<u8>| {
        CoreError::InvalidAddressFormat(format!("expected 32 bytes, got {}", v.len()))
    })
}
