//! Signatures and signing capabilities.
//!
//! Signing is Ed25519 with deterministic RFC 8032 nonces, so a message signed
//! twice with the same key yields the same 64 bytes. Key material never
//! leaves the [`Signer`] that owns it.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use rand_core::{OsRng, RngCore};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use crate::address::Address;
use crate::error::CoreError;

pub const SIGNATURE_BYTES: usize = 64;

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A 64-byte Ed25519 signature. The first signature of a transaction is its
/// identifier on the network.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_BYTES]);

impl Signature {
    pub const fn new(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; SIGNATURE_BYTES] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_BYTES] {
        &self.0
    }

    /// Strictly verify this signature over `message` for `address`.
    ///
    /// Returns false when `address` is not a valid Ed25519 public key.
    pub fn verify(&self, address: &Address, message: &[u8]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(address.as_bytes()) else {
            return false;
        };
        let sig = ed25519_dalek::Signature::from_bytes(&self.0);
        key.verify_strict(message, &sig).is_ok()
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_BYTES])
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl FromStr for Signature {
    type Err = CoreError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        // 64 bytes encode to at most 88 Base58 characters.
        if text.len() > 88 {
            return Err(CoreError::InvalidSignatureFormat(format!(
                "signature text too long: {} characters",
                text.len()
            )));
        }
        let bytes = bs58::decode(text)
            .into_vec()
            .map_err(|e| CoreError::InvalidSignatureFormat(format!("base58 decode failed: {e}")))?;
        let bytes: [u8; SIGNATURE_BYTES] = bytes.try_into().map_err(|v: Vec<u8>| {
            CoreError::InvalidSignatureFormat(format!("expected 64 bytes, got {}", v.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Signer capability
// ---------------------------------------------------------------------------

/// Something that can produce signatures for one address.
pub trait Signer: Send + Sync {
    fn address(&self) -> Address;

    /// Whether this signer holds the key for `address`.
    fn can_sign(&self, address: &Address) -> bool {
        self.address() == *address
    }

    fn sign_message(&self, message: &[u8]) -> Result<Signature, CoreError>;
}

impl<T: Signer + ?Sized> Signer for &T {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn can_sign(&self, address: &Address) -> bool {
        (**self).can_sign(address)
    }

    fn sign_message(&self, message: &[u8]) -> Result<Signature, CoreError> {
        (**self).sign_message(message)
    }
}

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// An in-memory Ed25519 keypair. The secret is zeroized on drop.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS random number generator.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        let keypair = Self::from_seed(&seed);
        seed.zeroize();
        keypair
    }

    /// Build a keypair from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let mut seed = *seed;
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();
        Self { signing_key }
    }

    /// Build a keypair from the 64-byte `seed || public key` layout used by
    /// CLI key files.
    ///
    /// Fails with [`CoreError::InvalidKey`] when the public half does not
    /// belong to the seed.
    pub fn from_bytes(bytes: &[u8; 64]) -> Result<Self, CoreError> {
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes[..32]);
        let keypair = Self::from_seed(&seed);
        seed.zeroize();

        if keypair.address().as_bytes()[..] != bytes[32..] {
            return Err(CoreError::InvalidKey(
                "public key does not match secret seed".into(),
            ));
        }
        Ok(keypair)
    }
}

impl Signer for Keypair {
    fn address(&self) -> Address {
        Address::new(self.signing_key.verifying_key().to_bytes())
    }

    fn sign_message(&self, message: &[u8]) -> Result<Signature, CoreError> {
        Ok(Signature(self.signing_key.sign(message).to_bytes()))
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Presigner
// ---------------------------------------------------------------------------

/// A signature produced elsewhere (a hardware wallet, a remote co-signer),
/// paired with the address that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presigner {
    address: Address,
    signature: Signature,
}

impl Presigner {
    pub fn new(address: Address, signature: Signature) -> Self {
        Self { address, signature }
    }
}

impl Signer for Presigner {
    fn address(&self) -> Address {
        self.address
    }

    /// Returns the stored signature if it verifies over `message`.
    fn sign_message(&self, message: &[u8]) -> Result<Signature, CoreError> {
        if !self.signature.verify(&self.address, message) {
            return Err(CoreError::SigningFailed(format!(
                "presigned signature for {} does not match message",
                self.address
            )));
        }
        Ok(self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 8032, section 7.1, TEST 1.
    const RFC_SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const RFC_PUBLIC: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";
    const RFC_SIGNATURE: &str = "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e06522490155\
                                 5fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b";

    fn rfc_keypair() -> Keypair {
        let seed: [u8; 32] = hex::decode(RFC_SEED).unwrap().try_into().unwrap();
        Keypair::from_seed(&seed)
    }

    // -- Keypair --------------------------------------------------------------

    #[test]
    fn rfc8032_public_key() {
        let kp = rfc_keypair();
        assert_eq!(hex::encode(kp.address().as_bytes()), RFC_PUBLIC);
    }

    #[test]
    fn rfc8032_empty_message_signature() {
        let kp = rfc_keypair();
        let sig = kp.sign_message(b"").unwrap();
        assert_eq!(hex::encode(sig.as_bytes()), RFC_SIGNATURE);
        assert!(sig.verify(&kp.address(), b""));
    }

    #[test]
    fn signing_is_deterministic() {
        let kp = rfc_keypair();
        let a = kp.sign_message(b"same bytes").unwrap();
        let b = kp.sign_message(b"same bytes").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn generated_keypairs_differ() {
        let a = Keypair::generate();
        let b = Keypair::generate();
        assert_ne!(a.address(), b.address());
        assert!(a.address().is_on_curve());
    }

    #[test]
    fn from_bytes_accepts_matching_halves() {
        let kp = rfc_keypair();
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&hex::decode(RFC_SEED).unwrap());
        bytes[32..].copy_from_slice(kp.address().as_bytes());

        let restored = Keypair::from_bytes(&bytes).unwrap();
        assert_eq!(restored.address(), kp.address());
    }

    #[test]
    fn from_bytes_rejects_mismatched_public_key() {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&hex::decode(RFC_SEED).unwrap());
        bytes[32..].copy_from_slice(&[7u8; 32]);

        let err = Keypair::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::InvalidKey(_)));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = rfc_keypair();
        let text = format!("{kp:?}");
        assert!(!text.contains(RFC_SEED));
        assert!(text.contains("Keypair"));
    }

    #[test]
    fn can_sign_only_own_address() {
        let kp = rfc_keypair();
        assert!(kp.can_sign(&kp.address()));
        assert!(!kp.can_sign(&Address::new([1u8; 32])));
    }

    // -- Signature ------------------------------------------------------------

    #[test]
    fn signature_base58_roundtrip() {
        let sig = rfc_keypair().sign_message(b"hello").unwrap();
        let parsed: Signature = sig.to_string().parse().unwrap();
        assert_eq!(parsed, sig);
    }

    #[test]
    fn signature_rejects_wrong_length() {
        let err = "11111111111111111111111111111111".parse::<Signature>().unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidSignatureFormat("expected 64 bytes, got 32".into())
        );
    }

    #[test]
    fn signature_rejects_bad_base58() {
        let err = "0OIl".parse::<Signature>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidSignatureFormat(_)));
    }

    #[test]
    fn signature_serde_as_string() {
        let sig = Signature::default();
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json, format!("\"{}\"", "1".repeat(64)));
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn verify_fails_for_other_message() {
        let kp = rfc_keypair();
        let sig = kp.sign_message(b"one").unwrap();
        assert!(!sig.verify(&kp.address(), b"two"));
    }

    // -- Presigner ------------------------------------------------------------

    #[test]
    fn presigner_returns_matching_signature() {
        let kp = rfc_keypair();
        let sig = kp.sign_message(b"msg").unwrap();
        let pre = Presigner::new(kp.address(), sig);
        assert_eq!(pre.sign_message(b"msg").unwrap(), sig);
    }

    #[test]
    fn presigner_rejects_other_message() {
        let kp = rfc_keypair();
        let sig = kp.sign_message(b"msg").unwrap();
        let pre = Presigner::new(kp.address(), sig);
        let err = pre.sign_message(b"different").unwrap_err();
        assert!(matches!(err, CoreError::SigningFailed(_)));
    }
}
