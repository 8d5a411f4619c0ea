//! Transaction signing and wire serialization.
//!
//! Wire layout:
//!
//! ```text
//! num_signatures   compact-u16
//! signatures       64 bytes * num_signatures
//! message          (see message.rs)
//! ```
//!
//! Signature slots follow the message's signer keys one-to-one. A
//! [`SignedTransaction`] may be partially signed; only a complete one can
//! be serialized for submission.

use crate::address::Address;
use crate::error::CoreError;
use crate::message::{encode_len, LifetimeToken, TransactionMessage};
use crate::signer::{Signature, Signer, SIGNATURE_BYTES};

/// Largest serialized transaction the network accepts in one packet.
pub const PACKET_DATA_SIZE: usize = 1232;

/// A message together with its (possibly incomplete) signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    message: TransactionMessage,
    message_bytes: Vec<u8>,
    signatures: Vec<Option<Signature>>,
}

/// Sign `message` with every required signer.
///
/// Fails with [`CoreError::MissingSigner`] naming the first required
/// address that no supplied signer can sign for.
pub fn sign(
    message: TransactionMessage,
    signers: &[&dyn Signer],
) -> Result<SignedTransaction, CoreError> {
    let tx = partially_sign(message, signers)?;
    if let Some(address) = tx.missing_signers().into_iter().next() {
        return Err(CoreError::MissingSigner(address));
    }
    Ok(tx)
}

/// Sign `message` with whichever required signers are supplied, leaving the
/// other slots empty.
pub fn partially_sign(
    message: TransactionMessage,
    signers: &[&dyn Signer],
) -> Result<SignedTransaction, CoreError> {
    let message_bytes = message.serialize()?;
    let slots = message.header.num_required_signatures as usize;
    let mut tx = SignedTransaction {
        message,
        message_bytes,
        signatures: vec![None; slots],
    };
    tx.sign_with(signers)?;
    Ok(tx)
}

impl SignedTransaction {
    /// Fill any empty signature slot that one of `signers` can sign for.
    ///
    /// Already-filled slots are left untouched. Every new signature is
    /// verified against its address before it is stored.
    pub fn sign_with(&mut self, signers: &[&dyn Signer]) -> Result<(), CoreError> {
        let required = self.message.required_signers();
        for (slot, address) in self.signatures.iter_mut().zip(required) {
            if slot.is_some() {
                continue;
            }
            let Some(signer) = signers.iter().find(|s| s.can_sign(address)) else {
                continue;
            };

            let signature = signer.sign_message(&self.message_bytes)?;
            if !signature.verify(address, &self.message_bytes) {
                return Err(CoreError::SigningFailed(format!(
                    "signature does not verify for {address}"
                )));
            }
            *slot = Some(signature);
        }
        Ok(())
    }

    pub fn message(&self) -> &TransactionMessage {
        &self.message
    }

    /// The serialized message, i.e. the bytes each signer signed.
    pub fn message_bytes(&self) -> &[u8] {
        &self.message_bytes
    }

    pub fn lifetime(&self) -> &LifetimeToken {
        &self.message.lifetime
    }

    /// Signature slots in signer-key order.
    pub fn signatures(&self) -> &[Option<Signature>] {
        &self.signatures
    }

    pub fn is_fully_signed(&self) -> bool {
        self.signatures.iter().all(Option::is_some)
    }

    /// Required signer addresses whose slots are still empty.
    pub fn missing_signers(&self) -> Vec<Address> {
        self.signatures
            .iter()
            .zip(self.message.required_signers())
            .filter(|(slot, _)| slot.is_none())
            .map(|(_, address)| *address)
            .collect()
    }

    /// The fee payer's signature, which identifies the transaction.
    pub fn signature(&self) -> Option<Signature> {
        self.signatures.first().copied().flatten()
    }

    /// Serialize into the wire format ready for `sendTransaction`.
    pub fn to_wire(&self) -> Result<Vec<u8>, CoreError> {
        if let Some(address) = self.missing_signers().into_iter().next() {
            return Err(CoreError::MissingSigner(address));
        }

        let mut wire = Vec::with_capacity(
            3 + SIGNATURE_BYTES * self.signatures.len() + self.message_bytes.len(),
        );
        wire.extend_from_slice(&encode_len(self.signatures.len(), "signatures")?);
        for signature in self.signatures.iter().flatten() {
            wire.extend_from_slice(signature.as_bytes());
        }
        wire.extend_from_slice(&self.message_bytes);

        if wire.len() > PACKET_DATA_SIZE {
            return Err(CoreError::Serialization(format!(
                "transaction is {} bytes, limit is {PACKET_DATA_SIZE}",
                wire.len()
            )));
        }

        Ok(wire)
    }
}
