use thiserror::Error;

use crate::address::Address;

/// Errors raised while building, assembling or signing a transaction.
///
/// Every variant is produced locally, before anything touches the network,
/// and is fixed by correcting the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("no valid bump seed found for program address")]
    NoValidBumpFound,

    #[error("invalid seeds: {0}")]
    InvalidSeeds(String),

    #[error("invalid instruction argument: {0}")]
    InvalidInstructionArgument(String),

    #[error("transaction has no instructions")]
    EmptyInstructionList,

    #[error("missing signer for {0}")]
    MissingSigner(Address),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_address_format() {
        let err = CoreError::InvalidAddressFormat("expected 32 bytes, got 31".into());
        assert_eq!(
            err.to_string(),
            "invalid address format: expected 32 bytes, got 31"
        );
    }

    #[test]
    fn display_invalid_signature_format() {
        let err = CoreError::InvalidSignatureFormat("expected 64 bytes, got 32".into());
        assert_eq!(
            err.to_string(),
            "invalid signature format: expected 64 bytes, got 32"
        );
    }

    #[test]
    fn display_missing_signer_uses_base58() {
        let err = CoreError::MissingSigner(Address::new([0u8; 32]));
        assert_eq!(
            err.to_string(),
            "missing signer for 11111111111111111111111111111111"
        );
    }

    #[test]
    fn display_empty_instruction_list() {
        assert_eq!(
            CoreError::EmptyInstructionList.to_string(),
            "transaction has no instructions"
        );
    }

    #[test]
    fn display_instruction_argument() {
        let err = CoreError::InvalidInstructionArgument("multiplier must be positive".into());
        assert_eq!(
            err.to_string(),
            "invalid instruction argument: multiplier must be positive"
        );
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(CoreError::NoValidBumpFound);
        assert!(err.to_string().contains("bump"));
    }
}
