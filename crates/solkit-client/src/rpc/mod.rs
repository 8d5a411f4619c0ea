//! The RPC capability the rest of the client is written against.
//!
//! [`RpcClient`] is an object-safe async trait so submission and flows can
//! run against [`HttpRpcClient`] in production and a scripted double in
//! tests. Implementations map failures to [`ClientError::Transport`] or
//! [`ClientError::Rpc`] and never retry.

mod http;

use std::time::Duration;

use async_trait::async_trait;
use solkit_core::{Address, Hash, LifetimeToken, Signature};

use crate::commitment::Commitment;
use crate::error::ClientError;

pub use http::HttpRpcClient;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A recent blockhash and the last block height at which a message using it
/// is still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

impl LatestBlockhash {
    pub fn lifetime(&self) -> LifetimeToken {
        LifetimeToken::Blockhash {
            blockhash: self.blockhash,
            last_valid_block_height: self.last_valid_block_height,
        }
    }
}

/// An on-chain account as returned by `getAccountInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub lamports: u64,
    pub owner: Address,
    pub data: Vec<u8>,
    pub executable: bool,
    pub rent_epoch: u64,
}

/// One entry of `getSignatureStatuses`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureStatus {
    pub slot: u64,
    /// `None` once the block is rooted.
    pub confirmations: Option<u64>,
    /// The execution error, if the transaction failed.
    pub err: Option<serde_json::Value>,
    pub confirmation_status: Option<Commitment>,
}

impl SignatureStatus {
    /// Whether the status has reached `commitment`.
    ///
    /// A rooted status without an explicit confirmation level counts as
    /// finalized.
    pub fn satisfies(&self, commitment: Commitment) -> bool {
        match self.confirmation_status {
            Some(status) => status >= commitment,
            None => self.confirmations.is_none(),
        }
    }
}

/// A token account balance as returned by `getTokenAccountBalance`.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenAmount {
    /// Raw amount in base units.
    pub amount: u64,
    pub decimals: u8,
    /// Human-readable amount, with any scaled-UI multiplier applied.
    pub ui_amount_string: String,
}

/// Options for `sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SendConfig {
    pub skip_preflight: bool,
    pub preflight_commitment: Option<Commitment>,
    pub max_retries: Option<usize>,
}

// ---------------------------------------------------------------------------
// RpcClient
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RpcClient: Send + Sync {
    async fn get_latest_blockhash(
        &self,
        commitment: Commitment,
    ) -> Result<LatestBlockhash, ClientError>;

    async fn get_block_height(&self, commitment: Commitment) -> Result<u64, ClientError>;

    async fn get_minimum_balance_for_rent_exemption(&self, space: u64)
        -> Result<u64, ClientError>;

    /// `Ok(None)` when the account does not exist.
    async fn get_account_info(
        &self,
        address: &Address,
        commitment: Commitment,
    ) -> Result<Option<Account>, ClientError>;

    async fn get_balance(&self, address: &Address, commitment: Commitment)
        -> Result<u64, ClientError>;

    /// Send wire bytes; returns the signature the node computed.
    async fn send_transaction(
        &self,
        wire: &[u8],
        config: &SendConfig,
    ) -> Result<Signature, ClientError>;

    /// One entry per requested signature, `None` when the node has not
    /// seen it.
    async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<SignatureStatus>>, ClientError>;

    async fn request_airdrop(
        &self,
        address: &Address,
        lamports: u64,
    ) -> Result<Signature, ClientError>;

    async fn get_token_account_balance(
        &self,
        address: &Address,
        commitment: Commitment,
    ) -> Result<TokenAmount, ClientError>;

    /// Resolve once `signature` reaches `commitment` or carries an
    /// execution error.
    ///
    /// Polls `get_signature_statuses` every `poll_interval`. The first
    /// failed poll is returned to the caller; there is no retry here.
    async fn subscribe_signature_status(
        &self,
        signature: &Signature,
        commitment: Commitment,
        poll_interval: Duration,
    ) -> Result<SignatureStatus, ClientError> {
        loop {
            let statuses = self
                .get_signature_statuses(std::slice::from_ref(signature))
                .await?;
            if let Some(Some(status)) = statuses.into_iter().next() {
                if status.err.is_some() || status.satisfies(commitment) {
                    return Ok(status);
                }
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(confirmation_status: Option<Commitment>, confirmations: Option<u64>) -> SignatureStatus {
        SignatureStatus {
            slot: 10,
            confirmations,
            err: None,
            confirmation_status,
        }
    }

    #[test]
    fn satisfies_compares_levels() {
        let confirmed = status(Some(Commitment::Confirmed), Some(3));
        assert!(confirmed.satisfies(Commitment::Processed));
        assert!(confirmed.satisfies(Commitment::Confirmed));
        assert!(!confirmed.satisfies(Commitment::Finalized));
    }

    #[test]
    fn rooted_status_without_level_is_final() {
        assert!(status(None, None).satisfies(Commitment::Finalized));
        assert!(!status(None, Some(1)).satisfies(Commitment::Processed));
    }

    #[test]
    fn latest_blockhash_lifetime() {
        let latest = LatestBlockhash {
            blockhash: Hash::new([1u8; 32]),
            last_valid_block_height: 77,
        };
        assert_eq!(
            latest.lifetime(),
            LifetimeToken::Blockhash {
                blockhash: Hash::new([1u8; 32]),
                last_valid_block_height: 77,
            }
        );
    }
}
