use std::fmt;

use solkit_core::{Address, CoreError, Signature};
use thiserror::Error;

/// Why a sent transaction could not be confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotConfirmedReason {
    /// The chain passed the message's last valid block height.
    BlockhashExpired,
    /// The durable nonce account no longer holds the transaction's nonce.
    NonceAdvanced,
    /// The caller's timeout elapsed first.
    Timeout,
}

impl fmt::Display for NotConfirmedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BlockhashExpired => "blockhash expired",
            Self::NonceAdvanced => "nonce advanced",
            Self::Timeout => "timed out",
        })
    }
}

/// Errors surfaced by the RPC client, the submission coordinator and the
/// flows built on them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// Local validation failure; nothing was sent.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The endpoint was unreachable, returned an HTTP error, or sent a body
    /// that is not valid JSON-RPC.
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// The endpoint answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// The node refused the transaction before it reached the network.
    /// Terminal: retrying the same bytes will fail the same way.
    #[error("transaction rejected ({code}): {message}")]
    SubmissionRejected {
        code: i64,
        message: String,
        logs: Vec<String>,
    },

    /// The transaction may or may not land. The only ambiguous outcome.
    #[error("transaction {signature} not confirmed: {reason}")]
    NotConfirmed {
        signature: Signature,
        reason: NotConfirmedReason,
    },

    /// The transaction landed and its execution failed.
    #[error("transaction {signature} failed: {error}")]
    TransactionFailed {
        signature: Signature,
        error: serde_json::Value,
    },

    #[error("account not found: {0}")]
    AccountNotFound(Address),

    #[error("invalid account data: {0}")]
    InvalidAccountData(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub(crate) fn transport(message: impl fmt::Display) -> Self {
        Self::Transport {
            message: message.to_string(),
        }
    }

    /// Whether the outcome is unknown and the caller must check the
    /// signature's status before deciding to resubmit.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::NotConfirmed { .. })
    }
}
