//! Send a signed transaction and wait for a definite outcome.
//!
//! After the send succeeds three things race: the signature reaching the
//! requested commitment, the transaction's lifetime running out, and the
//! caller's timeout. Only a landed status is definite. Expiry and timeout
//! both end in [`ClientError::NotConfirmed`], after one last status check.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use solkit_core::{LifetimeToken, Signature, SignedTransaction};
use tracing::{debug, info, warn};

use crate::commitment::Commitment;
use crate::error::{ClientError, NotConfirmedReason};
use crate::rpc::{RpcClient, SendConfig, SignatureStatus};
use crate::state::NonceAccount;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Drives one submission at a time; holds no state between calls.
#[derive(Clone)]
pub struct SubmissionCoordinator {
    rpc: Arc<dyn RpcClient>,
    send_config: SendConfig,
    poll_interval: Duration,
}

impl SubmissionCoordinator {
    pub fn new(rpc: Arc<dyn RpcClient>) -> Self {
        Self {
            rpc,
            send_config: SendConfig::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_send_config(mut self, send_config: SendConfig) -> Self {
        self.send_config = send_config;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn rpc(&self) -> &Arc<dyn RpcClient> {
        &self.rpc
    }

    /// Send `tx` and wait until it reaches `commitment`.
    ///
    /// Errors:
    /// - [`ClientError::Core`] when the transaction is not fully signed;
    ///   nothing is sent.
    /// - [`ClientError::SubmissionRejected`] when the node refuses the
    ///   transaction. Terminal.
    /// - [`ClientError::Transport`] when the send itself could not be
    ///   delivered.
    /// - [`ClientError::TransactionFailed`] when it landed with an
    ///   execution error.
    /// - [`ClientError::NotConfirmed`] when the lifetime expired or the
    ///   timeout elapsed first. The outcome is unknown.
    pub async fn submit_and_confirm(
        &self,
        tx: &SignedTransaction,
        commitment: Commitment,
        timeout: Duration,
    ) -> Result<Signature, ClientError> {
        let wire = tx.to_wire()?;
        let signature = tx.signature().ok_or_else(|| {
            ClientError::Core(solkit_core::CoreError::Serialization(
                "transaction has no fee payer signature".into(),
            ))
        })?;

        match self.rpc.send_transaction(&wire, &self.send_config).await {
            Ok(returned) => {
                if returned != signature {
                    warn!(%signature, %returned, "node reported a different signature");
                }
            }
            Err(ClientError::Rpc {
                code,
                message,
                data,
            }) => {
                warn!(%signature, code, %message, "transaction rejected");
                return Err(ClientError::SubmissionRejected {
                    code,
                    message,
                    logs: simulation_logs(data.as_ref()),
                });
            }
            Err(other) => return Err(other),
        }
        info!(%signature, bytes = wire.len(), "transaction sent");

        let outcome = tokio::select! {
            biased;
            status = self.await_status(&signature, commitment) => Ok(status),
            reason = self.watch_lifetime(tx.lifetime(), commitment) => Err(reason),
            _ = tokio::time::sleep(timeout) => Err(NotConfirmedReason::Timeout),
        };

        match outcome {
            Ok(status) => finish(signature, status),
            Err(reason) => self.final_check(signature, commitment, reason).await,
        }
    }

    /// Wait for an already-sent signature, without lifetime tracking.
    pub async fn confirm_signature(
        &self,
        signature: &Signature,
        commitment: Commitment,
        timeout: Duration,
    ) -> Result<Signature, ClientError> {
        match tokio::time::timeout(timeout, self.await_status(signature, commitment)).await {
            Ok(status) => finish(*signature, status),
            Err(_) => {
                self.final_check(*signature, commitment, NotConfirmedReason::Timeout)
                    .await
            }
        }
    }

    /// Poll until the signature lands. Transient RPC failures are logged
    /// and polling continues.
    async fn await_status(&self, signature: &Signature, commitment: Commitment) -> SignatureStatus {
        loop {
            match self
                .rpc
                .subscribe_signature_status(signature, commitment, self.poll_interval)
                .await
            {
                Ok(status) => return status,
                Err(e) => {
                    warn!(%signature, error = %e, "signature status poll failed");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// Resolve once the lifetime can no longer be used to land the
    /// transaction.
    async fn watch_lifetime(
        &self,
        lifetime: &LifetimeToken,
        commitment: Commitment,
    ) -> NotConfirmedReason {
        loop {
            match lifetime {
                LifetimeToken::Blockhash {
                    last_valid_block_height,
                    ..
                } => match self.rpc.get_block_height(commitment).await {
                    Ok(height) if height > *last_valid_block_height => {
                        debug!(height, last_valid_block_height, "blockhash expired");
                        return NotConfirmedReason::BlockhashExpired;
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "block height poll failed"),
                },
                LifetimeToken::DurableNonce {
                    nonce,
                    nonce_account,
                    ..
                } => match self.rpc.get_account_info(nonce_account, commitment).await {
                    Ok(None) => return NotConfirmedReason::NonceAdvanced,
                    Ok(Some(account)) => match NonceAccount::decode(&account.data) {
                        Ok(state) if state.nonce != *nonce => {
                            debug!(%nonce_account, "durable nonce advanced");
                            return NotConfirmedReason::NonceAdvanced;
                        }
                        Ok(_) => {}
                        Err(e) => warn!(%nonce_account, error = %e, "nonce account unreadable"),
                    },
                    Err(e) => warn!(error = %e, "nonce account poll failed"),
                },
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn final_check(
        &self,
        signature: Signature,
        commitment: Commitment,
        reason: NotConfirmedReason,
    ) -> Result<Signature, ClientError> {
        match self.rpc.get_signature_statuses(&[signature]).await {
            Ok(statuses) => {
                if let Some(Some(status)) = statuses.into_iter().next() {
                    if status.err.is_some() || status.satisfies(commitment) {
                        return finish(signature, status);
                    }
                }
            }
            Err(e) => warn!(%signature, error = %e, "final status check failed"),
        }

        warn!(%signature, %reason, "transaction not confirmed");
        Err(ClientError::NotConfirmed { signature, reason })
    }
}

fn finish(signature: Signature, status: SignatureStatus) -> Result<Signature, ClientError> {
    if let Some(error) = status.err {
        warn!(%signature, %error, "transaction failed");
        return Err(ClientError::TransactionFailed { signature, error });
    }
    info!(%signature, slot = status.slot, "transaction confirmed");
    Ok(signature)
}

/// Program logs from a preflight simulation failure, if the node sent any.
fn simulation_logs(data: Option<&Value>) -> Vec<String> {
    data.and_then(|d| d.get("logs"))
        .and_then(Value::as_array)
        .map(|logs| {
            logs.iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn logs_extracted_from_simulation_data() {
        let data = json!({
            "err": { "InstructionError": [0, { "Custom": 1 }] },
            "logs": ["Program 11111111111111111111111111111111 invoke [1]", "insufficient lamports"]
        });
        assert_eq!(
            simulation_logs(Some(&data)),
            vec![
                "Program 11111111111111111111111111111111 invoke [1]".to_owned(),
                "insufficient lamports".to_owned()
            ]
        );
    }

    #[test]
    fn missing_logs_are_empty() {
        assert!(simulation_logs(None).is_empty());
        assert!(simulation_logs(Some(&json!({ "err": null }))).is_empty());
        assert!(simulation_logs(Some(&json!({ "logs": null }))).is_empty());
    }

    #[test]
    fn finish_maps_execution_error() {
        let status = SignatureStatus {
            slot: 1,
            confirmations: Some(1),
            err: Some(json!({ "InstructionError": [0, "InvalidAccountData"] })),
            confirmation_status: Some(Commitment::Confirmed),
        };
        let err = finish(Signature::default(), status).unwrap_err();
        assert!(matches!(err, ClientError::TransactionFailed { .. }));
    }
}
