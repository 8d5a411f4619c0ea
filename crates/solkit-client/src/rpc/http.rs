//! JSON-RPC 2.0 over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use solkit_core::{Address, Hash, Signature};
use tracing::debug;

use super::{Account, LatestBlockhash, RpcClient, SendConfig, SignatureStatus, TokenAmount};
use crate::commitment::Commitment;
use crate::config::ClientConfig;
use crate::error::ClientError;

/// [`RpcClient`] backed by a Solana JSON-RPC endpoint.
///
/// Cheap to share behind an `Arc`; request ids come from an atomic counter.
#[derive(Debug)]
pub struct HttpRpcClient {
    client: reqwest::Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    /// Create a client with a 30 second request timeout.
    pub fn new(rpc_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(rpc_url, Duration::from_secs(30))
    }

    pub fn with_timeout(
        rpc_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        Self::with_timeout(config.rpc_url.clone(), config.request_timeout())
    }

    pub fn url(&self) -> &str {
        &self.rpc_url
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, ClientError> {
        let id = self.next_request_id();
        debug!(method, id, "rpc request");

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(ClientError::transport)?
            .error_for_status()
            .map_err(ClientError::transport)?;

        let body: Value = response.json().await.map_err(ClientError::transport)?;
        parse_response(body)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Results wrapped as `{ "context": { "slot": .. }, "value": .. }`.
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiBlockhash {
    blockhash: String,
    last_valid_block_height: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiAccount {
    lamports: u64,
    owner: String,
    /// `[payload, encoding]`.
    data: (String, String),
    executable: bool,
    rent_epoch: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiSignatureStatus {
    slot: u64,
    confirmations: Option<u64>,
    err: Option<Value>,
    confirmation_status: Option<Commitment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiTokenAmount {
    amount: String,
    decimals: u8,
    ui_amount_string: String,
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn parse_response<T: DeserializeOwned>(body: Value) -> Result<T, ClientError> {
    let envelope: JsonRpcResponse = serde_json::from_value(body)
        .map_err(|e| ClientError::transport(format!("malformed json-rpc response: {e}")))?;

    if let Some(error) = envelope.error {
        return Err(ClientError::Rpc {
            code: error.code,
            message: error.message,
            data: error.data,
        });
    }

    let result = envelope.result.unwrap_or(Value::Null);
    serde_json::from_value(result)
        .map_err(|e| ClientError::transport(format!("unexpected result shape: {e}")))
}

fn decode_account(ui: UiAccount) -> Result<Account, ClientError> {
    let (payload, encoding) = ui.data;
    if encoding != "base64" {
        return Err(ClientError::transport(format!(
            "unexpected account encoding: {encoding}"
        )));
    }
    let data = BASE64_STANDARD
        .decode(payload)
        .map_err(|e| ClientError::transport(format!("account data is not base64: {e}")))?;
    let owner = ui
        .owner
        .parse::<Address>()
        .map_err(|e| ClientError::transport(format!("account owner: {e}")))?;

    Ok(Account {
        lamports: ui.lamports,
        owner,
        data,
        executable: ui.executable,
        rent_epoch: ui.rent_epoch,
    })
}

fn decode_signature(text: &str) -> Result<Signature, ClientError> {
    text.parse()
        .map_err(|e| ClientError::transport(format!("signature in response: {e}")))
}

fn commitment_config(commitment: Commitment) -> Value {
    json!({ "commitment": commitment.as_str() })
}

fn send_params(wire: &[u8], config: &SendConfig) -> Value {
    let mut options = json!({
        "encoding": "base64",
        "skipPreflight": config.skip_preflight,
    });
    if let Some(commitment) = config.preflight_commitment {
        options["preflightCommitment"] = json!(commitment.as_str());
    }
    if let Some(max_retries) = config.max_retries {
        options["maxRetries"] = json!(max_retries);
    }
    json!([BASE64_STANDARD.encode(wire), options])
}

// ---------------------------------------------------------------------------
// RpcClient impl
// ---------------------------------------------------------------------------

#[async_trait]
impl RpcClient for HttpRpcClient {
    async fn get_latest_blockhash(
        &self,
        commitment: Commitment,
    ) -> Result<LatestBlockhash, ClientError> {
        let response: WithContext<UiBlockhash> = self
            .call("getLatestBlockhash", json!([commitment_config(commitment)]))
            .await?;
        let blockhash = response
            .value
            .blockhash
            .parse::<Hash>()
            .map_err(|e| ClientError::transport(format!("blockhash in response: {e}")))?;
        Ok(LatestBlockhash {
            blockhash,
            last_valid_block_height: response.value.last_valid_block_height,
        })
    }

    async fn get_block_height(&self, commitment: Commitment) -> Result<u64, ClientError> {
        self.call("getBlockHeight", json!([commitment_config(commitment)]))
            .await
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        space: u64,
    ) -> Result<u64, ClientError> {
        self.call("getMinimumBalanceForRentExemption", json!([space]))
            .await
    }

    async fn get_account_info(
        &self,
        address: &Address,
        commitment: Commitment,
    ) -> Result<Option<Account>, ClientError> {
        let response: WithContext<Option<UiAccount>> = self
            .call(
                "getAccountInfo",
                json!([
                    address.to_string(),
                    { "encoding": "base64", "commitment": commitment.as_str() }
                ]),
            )
            .await?;
        response.value.map(decode_account).transpose()
    }

    async fn get_balance(
        &self,
        address: &Address,
        commitment: Commitment,
    ) -> Result<u64, ClientError> {
        let response: WithContext<u64> = self
            .call(
                "getBalance",
                json!([address.to_string(), commitment_config(commitment)]),
            )
            .await?;
        Ok(response.value)
    }

    async fn send_transaction(
        &self,
        wire: &[u8],
        config: &SendConfig,
    ) -> Result<Signature, ClientError> {
        let signature: String = self
            .call("sendTransaction", send_params(wire, config))
            .await?;
        decode_signature(&signature)
    }

    async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<SignatureStatus>>, ClientError> {
        let encoded: Vec<String> = signatures.iter().map(ToString::to_string).collect();
        let response: WithContext<Vec<Option<UiSignatureStatus>>> = self
            .call(
                "getSignatureStatuses",
                json!([encoded, { "searchTransactionHistory": false }]),
            )
            .await?;

        Ok(response
            .value
            .into_iter()
            .map(|status| {
                status.map(|s| SignatureStatus {
                    slot: s.slot,
                    confirmations: s.confirmations,
                    err: s.err,
                    confirmation_status: s.confirmation_status,
                })
            })
            .collect())
    }

    async fn request_airdrop(
        &self,
        address: &Address,
        lamports: u64,
    ) -> Result<Signature, ClientError> {
        let signature: String = self
            .call("requestAirdrop", json!([address.to_string(), lamports]))
            .await?;
        decode_signature(&signature)
    }

    async fn get_token_account_balance(
        &self,
        address: &Address,
        commitment: Commitment,
    ) -> Result<TokenAmount, ClientError> {
        let response: WithContext<UiTokenAmount> = self
            .call(
                "getTokenAccountBalance",
                json!([address.to_string(), commitment_config(commitment)]),
            )
            .await?;
        let amount = response
            .value
            .amount
            .parse::<u64>()
            .map_err(|e| ClientError::transport(format!("token amount: {e}")))?;
        Ok(TokenAmount {
            amount,
            decimals: response.value.decimals,
            ui_amount_string: response.value.ui_amount_string,
        })
    }
}
