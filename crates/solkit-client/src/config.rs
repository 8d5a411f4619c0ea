use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::commitment::Commitment;
use crate::error::ClientError;

/// A well-known Solana cluster.
#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    pub name: &'static str,
    pub rpc_url: &'static str,
    /// Whether `requestAirdrop` is served.
    pub has_faucet: bool,
}

/// A local test validator on its default port.
pub const LOCALNET: Cluster = Cluster {
    name: "localnet",
    rpc_url: "http://localhost:8899",
    has_faucet: true,
};

pub const DEVNET: Cluster = Cluster {
    name: "devnet",
    rpc_url: "https://api.devnet.solana.com",
    has_faucet: true,
};

pub const TESTNET: Cluster = Cluster {
    name: "testnet",
    rpc_url: "https://api.testnet.solana.com",
    has_faucet: true,
};

pub const MAINNET_BETA: Cluster = Cluster {
    name: "mainnet-beta",
    rpc_url: "https://api.mainnet-beta.solana.com",
    has_faucet: false,
};

const ALL_CLUSTERS: &[&Cluster] = &[&LOCALNET, &DEVNET, &TESTNET, &MAINNET_BETA];

/// Look up a cluster by name, e.g. `"devnet"`.
pub fn get_cluster(name: &str) -> Option<&'static Cluster> {
    ALL_CLUSTERS.iter().find(|c| c.name == name).copied()
}

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

/// Settings for [`crate::HttpRpcClient`] and the submission flows.
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes:
///
/// ```json
/// { "rpc_url": "https://api.devnet.solana.com", "commitment": "finalized" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub rpc_url: String,
    /// Commitment for reads and confirmations.
    pub commitment: Commitment,
    /// Per-request HTTP timeout.
    pub request_timeout_ms: u64,
    /// How long a flow waits for confirmation after sending.
    pub confirm_timeout_ms: u64,
    /// Delay between signature status polls.
    pub poll_interval_ms: u64,
    pub skip_preflight: bool,
    /// Commitment for preflight simulation; the node default when unset.
    pub preflight_commitment: Option<Commitment>,
    /// Node-side rebroadcast limit; the node default when unset.
    pub max_retries: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_cluster(&LOCALNET)
    }
}

impl ClientConfig {
    pub fn for_cluster(cluster: &Cluster) -> Self {
        Self {
            rpc_url: cluster.rpc_url.to_owned(),
            commitment: Commitment::Confirmed,
            request_timeout_ms: 30_000,
            confirm_timeout_ms: 90_000,
            poll_interval_ms: 500,
            skip_preflight: false,
            preflight_commitment: None,
            max_retries: None,
        }
    }

    pub fn with_commitment(mut self, commitment: Commitment) -> Self {
        self.commitment = commitment;
        self
    }

    pub fn with_skip_preflight(mut self, skip: bool) -> Self {
        self.skip_preflight = skip;
        self
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, ClientError> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| ClientError::Config(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.rpc_url.trim().is_empty() {
            return Err(ClientError::Config("rpc_url is empty".into()));
        }
        if !self.rpc_url.starts_with("http://") && !self.rpc_url.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "rpc_url must be http(s): {}",
                self.rpc_url
            )));
        }
        for (name, value) in [
            ("request_timeout_ms", self.request_timeout_ms),
            ("confirm_timeout_ms", self.confirm_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(ClientError::Config(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
