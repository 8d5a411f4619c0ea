//! Async network side of solkit.
//!
//! [`RpcClient`] abstracts the JSON-RPC endpoint, [`SubmissionCoordinator`]
//! turns a signed transaction into a definite outcome, and [`SolanaClient`]
//! strings both together with the offline builders from `solkit_core`.
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod commitment;
pub mod config;
pub mod error;
pub mod flows;
pub mod rpc;
pub mod state;
pub mod submit;

pub use commitment::Commitment;
pub use config::{ClientConfig, Cluster, DEVNET, LOCALNET, MAINNET_BETA, TESTNET};
pub use error::{ClientError, NotConfirmedReason};
pub use flows::SolanaClient;
pub use rpc::{
    Account, HttpRpcClient, LatestBlockhash, RpcClient, SendConfig, SignatureStatus, TokenAmount,
};
pub use state::{Clock, NonceAccount};
pub use submit::SubmissionCoordinator;
