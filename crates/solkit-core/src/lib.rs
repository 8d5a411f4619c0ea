//! Offline building blocks for Solana transactions.
//!
//! This crate derives addresses, builds System, Token and Associated Token
//! instructions, assembles them into legacy messages and signs the result.
//! Nothing here touches the network; the wire format is written by hand
//! with `ed25519-dalek` for signing and `bs58` for text encoding.

pub mod address;
pub mod associated_token;
pub mod error;
pub mod instruction;
pub mod message;
pub mod pda;
pub mod programs;
pub mod signer;
pub mod system;
pub mod token;
pub mod transaction;

// Re-export key public types for ergonomic imports.
pub use address::{decode, encode, Address, Hash};
pub use error::CoreError;
pub use instruction::{AccountMeta, Instruction};
pub use message::{assemble, LifetimeToken, MessageHeader, TransactionMessage};
pub use pda::{create_program_address, derive_program_address, find_associated_token_address};
pub use signer::{Keypair, Presigner, Signature, Signer};
pub use transaction::{partially_sign, sign, SignedTransaction};
