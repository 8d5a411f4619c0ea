//! System Program instructions.
//!
//! The System Program encodes its instruction tag as a little-endian `u32`
//! followed by fixed-width little-endian fields.

use crate::address::Address;
use crate::error::CoreError;
use crate::instruction::{AccountMeta, Instruction};
use crate::programs::{SYSTEM_PROGRAM_ID, SYSVAR_RECENT_BLOCKHASHES_ID};

/// Largest account data size the network allows at creation (10 MiB).
pub const MAX_PERMITTED_DATA_LENGTH: u64 = 10 * 1024 * 1024;

const CREATE_ACCOUNT_TAG: u32 = 0;
const TRANSFER_TAG: u32 = 2;
const ADVANCE_NONCE_ACCOUNT_TAG: u32 = 4;

/// Build a `CreateAccount` instruction.
///
/// Funds `new_account` with `lamports` from `payer`, allocates `space` bytes
/// and assigns it to `owner`. Both `payer` and `new_account` must sign.
///
/// Data: `u32 0 || u64 lamports || u64 space || owner` (52 bytes).
pub fn create_account(
    payer: &Address,
    new_account: &Address,
    lamports: u64,
    space: u64,
    owner: &Address,
) -> Result<Instruction, CoreError> {
    if space > MAX_PERMITTED_DATA_LENGTH {
        return Err(CoreError::InvalidInstructionArgument(format!(
            "space {space} exceeds maximum of {MAX_PERMITTED_DATA_LENGTH} bytes"
        )));
    }

    let mut data = Vec::with_capacity(52);
    data.extend_from_slice(&CREATE_ACCOUNT_TAG.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());
    data.extend_from_slice(&space.to_le_bytes());
    data.extend_from_slice(owner.as_bytes());

    Ok(Instruction::new(
        SYSTEM_PROGRAM_ID,
        vec![
            AccountMeta::writable(*payer, true),
            AccountMeta::writable(*new_account, true),
        ],
        data,
    ))
}

/// Build a native `Transfer` instruction.
///
/// A zero amount is structurally valid.
///
/// Data: `u32 2 || u64 lamports` (12 bytes).
pub fn transfer(from: &Address, to: &Address, lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&TRANSFER_TAG.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction::new(
        SYSTEM_PROGRAM_ID,
        vec![
            AccountMeta::writable(*from, true),
            AccountMeta::writable(*to, false),
        ],
        data,
    )
}

/// Build an `AdvanceNonceAccount` instruction.
///
/// Must be the first instruction of any transaction that uses a durable
/// nonce as its lifetime.
pub fn advance_nonce_account(nonce_account: &Address, authority: &Address) -> Instruction {
    Instruction::new(
        SYSTEM_PROGRAM_ID,
        vec![
            AccountMeta::writable(*nonce_account, false),
            AccountMeta::readonly(SYSVAR_RECENT_BLOCKHASHES_ID, false),
            AccountMeta::readonly(*authority, true),
        ],
        ADVANCE_NONCE_ACCOUNT_TAG.to_le_bytes().to_vec(),
    )
}

/// Whether `ix` is an `AdvanceNonceAccount` for `nonce_account`.
pub(crate) fn is_advance_nonce(ix: &Instruction, nonce_account: &Address) -> bool {
    ix.program_id == SYSTEM_PROGRAM_ID
        && ix.data == ADVANCE_NONCE_ACCOUNT_TAG.to_le_bytes()
        && ix.accounts.first().map(|m| m.address) == Some(*nonce_account)
}
