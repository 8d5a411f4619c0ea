//! Associated Token Account program instructions.
//!
//! The associated token account (ATA) for an owner and mint lives at a PDA
//! of the ATA program; see [`crate::pda::find_associated_token_address`].

use crate::address::Address;
use crate::error::CoreError;
use crate::instruction::{AccountMeta, Instruction};
use crate::pda::find_associated_token_address;
use crate::programs::{is_token_program, ASSOCIATED_TOKEN_PROGRAM_ID, SYSTEM_PROGRAM_ID};

const CREATE_TAG: u8 = 0;
const CREATE_IDEMPOTENT_TAG: u8 = 1;

/// Build a `Create` instruction for the owner's associated token account.
///
/// Fails on-chain if the account already exists.
pub fn create_associated_token_account(
    payer: &Address,
    owner: &Address,
    mint: &Address,
    token_program: &Address,
) -> Result<Instruction, CoreError> {
    build(payer, owner, mint, token_program, CREATE_TAG)
}

/// Build a `CreateIdempotent` instruction, which succeeds when the account
/// already exists with the expected owner and mint.
pub fn create_associated_token_account_idempotent(
    payer: &Address,
    owner: &Address,
    mint: &Address,
    token_program: &Address,
) -> Result<Instruction, CoreError> {
    build(payer, owner, mint, token_program, CREATE_IDEMPOTENT_TAG)
}

fn build(
    payer: &Address,
    owner: &Address,
    mint: &Address,
    token_program: &Address,
    tag: u8,
) -> Result<Instruction, CoreError> {
    if !is_token_program(token_program) {
        return Err(CoreError::InvalidInstructionArgument(format!(
            "{token_program} is not a token program"
        )));
    }

    let (ata, _bump) = find_associated_token_address(owner, mint, token_program)?;

    Ok(Instruction::new(
        ASSOCIATED_TOKEN_PROGRAM_ID,
        vec![
            AccountMeta::writable(*payer, true),
            AccountMeta::writable(ata, false),
            AccountMeta::readonly(*owner, false),
            AccountMeta::readonly(*mint, false),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
            AccountMeta::readonly(*token_program, false),
        ],
        vec![tag],
    ))
}
