//! SPL Token and Token-2022 instructions.
//!
//! Both token programs share the same instruction layout for the basic
//! operations: a one-byte tag followed by packed little-endian fields.
//! Every builder takes the token program id explicitly so callers choose
//! between the classic program and Token-2022.

use crate::address::Address;
use crate::error::CoreError;
use crate::instruction::{AccountMeta, Instruction};
use crate::programs::{is_token_program, SYSVAR_RENT_ID, TOKEN_2022_PROGRAM_ID};

/// Size of a mint account without extensions.
pub const MINT_SIZE: u64 = 82;

/// Size of a token account without extensions.
pub const TOKEN_ACCOUNT_SIZE: u64 = 165;

/// Maximum number of signers in a token multisig.
pub const MAX_SIGNERS: usize = 11;

const INITIALIZE_MINT_TAG: u8 = 0;
const INITIALIZE_ACCOUNT_TAG: u8 = 1;
const TRANSFER_TAG: u8 = 3;
const MINT_TO_TAG: u8 = 7;
const TRANSFER_CHECKED_TAG: u8 = 12;
const MINT_TO_CHECKED_TAG: u8 = 14;
const INITIALIZE_ACCOUNT2_TAG: u8 = 16;
const INITIALIZE_ACCOUNT3_TAG: u8 = 18;
const INITIALIZE_MINT2_TAG: u8 = 20;

/// Token-2022 `ScaledUiAmountExtension` tag and its `UpdateMultiplier` sub-tag.
const SCALED_UI_AMOUNT_EXTENSION_TAG: u8 = 43;
const UPDATE_MULTIPLIER_TAG: u8 = 1;

// ---------------------------------------------------------------------------
// Mint and account initialization
// ---------------------------------------------------------------------------

/// Build an `InitializeMint` instruction (requires the rent sysvar).
///
/// Data: `[0, decimals, mint_authority, freeze_option]` where the freeze
/// authority is packed as `0` or `1 || pubkey`.
pub fn initialize_mint(
    token_program: &Address,
    mint: &Address,
    mint_authority: &Address,
    freeze_authority: Option<&Address>,
    decimals: u8,
) -> Result<Instruction, CoreError> {
    check_token_program(token_program)?;

    Ok(Instruction::new(
        *token_program,
        vec![
            AccountMeta::writable(*mint, false),
            AccountMeta::readonly(SYSVAR_RENT_ID, false),
        ],
        mint_data(INITIALIZE_MINT_TAG, mint_authority, freeze_authority, decimals),
    ))
}

/// Build an `InitializeMint2` instruction. Same as [`initialize_mint`] but
/// without the rent sysvar account.
pub fn initialize_mint2(
    token_program: &Address,
    mint: &Address,
    mint_authority: &Address,
    freeze_authority: Option<&Address>,
    decimals: u8,
) -> Result<Instruction, CoreError> {
    check_token_program(token_program)?;

    Ok(Instruction::new(
        *token_program,
        vec![AccountMeta::writable(*mint, false)],
        mint_data(INITIALIZE_MINT2_TAG, mint_authority, freeze_authority, decimals),
    ))
}

/// Build an `InitializeAccount` instruction. The owner is passed as an
/// account and the rent sysvar is required.
pub fn initialize_account(
    token_program: &Address,
    account: &Address,
    mint: &Address,
    owner: &Address,
) -> Result<Instruction, CoreError> {
    check_token_program(token_program)?;

    Ok(Instruction::new(
        *token_program,
        vec![
            AccountMeta::writable(*account, false),
            AccountMeta::readonly(*mint, false),
            AccountMeta::readonly(*owner, false),
            AccountMeta::readonly(SYSVAR_RENT_ID, false),
        ],
        vec![INITIALIZE_ACCOUNT_TAG],
    ))
}

/// Build an `InitializeAccount2` instruction (owner in data, rent sysvar).
pub fn initialize_account2(
    token_program: &Address,
    account: &Address,
    mint: &Address,
    owner: &Address,
) -> Result<Instruction, CoreError> {
    check_token_program(token_program)?;

    Ok(Instruction::new(
        *token_program,
        vec![
            AccountMeta::writable(*account, false),
            AccountMeta::readonly(*mint, false),
            AccountMeta::readonly(SYSVAR_RENT_ID, false),
        ],
        tag_with_address(INITIALIZE_ACCOUNT2_TAG, owner),
    ))
}

/// Build an `InitializeAccount3` instruction (owner in data, no sysvar).
pub fn initialize_account3(
    token_program: &Address,
    account: &Address,
    mint: &Address,
    owner: &Address,
) -> Result<Instruction, CoreError> {
    check_token_program(token_program)?;

    Ok(Instruction::new(
        *token_program,
        vec![
            AccountMeta::writable(*account, false),
            AccountMeta::readonly(*mint, false),
        ],
        tag_with_address(INITIALIZE_ACCOUNT3_TAG, owner),
    ))
}

// ---------------------------------------------------------------------------
// Minting and transfers
// ---------------------------------------------------------------------------

/// Build a `MintTo` instruction.
///
/// `multisig_signers` is empty for a single-key authority. With a multisig
/// authority the authority account does not sign and each listed signer
/// does.
pub fn mint_to(
    token_program: &Address,
    mint: &Address,
    destination: &Address,
    authority: &Address,
    multisig_signers: &[Address],
    amount: u64,
) -> Result<Instruction, CoreError> {
    check_token_program(token_program)?;

    let mut accounts = vec![
        AccountMeta::writable(*mint, false),
        AccountMeta::writable(*destination, false),
    ];
    push_authority(&mut accounts, authority, multisig_signers)?;

    Ok(Instruction::new(
        *token_program,
        accounts,
        tag_with_amount(MINT_TO_TAG, amount, None),
    ))
}

/// Build a `MintToChecked` instruction, which also asserts the mint's
/// decimals on-chain.
pub fn mint_to_checked(
    token_program: &Address,
    mint: &Address,
    destination: &Address,
    authority: &Address,
    multisig_signers: &[Address],
    amount: u64,
    decimals: u8,
) -> Result<Instruction, CoreError> {
    check_token_program(token_program)?;

    let mut accounts = vec![
        AccountMeta::writable(*mint, false),
        AccountMeta::writable(*destination, false),
    ];
    push_authority(&mut accounts, authority, multisig_signers)?;

    Ok(Instruction::new(
        *token_program,
        accounts,
        tag_with_amount(MINT_TO_CHECKED_TAG, amount, Some(decimals)),
    ))
}

/// Build a `Transfer` instruction moving `amount` base units.
///
/// Deprecated for Token-2022 mints with transfer-fee or hook extensions;
/// prefer [`transfer_checked`] there.
pub fn transfer(
    token_program: &Address,
    source: &Address,
    destination: &Address,
    authority: &Address,
    multisig_signers: &[Address],
    amount: u64,
) -> Result<Instruction, CoreError> {
    check_token_program(token_program)?;

    let mut accounts = vec![
        AccountMeta::writable(*source, false),
        AccountMeta::writable(*destination, false),
    ];
    push_authority(&mut accounts, authority, multisig_signers)?;

    Ok(Instruction::new(
        *token_program,
        accounts,
        tag_with_amount(TRANSFER_TAG, amount, None),
    ))
}

/// Build a `TransferChecked` instruction.
///
/// Accounts: source (w), mint, destination (w), authority.
/// Data: `[12] || u64 amount || decimals` (10 bytes).
#[allow(clippy::too_many_arguments)]
pub fn transfer_checked(
    token_program: &Address,
    source: &Address,
    mint: &Address,
    destination: &Address,
    authority: &Address,
    multisig_signers: &[Address],
    amount: u64,
    decimals: u8,
) -> Result<Instruction, CoreError> {
    check_token_program(token_program)?;

    let mut accounts = vec![
        AccountMeta::writable(*source, false),
        AccountMeta::readonly(*mint, false),
        AccountMeta::writable(*destination, false),
    ];
    push_authority(&mut accounts, authority, multisig_signers)?;

    Ok(Instruction::new(
        *token_program,
        accounts,
        tag_with_amount(TRANSFER_CHECKED_TAG, amount, Some(decimals)),
    ))
}

// ---------------------------------------------------------------------------
// Scaled UI amount extension (Token-2022 only)
// ---------------------------------------------------------------------------

/// Build a Token-2022 `ScaledUiAmount::UpdateMultiplier` instruction.
///
/// The multiplier is stored on-chain as an IEEE-754 `f64`, so it is encoded
/// bit-exact in little-endian order. It must be finite and strictly
/// positive. `effective_timestamp` is a unix timestamp in seconds; the new
/// multiplier applies from then on.
///
/// Data: `[43, 1] || f64 multiplier || i64 effective_timestamp` (18 bytes).
pub fn update_multiplier(
    token_program: &Address,
    mint: &Address,
    authority: &Address,
    multisig_signers: &[Address],
    multiplier: f64,
    effective_timestamp: i64,
) -> Result<Instruction, CoreError> {
    if *token_program != TOKEN_2022_PROGRAM_ID {
        return Err(CoreError::InvalidInstructionArgument(format!(
            "scaled ui amount requires the token-2022 program, got {token_program}"
        )));
    }
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return Err(CoreError::InvalidInstructionArgument(format!(
            "multiplier must be finite and positive, got {multiplier}"
        )));
    }

    let mut accounts = vec![AccountMeta::writable(*mint, false)];
    push_authority(&mut accounts, authority, multisig_signers)?;

    let mut data = Vec::with_capacity(18);
    data.push(SCALED_UI_AMOUNT_EXTENSION_TAG);
    data.push(UPDATE_MULTIPLIER_TAG);
    data.extend_from_slice(&multiplier.to_le_bytes());
    data.extend_from_slice(&effective_timestamp.to_le_bytes());

    Ok(Instruction::new(*token_program, accounts, data))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn check_token_program(program: &Address) -> Result<(), CoreError> {
    if !is_token_program(program) {
        return Err(CoreError::InvalidInstructionArgument(format!(
            "{program} is not a token program"
        )));
    }
    Ok(())
}

fn push_authority(
    accounts: &mut Vec<AccountMeta>,
    authority: &Address,
    multisig_signers: &[Address],
) -> Result<(), CoreError> {
    if multisig_signers.len() > MAX_SIGNERS {
        return Err(CoreError::InvalidInstructionArgument(format!(
            "at most {MAX_SIGNERS} multisig signers, got {}",
            multisig_signers.len()
        )));
    }

    accounts.push(AccountMeta::readonly(*authority, multisig_signers.is_empty()));
    accounts.extend(
        multisig_signers
            .iter()
            .map(|signer| AccountMeta::readonly(*signer, true)),
    );
    Ok(())
}

fn mint_data(
    tag: u8,
    mint_authority: &Address,
    freeze_authority: Option<&Address>,
    decimals: u8,
) -> Vec<u8> {
    let mut data = Vec::with_capacity(67);
    data.push(tag);
    data.push(decimals);
    data.extend_from_slice(mint_authority.as_bytes());
    match freeze_authority {
        Some(freeze) => {
            data.push(1);
            data.extend_from_slice(freeze.as_bytes());
        }
        None => data.push(0),
    }
    data
}

fn tag_with_address(tag: u8, address: &Address) -> Vec<u8> {
    let mut data = Vec::with_capacity(33);
    data.push(tag);
    data.extend_from_slice(address.as_bytes());
    data
}

fn tag_with_amount(tag: u8, amount: u64, decimals: Option<u8>) -> Vec<u8> {
    let mut data = Vec::with_capacity(10);
    data.push(tag);
    data.extend_from_slice(&amount.to_le_bytes());
    if let Some(decimals) = decimals {
        data.push(decimals);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::{SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID};

    fn addr(fill: u8) -> Address {
        Address::new([fill; 32])
    }

    // -- Program id checks ----------------------------------------------------

    #[test]
    fn rejects_non_token_program() {
        let err = transfer(&SYSTEM_PROGRAM_ID, &addr(1), &addr(2), &addr(3), &[], 1).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInstructionArgument(_)));
    }

    #[test]
    fn accepts_both_token_programs() {
        for program in [TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID] {
            let ix = transfer(&program, &addr(1), &addr(2), &addr(3), &[], 1).unwrap();
            assert_eq!(ix.program_id, program);
        }
    }

    // -- Mint initialization --------------------------------------------------

    #[test]
    fn initialize_mint_with_freeze_authority() {
        let ix = initialize_mint(&TOKEN_PROGRAM_ID, &addr(1), &addr(2), Some(&addr(3)), 9).unwrap();

        assert_eq!(ix.data.len(), 67);
        assert_eq!(ix.data[0], 0);
        assert_eq!(ix.data[1], 9);
        assert_eq!(&ix.data[2..34], addr(2).as_bytes());
        assert_eq!(ix.data[34], 1);
        assert_eq!(&ix.data[35..], addr(3).as_bytes());

        assert_eq!(ix.accounts[0], AccountMeta::writable(addr(1), false));
        assert_eq!(ix.accounts[1], AccountMeta::readonly(SYSVAR_RENT_ID, false));
    }

    #[test]
    fn initialize_mint2_without_freeze_authority() {
        let ix = initialize_mint2(&TOKEN_2022_PROGRAM_ID, &addr(1), &addr(2), None, 2).unwrap();

        assert_eq!(ix.data.len(), 35);
        assert_eq!(ix.data[0], 20);
        assert_eq!(ix.data[1], 2);
        assert_eq!(ix.data[34], 0);
        assert_eq!(ix.accounts, vec![AccountMeta::writable(addr(1), false)]);
    }

    #[test]
    fn full_decimal_range_is_accepted() {
        for decimals in [0u8, 2, 9, 255] {
            assert!(initialize_mint2(&TOKEN_PROGRAM_ID, &addr(1), &addr(2), None, decimals).is_ok());
        }
    }

    // -- Account initialization -----------------------------------------------

    #[test]
    fn initialize_account_variants() {
        let v1 = initialize_account(&TOKEN_PROGRAM_ID, &addr(1), &addr(2), &addr(3)).unwrap();
        assert_eq!(v1.data, vec![1]);
        assert_eq!(v1.accounts.len(), 4);
        assert_eq!(v1.accounts[2], AccountMeta::readonly(addr(3), false));

        let v2 = initialize_account2(&TOKEN_PROGRAM_ID, &addr(1), &addr(2), &addr(3)).unwrap();
        assert_eq!(v2.data[0], 16);
        assert_eq!(&v2.data[1..], addr(3).as_bytes());
        assert_eq!(v2.accounts.len(), 3);
        assert_eq!(v2.accounts[2], AccountMeta::readonly(SYSVAR_RENT_ID, false));

        let v3 = initialize_account3(&TOKEN_PROGRAM_ID, &addr(1), &addr(2), &addr(3)).unwrap();
        assert_eq!(v3.data[0], 18);
        assert_eq!(v3.accounts.len(), 2);
    }

    // -- Mint / transfer ------------------------------------------------------

    #[test]
    fn mint_to_layout() {
        let ix = mint_to(&TOKEN_PROGRAM_ID, &addr(1), &addr(2), &addr(3), &[], 100).unwrap();

        assert_eq!(ix.data.len(), 9);
        assert_eq!(ix.data[0], 7);
        assert_eq!(&ix.data[1..], &100u64.to_le_bytes());
        assert_eq!(
            ix.accounts,
            vec![
                AccountMeta::writable(addr(1), false),
                AccountMeta::writable(addr(2), false),
                AccountMeta::readonly(addr(3), true),
            ]
        );
    }

    #[test]
    fn mint_to_checked_appends_decimals() {
        let ix =
            mint_to_checked(&TOKEN_PROGRAM_ID, &addr(1), &addr(2), &addr(3), &[], 100, 2).unwrap();
        assert_eq!(ix.data.len(), 10);
        assert_eq!(ix.data[0], 14);
        assert_eq!(ix.data[9], 2);
    }

    #[test]
    fn transfer_layout_and_roles() {
        let ix = transfer(&TOKEN_PROGRAM_ID, &addr(1), &addr(2), &addr(3), &[], 500_000).unwrap();

        assert_eq!(ix.data[0], 3);
        assert_eq!(u64::from_le_bytes(ix.data[1..9].try_into().unwrap()), 500_000);

        assert!(ix.accounts[0].is_writable && !ix.accounts[0].is_signer);
        assert!(ix.accounts[1].is_writable && !ix.accounts[1].is_signer);
        assert!(!ix.accounts[2].is_writable && ix.accounts[2].is_signer);
    }

    #[test]
    fn zero_amount_transfer_builds() {
        let ix = transfer(&TOKEN_PROGRAM_ID, &addr(1), &addr(2), &addr(3), &[], 0).unwrap();
        assert_eq!(&ix.data[1..], &[0u8; 8]);
    }

    #[test]
    fn transfer_checked_layout() {
        let ix = transfer_checked(
            &TOKEN_2022_PROGRAM_ID,
            &addr(1),
            &addr(4),
            &addr(2),
            &addr(3),
            &[],
            50,
            2,
        )
        .unwrap();

        assert_eq!(ix.data, {
            let mut d = vec![12];
            d.extend_from_slice(&50u64.to_le_bytes());
            d.push(2);
            d
        });
        assert_eq!(ix.accounts[1], AccountMeta::readonly(addr(4), false));
        assert_eq!(ix.accounts[2], AccountMeta::writable(addr(2), false));
        assert_eq!(ix.accounts[3], AccountMeta::readonly(addr(3), true));
    }

    #[test]
    fn multisig_authority_does_not_sign() {
        let signers = [addr(7), addr(8)];
        let ix = transfer(&TOKEN_PROGRAM_ID, &addr(1), &addr(2), &addr(3), &signers, 1).unwrap();

        assert_eq!(ix.accounts.len(), 5);
        assert_eq!(ix.accounts[2], AccountMeta::readonly(addr(3), false));
        assert_eq!(ix.accounts[3], AccountMeta::readonly(addr(7), true));
        assert_eq!(ix.accounts[4], AccountMeta::readonly(addr(8), true));
    }

    #[test]
    fn too_many_multisig_signers_rejected() {
        let signers = vec![addr(7); MAX_SIGNERS + 1];
        let err = mint_to(&TOKEN_PROGRAM_ID, &addr(1), &addr(2), &addr(3), &signers, 1).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInstructionArgument(_)));
    }

    // -- Scaled UI multiplier -------------------------------------------------

    #[test]
    fn update_multiplier_layout() {
        let ix = update_multiplier(
            &TOKEN_2022_PROGRAM_ID,
            &addr(1),
            &addr(2),
            &[],
            1.5,
            1_700_000_000,
        )
        .unwrap();

        assert_eq!(ix.data.len(), 18);
        assert_eq!(&ix.data[..2], &[43, 1]);
        assert_eq!(&ix.data[2..10], &1.5f64.to_le_bytes());
        assert_eq!(&ix.data[10..], &1_700_000_000i64.to_le_bytes());
        assert_eq!(
            ix.accounts,
            vec![
                AccountMeta::writable(addr(1), false),
                AccountMeta::readonly(addr(2), true),
            ]
        );
    }

    #[test]
    fn update_multiplier_requires_token_2022() {
        let err =
            update_multiplier(&TOKEN_PROGRAM_ID, &addr(1), &addr(2), &[], 1.5, 0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInstructionArgument(_)));
    }

    #[test]
    fn update_multiplier_rejects_invalid_values() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = update_multiplier(&TOKEN_2022_PROGRAM_ID, &addr(1), &addr(2), &[], bad, 0);
            assert!(result.is_err(), "{bad} should be rejected");
        }
    }
}
