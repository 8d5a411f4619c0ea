//! Program Derived Address (PDA) derivation.
//!
//! A PDA is `SHA-256(seed_0 || ... || seed_n || bump || program_id ||
//! "ProgramDerivedAddress")`, accepted only when the digest is NOT a valid
//! Ed25519 point, so no private key can exist for it. The search walks the
//! bump from 255 down to 0 and returns the first off-curve result. This
//! mirrors the network's own derivation byte for byte.

use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::error::CoreError;
use crate::programs::ASSOCIATED_TOKEN_PROGRAM_ID;

/// Maximum number of seeds, bump included.
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single seed in bytes.
pub const MAX_SEED_LEN: usize = 32;

/// Domain separator appended to every PDA hash.
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Find the canonical PDA and its bump for `seeds` under `program`.
///
/// At most `MAX_SEEDS - 1` seeds may be supplied since the bump takes the
/// last slot.
pub fn derive_program_address(
    program: &Address,
    seeds: &[&[u8]],
) -> Result<(Address, u8), CoreError> {
    if seeds.len() >= MAX_SEEDS {
        return Err(CoreError::InvalidSeeds(format!(
            "at most {} seeds allowed before the bump, got {}",
            MAX_SEEDS - 1,
            seeds.len()
        )));
    }
    check_seed_lengths(seeds)?;

    for bump in (0u8..=255).rev() {
        let digest = hash_seeds(seeds, &[bump], program);
        if !digest.is_on_curve() {
            return Ok((digest, bump));
        }
    }

    Err(CoreError::NoValidBumpFound)
}

/// Compute a PDA from seeds that already include the bump.
///
/// Fails with [`CoreError::InvalidSeeds`] if the digest lands on the curve.
pub fn create_program_address(program: &Address, seeds: &[&[u8]]) -> Result<Address, CoreError> {
    if seeds.len() > MAX_SEEDS {
        return Err(CoreError::InvalidSeeds(format!(
            "at most {MAX_SEEDS} seeds allowed, got {}",
            seeds.len()
        )));
    }
    check_seed_lengths(seeds)?;

    let digest = hash_seeds(seeds, &[], program);
    if digest.is_on_curve() {
        return Err(CoreError::InvalidSeeds(
            "derived address lies on the ed25519 curve".into(),
        ));
    }
    Ok(digest)
}

/// Derive the associated token account for an owner + mint pair.
///
/// Seeds are `[owner, token_program, mint]` under the associated token
/// program. Works for both the classic token program and Token-2022.
pub fn find_associated_token_address(
    owner: &Address,
    mint: &Address,
    token_program: &Address,
) -> Result<(Address, u8), CoreError> {
    derive_program_address(
        &ASSOCIATED_TOKEN_PROGRAM_ID,
        &[owner.as_ref(), token_program.as_ref(), mint.as_ref()],
    )
}

fn check_seed_lengths(seeds: &[&[u8]]) -> Result<(), CoreError> {
    if let Some((index, seed)) = seeds
        .iter()
        .enumerate()
        .find(|(_, seed)| seed.len() > MAX_SEED_LEN)
    {
        return Err(CoreError::InvalidSeeds(format!(
            "seed {index} is {} bytes, max {MAX_SEED_LEN}",
            seed.len()
        )));
    }
    Ok(())
}

fn hash_seeds(seeds: &[&[u8]], bump: &[u8], program: &Address) -> Address {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(bump);
    hasher.update(program.as_bytes());
    hasher.update(PDA_MARKER);

    let digest: [u8; 32] = hasher.finalize().into();
    Address::new(digest)
}
