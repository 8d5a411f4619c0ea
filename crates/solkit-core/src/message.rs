//! Transaction message assembly and wire serialization.
//!
//! Only the legacy message layout is produced. Its fields, in order:
//!
//! | field                  | encoding                               |
//! |------------------------|----------------------------------------|
//! | header                 | three `u8` counts (see [`MessageHeader`]) |
//! | account keys           | compact-u16 count, then 32 bytes each  |
//! | recent blockhash       | 32 bytes                               |
//! | instructions           | compact-u16 count, then each compiled  |
//!
//! A compiled instruction is its program key index (`u8`), its account
//! indices (compact-u16 count, one `u8` each) and its data (compact-u16
//! length, raw bytes).

use crate::address::{Address, Hash};
use crate::error::CoreError;
use crate::instruction::Instruction;
use crate::system;

/// Account indices are a single byte, so a message holds at most 256 keys.
pub const MAX_ACCOUNT_KEYS: usize = 256;

// ---------------------------------------------------------------------------
// Compact-u16 encoding
// ---------------------------------------------------------------------------

/// Write `value` as a little-endian base-128 varint of one to three bytes.
///
/// Seven payload bits go in each byte; the high bit marks that another
/// byte follows. Lengths under 128 therefore cost a single byte.
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut rest = u32::from(value);
    let mut out = Vec::with_capacity(3);
    while rest >= 0x80 {
        out.push((rest & 0x7f) as u8 | 0x80);
        rest >>= 7;
    }
    out.push(rest as u8);
    out
}

/// Encode a collection length, rejecting anything above `u16::MAX`.
pub(crate) fn encode_len(len: usize, what: &str) -> Result<Vec<u8>, CoreError> {
    let len = u16::try_from(len)
        .map_err(|_| CoreError::Serialization(format!("too many {what}: {len}")))?;
    Ok(encode_compact_u16(len))
}

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// How long a transaction stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifetimeToken {
    /// A recent blockhash; the transaction expires once the chain passes
    /// `last_valid_block_height`.
    Blockhash {
        blockhash: Hash,
        last_valid_block_height: u64,
    },
    /// A durable nonce stored in `nonce_account`; the transaction stays
    /// valid until the nonce is advanced.
    DurableNonce {
        nonce: Hash,
        nonce_account: Address,
        nonce_authority: Address,
    },
}

impl LifetimeToken {
    /// The value written into the message's `recent_blockhash` field.
    pub fn recent_blockhash(&self) -> Hash {
        match self {
            Self::Blockhash { blockhash, .. } => *blockhash,
            Self::DurableNonce { nonce, .. } => *nonce,
        }
    }
}

/// Signer and read-only counts describing how `account_keys` is partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// The first this-many keys must sign, fee payer included.
    pub num_required_signatures: u8,
    /// Trailing keys of the signer range that are read-only.
    pub num_readonly_signed: u8,
    /// Trailing keys of the non-signer range that are read-only.
    pub num_readonly_unsigned: u8,
}

/// An [`Instruction`] with every address swapped for its position in the
/// owning message's key list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

/// An unsigned transaction message.
///
/// Messages built by [`assemble`] are always consistent. A message put
/// together by hand is checked by [`TransactionMessage::validate`] before
/// it is serialized or signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionMessage {
    pub header: MessageHeader,

    /// Writable signers (fee payer first), read-only signers, writable
    /// non-signers, read-only non-signers.
    pub account_keys: Vec<Address>,

    pub lifetime: LifetimeToken,

    pub instructions: Vec<CompiledInstruction>,
}

impl TransactionMessage {
    /// Key 0, or `None` for a message with no keys.
    pub fn fee_payer(&self) -> Option<&Address> {
        self.account_keys.first()
    }

    pub fn recent_blockhash(&self) -> Hash {
        self.lifetime.recent_blockhash()
    }

    /// Addresses that must sign, in signature-slot order.
    ///
    /// Empty when the header claims more signers than there are keys.
    pub fn required_signers(&self) -> &[Address] {
        self.account_keys
            .get(..self.header.num_required_signatures as usize)
            .unwrap_or(&[])
    }

    pub fn is_signer(&self, index: usize) -> bool {
        index < self.header.num_required_signatures as usize && index < self.account_keys.len()
    }

    pub fn is_writable(&self, index: usize) -> bool {
        let num_keys = self.account_keys.len();
        let num_signers = self.header.num_required_signatures as usize;
        if index >= num_keys {
            return false;
        }
        if index < num_signers {
            index < num_signers.saturating_sub(self.header.num_readonly_signed as usize)
        } else {
            index < num_keys.saturating_sub(self.header.num_readonly_unsigned as usize)
        }
    }

    /// Check the header and instruction indices against `account_keys`.
    ///
    /// The fee payer must be a writable signer, the read-only counts must
    /// fit inside their ranges, and every index must name an existing key.
    pub fn validate(&self) -> Result<(), CoreError> {
        let num_keys = self.account_keys.len();
        let num_signers = self.header.num_required_signatures as usize;
        let invalid = |reason: String| -> Result<(), CoreError> {
            Err(CoreError::Serialization(reason))
        };

        if num_keys == 0 {
            return invalid("message has no account keys".into());
        }
        if num_keys > MAX_ACCOUNT_KEYS {
            return invalid(format!(
                "too many account keys: {num_keys} (max {MAX_ACCOUNT_KEYS})"
            ));
        }
        if num_signers == 0 || num_signers > num_keys {
            return invalid(format!(
                "header requires {num_signers} signers for {num_keys} account keys"
            ));
        }
        if self.header.num_readonly_signed as usize >= num_signers {
            return invalid(format!(
                "{} of {num_signers} signers read-only, fee payer must be writable",
                self.header.num_readonly_signed
            ));
        }
        if self.header.num_readonly_unsigned as usize > num_keys - num_signers {
            return invalid(format!(
                "{} read-only non-signers but only {} non-signer keys",
                self.header.num_readonly_unsigned,
                num_keys - num_signers
            ));
        }
        for ix in &self.instructions {
            let out_of_range = std::iter::once(&ix.program_id_index)
                .chain(&ix.account_indices)
                .find(|&&index| index as usize >= num_keys);
            if let Some(index) = out_of_range {
                return invalid(format!(
                    "instruction index {index} out of range for {num_keys} account keys"
                ));
            }
        }
        Ok(())
    }

    /// Serialize the message: the bytes every signer signs.
    pub fn serialize(&self) -> Result<Vec<u8>, CoreError> {
        self.validate()?;
        let mut buf = Vec::with_capacity(256);

        buf.push(self.header.num_required_signatures);
        buf.push(self.header.num_readonly_signed);
        buf.push(self.header.num_readonly_unsigned);

        buf.extend_from_slice(&encode_len(self.account_keys.len(), "account keys")?);
        for key in &self.account_keys {
            buf.extend_from_slice(key.as_bytes());
        }

        buf.extend_from_slice(self.recent_blockhash().as_bytes());

        buf.extend_from_slice(&encode_len(self.instructions.len(), "instructions")?);
        for ix in &self.instructions {
            buf.push(ix.program_id_index);

            buf.extend_from_slice(&encode_len(ix.account_indices.len(), "instruction accounts")?);
            buf.extend_from_slice(&ix.account_indices);

            buf.extend_from_slice(&encode_len(ix.data.len(), "instruction data bytes")?);
            buf.extend_from_slice(&ix.data);
        }

        Ok(buf)
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Assemble instructions, a fee payer and a lifetime into a message.
///
/// Accounts referenced more than once are merged with the OR of their
/// signer/writable flags. The fee payer is always key 0, signer and
/// writable. A durable-nonce lifetime gets an `AdvanceNonceAccount`
/// instruction prepended unless one is already first.
pub fn assemble(
    fee_payer: &Address,
    lifetime: LifetimeToken,
    instructions: &[Instruction],
) -> Result<TransactionMessage, CoreError> {
    if instructions.is_empty() {
        return Err(CoreError::EmptyInstructionList);
    }

    let mut all: Vec<Instruction> = Vec::with_capacity(instructions.len() + 1);
    if let LifetimeToken::DurableNonce {
        nonce_account,
        nonce_authority,
        ..
    } = &lifetime
    {
        if !system::is_advance_nonce(&instructions[0], nonce_account) {
            all.push(system::advance_nonce_account(nonce_account, nonce_authority));
        }
    }
    all.extend_from_slice(instructions);

    struct AccountEntry {
        address: Address,
        is_signer: bool,
        is_writable: bool,
    }

    // Instruction account lists are tiny, so a linear scan beats hashing.
    let mut entries: Vec<AccountEntry> = Vec::new();
    let mut upsert = |address: Address, signer: bool, writable: bool| {
        if let Some(entry) = entries.iter_mut().find(|e| e.address == address) {
            entry.is_signer |= signer;
            entry.is_writable |= writable;
        } else {
            entries.push(AccountEntry {
                address,
                is_signer: signer,
                is_writable: writable,
            });
        }
    };

    upsert(*fee_payer, true, true);
    for ix in &all {
        for meta in &ix.accounts {
            upsert(meta.address, meta.is_signer, meta.is_writable);
        }
        upsert(ix.program_id, false, false);
    }

    // Stable sort: insertion order survives inside each class, and the fee
    // payer was inserted first into the first class.
    entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
        (true, true) => 0u8,
        (true, false) => 1,
        (false, true) => 2,
        (false, false) => 3,
    });

    if entries.len() > MAX_ACCOUNT_KEYS {
        return Err(CoreError::Serialization(format!(
            "too many account keys: {} (max {MAX_ACCOUNT_KEYS})",
            entries.len()
        )));
    }

    let count = |what: &str, pred: fn(&AccountEntry) -> bool| {
        let n = entries.iter().filter(|e| pred(e)).count();
        u8::try_from(n).map_err(|_| {
            CoreError::Serialization(format!("too many {what}: {n} (max {})", u8::MAX))
        })
    };
    let header = MessageHeader {
        num_required_signatures: count("signers", |e| e.is_signer)?,
        num_readonly_signed: count("read-only signers", |e| e.is_signer && !e.is_writable)?,
        num_readonly_unsigned: count("read-only accounts", |e| {
            !e.is_signer && !e.is_writable
        })?,
    };

    let account_keys: Vec<Address> = entries.iter().map(|e| e.address).collect();
    let index_of = |address: &Address| -> Result<u8, CoreError> {
        account_keys
            .iter()
            .position(|k| k == address)
            .map(|i| i as u8)
            .ok_or_else(|| CoreError::Serialization(format!("{address} not in account keys")))
    };

    let mut compiled = Vec::with_capacity(all.len());
    for ix in &all {
        let account_indices = ix
            .accounts
            .iter()
            .map(|meta| index_of(&meta.address))
            .collect::<Result<Vec<u8>, CoreError>>()?;

        compiled.push(CompiledInstruction {
            program_id_index: index_of(&ix.program_id)?,
            account_indices,
            data: ix.data.clone(),
        });
    }

    Ok(TransactionMessage {
        header,
        account_keys,
        lifetime,
        instructions: compiled,
    })
}
