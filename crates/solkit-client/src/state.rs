//! Decoders for account data the client reads back from the chain.

use solkit_core::{Address, Hash};

use crate::error::ClientError;

/// The Clock sysvar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    pub slot: u64,
    /// Unix timestamp of the first slot of the current epoch.
    pub epoch_start_timestamp: i64,
    pub epoch: u64,
    pub leader_schedule_epoch: u64,
    /// Estimated wall-clock time of the current slot.
    pub unix_timestamp: i64,
}

impl Clock {
    pub const SIZE: usize = 40;

    pub fn decode(data: &[u8]) -> Result<Self, ClientError> {
        let data = require_len(data, Self::SIZE, "clock")?;
        Ok(Self {
            slot: u64::from_le_bytes(array(&data[0..8])),
            epoch_start_timestamp: i64::from_le_bytes(array(&data[8..16])),
            epoch: u64::from_le_bytes(array(&data[16..24])),
            leader_schedule_epoch: u64::from_le_bytes(array(&data[24..32])),
            unix_timestamp: i64::from_le_bytes(array(&data[32..40])),
        })
    }
}

/// An initialized durable nonce account.
///
/// Layout: `u32 version || u32 state || authority || nonce || u64 fee`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceAccount {
    pub authority: Address,
    pub nonce: Hash,
    pub lamports_per_signature: u64,
}

impl NonceAccount {
    pub const SIZE: usize = 80;

    const STATE_INITIALIZED: u32 = 1;

    pub fn decode(data: &[u8]) -> Result<Self, ClientError> {
        let data = require_len(data, Self::SIZE, "nonce account")?;
        let state = u32::from_le_bytes(array(&data[4..8]));
        if state != Self::STATE_INITIALIZED {
            return Err(ClientError::InvalidAccountData(format!(
                "nonce account is not initialized (state {state})"
            )));
        }
        Ok(Self {
            authority: Address::new(array(&data[8..40])),
            nonce: Hash::new(array(&data[40..72])),
            lamports_per_signature: u64::from_le_bytes(array(&data[72..80])),
        })
    }
}

fn require_len<'a>(data: &'a [u8], len: usize, what: &str) -> Result<&'a [u8], ClientError> {
    if data.len() < len {
        return Err(ClientError::InvalidAccountData(format!(
            "{what} data is {} bytes, expected {len}",
            data.len()
        )));
    }
    Ok(&data[..len])
}

/// Copy a slice whose length was already checked into a fixed array.
fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_clock() {
        let mut data = Vec::new();
        data.extend_from_slice(&123_456u64.to_le_bytes());
        data.extend_from_slice(&1_700_000_000i64.to_le_bytes());
        data.extend_from_slice(&512u64.to_le_bytes());
        data.extend_from_slice(&513u64.to_le_bytes());
        data.extend_from_slice(&1_700_000_321i64.to_le_bytes());

        let clock = Clock::decode(&data).unwrap();
        assert_eq!(clock.slot, 123_456);
        assert_eq!(clock.epoch_start_timestamp, 1_700_000_000);
        assert_eq!(clock.epoch, 512);
        assert_eq!(clock.leader_schedule_epoch, 513);
        assert_eq!(clock.unix_timestamp, 1_700_000_321);
    }

    #[test]
    fn short_clock_rejected() {
        let err = Clock::decode(&[0u8; 39]).unwrap_err();
        assert_eq!(
            err,
            ClientError::InvalidAccountData("clock data is 39 bytes, expected 40".into())
        );
    }

    #[test]
    fn decode_nonce_account() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&[3u8; 32]);
        data.extend_from_slice(&[4u8; 32]);
        data.extend_from_slice(&5000u64.to_le_bytes());

        let nonce = NonceAccount::decode(&data).unwrap();
        assert_eq!(nonce.authority, Address::new([3u8; 32]));
        assert_eq!(nonce.nonce, Hash::new([4u8; 32]));
        assert_eq!(nonce.lamports_per_signature, 5000);
    }

    #[test]
    fn uninitialized_nonce_rejected() {
        let data = [0u8; NonceAccount::SIZE];
        assert!(matches!(
            NonceAccount::decode(&data),
            Err(ClientError::InvalidAccountData(_))
        ));
    }
}
