//! Scripted in-memory RpcClient shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use solkit_client::{
    Account, ClientError, Commitment, LatestBlockhash, RpcClient, SendConfig, SignatureStatus,
    TokenAmount,
};
use solkit_core::{Address, Hash, Signature};

pub const LAST_VALID_BLOCK_HEIGHT: u64 = 150;

/// Mock RPC endpoint with configurable responses and call counters.
pub struct MockRpc {
    block_height: Mutex<u64>,
    /// Added to the block height after every `get_block_height` call.
    block_height_step: u64,
    send_error: Option<ClientError>,
    /// Each status poll pops one entry; the last entry repeats.
    statuses: Mutex<VecDeque<Result<Option<SignatureStatus>, ClientError>>>,
    accounts: Mutex<HashMap<Address, Account>>,
    token_balances: HashMap<Address, TokenAmount>,
    pub sent: Mutex<Vec<Vec<u8>>>,
    pub send_config: Mutex<Option<SendConfig>>,
    pub status_calls: Mutex<u64>,
    pub airdrops: Mutex<Vec<(Address, u64)>>,
}

impl MockRpc {
    pub fn new() -> Self {
        Self {
            block_height: Mutex::new(100),
            block_height_step: 0,
            send_error: None,
            statuses: Mutex::new(VecDeque::new()),
            accounts: Mutex::new(HashMap::new()),
            token_balances: HashMap::new(),
            sent: Mutex::new(Vec::new()),
            send_config: Mutex::new(None),
            status_calls: Mutex::new(0),
            airdrops: Mutex::new(Vec::new()),
        }
    }

    pub fn with_block_height(mut self, start: u64, step: u64) -> Self {
        self.block_height = Mutex::new(start);
        self.block_height_step = step;
        self
    }

    pub fn with_send_error(mut self, error: ClientError) -> Self {
        self.send_error = Some(error);
        self
    }

    pub fn with_statuses(
        self,
        statuses: Vec<Result<Option<SignatureStatus>, ClientError>>,
    ) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_account(self, address: Address, account: Account) -> Self {
        self.accounts.lock().unwrap().insert(address, account);
        self
    }

    pub fn with_token_balance(mut self, address: Address, amount: TokenAmount) -> Self {
        self.token_balances.insert(address, amount);
        self
    }

    pub fn set_account(&self, address: Address, account: Account) {
        self.accounts.lock().unwrap().insert(address, account);
    }

    pub fn status_calls(&self) -> u64 {
        *self.status_calls.lock().unwrap()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn next_status(&self) -> Result<Option<SignatureStatus>, ClientError> {
        *self.status_calls.lock().unwrap() += 1;
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses.front().cloned().unwrap_or(Ok(None))
        }
    }
}

pub fn status_at(level: Commitment) -> Option<SignatureStatus> {
    Some(SignatureStatus {
        slot: 200,
        confirmations: Some(1),
        err: None,
        confirmation_status: Some(level),
    })
}

pub fn failed_status(err: Value) -> Option<SignatureStatus> {
    Some(SignatureStatus {
        slot: 200,
        confirmations: Some(1),
        err: Some(err),
        confirmation_status: Some(Commitment::Confirmed),
    })
}

pub fn transient_error() -> ClientError {
    ClientError::Transport {
        message: "connection reset".into(),
    }
}

#[async_trait]
impl RpcClient for MockRpc {
    async fn get_latest_blockhash(
        &self,
        _commitment: Commitment,
    ) -> Result<LatestBlockhash, ClientError> {
        Ok(LatestBlockhash {
            blockhash: Hash::new([0x5A; 32]),
            last_valid_block_height: LAST_VALID_BLOCK_HEIGHT,
        })
    }

    async fn get_block_height(&self, _commitment: Commitment) -> Result<u64, ClientError> {
        let mut height = self.block_height.lock().unwrap();
        let current = *height;
        *height += self.block_height_step;
        Ok(current)
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        space: u64,
    ) -> Result<u64, ClientError> {
        Ok((space + 128) * 6_960)
    }

    async fn get_account_info(
        &self,
        address: &Address,
        _commitment: Commitment,
    ) -> Result<Option<Account>, ClientError> {
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    async fn get_balance(
        &self,
        address: &Address,
        _commitment: Commitment,
    ) -> Result<u64, ClientError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(address)
            .map_or(0, |a| a.lamports))
    }

    async fn send_transaction(
        &self,
        wire: &[u8],
        config: &SendConfig,
    ) -> Result<Signature, ClientError> {
        *self.send_config.lock().unwrap() = Some(config.clone());
        if let Some(error) = &self.send_error {
            return Err(error.clone());
        }
        self.sent.lock().unwrap().push(wire.to_vec());
        let first: [u8; 64] = wire[1..65].try_into().unwrap();
        Ok(Signature::new(first))
    }

    async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<SignatureStatus>>, ClientError> {
        let status = self.next_status()?;
        Ok(vec![status; signatures.len()])
    }

    async fn request_airdrop(
        &self,
        address: &Address,
        lamports: u64,
    ) -> Result<Signature, ClientError> {
        self.airdrops.lock().unwrap().push((*address, lamports));
        Ok(Signature::new([7u8; 64]))
    }

    async fn get_token_account_balance(
        &self,
        address: &Address,
        _commitment: Commitment,
    ) -> Result<TokenAmount, ClientError> {
        self.token_balances
            .get(address)
            .cloned()
            .ok_or_else(|| ClientError::Rpc {
                code: -32602,
                message: "could not find account".into(),
                data: None,
            })
    }
}
