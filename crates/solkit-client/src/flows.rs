//! End-to-end operations: fetch a lifetime, assemble, sign, submit, confirm.

use std::sync::Arc;

use solkit_core::programs::SYSVAR_CLOCK_ID;
use solkit_core::{
    assemble, associated_token, find_associated_token_address, sign, system, token, Address,
    Instruction, Signature, Signer,
};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::rpc::{HttpRpcClient, RpcClient, SendConfig, TokenAmount};
use crate::state::Clock;
use crate::submit::SubmissionCoordinator;

/// High-level client bundling an [`RpcClient`], its configuration and a
/// [`SubmissionCoordinator`].
#[derive(Clone)]
pub struct SolanaClient {
    rpc: Arc<dyn RpcClient>,
    config: ClientConfig,
    coordinator: SubmissionCoordinator,
}

impl SolanaClient {
    pub fn new(rpc: Arc<dyn RpcClient>, config: ClientConfig) -> Self {
        let coordinator = SubmissionCoordinator::new(rpc.clone())
            .with_poll_interval(config.poll_interval())
            .with_send_config(SendConfig {
                skip_preflight: config.skip_preflight,
                preflight_commitment: config.preflight_commitment,
                max_retries: config.max_retries,
            });
        Self {
            rpc,
            config,
            coordinator,
        }
    }

    /// Connect over HTTP using `config.rpc_url`.
    pub fn from_config(config: ClientConfig) -> Result<Self, ClientError> {
        let rpc = HttpRpcClient::from_config(&config)?;
        Ok(Self::new(Arc::new(rpc), config))
    }

    pub fn rpc(&self) -> &Arc<dyn RpcClient> {
        &self.rpc
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &SubmissionCoordinator {
        &self.coordinator
    }

    /// Assemble `instructions` under a fresh blockhash, sign with the fee
    /// payer plus `extra_signers`, then submit and confirm.
    pub async fn send_instructions(
        &self,
        fee_payer: &dyn Signer,
        instructions: &[Instruction],
        extra_signers: &[&dyn Signer],
    ) -> Result<Signature, ClientError> {
        let latest = self.rpc.get_latest_blockhash(self.config.commitment).await?;
        let message = assemble(&fee_payer.address(), latest.lifetime(), instructions)?;

        let mut signers: Vec<&dyn Signer> = Vec::with_capacity(extra_signers.len() + 1);
        signers.push(fee_payer);
        signers.extend_from_slice(extra_signers);
        let tx = sign(message, &signers)?;

        self.coordinator
            .submit_and_confirm(&tx, self.config.commitment, self.config.confirm_timeout())
            .await
    }

    /// Request test lamports from the cluster faucet and wait for them.
    pub async fn airdrop(&self, address: &Address, lamports: u64) -> Result<Signature, ClientError> {
        let signature = self.rpc.request_airdrop(address, lamports).await?;
        info!(%address, lamports, %signature, "airdrop requested");
        self.coordinator
            .confirm_signature(&signature, self.config.commitment, self.config.confirm_timeout())
            .await
    }

    pub async fn transfer_lamports(
        &self,
        from: &dyn Signer,
        to: &Address,
        lamports: u64,
    ) -> Result<Signature, ClientError> {
        let ix = system::transfer(&from.address(), to, lamports);
        self.send_instructions(from, &[ix], &[]).await
    }

    /// Create and initialize a mint owned by `token_program`, funded by
    /// `payer` with the rent-exempt minimum.
    pub async fn create_mint(
        &self,
        payer: &dyn Signer,
        mint: &dyn Signer,
        mint_authority: &Address,
        freeze_authority: Option<&Address>,
        decimals: u8,
        token_program: &Address,
    ) -> Result<Signature, ClientError> {
        let rent = self
            .rpc
            .get_minimum_balance_for_rent_exemption(token::MINT_SIZE)
            .await?;
        let instructions = [
            system::create_account(
                &payer.address(),
                &mint.address(),
                rent,
                token::MINT_SIZE,
                token_program,
            )?,
            token::initialize_mint2(
                token_program,
                &mint.address(),
                mint_authority,
                freeze_authority,
                decimals,
            )?,
        ];
        self.send_instructions(payer, &instructions, &[mint]).await
    }

    /// Create and initialize a token account at a fresh keypair address.
    pub async fn create_token_account(
        &self,
        payer: &dyn Signer,
        account: &dyn Signer,
        mint: &Address,
        owner: &Address,
        token_program: &Address,
    ) -> Result<Signature, ClientError> {
        let rent = self
            .rpc
            .get_minimum_balance_for_rent_exemption(token::TOKEN_ACCOUNT_SIZE)
            .await?;
        let instructions = [
            system::create_account(
                &payer.address(),
                &account.address(),
                rent,
                token::TOKEN_ACCOUNT_SIZE,
                token_program,
            )?,
            token::initialize_account3(token_program, &account.address(), mint, owner)?,
        ];
        self.send_instructions(payer, &instructions, &[account]).await
    }

    /// Create the associated token account for `owner` and `mint`.
    ///
    /// Returns the account address alongside the transaction signature.
    pub async fn create_associated_token_account(
        &self,
        payer: &dyn Signer,
        owner: &Address,
        mint: &Address,
        token_program: &Address,
    ) -> Result<(Address, Signature), ClientError> {
        let (ata, _) = find_associated_token_address(owner, mint, token_program)?;
        let ix = associated_token::create_associated_token_account(
            &payer.address(),
            owner,
            mint,
            token_program,
        )?;
        let signature = self.send_instructions(payer, &[ix], &[]).await?;
        Ok((ata, signature))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn mint_to(
        &self,
        payer: &dyn Signer,
        mint: &Address,
        destination: &Address,
        authority: &dyn Signer,
        amount: u64,
        decimals: u8,
        token_program: &Address,
    ) -> Result<Signature, ClientError> {
        let ix = token::mint_to_checked(
            token_program,
            mint,
            destination,
            &authority.address(),
            &[],
            amount,
            decimals,
        )?;
        self.send_instructions(payer, &[ix], &[authority]).await
    }

    /// Move tokens between two token accounts with a checked transfer.
    #[allow(clippy::too_many_arguments)]
    pub async fn transfer_tokens(
        &self,
        payer: &dyn Signer,
        source: &Address,
        mint: &Address,
        destination: &Address,
        owner: &dyn Signer,
        amount: u64,
        decimals: u8,
        token_program: &Address,
    ) -> Result<Signature, ClientError> {
        let ix = token::transfer_checked(
            token_program,
            source,
            mint,
            destination,
            &owner.address(),
            &[],
            amount,
            decimals,
        )?;
        self.send_instructions(payer, &[ix], &[owner]).await
    }

    /// Set a new scaled-UI multiplier on a Token-2022 mint, effective at
    /// `effective_timestamp` (unix seconds).
    pub async fn update_scaled_ui_multiplier(
        &self,
        payer: &dyn Signer,
        mint: &Address,
        authority: &dyn Signer,
        multiplier: f64,
        effective_timestamp: i64,
        token_program: &Address,
    ) -> Result<Signature, ClientError> {
        let ix = token::update_multiplier(
            token_program,
            mint,
            &authority.address(),
            &[],
            multiplier,
            effective_timestamp,
        )?;
        self.send_instructions(payer, &[ix], &[authority]).await
    }

    /// Read and decode the Clock sysvar.
    pub async fn read_clock(&self) -> Result<Clock, ClientError> {
        let account = self
            .rpc
            .get_account_info(&SYSVAR_CLOCK_ID, self.config.commitment)
            .await?
            .ok_or(ClientError::AccountNotFound(SYSVAR_CLOCK_ID))?;
        Clock::decode(&account.data)
    }

    /// Balance of `owner`'s associated token account for `mint`.
    ///
    /// Fails with [`ClientError::AccountNotFound`] when that account does
    /// not exist.
    pub async fn token_balance(
        &self,
        owner: &Address,
        mint: &Address,
        token_program: &Address,
    ) -> Result<TokenAmount, ClientError> {
        let (ata, _) = find_associated_token_address(owner, mint, token_program)?;
        if self
            .rpc
            .get_account_info(&ata, self.config.commitment)
            .await?
            .is_none()
        {
            return Err(ClientError::AccountNotFound(ata));
        }
        self.rpc
            .get_token_account_balance(&ata, self.config.commitment)
            .await
    }
}
