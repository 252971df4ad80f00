//! Transaction submission shared by approvals and swaps.
//!
//! Every write goes through the same steps: draft (gas price + offset, fresh
//! nonce), estimate gas, sign locally, `eth_sendRawTransaction`, then poll for
//! the receipt up to the configured timeout.

use crate::error::{Result, SwapError};
use crate::settings::{Settings, SwapPolicy};
use crate::types::SwapOutcome;
use crate::units;
use crate::wallet;
use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::TransactionRequest;
use tracing::{debug, info, warn};

/// Signing identity plus the connection it sends through.
#[derive(Clone)]
pub struct TxSender {
    provider: DynProvider,
    chain_id: u64,
    owner: Option<Address>,
    wallet: Option<EthereumWallet>,
    signer_address: Option<Address>,
    /// Why the configured key could not be loaded
    key_error: Option<String>,
}

impl TxSender {
    /// Read-only senders are fine: missing or broken credentials only fail
    /// when something is actually sent.
    pub fn new(provider: DynProvider, chain_id: u64, settings: &Settings) -> Self {
        let owner = settings.account();
        let mut signer_address = None;
        let (wallet, key_error) = if settings.private_key.is_empty() {
            (None, None)
        } else {
            match wallet::signer_from_private_key(&settings.private_key) {
                Ok(signer) => {
                    if owner.is_some_and(|o| o != signer.address()) {
                        warn!(
                            "Configured address {} does not match private key address {}",
                            settings.address,
                            signer.address()
                        );
                    }
                    signer_address = Some(signer.address());
                    (Some(EthereumWallet::from(signer)), None)
                }
                Err(e) => {
                    warn!("Private key not loaded: {}", e);
                    (None, Some(e.to_string()))
                }
            }
        };

        Self {
            provider,
            chain_id,
            owner,
            wallet,
            signer_address,
            key_error,
        }
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Configured wallet address
    pub fn owner(&self) -> Result<Address> {
        self.owner.ok_or(SwapError::MissingCredentials)
    }

    /// Address the loaded key signs for, if any.
    pub fn signer_address(&self) -> Option<Address> {
        self.signer_address
    }

    fn wallet(&self) -> Result<&EthereumWallet> {
        match (&self.wallet, &self.key_error) {
            (Some(wallet), _) => Ok(wallet),
            (None, Some(reason)) => Err(SwapError::InvalidPrivateKey(reason.clone())),
            (None, None) => Err(SwapError::MissingCredentials),
        }
    }

    /// Unsigned request with sender, gas price and nonce filled in.
    pub async fn draft(
        &self,
        to: Address,
        input: Bytes,
        value: U256,
        policy: &SwapPolicy,
    ) -> Result<TransactionRequest> {
        let from = self.owner()?;
        let gas_price = units::gas_price_with_offset(&self.provider, policy.gas.gwei_offset).await?;
        let nonce = self.provider.get_transaction_count(from).await?;

        debug!("Draft tx: from {} to {} | value {} | nonce {} | gas price {}", from, to, value, nonce, gas_price);

        Ok(TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(input)
            .with_value(value)
            .with_gas_price(gas_price)
            .with_nonce(nonce)
            .with_chain_id(self.chain_id))
    }

    /// Estimate, sign, broadcast and wait for the receipt of a drafted request.
    ///
    /// Once the transaction is broadcast, a missing receipt is reported as
    /// `Unconfirmed` with its hash.
    pub async fn submit(&self, tx: TransactionRequest, policy: &SwapPolicy) -> Result<SwapOutcome> {
        self.wallet()?;

        let gas = units::estimate_gas(&self.provider, &tx, &policy.gas).await?;
        if !gas.within_budget {
            warn!(
                "Estimated fee {} exceeds MaxTXFeeETH {}",
                gas.cost_native, policy.gas.max_tx_fee_native
            );
        }

        let raw = self.sign(tx, gas.gas_limit).await?;
        let pending = self.provider.send_raw_transaction(&raw).await?;
        let tx_hash = *pending.tx_hash();
        info!("Tx submitted: {}", tx_hash);

        let receipt = pending
            .with_timeout(Some(policy.timeout))
            .get_receipt()
            .await
            .map_err(|source| {
                warn!("No receipt for {}: {}", tx_hash, source);
                SwapError::Unconfirmed { tx_hash, source }
            })?;
        let success = receipt.status();
        if success {
            info!("Tx confirmed: {} | block {:?}", tx_hash, receipt.block_number);
        } else {
            warn!("Tx reverted: {}", tx_hash);
        }

        Ok(SwapOutcome::confirmed(success, tx_hash.to_string(), gas))
    }

    /// Attach `gas_limit` and sign locally. Returns the EIP-2718 encoding.
    pub async fn sign(&self, tx: TransactionRequest, gas_limit: u64) -> Result<Bytes> {
        let envelope = tx
            .with_gas_limit(gas_limit)
            .build(self.wallet()?)
            .await
            .map_err(|e| SwapError::TxBuild(e.to_string()))?;
        Ok(envelope.encoded_2718().into())
    }

    /// `draft` followed by `submit`.
    pub async fn send(
        &self,
        to: Address,
        input: Bytes,
        value: U256,
        policy: &SwapPolicy,
    ) -> Result<SwapOutcome> {
        let tx = self.draft(to, input, value, policy).await?;
        self.submit(tx, policy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        mock_provider, push_broadcast, push_draft, push_send, test_address, GAS_PRICE, NONCE,
        TEST_KEY,
    };
    use crate::types::OutcomeDetail;
    use alloy::consensus::{Transaction as _, TxEnvelope};
    use alloy::eips::eip2718::Decodable2718;
    use alloy::primitives::{TxHash, U128, U64};
    use alloy::transports::mock::Asserter;

    fn settings_with(address: &str, key: &str) -> Settings {
        Settings {
            address: address.to_string(),
            private_key: key.to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_credentials_loaded() {
        let (provider, _asserter) = mock_provider();
        let sender = TxSender::new(provider, 8453, &settings_with(&test_address().to_string(), TEST_KEY));
        assert_eq!(sender.owner().unwrap(), test_address());
        assert_eq!(sender.signer_address(), Some(test_address()));
        assert!(sender.wallet().is_ok());
    }

    #[test]
    fn test_read_only_sender() {
        let (provider, _asserter) = mock_provider();
        let sender = TxSender::new(provider, 8453, &Settings::default());
        assert!(matches!(sender.owner(), Err(SwapError::MissingCredentials)));
        assert!(matches!(sender.wallet(), Err(SwapError::MissingCredentials)));
    }

    #[test]
    fn test_bad_key_reported_on_send() {
        let (provider, _asserter) = mock_provider();
        let sender = TxSender::new(provider, 8453, &settings_with("", "0x1234"));
        assert!(matches!(sender.wallet(), Err(SwapError::InvalidPrivateKey(_))));
    }

    #[tokio::test]
    async fn test_draft_fills_gas_price_and_nonce() {
        let (provider, asserter) = mock_provider();
        asserter.push_success(&U128::from(1_000_000_000u64));
        asserter.push_success(&U64::from(7u64));

        let settings = Settings {
            gwei_offset: 2,
            ..settings_with(&test_address().to_string(), TEST_KEY)
        };
        let sender = TxSender::new(provider, 8453, &settings);
        let tx = sender
            .draft(Address::repeat_byte(9), Bytes::new(), U256::from(5u64), &settings.swap_policy())
            .await
            .unwrap();

        assert_eq!(tx.from, Some(test_address()));
        assert_eq!(tx.gas_price, Some(3_000_000_000));
        assert_eq!(tx.nonce, Some(7));
        assert_eq!(tx.value, Some(U256::from(5u64)));
        assert_eq!(tx.chain_id, Some(8453));
    }

    fn funded_sender() -> (TxSender, SwapPolicy, Asserter) {
        let (provider, asserter) = mock_provider();
        let settings = settings_with(&test_address().to_string(), TEST_KEY);
        (TxSender::new(provider, 8453, &settings), settings.swap_policy(), asserter)
    }

    #[tokio::test]
    async fn test_sign_attaches_gas_limit() {
        let (sender, policy, asserter) = funded_sender();
        push_draft(&asserter);
        let to = Address::repeat_byte(9);
        let input = Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]);

        let tx = sender
            .draft(to, input.clone(), U256::from(5u64), &policy)
            .await
            .unwrap();
        let raw = sender.sign(tx, 110_000).await.unwrap();

        let envelope = TxEnvelope::decode_2718_exact(&raw).unwrap();
        assert_eq!(envelope.gas_limit(), 110_000);
        assert_eq!(envelope.gas_price(), Some(GAS_PRICE as u128));
        assert_eq!(envelope.nonce(), NONCE);
        assert_eq!(envelope.chain_id(), Some(8453));
        assert_eq!(envelope.to(), Some(to));
        assert_eq!(envelope.value(), U256::from(5u64));
        assert_eq!(envelope.input(), &input);
    }

    #[tokio::test]
    async fn test_send_confirmed() {
        let (sender, policy, asserter) = funded_sender();
        let tx_hash = TxHash::repeat_byte(0x11);
        push_send(&asserter, tx_hash, true);

        let outcome = sender
            .send(Address::repeat_byte(9), Bytes::new(), U256::ZERO, &policy)
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.tx_hash, tx_hash.to_string());
        let gas = outcome.gas().unwrap();
        // 100k estimate plus the 10% margin
        assert_eq!(gas.gas_limit, 110_000);
        assert!(gas.within_budget);
    }

    #[tokio::test]
    async fn test_send_reverted() {
        let (sender, policy, asserter) = funded_sender();
        let tx_hash = TxHash::repeat_byte(0x12);
        push_send(&asserter, tx_hash, false);

        let outcome = sender
            .send(Address::repeat_byte(9), Bytes::new(), U256::ZERO, &policy)
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.tx_hash, tx_hash.to_string());
        assert!(matches!(outcome.detail, OutcomeDetail::Gas(_)));
    }

    #[tokio::test]
    async fn test_missing_receipt_keeps_hash() {
        let (sender, policy, asserter) = funded_sender();
        let tx_hash = TxHash::repeat_byte(0x13);
        push_draft(&asserter);
        push_broadcast(&asserter, tx_hash);
        asserter.push_failure_msg("receipt lookup failed");

        let err = sender
            .send(Address::repeat_byte(9), Bytes::new(), U256::ZERO, &policy)
            .await
            .unwrap_err();

        assert!(matches!(err, SwapError::Unconfirmed { .. }));
        assert_eq!(err.broadcast_hash(), Some(tx_hash));
    }

    #[tokio::test]
    async fn test_read_only_sender_sends_nothing() {
        // no replies queued: the credential check must come before any RPC
        let (provider, _asserter) = mock_provider();
        let sender = TxSender::new(provider, 8453, &Settings::default());

        let result = sender
            .submit(TransactionRequest::default(), &Settings::default().swap_policy())
            .await;
        assert!(matches!(result, Err(SwapError::MissingCredentials)));
    }
}
