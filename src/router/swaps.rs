//! Router writes: swaps between the native asset and tokens.
//!
//! Each swap resolves the protocol version of its target token, fetches the
//! matching path, quotes it, applies slippage and hands the encoded call to
//! the shared sender.

use super::RouterView;
use crate::contracts::{fee_to_u24, ISwapperRouter};
use crate::error::{Result, SwapError};
use crate::settings::SwapPolicy;
use crate::types::{SwapOutcome, SwapPath};
use crate::units;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use tracing::{error, info, warn};

fn encode_native_to_token(path: SwapPath, min_output: U256) -> Bytes {
    let call = match path {
        SwapPath::V2 { hops, dex_ids } => ISwapperRouter::swapETHtoTokenV2Call {
            path: hops,
            dexPath: dex_ids,
            minOutput: min_output,
        }
        .abi_encode(),
        SwapPath::V3 {
            hops,
            pools,
            pool_fees,
            ..
        } => ISwapperRouter::swapETHtoTokenV3Call {
            path: hops,
            pools,
            poolFees: pool_fees.into_iter().map(fee_to_u24).collect(),
            minOutput: min_output,
        }
        .abi_encode(),
    };
    call.into()
}

fn encode_token_to_native(path: SwapPath, amount_in: U256, min_output: U256) -> Bytes {
    let call = match path {
        SwapPath::V2 { hops, dex_ids } => ISwapperRouter::swapTokentoETHV2Call {
            path: hops,
            dexPath: dex_ids,
            amountIn: amount_in,
            minOutput: min_output,
        }
        .abi_encode(),
        SwapPath::V3 {
            hops,
            pools,
            pool_fees,
            ..
        } => ISwapperRouter::swapTokenToETHV3Call {
            path: hops,
            pools,
            poolFees: pool_fees.into_iter().map(fee_to_u24).collect(),
            amountIn: amount_in,
            minOutput: min_output,
        }
        .abi_encode(),
    };
    call.into()
}

fn encode_token_to_token(path: SwapPath, amount_in: U256, min_output: U256) -> Bytes {
    let call = match path {
        SwapPath::V2 { hops, dex_ids } => ISwapperRouter::swapTokentoTokenV2Call {
            path: hops,
            dexPath: dex_ids,
            amountIn: amount_in,
            minOutput: min_output,
        }
        .abi_encode(),
        SwapPath::V3 {
            hops,
            pools,
            pool_fees,
            ..
        } => ISwapperRouter::swapTokentoTokenV3Call {
            path: hops,
            pools,
            poolFees: pool_fees.into_iter().map(fee_to_u24).collect(),
            amountIn: amount_in,
            minOutput: min_output,
        }
        .abi_encode(),
    };
    call.into()
}

impl RouterView {
    /// Path for `token_in -> token_out` in the protocol of `target`, and the
    /// minimum output after slippage.
    async fn route(
        &self,
        target: Address,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        policy: &SwapPolicy,
    ) -> Result<(SwapPath, U256)> {
        let version = self.protocol_version(target).await?;
        let path = self.path(version, token_in, token_out).await?;
        let amounts = self.amounts_out(&path, amount_in).await?;
        let amount_out = *amounts.last().ok_or(SwapError::EmptyQuote)?;
        let min_output = units::min_output(amount_out, policy.slippage_percent);

        info!(
            "{} route {} -> {} | in {} | out {} | min {}",
            version, token_in, token_out, amount_in, amount_out, min_output
        );
        Ok((path, min_output))
    }

    /// Routed, encoded and priced native -> token swap, ready to submit.
    /// Carries `amount_in` as the transaction value.
    pub async fn draft_native_to_token(
        &self,
        token: Address,
        amount_in: U256,
        policy: &SwapPolicy,
    ) -> Result<TransactionRequest> {
        let (path, min_output) = self
            .route(token, self.profile.wrapped_native, token, amount_in, policy)
            .await?;
        let input = encode_native_to_token(path, min_output);
        self.sender.draft(self.address(), input, amount_in, policy).await
    }

    pub async fn draft_token_to_native(
        &self,
        token: Address,
        amount_in: U256,
        policy: &SwapPolicy,
    ) -> Result<TransactionRequest> {
        let (path, min_output) = self
            .route(token, token, self.profile.wrapped_native, amount_in, policy)
            .await?;
        let input = encode_token_to_native(path, amount_in, min_output);
        self.sender.draft(self.address(), input, U256::ZERO, policy).await
    }

    /// Protocol is chosen by `token_in`.
    pub async fn draft_token_to_token(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        policy: &SwapPolicy,
    ) -> Result<TransactionRequest> {
        let (path, min_output) = self
            .route(token_in, token_in, token_out, amount_in, policy)
            .await?;
        let input = encode_token_to_token(path, amount_in, min_output);
        self.sender.draft(self.address(), input, U256::ZERO, policy).await
    }

    pub async fn swap_native_to_token(
        &self,
        token: Address,
        amount_in: U256,
        policy: &SwapPolicy,
    ) -> Result<SwapOutcome> {
        let tx = self.draft_native_to_token(token, amount_in, policy).await?;
        self.sender.submit(tx, policy).await
    }

    pub async fn swap_token_to_native(
        &self,
        token: Address,
        amount_in: U256,
        policy: &SwapPolicy,
    ) -> Result<SwapOutcome> {
        let tx = self.draft_token_to_native(token, amount_in, policy).await?;
        self.sender.submit(tx, policy).await
    }

    pub async fn swap_token_to_token(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        policy: &SwapPolicy,
    ) -> Result<SwapOutcome> {
        let tx = self
            .draft_token_to_token(token_in, token_out, amount_in, policy)
            .await?;
        self.sender.submit(tx, policy).await
    }

    /// Build and gas-estimate a native -> token swap without signing it.
    ///
    /// Returns `Err(InsufficientFunds)` when the node reports the wallet
    /// cannot pay for it; any other failure is logged and yields `Ok(false)`.
    pub async fn test_swap_native_to_token(
        &self,
        token: Address,
        amount_in: U256,
        policy: &SwapPolicy,
    ) -> Result<bool> {
        let attempt = async {
            let tx = self.draft_native_to_token(token, amount_in, policy).await?;
            let gas = self.provider().estimate_gas(tx).await?;
            Ok::<u64, SwapError>(gas)
        };

        match attempt.await {
            Ok(gas) => {
                info!("Test swap ok: {} gas", gas);
                Ok(true)
            }
            Err(e) => {
                let e = e.classify_funds();
                if e.is_fatal() {
                    error!("Test swap failed: {}", e);
                    Err(e)
                } else {
                    warn!("Test swap failed: {}", e);
                    Ok(false)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::test_support::router;
    use crate::testing::{mock_provider, push_call_return, push_draft, push_send};
    use alloy::primitives::{TxHash, TxKind, U128, U64};
    use alloy::transports::mock::Asserter;
    use rust_decimal_macros::dec;

    fn v2_path() -> SwapPath {
        SwapPath::V2 {
            hops: vec![Address::repeat_byte(1), Address::repeat_byte(2)],
            dex_ids: vec![U256::from(0u64)],
        }
    }

    fn v3_path() -> SwapPath {
        SwapPath::V3 {
            hops: vec![Address::repeat_byte(1), Address::repeat_byte(2)],
            dex_ids: vec![U256::from(0u64)],
            pools: vec![Address::repeat_byte(3)],
            pool_fees: vec![3000],
        }
    }

    #[test]
    fn test_encoding_follows_path_version() {
        let min = U256::from(970u64);
        assert_eq!(
            encode_native_to_token(v2_path(), min)[..4],
            ISwapperRouter::swapETHtoTokenV2Call::SELECTOR
        );
        assert_eq!(
            encode_native_to_token(v3_path(), min)[..4],
            ISwapperRouter::swapETHtoTokenV3Call::SELECTOR
        );
        assert_eq!(
            encode_token_to_native(v3_path(), U256::from(1000u64), min)[..4],
            ISwapperRouter::swapTokenToETHV3Call::SELECTOR
        );
        assert_eq!(
            encode_token_to_token(v2_path(), U256::from(1000u64), min)[..4],
            ISwapperRouter::swapTokentoTokenV2Call::SELECTOR
        );
    }

    #[test]
    fn test_v3_call_carries_pool_fees() {
        let input = encode_token_to_native(v3_path(), U256::from(1000u64), U256::from(970u64));
        let call = ISwapperRouter::swapTokenToETHV3Call::abi_decode(&input).unwrap();
        assert_eq!(call.poolFees, vec![fee_to_u24(3000)]);
        assert_eq!(call.amountIn, U256::from(1000u64));
        assert_eq!(call.minOutput, U256::from(970u64));
    }

    fn queue_v2_route(asserter: &Asserter, amounts: Vec<U256>) {
        push_call_return(asserter, (2u16,));
        push_call_return(
            asserter,
            (
                vec![Address::repeat_byte(1), Address::repeat_byte(2)],
                vec![U256::from(0u64)],
            ),
        );
        push_call_return(asserter, (amounts,));
    }

    fn queue_v3_route(asserter: &Asserter, amounts: Vec<U256>) {
        push_call_return(asserter, (3u16,));
        // uint24 fees share the uint256 word encoding
        push_call_return(
            asserter,
            (
                vec![Address::repeat_byte(1), Address::repeat_byte(2)],
                vec![U256::from(0u64)],
                vec![Address::repeat_byte(3)],
                vec![U256::from(3000u64)],
            ),
        );
        push_call_return(asserter, (amounts,));
    }

    #[tokio::test]
    async fn test_route_applies_slippage() {
        let (provider, asserter) = mock_provider();
        queue_v2_route(&asserter, vec![U256::from(1000u64), U256::from(2000u64)]);
        let router = router(provider);
        let policy = crate::settings::Settings::default().swap_policy();
        assert_eq!(policy.slippage_percent, dec!(3));

        let (path, min) = router
            .route(Address::repeat_byte(2), Address::repeat_byte(1), Address::repeat_byte(2), U256::from(1000u64), &policy)
            .await
            .unwrap();
        assert_eq!(path, v2_path());
        assert_eq!(min, U256::from(1940u64));
    }

    #[tokio::test]
    async fn test_empty_quote() {
        let (provider, asserter) = mock_provider();
        queue_v2_route(&asserter, vec![]);
        let router = router(provider);
        let policy = crate::settings::Settings::default().swap_policy();

        let result = router
            .swap_native_to_token(Address::repeat_byte(2), U256::from(1000u64), &policy)
            .await;
        assert!(matches!(result, Err(SwapError::EmptyQuote)));
    }

    #[tokio::test]
    async fn test_preflight_insufficient_funds_is_fatal() {
        let (provider, asserter) = mock_provider();
        queue_v2_route(&asserter, vec![U256::from(1000u64), U256::from(2000u64)]);
        asserter.push_success(&U128::from(1_000_000_000u64));
        asserter.push_success(&U64::from(0u64));
        asserter.push_failure_msg("insufficient funds for transfer");
        let router = router(provider);
        let policy = crate::settings::Settings::default().swap_policy();

        let err = router
            .test_swap_native_to_token(Address::repeat_byte(2), U256::from(1000u64), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::InsufficientFunds(_)));
    }

    #[tokio::test]
    async fn test_preflight_other_failure_is_false() {
        let (provider, asserter) = mock_provider();
        queue_v2_route(&asserter, vec![U256::from(1000u64), U256::from(2000u64)]);
        asserter.push_success(&U128::from(1_000_000_000u64));
        asserter.push_success(&U64::from(0u64));
        asserter.push_failure_msg("execution reverted");
        let router = router(provider);
        let policy = crate::settings::Settings::default().swap_policy();

        let ok = router
            .test_swap_native_to_token(Address::repeat_byte(2), U256::from(1000u64), &policy)
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_native_to_token_draft_carries_value() {
        let (provider, asserter) = mock_provider();
        queue_v3_route(&asserter, vec![U256::from(1000u64), U256::from(2000u64)]);
        push_draft(&asserter);
        let router = router(provider);
        let policy = crate::settings::Settings::default().swap_policy();

        let tx = router
            .draft_native_to_token(Address::repeat_byte(2), U256::from(1000u64), &policy)
            .await
            .unwrap();

        assert_eq!(tx.value, Some(U256::from(1000u64)));
        assert_eq!(tx.to, Some(TxKind::Call(router.address())));
        let call = ISwapperRouter::swapETHtoTokenV3Call::abi_decode(tx.input.input().unwrap()).unwrap();
        assert_eq!(call.pools, vec![Address::repeat_byte(3)]);
        assert_eq!(call.poolFees, vec![fee_to_u24(3000)]);
        assert_eq!(call.minOutput, U256::from(1940u64));
    }

    #[tokio::test]
    async fn test_token_to_native_draft_sends_no_value() {
        let (provider, asserter) = mock_provider();
        queue_v2_route(&asserter, vec![U256::from(1000u64), U256::from(500u64)]);
        push_draft(&asserter);
        let router = router(provider);
        let policy = crate::settings::Settings::default().swap_policy();

        let tx = router
            .draft_token_to_native(Address::repeat_byte(1), U256::from(1000u64), &policy)
            .await
            .unwrap();

        assert_eq!(tx.value, Some(U256::ZERO));
        let call = ISwapperRouter::swapTokentoETHV2Call::abi_decode(tx.input.input().unwrap()).unwrap();
        assert_eq!(call.amountIn, U256::from(1000u64));
        assert_eq!(call.minOutput, U256::from(485u64));
    }

    #[tokio::test]
    async fn test_v2_swap_confirmed() {
        let (provider, asserter) = mock_provider();
        let tx_hash = TxHash::repeat_byte(0x21);
        queue_v2_route(&asserter, vec![U256::from(1000u64), U256::from(2000u64)]);
        push_send(&asserter, tx_hash, true);
        let router = router(provider);
        let policy = crate::settings::Settings::default().swap_policy();

        let outcome = router
            .swap_native_to_token(Address::repeat_byte(2), U256::from(1000u64), &policy)
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.tx_hash, tx_hash.to_string());
        assert_eq!(outcome.gas().unwrap().gas_limit, 110_000);
    }

    #[tokio::test]
    async fn test_v3_swap_reverted() {
        let (provider, asserter) = mock_provider();
        let tx_hash = TxHash::repeat_byte(0x22);
        queue_v3_route(&asserter, vec![U256::from(1000u64), U256::from(2000u64)]);
        push_send(&asserter, tx_hash, false);
        let router = router(provider);
        let policy = crate::settings::Settings::default().swap_policy();

        let outcome = router
            .swap_token_to_token(
                Address::repeat_byte(1),
                Address::repeat_byte(2),
                U256::from(1000u64),
                &policy,
            )
            .await
            .unwrap();

        // mined but reverted: an outcome, not an error
        assert!(!outcome.success);
        assert_eq!(outcome.tx_hash, tx_hash.to_string());
        assert!(outcome.gas().is_some());
    }
}
