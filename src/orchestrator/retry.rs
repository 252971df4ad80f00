//! Retrying swap entry points.
//!
//! Every attempt rebuilds stale views, converts the human amount with the
//! right decimals and dispatches to the router. Errors consume an attempt;
//! attempts are spaced by a fixed delay. Once the budget is spent the caller
//! gets a failed outcome carrying the last error, never an `Err`. If any
//! attempt broadcast a transaction that never confirmed, the outcome keeps
//! its hash.

use super::SwapOrchestrator;
use crate::error::Result;
use crate::token::TokenView;
use crate::types::SwapOutcome;
use crate::units::{self, HumanAmount, NATIVE_DECIMALS};
use alloy::primitives::{Address, TxHash};
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Pause between failed attempts
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
enum SwapRequest {
    NativeToToken { amount: HumanAmount },
    TokenToNative { amount: HumanAmount },
    TokenToToken {
        token_in: Address,
        token_out: Address,
        amount: HumanAmount,
    },
}

impl fmt::Display for SwapRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SwapRequest::NativeToToken { amount } => write!(f, "native->token {}", amount),
            SwapRequest::TokenToNative { amount } => write!(f, "token->native {}", amount),
            SwapRequest::TokenToToken {
                token_in,
                token_out,
                amount,
            } => write!(f, "{} {} -> {}", amount, token_in, token_out),
        }
    }
}

fn failure(reason: String, in_flight: Option<TxHash>) -> SwapOutcome {
    match in_flight {
        Some(tx_hash) => SwapOutcome::unconfirmed(tx_hash.to_string(), reason),
        None => SwapOutcome::failed(reason),
    }
}

impl SwapOrchestrator {
    async fn attempt(&mut self, request: SwapRequest) -> Result<SwapOutcome> {
        self.ensure_fresh().await?;
        let policy = self.settings.swap_policy();
        let token = self.token_address;

        match request {
            SwapRequest::NativeToToken { amount } => {
                let amount_in = units::to_smallest_unit(amount, NATIVE_DECIMALS)?;
                self.router.swap_native_to_token(token, amount_in, &policy).await
            }
            SwapRequest::TokenToNative { amount } => {
                let amount_in = units::to_smallest_unit(amount, self.token.decimals().await?)?;
                self.router.swap_token_to_native(token, amount_in, &policy).await
            }
            SwapRequest::TokenToToken {
                token_in,
                token_out,
                amount,
            } => {
                let decimals = if token_in == token {
                    self.token.decimals().await?
                } else {
                    TokenView::new(token_in, &self.profile, self.router.sender().clone())
                        .decimals()
                        .await?
                };
                let amount_in = units::to_smallest_unit(amount, decimals)?;
                self.router
                    .swap_token_to_token(token_in, token_out, amount_in, &policy)
                    .await
            }
        }
    }

    async fn run_with_retries(&mut self, request: SwapRequest, attempts: u32) -> SwapOutcome {
        let attempts = attempts.max(1);
        let mut last_error = String::new();
        let mut in_flight: Option<TxHash> = None;

        for attempt in 1..=attempts {
            match self.attempt(request).await {
                Ok(outcome) => {
                    info!(
                        "Swap {} finished: success={} tx={}",
                        request, outcome.success, outcome.tx_hash
                    );
                    return outcome;
                }
                Err(e) if e.is_fatal() => {
                    error!("Swap {} aborted: {}", request, e);
                    return failure(e.to_string(), in_flight);
                }
                Err(e) => {
                    warn!("Swap {} attempt {}/{} failed: {}", request, attempt, attempts, e);
                    in_flight = e.broadcast_hash().or(in_flight);
                    last_error = e.to_string();
                }
            }
            if attempt < attempts {
                sleep(RETRY_DELAY).await;
            }
        }

        failure(last_error, in_flight)
    }

    /// Buy the active token with `amount` native units.
    pub async fn swap_native_to_token(
        &mut self,
        amount: impl Into<HumanAmount>,
        attempts: u32,
    ) -> SwapOutcome {
        let request = SwapRequest::NativeToToken {
            amount: amount.into(),
        };
        self.run_with_retries(request, attempts).await
    }

    /// Sell `amount` of the active token for the native asset.
    pub async fn swap_token_to_native(
        &mut self,
        amount: impl Into<HumanAmount>,
        attempts: u32,
    ) -> SwapOutcome {
        let request = SwapRequest::TokenToNative {
            amount: amount.into(),
        };
        self.run_with_retries(request, attempts).await
    }

    /// Sell `amount` of `token_in` for `token_out`.
    pub async fn swap_token_to_token(
        &mut self,
        token_in: Address,
        token_out: Address,
        amount: impl Into<HumanAmount>,
        attempts: u32,
    ) -> SwapOutcome {
        let request = SwapRequest::TokenToToken {
            token_in,
            token_out,
            amount: amount.into(),
        };
        self.run_with_retries(request, attempts).await
    }

    /// Pre-flight check of a native -> token swap of `amount` without sending.
    ///
    /// `Err(InsufficientFunds)` is fatal; other failures come back as `Ok(false)`.
    pub async fn test_swap_native_to_token(&mut self, amount: impl Into<HumanAmount>) -> Result<bool> {
        self.ensure_fresh().await?;
        let amount_in = units::to_smallest_unit(amount, NATIVE_DECIMALS)?;
        self.router
            .test_swap_native_to_token(self.token_address, amount_in, &self.settings.swap_policy())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{orchestrator, push_chain_id};
    use super::*;
    use crate::settings::Settings;
    use crate::testing::{
        push_broadcast, push_call_return, push_draft, push_send, TEST_ADDRESS, TEST_KEY,
    };
    use alloy::primitives::U256;
    use crate::types::OutcomeDetail;
    use rust_decimal_macros::dec;
    use tokio::time::Instant;

    fn funded_settings() -> Settings {
        Settings {
            address: TEST_ADDRESS.to_string(),
            private_key: TEST_KEY.to_string(),
            ..Settings::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_attempts_return_failure() {
        let (mut orchestrator, asserter, _) = orchestrator(funded_settings()).await;
        // each attempt fails on its first request, the router version read
        for n in 1..=4 {
            asserter.push_failure_msg(format!("node busy #{}", n));
        }

        let started = Instant::now();
        let outcome = orchestrator.swap_native_to_token(dec!(0.01), 3).await;

        assert!(!outcome.success);
        assert_eq!(outcome.tx_hash, SwapOutcome::NO_TX);
        assert!(matches!(outcome.detail, OutcomeDetail::Failed(ref e) if e.contains("node busy #3")));
        // exactly three attempts: the fourth reply is still queued
        assert_eq!(asserter.read_q().len(), 1);
        // two pauses between them
        let elapsed = started.elapsed();
        assert!(elapsed >= RETRY_DELAY * 2, "elapsed {:?}", elapsed);
        assert!(elapsed < RETRY_DELAY * 3, "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfirmed_hash_survives_retries() {
        let (mut orchestrator, asserter, _) = orchestrator(funded_settings()).await;
        let tx_hash = TxHash::repeat_byte(0x41);

        // attempt 1: routed, signed and broadcast, then the receipt poll fails
        push_call_return(&asserter, (2u16,));
        push_call_return(
            &asserter,
            (
                vec![Address::repeat_byte(1), Address::repeat_byte(2)],
                vec![U256::from(0u64)],
            ),
        );
        push_call_return(&asserter, (vec![U256::from(1000u64), U256::from(2000u64)],));
        push_draft(&asserter);
        push_broadcast(&asserter, tx_hash);
        asserter.push_failure_msg("receipt lookup failed");
        // attempt 2: fails before anything is sent
        asserter.push_failure_msg("nonce too low");

        let outcome = orchestrator.swap_native_to_token(dec!(0.01), 2).await;

        assert!(!outcome.success);
        assert_eq!(outcome.tx_hash, tx_hash.to_string());
        assert!(matches!(outcome.detail, OutcomeDetail::Failed(ref e) if e.contains("nonce too low")));
    }

    #[tokio::test]
    async fn test_confirmed_swap_ends_loop() {
        let (mut orchestrator, asserter, _) = orchestrator(funded_settings()).await;
        let tx_hash = TxHash::repeat_byte(0x42);
        push_call_return(&asserter, (2u16,));
        push_call_return(
            &asserter,
            (
                vec![Address::repeat_byte(1), Address::repeat_byte(2)],
                vec![U256::from(0u64)],
            ),
        );
        push_call_return(&asserter, (vec![U256::from(1000u64), U256::from(2000u64)],));
        push_send(&asserter, tx_hash, true);

        let outcome = orchestrator.swap_native_to_token(dec!(0.01), 3).await;

        assert!(outcome.success);
        assert_eq!(outcome.tx_hash, tx_hash.to_string());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_run_once() {
        let (mut orchestrator, _, _) = orchestrator(funded_settings()).await;

        let started = Instant::now();
        let outcome = orchestrator.swap_token_to_native(dec!(1), 0).await;

        assert!(!outcome.success);
        assert!(started.elapsed() < RETRY_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_views_rebuilt_before_swap() {
        let (mut orchestrator, asserter, endpoints) = orchestrator(Settings::default()).await;
        orchestrator.set("address", TEST_ADDRESS, true).await.unwrap();
        orchestrator.set("private_key", TEST_KEY, true).await.unwrap();

        push_chain_id(&asserter, 8453);
        let outcome = orchestrator.swap_native_to_token(dec!(0.01), 1).await;

        // the swap itself fails on the empty queue, but only after a rebuild
        assert!(!outcome.success);
        assert!(!orchestrator.is_stale());
        assert_eq!(endpoints.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_negative_amount_fails_without_rpc() {
        let (mut orchestrator, _, _) = orchestrator(funded_settings()).await;

        let outcome = orchestrator.swap_native_to_token(dec!(-1), 1).await;
        assert!(matches!(outcome.detail, OutcomeDetail::Failed(ref e) if e.contains("invalid amount")));
    }
}
