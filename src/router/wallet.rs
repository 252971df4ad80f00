//! Wallet reports: batched token snapshots and token discovery from
//! Transfer logs.

use super::RouterView;
use crate::contracts::{ISwapperRouter, IERC20};
use crate::error::{Result, SwapError};
use crate::types::TokenSnapshot;
use crate::units::{self, NATIVE_DECIMALS};
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use alloy::rpc::types::Filter;
use alloy::sol_types::SolEvent;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Most tokens the router accepts in one `getWalletTokenDATA` call.
pub const MAX_WALLET_BATCH: usize = 28;

/// Block range of one `eth_getLogs` request during token discovery.
pub const DEFAULT_SCAN_WINDOW: u64 = 10_000;

/// How far back token discovery looks by default.
pub const DEFAULT_SCAN_BLOCKS: u64 = 150_000;

/// Address label of the synthetic native-asset row.
pub const NATIVE_ENTRY: &str = "Native";

/// Chunks of at most `MAX_WALLET_BATCH` tokens, one router call each.
pub fn wallet_batches(tokens: &[Address]) -> std::slice::Chunks<'_, Address> {
    tokens.chunks(MAX_WALLET_BATCH)
}

fn usd_value(price: Decimal, amount: Decimal) -> Decimal {
    price.checked_mul(amount).unwrap_or_else(|| {
        warn!("USD value overflow: {} * {}", price, amount);
        Decimal::ZERO
    })
}

fn snapshot_row(
    data: &ISwapperRouter::getWalletTokenDATAReturn,
    index: usize,
    native_usd: Decimal,
) -> Result<TokenSnapshot> {
    let missing = || SwapError::Decode(format!("wallet report is missing entry {}", index));

    let address = *data.tokenAddress.get(index).ok_or_else(missing)?;
    let decimals = *data.tokenDecimals.get(index).ok_or_else(missing)?;
    let balance_wei = *data.tokenBalances.get(index).ok_or_else(missing)?;
    let usd_price_wei = *data.tokenUSDPrice.get(index).ok_or_else(missing)?;
    let eth_price_wei = *data.tokenETHPrice.get(index).ok_or_else(missing)?;
    let version = data.tokensVersion.get(index).ok_or_else(missing)?;

    let balance = units::to_human_unit(balance_wei, decimals);
    let eth_price = units::to_human_unit(eth_price_wei, NATIVE_DECIMALS).to_decimal()?;
    let usd_price = usd_value(eth_price, native_usd);
    let balance_usd = match balance.to_decimal() {
        Ok(amount) => usd_value(usd_price, amount),
        Err(e) => {
            warn!("No USD value for {}: {}", address, e);
            Decimal::ZERO
        }
    };

    Ok(TokenSnapshot {
        address: address.to_checksum(None),
        name: data.tokenName.get(index).cloned().unwrap_or_default(),
        symbol: data.tokenSymbol.get(index).cloned().unwrap_or_default(),
        decimals,
        uniswap_version: version.saturating_to::<u64>(),
        balance_wei,
        balance,
        balance_usd,
        usd_price_wei,
        eth_price_wei,
        usd_price,
        eth_price,
    })
}

impl RouterView {
    fn native_row(&self, balance_wei: U256, native_usd: Decimal) -> Result<TokenSnapshot> {
        let balance = units::to_human_unit(balance_wei, NATIVE_DECIMALS);
        Ok(TokenSnapshot {
            address: NATIVE_ENTRY.to_string(),
            name: "Ethereum".to_string(),
            symbol: self.profile.native_symbol.to_string(),
            decimals: NATIVE_DECIMALS,
            uniswap_version: 3,
            balance_wei,
            balance,
            balance_usd: usd_value(native_usd, balance.to_decimal()?),
            usd_price_wei: units::to_smallest_unit(native_usd, 6)?,
            eth_price_wei: U256::from(10u64).pow(U256::from(NATIVE_DECIMALS)),
            usd_price: native_usd,
            eth_price: Decimal::ONE,
        })
    }

    /// Balances and prices of `tokens` held by `wallet`, plus the native
    /// balance, sorted by USD value (largest first).
    ///
    /// Balances are kept exact. A row whose ETH price exceeds the `Decimal`
    /// range is logged and left out.
    pub async fn wallet_token_data(
        &self,
        wallet: Address,
        tokens: &[Address],
    ) -> Result<Vec<TokenSnapshot>> {
        let native_usd = self.native_usd_price().await?;
        let mut rows = Vec::with_capacity(tokens.len() + 1);

        for batch in wallet_batches(tokens) {
            debug!("Wallet report batch: {} tokens", batch.len());
            let data = self
                .contract
                .getWalletTokenDATA(wallet, batch.to_vec())
                .call()
                .await?;

            for index in 0..batch.len() {
                match snapshot_row(&data, index, native_usd) {
                    Ok(row) => rows.push(row),
                    Err(SwapError::AmountOverflow { amount, decimals }) => warn!(
                        "Skipping {}: price {} with {} decimals out of range",
                        batch[index], amount, decimals
                    ),
                    Err(e) => return Err(e),
                }
            }
        }

        let balance_wei = self.native_balance(wallet).await?;
        rows.push(self.native_row(balance_wei, native_usd)?);

        rows.sort_by(|a, b| b.balance_usd.cmp(&a.balance_usd));
        Ok(rows)
    }

    /// Tokens that were ever sent to `wallet` within the last `blocks_back`
    /// blocks, in first-seen order.
    ///
    /// Windows whose `eth_getLogs` fails are logged and skipped.
    pub async fn wallet_tokens(
        &self,
        wallet: Address,
        window: u64,
        blocks_back: u64,
    ) -> Result<Vec<Address>> {
        let window = window.max(1);
        let latest = self.provider().get_block_number().await?;
        let mut start = latest.saturating_sub(blocks_back);

        let mut seen = HashSet::new();
        let mut tokens = Vec::new();

        while start <= latest {
            let end = start.saturating_add(window - 1).min(latest);
            let filter = Filter::new()
                .from_block(start)
                .to_block(end)
                .event_signature(IERC20::Transfer::SIGNATURE_HASH)
                .topic2(wallet.into_word());

            match self.provider().get_logs(&filter).await {
                Ok(logs) => {
                    for log in logs {
                        let token = log.address();
                        if seen.insert(token) {
                            tokens.push(token);
                        }
                    }
                }
                Err(e) => warn!("Log scan {}..={} failed: {}", start, end, e),
            }
            start = end + 1;
        }

        info!("Found {} tokens for {}", tokens.len(), wallet);
        Ok(tokens)
    }

    /// `wallet_tokens` over the default range, then `wallet_token_data`.
    pub async fn wallet_assets(&self, wallet: Address) -> Result<Vec<TokenSnapshot>> {
        let tokens = self
            .wallet_tokens(wallet, DEFAULT_SCAN_WINDOW, DEFAULT_SCAN_BLOCKS)
            .await?;
        self.wallet_token_data(wallet, &tokens).await
    }
}
