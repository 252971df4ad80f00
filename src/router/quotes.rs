//! Router reads: prices, liquidity, paths, quotes and token checks.

use super::RouterView;
use crate::contracts::u24_to_fee;
use crate::error::{Result, SwapError};
use crate::types::{BestPool, ProtocolVersion, SwapPath, TokenInfo};
use crate::units::{self, HumanAmount, NATIVE_DECIMALS};
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use rust_decimal::Decimal;
use tracing::debug;

/// Router USD prices and liquidity carry 6 decimals.
const USD_DECIMALS: u8 = 6;

/// Fractional digits kept while dividing tax amounts, before the final rounding.
const TAX_SCALE: u32 = 9;

impl RouterView {
    /// USD price of one whole `token`, as the raw 6-decimal router value
    pub async fn usd_price_raw(&self, token: Address) -> Result<U256> {
        Ok(self.contract.getUSDPrice(token).call().await?)
    }

    pub async fn usd_price(&self, token: Address) -> Result<Decimal> {
        units::to_human_unit(self.usd_price_raw(token).await?, USD_DECIMALS).to_decimal()
    }

    /// Price of one whole `token` in native units
    pub async fn eth_price(&self, token: Address) -> Result<Decimal> {
        let raw = self.contract.getETHPrice(token).call().await?;
        units::to_human_unit(raw, NATIVE_DECIMALS).to_decimal()
    }

    /// USD price of the wrapped native token
    pub async fn native_usd_price(&self) -> Result<Decimal> {
        self.usd_price(self.profile.wrapped_native).await
    }

    pub async fn liquidity_usd(&self, token: Address) -> Result<Decimal> {
        let raw = self.contract.getLiquidity(token).call().await?;
        units::to_human_unit(raw, USD_DECIMALS).to_decimal()
    }

    pub async fn best_pool(&self, token: Address) -> Result<BestPool> {
        let pool = self.contract.getBestPool(token).call().await?;
        Ok(BestPool {
            dex_id: pool.dexIdent,
            pool: pool.bestPool,
            base_token: pool.baseToken,
        })
    }

    pub async fn protocol_version(&self, token: Address) -> Result<ProtocolVersion> {
        let version = self.contract.checkVersion(token).call().await?;
        ProtocolVersion::try_from(version)
    }

    pub async fn path_v2(&self, token_in: Address, token_out: Address) -> Result<SwapPath> {
        let path = self.contract.getSwapPathV2(token_in, token_out).call().await?;
        Ok(SwapPath::V2 {
            hops: path.path,
            dex_ids: path.dexPath,
        })
    }

    pub async fn path_v3(&self, token_in: Address, token_out: Address) -> Result<SwapPath> {
        let path = self.contract.getSwapPathV3(token_in, token_out).call().await?;
        Ok(SwapPath::V3 {
            hops: path.path,
            dex_ids: path.dexIdents,
            pools: path.pools,
            pool_fees: path.poolFees.into_iter().map(u24_to_fee).collect(),
        })
    }

    pub async fn path(
        &self,
        version: ProtocolVersion,
        token_in: Address,
        token_out: Address,
    ) -> Result<SwapPath> {
        match version {
            ProtocolVersion::V2 => self.path_v2(token_in, token_out).await,
            ProtocolVersion::V3 => self.path_v3(token_in, token_out).await,
        }
    }

    /// Amount after every hop of `path`; the last element is the output.
    pub async fn amounts_out(&self, path: &SwapPath, amount_in: U256) -> Result<Vec<U256>> {
        let amounts = match path {
            SwapPath::V2 { hops, dex_ids } => {
                self.contract
                    .getAmountsOutV2(amount_in, hops.clone(), dex_ids.clone())
                    .call()
                    .await?
            }
            SwapPath::V3 { hops, pools, .. } => {
                self.contract
                    .getAmountsOutV3(pools.clone(), hops.clone(), amount_in)
                    .call()
                    .await?
            }
        };
        debug!("{} amounts out for {}: {:?}", path.version(), amount_in, amounts);
        Ok(amounts)
    }

    /// Router-side quote letting the router pick the path.
    pub async fn quote(&self, token_in: Address, token_out: Address, amount_in: U256) -> Result<Vec<U256>> {
        Ok(self
            .contract
            .getAmountsOut(token_in, token_out, amount_in)
            .call()
            .await?)
    }

    /// Simulated buy/sell tax and honeypot verdict.
    ///
    /// The router function is not `view`; it is evaluated with `eth_call`
    /// from the zero address so nothing is ever sent.
    pub async fn token_info(&self, token: Address) -> Result<TokenInfo> {
        let info = self
            .contract
            .getTokenInfos(token)
            .from(self.profile.zero)
            .call()
            .await?;
        debug!("Token info for {}: {}", token, info.note);
        decode_token_info(
            (info.buyIn, info.buyOut),
            (info.sellIn, info.sellOut),
            [info.check0, info.check1, info.check2, info.check3],
        )
    }

    pub async fn native_balance(&self, owner: Address) -> Result<U256> {
        Ok(self.provider().get_balance(owner).await?)
    }

    pub async fn native_balance_human(&self, owner: Address) -> Result<HumanAmount> {
        Ok(units::to_human_unit(self.native_balance(owner).await?, NATIVE_DECIMALS))
    }
}

/// Turn the router's raw simulation amounts into tax percentages.
///
/// `tax = round((before - after) / before * 100 - 1, 3)`; the token is a
/// honeypot unless all four checks passed.
pub fn decode_token_info(buy: (U256, U256), sell: (U256, U256), checks: [bool; 4]) -> Result<TokenInfo> {
    Ok(TokenInfo {
        buy_tax_percent: tax_percent(buy.0, buy.1)?,
        sell_tax_percent: tax_percent(sell.0, sell.1)?,
        is_honeypot: !checks.iter().all(|passed| *passed),
    })
}

fn tax_percent(before: U256, after: U256) -> Result<Decimal> {
    if before.is_zero() {
        return Err(SwapError::Decode("token info reference amount is zero".into()));
    }

    let (diff, negative) = if before >= after {
        (before - after, false)
    } else {
        (after - before, true)
    };
    let scaled = diff
        .checked_mul(U256::from(100u64) * U256::from(10u64).pow(U256::from(TAX_SCALE)))
        .ok_or_else(|| SwapError::Decode("token info amounts overflow".into()))?
        / before;
    let scaled = i128::try_from(scaled)
        .map_err(|_| SwapError::Decode(format!("token info tax out of range: {}", scaled)))?;

    let mut percent = Decimal::try_from_i128_with_scale(scaled, TAX_SCALE)
        .map_err(|e| SwapError::Decode(e.to_string()))?;
    if negative {
        percent = -percent;
    }
    Ok((percent - Decimal::ONE).round_dp(3))
}
