//! Unit Converter
//!
//! Conversions between smallest-unit integers (wei, token base units) and
//! human decimals, slippage bounds, display rounding and gas estimation.
//!
//! Human amounts read from the chain are exact `HumanAmount`s over the full
//! uint256 range; prices and fees use `rust_decimal`. Nothing here touches f64.
//! Only `estimate_gas` and `gas_price_with_offset` talk to the chain.

use crate::error::{Result, SwapError};
use crate::types::GasEstimate;
use alloy::primitives::U256;
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Decimals of the native asset
pub const NATIVE_DECIMALS: u8 = 18;

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Largest scale rust_decimal can represent.
const MAX_DECIMAL_SCALE: u32 = 28;

/// Gas settings needed to price a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPolicy {
    /// Added on top of the network gas price, in gwei
    pub gwei_offset: u64,
    /// Advisory ceiling on the fee of one transaction, in native units
    pub max_tx_fee_native: Decimal,
}

fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// Exact decimal amount in human units: `digits / 10^scale`.
///
/// Holds the full 256-bit range of on-chain amounts at any token precision,
/// so balances never lose digits on their way to the caller. Trailing zeros
/// are stripped, which makes equality numeric (`1.50 == 1.5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HumanAmount {
    negative: bool,
    digits: U256,
    scale: u8,
}

impl HumanAmount {
    pub const ZERO: HumanAmount = HumanAmount {
        negative: false,
        digits: U256::ZERO,
        scale: 0,
    };

    fn new(negative: bool, mut digits: U256, mut scale: u8) -> Self {
        let ten = U256::from(10u64);
        while scale > 0 && !digits.is_zero() && (digits % ten).is_zero() {
            digits /= ten;
            scale -= 1;
        }
        if digits.is_zero() {
            return Self::ZERO;
        }
        Self {
            negative,
            digits,
            scale,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.digits.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Significant digits, without the decimal point.
    pub fn digits(&self) -> U256 {
        self.digits
    }

    /// Fractional digits after normalization.
    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Nearest `Decimal`, truncating fractional digits beyond what its
    /// 96-bit mantissa holds. Only an integer part above `Decimal::MAX` is
    /// an error.
    pub fn to_decimal(&self) -> Result<Decimal> {
        let max_mantissa = U256::from(Decimal::MAX.mantissa().unsigned_abs());
        let ten = U256::from(10u64);

        let mut digits = self.digits;
        let mut scale = self.scale as u32;
        while scale > 0 && (scale > MAX_DECIMAL_SCALE || digits > max_mantissa) {
            digits /= ten;
            scale -= 1;
        }
        let overflow = || SwapError::AmountOverflow {
            amount: self.digits,
            decimals: self.scale,
        };
        if digits > max_mantissa {
            return Err(overflow());
        }

        let mantissa = i128::try_from(digits).map_err(|_| overflow())?;
        let value = Decimal::try_from_i128_with_scale(mantissa, scale)
            .map_err(|_| overflow())?
            .normalize();
        Ok(if self.negative { -value } else { value })
    }
}

impl From<Decimal> for HumanAmount {
    fn from(amount: Decimal) -> Self {
        let digits = U256::from(amount.mantissa().unsigned_abs());
        // rust_decimal scales never exceed 28
        Self::new(amount.is_sign_negative(), digits, amount.scale() as u8)
    }
}

impl From<U256> for HumanAmount {
    fn from(whole: U256) -> Self {
        Self::new(false, whole, 0)
    }
}

impl fmt::Display for HumanAmount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sign = if self.negative { "-" } else { "" };
        let digits = self.digits.to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }

        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (integer, fraction) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, integer, fraction)
    }
}

impl FromStr for HumanAmount {
    type Err = SwapError;

    /// Plain decimal notation, e.g. `"79300000000.000000000000000007"`.
    fn from_str(text: &str) -> Result<Self> {
        let invalid = || SwapError::InvalidAmount(text.to_string());
        let trimmed = text.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if integer.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !integer.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let scale = u8::try_from(fraction.len()).map_err(|_| invalid())?;
        let joined = format!("{}{}", integer, fraction);
        let digits = U256::from_str_radix(&joined, 10).map_err(|_| invalid())?;
        Ok(Self::new(negative, digits, scale))
    }
}

impl Serialize for HumanAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Convert a human amount to smallest units: `amount * 10^decimals`,
/// truncated toward zero.
pub fn to_smallest_unit(amount: impl Into<HumanAmount>, decimals: u8) -> Result<U256> {
    let amount = amount.into();
    if amount.is_negative() {
        return Err(SwapError::InvalidAmount(amount.to_string()));
    }
    if amount.is_zero() {
        return Ok(U256::ZERO);
    }

    let overflow = || SwapError::InvalidAmount(format!("{} overflows uint256", amount));
    let ten = U256::from(10u64);
    let decimals = decimals as u32;
    let scale = amount.scale as u32;

    if decimals >= scale {
        let factor = ten
            .checked_pow(U256::from(decimals - scale))
            .ok_or_else(overflow)?;
        amount.digits.checked_mul(factor).ok_or_else(overflow)
    } else {
        // digits < 2^256 < 10^78, so a larger divisor truncates to zero
        Ok(ten
            .checked_pow(U256::from(scale - decimals))
            .map_or(U256::ZERO, |divisor| amount.digits / divisor))
    }
}

/// Convert smallest units to a human amount: exact division by `10^decimals`.
pub fn to_human_unit(amount: U256, decimals: u8) -> HumanAmount {
    HumanAmount::new(false, amount, decimals)
}

/// Display rounding for prices, balances and fees.
///
/// * integer part non-zero: 0 fractional digits when it has 4+ digits, else 2
/// * integer part zero: with `k` the index of the first non-zero fractional
///   digit, keep `k + 4` digits when 3+ digits follow from `k`, else `k + 2`
///
/// Always truncates toward zero.
pub fn human_round(amount: Decimal) -> Decimal {
    let amount = amount.normalize();
    if amount.scale() == 0 {
        return amount;
    }

    let integer_part = amount.trunc();
    if !integer_part.is_zero() {
        let int_digits = integer_part.abs().to_string().len();
        let keep = if int_digits >= 4 { 0 } else { 2 };
        return amount.round_dp_with_strategy(keep, RoundingStrategy::ToZero);
    }

    let text = amount.abs().to_string();
    let fractional = text.split('.').nth(1).unwrap_or("");
    match fractional.find(|c: char| c != '0') {
        Some(first_significant) => {
            let run = fractional.len() - first_significant;
            let keep = if run >= 3 {
                first_significant + 4
            } else {
                first_significant + 2
            };
            amount.round_dp_with_strategy(keep as u32, RoundingStrategy::ToZero)
        }
        None => amount,
    }
}

/// Minimum acceptable output: `floor(amount_out - amount_out * slippage / 100)`.
pub fn min_output(amount_out: U256, slippage_percent: Decimal) -> U256 {
    if slippage_percent <= Decimal::ZERO {
        return amount_out;
    }
    if slippage_percent >= Decimal::ONE_HUNDRED {
        return U256::ZERO;
    }

    // floor(a - x) == a - ceil(x) with x = a * m / (100 * 10^s)
    let numerator = amount_out.saturating_mul(U256::from(slippage_percent.mantissa().unsigned_abs()));
    let denominator = U256::from(100u64) * pow10(slippage_percent.scale());
    let reduction = numerator.saturating_add(denominator - U256::from(1u64)) / denominator;
    amount_out.saturating_sub(reduction)
}

/// Network gas price plus the configured offset, in wei.
pub async fn gas_price_with_offset<P: Provider>(provider: &P, gwei_offset: u64) -> Result<u128> {
    let gas_price = provider.get_gas_price().await?;
    Ok(gas_price + gwei_offset as u128 * WEI_PER_GWEI)
}

/// Estimate gas for `tx`, add a 10% margin and price the fee against the policy.
///
/// The fee uses the raw estimate; only the limit carries the margin.
pub async fn estimate_gas<P: Provider>(
    provider: &P,
    tx: &TransactionRequest,
    policy: &GasPolicy,
) -> Result<GasEstimate> {
    let gas = provider.estimate_gas(tx.clone()).await?;
    let gas_limit = gas + gas / 10;

    let price = gas_price_with_offset(provider, policy.gwei_offset).await?;
    let cost_wei = U256::from(gas).saturating_mul(U256::from(price));
    let cost_native = human_round(to_human_unit(cost_wei, NATIVE_DECIMALS).to_decimal()?);
    let within_budget = cost_native <= policy.max_tx_fee_native;

    debug!(
        "Gas estimate: {} (limit {}) @ {} wei = {} native | budget {} | ok={}",
        gas, gas_limit, price, cost_native, policy.max_tx_fee_native, within_budget
    );

    Ok(GasEstimate {
        gas_limit,
        cost_native,
        within_budget,
    })
}
