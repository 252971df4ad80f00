//! Core data structures shared by the token view, router view and orchestrator.

use crate::error::SwapError;
use crate::units::HumanAmount;
use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;

/// Router protocol families. The router reports one per token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    V2,
    V3,
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = SwapError;

    fn try_from(version: u8) -> Result<Self, Self::Error> {
        match version {
            2 => Ok(ProtocolVersion::V2),
            3 => Ok(ProtocolVersion::V3),
            other => Err(SwapError::UnknownProtocol(other)),
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProtocolVersion::V2 => write!(f, "V2"),
            ProtocolVersion::V3 => write!(f, "V3"),
        }
    }
}

/// Route through the router, in the encoding of its protocol version.
///
/// The router resolves these arrays itself; they are passed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapPath {
    V2 {
        hops: Vec<Address>,
        dex_ids: Vec<U256>,
    },
    V3 {
        hops: Vec<Address>,
        dex_ids: Vec<U256>,
        pools: Vec<Address>,
        /// Fee tier per pool (500 = 0.05%, 3000 = 0.30%, ...)
        pool_fees: Vec<u32>,
    },
}

impl SwapPath {
    pub fn version(&self) -> ProtocolVersion {
        match self {
            SwapPath::V2 { .. } => ProtocolVersion::V2,
            SwapPath::V3 { .. } => ProtocolVersion::V3,
        }
    }

    pub fn hops(&self) -> &[Address] {
        match self {
            SwapPath::V2 { hops, .. } | SwapPath::V3 { hops, .. } => hops,
        }
    }
}

/// Gas estimate with the 10% safety margin already applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GasEstimate {
    pub gas_limit: u64,
    /// Estimated fee in native units, display-rounded
    pub cost_native: Decimal,
    /// Advisory: fee is within the configured maximum
    pub within_budget: bool,
}

/// What accompanies a swap/approve outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeDetail {
    /// A transaction was broadcast with this gas estimate
    Gas(GasEstimate),
    /// Allowance already covered the request, nothing was sent
    AlreadyApproved,
    /// No successful attempt; carries the last error
    Failed(String),
}

impl fmt::Display for OutcomeDetail {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutcomeDetail::Gas(gas) => write!(
                f,
                "gas limit {} | cost {} | within budget: {}",
                gas.gas_limit, gas.cost_native, gas.within_budget
            ),
            OutcomeDetail::AlreadyApproved => write!(f, "Already Approved"),
            OutcomeDetail::Failed(reason) => write!(f, "{}", reason),
        }
    }
}

/// Result of one submission attempt (or of the whole retry loop).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    pub success: bool,
    /// Transaction hash, or "0" when nothing was broadcast
    pub tx_hash: String,
    pub detail: OutcomeDetail,
}

impl SwapOutcome {
    /// Hash used when no transaction was broadcast.
    pub const NO_TX: &'static str = "0";

    pub fn confirmed(success: bool, tx_hash: String, gas: GasEstimate) -> Self {
        Self {
            success,
            tx_hash,
            detail: OutcomeDetail::Gas(gas),
        }
    }

    pub fn already_approved() -> Self {
        Self {
            success: true,
            tx_hash: Self::NO_TX.to_string(),
            detail: OutcomeDetail::AlreadyApproved,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            tx_hash: Self::NO_TX.to_string(),
            detail: OutcomeDetail::Failed(reason.into()),
        }
    }

    /// Failure that left a broadcast transaction without a receipt.
    pub fn unconfirmed(tx_hash: String, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            tx_hash,
            detail: OutcomeDetail::Failed(reason.into()),
        }
    }

    pub fn gas(&self) -> Option<&GasEstimate> {
        match &self.detail {
            OutcomeDetail::Gas(gas) => Some(gas),
            _ => None,
        }
    }
}

/// Approval size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproveAmount {
    Exact(U256),
    /// 2^256 - 1
    Max,
}

impl ApproveAmount {
    pub fn value(&self) -> U256 {
        match self {
            ApproveAmount::Exact(amount) => *amount,
            ApproveAmount::Max => U256::MAX,
        }
    }
}

/// Router-reported tax and honeypot verdict for a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub buy_tax_percent: Decimal,
    pub sell_tax_percent: Decimal,
    pub is_honeypot: bool,
}

/// Deepest pool the router knows for a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestPool {
    pub dex_id: U256,
    pub pool: Address,
    pub base_token: Address,
}

/// One row of a wallet report, keyed like the router's own report format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TokenSnapshot {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(rename = "UniswapV")]
    pub uniswap_version: u64,
    #[serde(serialize_with = "as_decimal_string")]
    pub balance_wei: U256,
    pub balance: HumanAmount,
    #[serde(rename = "BalanceUSD")]
    pub balance_usd: Decimal,
    #[serde(rename = "USDPriceWei", serialize_with = "as_decimal_string")]
    pub usd_price_wei: U256,
    #[serde(rename = "ETHPriceWei", serialize_with = "as_decimal_string")]
    pub eth_price_wei: U256,
    #[serde(rename = "USDPrice")]
    pub usd_price: Decimal,
    #[serde(rename = "ETHPrice")]
    pub eth_price: Decimal,
}

fn as_decimal_string<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}
