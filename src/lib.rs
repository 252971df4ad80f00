//! baseswap
//!
//! Swap engine for a V2/V3 router contract on Base: token and native prices,
//! liquidity and tax checks, approvals, wallet reports and retrying swaps
//! between the native asset and ERC-20 tokens.
//!
//! [`SwapOrchestrator`] is the entry point. It owns the [`Settings`], the RPC
//! connection and the [`TokenView`] / [`RouterView`] pair built on it.

pub mod chains;
pub mod contracts;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod router;
pub mod settings;
pub mod token;
pub mod tx;
pub mod types;
pub mod units;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use chains::{profile_for, ChainProfile, BASE_CHAIN_ID, HARDHAT_CHAIN_ID};
pub use error::{Result, SwapError};
pub use orchestrator::{Connector, RpcConnector, SwapOrchestrator};
pub use router::RouterView;
pub use settings::{SettingKey, Settings, SwapPolicy};
pub use token::TokenView;
pub use types::{
    ApproveAmount, BestPool, GasEstimate, OutcomeDetail, ProtocolVersion, SwapOutcome, SwapPath,
    TokenInfo, TokenSnapshot,
};
pub use units::{human_round, min_output, to_human_unit, to_smallest_unit, GasPolicy, HumanAmount};
