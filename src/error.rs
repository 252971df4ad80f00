//! Error taxonomy for the swap engine.
//!
//! Read paths propagate these to the caller. Write paths only absorb them
//! inside the orchestrator's retry loop.

use alloy::primitives::{TxHash, U256};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SwapError>;

/// RPC error text that marks a pre-flight swap as unaffordable.
const INSUFFICIENT_FUNDS_MARKER: &str = "insufficient funds for transfer";

#[derive(Debug, Error)]
pub enum SwapError {
    /// Chain id has no router profile. Fatal: the caller should abort.
    #[error("ChainID {0} currently not supported")]
    UnsupportedChain(u64),

    /// Native balance cannot cover a pre-flight swap. Fatal.
    #[error("insufficient native funds for transaction: {0}")]
    InsufficientFunds(String),

    #[error("setting key '{0}' not found in settings")]
    UnknownSetting(String),

    #[error("invalid value for setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("address and private key must be configured before sending transactions")]
    MissingCredentials,

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("amount {amount} with {decimals} decimals exceeds the Decimal range")]
    AmountOverflow { amount: U256, decimals: u8 },

    #[error("router reported unknown protocol version {0}")]
    UnknownProtocol(u8),

    #[error("router returned an empty quote")]
    EmptyQuote,

    #[error("failed to decode router response: {0}")]
    Decode(String),

    #[error("connection to {0} timed out")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(#[from] alloy::transports::TransportError),

    #[error("contract call failed: {0}")]
    Contract(#[from] alloy::contract::Error),

    /// Broadcast, but no receipt arrived. The transaction may still be mined.
    #[error("transaction {tx_hash} unconfirmed: {source}")]
    Unconfirmed {
        tx_hash: TxHash,
        #[source]
        source: alloy::providers::PendingTransactionError,
    },

    #[error("signer error: {0}")]
    Signer(#[from] alloy::signers::local::LocalSignerError),

    #[error("failed to build transaction: {0}")]
    TxBuild(String),
}

impl SwapError {
    /// Errors after which the process is expected to stop rather than retry.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SwapError::UnsupportedChain(_) | SwapError::InsufficientFunds(_))
    }

    /// Hash of the transaction this error left in flight, if any.
    pub fn broadcast_hash(&self) -> Option<TxHash> {
        match self {
            SwapError::Unconfirmed { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }

    /// Reclassify an RPC failure as `InsufficientFunds` when the node says so.
    pub fn classify_funds(self) -> Self {
        let message = self.to_string();
        if message.contains(INSUFFICIENT_FUNDS_MARKER) {
            SwapError::InsufficientFunds(message)
        } else {
            self
        }
    }
}
