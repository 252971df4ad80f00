//! Router View
//!
//! Typed access to the swapper router deployed on the connected chain:
//!
//! - quotes: prices, liquidity, paths, amounts out, tax/honeypot check
//! - swaps: native/token swaps through the V2 or V3 entry points
//! - wallet: batched wallet reports and Transfer-log token discovery

mod quotes;
mod swaps;
mod wallet;

pub use quotes::decode_token_info;
pub use wallet::{
    wallet_batches, DEFAULT_SCAN_BLOCKS, DEFAULT_SCAN_WINDOW, MAX_WALLET_BATCH, NATIVE_ENTRY,
};

use crate::chains::ChainProfile;
use crate::contracts::ISwapperRouter;
use crate::tx::TxSender;
use alloy::primitives::Address;
use alloy::providers::DynProvider;

pub struct RouterView {
    contract: ISwapperRouter::ISwapperRouterInstance<DynProvider>,
    profile: ChainProfile,
    sender: TxSender,
}

impl RouterView {
    pub fn new(profile: ChainProfile, sender: TxSender) -> Self {
        Self {
            contract: ISwapperRouter::new(profile.router, sender.provider().clone()),
            profile,
            sender,
        }
    }

    pub fn address(&self) -> Address {
        *self.contract.address()
    }

    pub fn profile(&self) -> &ChainProfile {
        &self.profile
    }

    pub fn sender(&self) -> &TxSender {
        &self.sender
    }

    fn provider(&self) -> &DynProvider {
        self.sender.provider()
    }
}
