//! Chain Registry
//!
//! Static lookup from chain id to the router deployment on that chain.
//! Unknown chain ids have no fallback profile.

use crate::error::{Result, SwapError};
use alloy::primitives::{address, Address};

/// Base mainnet
pub const BASE_CHAIN_ID: u64 = 8453;
/// Local Hardhat fork of Base
pub const HARDHAT_CHAIN_ID: u64 = 31337;

const SWAPPER_ROUTER: Address = address!("dfFaE64f8E4a0E2389f7EC8d2745E8fa6Fa806eC");
const BASE_USDC: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

/// Router deployment and well-known addresses for one chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainProfile {
    pub chain_id: u64,
    pub router: Address,
    pub wrapped_native: Address,
    pub zero: Address,
    /// Token used when no target token is supplied
    pub default_token: Address,
    pub native_symbol: &'static str,
}

/// Look up the profile for `chain_id`.
pub fn profile_for(chain_id: u64) -> Result<ChainProfile> {
    match chain_id {
        BASE_CHAIN_ID => Ok(ChainProfile {
            chain_id,
            router: SWAPPER_ROUTER,
            wrapped_native: address!("4200000000000000000000000000000000000006"),
            zero: Address::ZERO,
            default_token: BASE_USDC,
            native_symbol: "ETH",
        }),
        HARDHAT_CHAIN_ID => Ok(ChainProfile {
            chain_id,
            router: SWAPPER_ROUTER,
            wrapped_native: address!("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"),
            zero: Address::ZERO,
            default_token: BASE_USDC,
            native_symbol: "ETH",
        }),
        other => Err(SwapError::UnsupportedChain(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_profile() {
        let profile = profile_for(BASE_CHAIN_ID).unwrap();
        assert_eq!(profile.router, SWAPPER_ROUTER);
        assert_eq!(
            profile.wrapped_native,
            address!("4200000000000000000000000000000000000006")
        );
        assert_eq!(profile.zero, Address::ZERO);
    }

    #[test]
    fn test_hardhat_shares_router() {
        let base = profile_for(BASE_CHAIN_ID).unwrap();
        let local = profile_for(HARDHAT_CHAIN_ID).unwrap();
        assert_eq!(base.router, local.router);
        assert_ne!(base.wrapped_native, local.wrapped_native);
    }

    #[test]
    fn test_unknown_chain_is_fatal() {
        let err = profile_for(137).unwrap_err();
        assert!(matches!(err, SwapError::UnsupportedChain(137)));
        assert!(err.is_fatal());
    }
}
