//! Centralized Contract Definitions
//!
//! Solidity interfaces for the ERC-20 tokens and the V2/V3 swapper router,
//! defined using alloy's `sol!` macro.
//!
//! Each interface is annotated with `#[sol(rpc)]` to generate
//! contract instance types that can make RPC calls via any alloy Provider.

use alloy::primitives::Uint;
use alloy::sol;

// ── ERC20 ─────────────────────────────────────────────────────────────

sol! {
    #[sol(rpc)]
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);

        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

// ── Swapper router (V2 + V3 paths behind one contract) ───────────────

sol! {
    #[sol(rpc)]
    interface ISwapperRouter {
        function getUSDPrice(address token) external view returns (uint256 amount);
        function getETHPrice(address token) external view returns (uint256 amount);
        function getLiquidity(address token) external view returns (uint256);
        function checkVersion(address tokenIn) external view returns (uint8 version);
        function getBestPool(address token) external view returns (uint256 dexIdent, address bestPool, address baseToken);

        function getSwapPathV2(address tokenIn, address tokenOut) external view returns (address[] path, uint256[] dexPath);
        function getSwapPathV3(address tokenIn, address tokenOut) external view returns (address[] path, uint256[] dexIdents, address[] pools, uint24[] poolFees);

        function getAmountsOut(address tokenIn, address tokenOut, uint256 amountIn) external view returns (uint256[] amountsOut);
        function getAmountsOutV2(uint256 amountIn, address[] path, uint256[] dexPath) external view returns (uint256[] amounts);
        function getAmountsOutV3(address[] pools, address[] path, uint256 amountIn) external view returns (uint256[] amounts);

        function getTokenInfos(address token) external returns (uint256 buyIn, uint256 buyOut, uint256 sellIn, uint256 sellOut, bool check0, bool check1, bool check2, bool check3, string note);

        function getWalletTokenDATA(address wallet, address[] tokens) external view returns (address[] tokenAddress, string[] tokenName, string[] tokenSymbol, uint8[] tokenDecimals, uint256[] tokensVersion, uint256[] tokenBalances, uint256[] tokenUSDPrice, uint256[] tokenETHPrice);

        function swapETHtoTokenV2(address[] path, uint256[] dexPath, uint256 minOutput) external payable;
        function swapETHtoTokenV3(address[] path, address[] pools, uint24[] poolFees, uint256 minOutput) external payable;
        function swapTokentoETHV2(address[] path, uint256[] dexPath, uint256 amountIn, uint256 minOutput) external;
        function swapTokenToETHV3(address[] path, address[] pools, uint24[] poolFees, uint256 amountIn, uint256 minOutput) external;
        function swapTokentoTokenV2(address[] path, uint256[] dexPath, uint256 amountIn, uint256 minOutput) external;
        function swapTokentoTokenV3(address[] path, address[] pools, uint24[] poolFees, uint256 amountIn, uint256 minOutput) external;
    }
}

/// Convert a u32 pool fee to alloy's uint24 type for contract calls.
/// Uses from_limbs() because Uint<24, 1> doesn't impl From<u32>.
pub fn fee_to_u24(fee: u32) -> Uint<24, 1> {
    debug_assert!(fee <= 0xFFFFFF, "fee {} exceeds U24 max (16777215)", fee);
    Uint::from_limbs([fee as u64])
}

/// Inverse of [`fee_to_u24`].
pub fn u24_to_fee(fee: Uint<24, 1>) -> u32 {
    fee.to::<u32>()
}
