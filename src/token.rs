//! Token View
//!
//! ERC-20 reads for one token plus the approval write. Static metadata
//! (decimals, name, symbol) is fetched once and cached for the life of the
//! view; balances and allowances are always read fresh.

use crate::chains::ChainProfile;
use crate::contracts::IERC20;
use crate::error::Result;
use crate::settings::SwapPolicy;
use crate::tx::TxSender;
use crate::types::{ApproveAmount, SwapOutcome};
use crate::units::{self, HumanAmount};
use alloy::primitives::{Address, U256};
use alloy::providers::DynProvider;
use tokio::sync::OnceCell;
use tracing::{debug, info};

pub struct TokenView {
    contract: IERC20::IERC20Instance<DynProvider>,
    router: Address,
    sender: TxSender,
    decimals: OnceCell<u8>,
    name: OnceCell<String>,
    symbol: OnceCell<String>,
}

impl TokenView {
    pub fn new(token: Address, profile: &ChainProfile, sender: TxSender) -> Self {
        Self {
            contract: IERC20::new(token, sender.provider().clone()),
            router: profile.router,
            sender,
            decimals: OnceCell::new(),
            name: OnceCell::new(),
            symbol: OnceCell::new(),
        }
    }

    pub fn address(&self) -> Address {
        *self.contract.address()
    }

    pub fn sender(&self) -> &TxSender {
        &self.sender
    }

    pub async fn decimals(&self) -> Result<u8> {
        let decimals = self
            .decimals
            .get_or_try_init(|| async { self.contract.decimals().call().await })
            .await?;
        Ok(*decimals)
    }

    pub async fn name(&self) -> Result<String> {
        let name = self
            .name
            .get_or_try_init(|| async { self.contract.name().call().await })
            .await?;
        Ok(name.clone())
    }

    pub async fn symbol(&self) -> Result<String> {
        let symbol = self
            .symbol
            .get_or_try_init(|| async { self.contract.symbol().call().await })
            .await?;
        Ok(symbol.clone())
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        Ok(self.contract.balanceOf(owner).call().await?)
    }

    pub async fn balance_of_human(&self, owner: Address) -> Result<HumanAmount> {
        let raw = self.balance_of(owner).await?;
        Ok(units::to_human_unit(raw, self.decimals().await?))
    }

    /// Human balance of the configured wallet
    pub async fn balance(&self) -> Result<HumanAmount> {
        self.balance_of_human(self.sender.owner()?).await
    }

    /// Allowance granted by the configured wallet to `spender`
    pub async fn allowance(&self, spender: Address) -> Result<U256> {
        let owner = self.sender.owner()?;
        Ok(self.contract.allowance(owner, spender).call().await?)
    }

    pub async fn is_approved(&self, spender: Address, amount: U256) -> Result<bool> {
        let allowance = self.allowance(spender).await?;
        debug!("Allowance for {}: {} (need {})", spender, allowance, amount);
        Ok(allowance >= amount)
    }

    /// Approve `spender`, skipping the transaction when the current allowance
    /// already covers the request.
    pub async fn approve(
        &self,
        spender: Address,
        amount: ApproveAmount,
        policy: &SwapPolicy,
    ) -> Result<SwapOutcome> {
        let value = amount.value();
        if self.is_approved(spender, value).await? {
            debug!("Sufficient allowance for {} on {}", spender, self.address());
            return Ok(SwapOutcome::already_approved());
        }

        info!("Approving {} of {} for {}", value, self.address(), spender);
        let input = self.contract.approve(spender, value).calldata().clone();
        self.sender
            .send(self.address(), input, U256::ZERO, policy)
            .await
    }

    /// Approve the chain's router for `amount` human units (0 means unlimited).
    pub async fn approve_router(
        &self,
        amount: impl Into<HumanAmount>,
        policy: &SwapPolicy,
    ) -> Result<SwapOutcome> {
        let amount = amount.into();
        let amount = if amount.is_zero() {
            ApproveAmount::Max
        } else {
            ApproveAmount::Exact(units::to_smallest_unit(amount, self.decimals().await?)?)
        };
        self.approve(self.router, amount, policy).await
    }
}
