//! Swap Orchestrator
//!
//! Owns the settings, the RPC connection and the token/router views, and
//! exposes the high-level operations: setting edits with cascading rebuilds,
//! wallet import, reads, approvals and retrying swaps.
//!
//! Editing `address`, `private_key` or `RPC` invalidates both views. A
//! non-deferred edit rebuilds immediately; deferred edits only mark the views
//! stale, and every write path rebuilds stale views before it signs anything.

mod connect;
mod retry;

pub use connect::{is_websocket, Connector, RpcConnector};
pub use retry::RETRY_DELAY;

use crate::chains::{profile_for, ChainProfile};
use crate::error::Result;
use crate::router::RouterView;
use crate::settings::{SettingKey, Settings};
use crate::token::TokenView;
use crate::tx::TxSender;
use crate::types::{SwapOutcome, TokenInfo, TokenSnapshot};
use crate::units::HumanAmount;
use crate::wallet;
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider};
use rust_decimal::Decimal;
use tracing::{error, info};

pub struct SwapOrchestrator {
    settings: Settings,
    connector: Box<dyn Connector>,
    provider: DynProvider,
    profile: ChainProfile,
    token_address: Address,
    token: TokenView,
    router: RouterView,
    stale: bool,
}

/// Connect and resolve the router profile of the connected chain.
async fn open(connector: &dyn Connector, settings: &Settings) -> Result<(DynProvider, ChainProfile)> {
    let provider = connector.connect(&settings.rpc, settings.timeout()).await?;
    let chain_id = provider.get_chain_id().await?;
    let profile = profile_for(chain_id).inspect_err(|e| error!("{}", e))?;
    info!("Chain {} | router {}", chain_id, profile.router);
    Ok((provider, profile))
}

fn build_views(
    provider: &DynProvider,
    profile: &ChainProfile,
    settings: &Settings,
    token: Address,
) -> (TokenView, RouterView) {
    let sender = TxSender::new(provider.clone(), profile.chain_id, settings);
    (
        TokenView::new(token, profile, sender.clone()),
        RouterView::new(*profile, sender),
    )
}

impl SwapOrchestrator {
    /// Connect to `settings.rpc` and build the views for `token`, or for the
    /// chain's default token when none is given.
    pub async fn connect(
        settings: Settings,
        token: Option<Address>,
        connector: impl Connector + 'static,
    ) -> Result<Self> {
        let connector: Box<dyn Connector> = Box::new(connector);
        let (provider, profile) = open(connector.as_ref(), &settings).await?;
        let token_address = token.unwrap_or(profile.default_token);
        let (token, router) = build_views(&provider, &profile, &settings, token_address);

        Ok(Self {
            settings,
            connector,
            provider,
            profile,
            token_address,
            token,
            router,
            stale: false,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn profile(&self) -> &ChainProfile {
        &self.profile
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Active token
    pub fn token_address(&self) -> Address {
        self.token_address
    }

    /// Views as of the last rebuild.
    pub fn token(&self) -> &TokenView {
        &self.token
    }

    pub fn router(&self) -> &RouterView {
        &self.router
    }

    /// True when deferred edits are waiting for a rebuild.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Apply one setting edit. Edits to `address`, `private_key` and `RPC`
    /// rebuild the views unless `defer` is set.
    pub async fn set(&mut self, key: &str, value: &str, defer: bool) -> Result<()> {
        let key = self.settings.set(key, value)?;
        if key.triggers_rebuild() {
            self.stale = true;
            if !defer {
                self.rebuild().await?;
            }
        }
        Ok(())
    }

    /// Reconnect and rebuild both views from the current settings.
    pub async fn rebuild(&mut self) -> Result<()> {
        let (provider, profile) = open(self.connector.as_ref(), &self.settings).await?;
        let (token, router) = build_views(&provider, &profile, &self.settings, self.token_address);

        self.provider = provider;
        self.profile = profile;
        self.token = token;
        self.router = router;
        self.stale = false;
        info!("Views rebuilt for token {}", self.token_address);
        Ok(())
    }

    pub(crate) async fn ensure_fresh(&mut self) -> Result<()> {
        if self.stale {
            self.rebuild().await?;
        }
        Ok(())
    }

    pub async fn change_rpc(&mut self, rpc: &str) -> Result<()> {
        self.set(SettingKey::Rpc.as_str(), rpc, false).await
    }

    /// Switch the active token. Rebuilds the views on the current connection.
    pub fn change_token(&mut self, token: Address) {
        self.token_address = token;
        let (token_view, router) = build_views(&self.provider, &self.profile, &self.settings, token);
        self.token = token_view;
        self.router = router;
        info!("Active token changed to {}", token);
    }

    /// Use the wallet of `private_key`. Address and key change together with
    /// a single rebuild.
    pub async fn load_wallet_from_private_key(&mut self, private_key: &str) -> Result<()> {
        let (address, key) = wallet::credentials_from_private_key(private_key)?;
        self.load_credentials(&address, &key).await
    }

    /// Use the first account derived from a BIP-39 phrase.
    pub async fn load_wallet_from_mnemonic(&mut self, phrase: &str) -> Result<()> {
        let (address, key) = wallet::credentials_from_mnemonic(phrase)?;
        self.load_credentials(&address, &key).await
    }

    async fn load_credentials(&mut self, address: &str, key: &str) -> Result<()> {
        self.set(SettingKey::Address.as_str(), address, true).await?;
        self.set(SettingKey::PrivateKey.as_str(), key, false).await?;
        info!("Wallet loaded: {}", address);
        Ok(())
    }

    pub fn check_settings(&self) -> String {
        self.settings.check().to_string()
    }

    // ── Reads on the active token ───────────────────────────────────

    pub async fn usd_price(&self) -> Result<Decimal> {
        self.router.usd_price(self.token_address).await
    }

    pub async fn eth_price(&self) -> Result<Decimal> {
        self.router.eth_price(self.token_address).await
    }

    pub async fn native_usd_price(&self) -> Result<Decimal> {
        self.router.native_usd_price().await
    }

    pub async fn liquidity_usd(&self) -> Result<Decimal> {
        self.router.liquidity_usd(self.token_address).await
    }

    pub async fn token_info(&self) -> Result<TokenInfo> {
        self.router.token_info(self.token_address).await
    }

    /// Token balance of the configured wallet
    pub async fn balance(&self) -> Result<HumanAmount> {
        self.token.balance().await
    }

    /// Native balance of the configured wallet
    pub async fn native_balance(&self) -> Result<HumanAmount> {
        let owner = self.router.sender().owner()?;
        self.router.native_balance_human(owner).await
    }

    pub async fn wallet_assets(&self) -> Result<Vec<TokenSnapshot>> {
        let owner = self.router.sender().owner()?;
        self.router.wallet_assets(owner).await
    }

    /// Approve the router to spend `amount` of the active token (0 = unlimited).
    pub async fn approve_router(&mut self, amount: impl Into<HumanAmount>) -> Result<SwapOutcome> {
        self.ensure_fresh().await?;
        self.token
            .approve_router(amount, &self.settings.swap_policy())
            .await
    }
}
