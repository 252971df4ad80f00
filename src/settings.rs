//! Settings
//!
//! The single mutable configuration value owned by the orchestrator.
//! Keys keep their wire names (`RPC`, `GWEI_OFFSET`, `MaxTXFeeETH`, ...)
//! so existing settings files and env setups carry over.
//!
//! Loading sources: defaults, `.env` / environment (`BASESWAP_*`), or a
//! TOML file. Settings are never written back to disk.

use crate::error::{Result, SwapError};
use crate::units::GasPolicy;
use crate::wallet;
use alloy::primitives::Address;
use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info, warn};

pub const DEFAULT_RPC: &str = "https://mainnet.base.org";

/// Per-call trading parameters. Read fresh from the settings on every write,
/// so editing them never needs a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPolicy {
    pub slippage_percent: Decimal,
    pub gas: GasPolicy,
    /// Receipt polling limit
    pub timeout: Duration,
}

/// Recognized setting keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Address,
    PrivateKey,
    Rpc,
    GweiOffset,
    MaxTxFeeNative,
    Slippage,
    Timeout,
}

impl SettingKey {
    pub const ALL: [SettingKey; 7] = [
        SettingKey::Address,
        SettingKey::PrivateKey,
        SettingKey::Rpc,
        SettingKey::GweiOffset,
        SettingKey::MaxTxFeeNative,
        SettingKey::Slippage,
        SettingKey::Timeout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::Address => "address",
            SettingKey::PrivateKey => "private_key",
            SettingKey::Rpc => "RPC",
            SettingKey::GweiOffset => "GWEI_OFFSET",
            SettingKey::MaxTxFeeNative => "MaxTXFeeETH",
            SettingKey::Slippage => "Slippage",
            SettingKey::Timeout => "timeout",
        }
    }

    /// Keys whose change invalidates the token and router views.
    pub fn triggers_rebuild(&self) -> bool {
        matches!(
            self,
            SettingKey::Address | SettingKey::PrivateKey | SettingKey::Rpc
        )
    }

    fn env_var(&self) -> &'static str {
        match self {
            SettingKey::Address => "BASESWAP_ADDRESS",
            SettingKey::PrivateKey => "BASESWAP_PRIVATE_KEY",
            SettingKey::Rpc => "BASESWAP_RPC",
            SettingKey::GweiOffset => "BASESWAP_GWEI_OFFSET",
            SettingKey::MaxTxFeeNative => "BASESWAP_MAX_TX_FEE",
            SettingKey::Slippage => "BASESWAP_SLIPPAGE",
            SettingKey::Timeout => "BASESWAP_TIMEOUT",
        }
    }
}

impl FromStr for SettingKey {
    type Err = SwapError;

    fn from_str(key: &str) -> Result<Self> {
        SettingKey::ALL
            .into_iter()
            .find(|k| k.as_str() == key)
            .ok_or_else(|| SwapError::UnknownSetting(key.to_string()))
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Wallet address, only needed for transactions
    pub address: String,
    /// Hex private key, only needed for transactions
    pub private_key: String,
    /// RPC endpoint; `ws://` / `wss://` select the WebSocket transport
    #[serde(rename = "RPC")]
    pub rpc: String,
    /// Added to the network gas price, in gwei
    #[serde(rename = "GWEI_OFFSET")]
    pub gwei_offset: u64,
    /// Advisory fee ceiling per transaction, in native units
    #[serde(rename = "MaxTXFeeETH")]
    pub max_tx_fee_native: Decimal,
    /// Max slippage percentage for swaps
    #[serde(rename = "Slippage")]
    pub slippage_percent: Decimal,
    /// Timeout in seconds for RPC requests and receipt polling
    #[serde(rename = "timeout")]
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            address: String::new(),
            private_key: String::new(),
            rpc: DEFAULT_RPC.to_string(),
            gwei_offset: 0,
            max_tx_fee_native: Decimal::new(1, 4), // 0.0001
            slippage_percent: Decimal::from(3),
            timeout_secs: 60,
        }
    }
}

fn invalid(key: SettingKey, reason: impl fmt::Display) -> SwapError {
    SwapError::InvalidSetting {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

impl Settings {
    /// Load from `.env` and the process environment, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let mut settings = Self::default();
        for key in SettingKey::ALL {
            if let Ok(value) = std::env::var(key.env_var()) {
                settings
                    .apply(key, &value)
                    .with_context(|| format!("{} is invalid", key.env_var()))?;
            }
        }
        Ok(settings)
    }

    /// Load from a TOML file using the wire key names.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read settings file: {}", path.as_ref().display())
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse TOML settings. Unknown keys are logged and ignored.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let mut table: toml::Table = content.parse().context("Failed to parse TOML settings")?;
        table.retain(|key, _| {
            let known = SettingKey::from_str(key).is_ok();
            if !known {
                warn!("Ignoring unknown setting '{}' in settings file", key);
            }
            known
        });

        let settings: Self = table
            .try_into()
            .context("Failed to parse TOML settings")?;
        settings.validate_ranges()?;
        Ok(settings)
    }

    /// Apply one `key = value` edit given by name.
    ///
    /// Unknown keys are logged and rejected; nothing is changed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<SettingKey> {
        let key = match SettingKey::from_str(key) {
            Ok(k) => k,
            Err(e) => {
                error!("Setting key '{}' not found in settings.", key);
                return Err(e);
            }
        };
        self.apply(key, value)?;
        Ok(key)
    }

    /// Apply one edit to a known key.
    pub fn apply(&mut self, key: SettingKey, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            SettingKey::Address => self.address = value.to_string(),
            SettingKey::PrivateKey => self.private_key = value.to_string(),
            SettingKey::Rpc => {
                if value.is_empty() {
                    return Err(invalid(key, "endpoint must not be empty"));
                }
                self.rpc = value.to_string();
            }
            SettingKey::GweiOffset => {
                self.gwei_offset = value.parse().map_err(|e| invalid(key, e))?;
            }
            SettingKey::MaxTxFeeNative => {
                let fee = Decimal::from_str(value).map_err(|e| invalid(key, e))?;
                if fee.is_sign_negative() {
                    return Err(invalid(key, "fee ceiling must not be negative"));
                }
                self.max_tx_fee_native = fee;
            }
            SettingKey::Slippage => {
                let slippage = Decimal::from_str(value).map_err(|e| invalid(key, e))?;
                if slippage.is_sign_negative() || slippage > Decimal::ONE_HUNDRED {
                    return Err(invalid(key, "slippage must be within 0..=100"));
                }
                self.slippage_percent = slippage;
            }
            SettingKey::Timeout => {
                let secs: u64 = value.parse().map_err(|e| invalid(key, e))?;
                if secs == 0 {
                    return Err(invalid(key, "timeout must be at least one second"));
                }
                self.timeout_secs = secs;
            }
        }

        if key == SettingKey::PrivateKey {
            info!("Setting '{}' updated", key);
        } else {
            info!("Setting '{}' = {}", key, value);
        }
        Ok(())
    }

    fn validate_ranges(&self) -> Result<()> {
        if self.slippage_percent.is_sign_negative() || self.slippage_percent > Decimal::ONE_HUNDRED {
            return Err(invalid(SettingKey::Slippage, "slippage must be within 0..=100"));
        }
        if self.timeout_secs == 0 {
            return Err(invalid(SettingKey::Timeout, "timeout must be at least one second"));
        }
        Ok(())
    }

    /// Human-readable check of the wallet credentials.
    pub fn check(&self) -> &'static str {
        if !self.address.is_empty() && !wallet::is_valid_address(&self.address) {
            return "Invalid address in settings!";
        }
        if !self.private_key.is_empty() && !matches!(self.private_key.len(), 64 | 66) {
            return "Invalid private_key in settings!";
        }
        "Address Setup is done"
    }

    /// Configured wallet address, if it parses.
    pub fn account(&self) -> Option<Address> {
        if self.address.is_empty() {
            return None;
        }
        self.address.parse().ok()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn gas_policy(&self) -> GasPolicy {
        GasPolicy {
            gwei_offset: self.gwei_offset,
            max_tx_fee_native: self.max_tx_fee_native,
        }
    }

    pub fn swap_policy(&self) -> SwapPolicy {
        SwapPolicy {
            slippage_percent: self.slippage_percent,
            gas: self.gas_policy(),
            timeout: self.timeout(),
        }
    }

    /// Pretty JSON dump with the private key masked.
    pub fn to_json_redacted(&self) -> String {
        let mut shown = self.clone();
        if !shown.private_key.is_empty() {
            shown.private_key = "<redacted>".to_string();
        }
        serde_json::to_string_pretty(&shown).unwrap_or_default()
    }
}
