//! Wallet helpers: address validation, signer loading and BIP-39 import.
//!
//! Key derivation itself is alloy's `MnemonicBuilder`.

use crate::error::{Result, SwapError};
use alloy::primitives::Address;
use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use std::str::FromStr;

/// First account of the standard Ethereum derivation tree
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// A 20-byte hex address. Mixed-case input must carry a valid EIP-55 checksum.
pub fn is_valid_address(value: &str) -> bool {
    let hex = value.strip_prefix("0x").unwrap_or(value);
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        let prefixed = format!("0x{}", hex);
        return Address::parse_checksummed(&prefixed, None).is_ok();
    }
    true
}

/// Parse a hex private key (with or without `0x`).
pub fn signer_from_private_key(private_key: &str) -> Result<PrivateKeySigner> {
    PrivateKeySigner::from_str(private_key.trim())
        .map_err(|e| SwapError::InvalidPrivateKey(e.to_string()))
}

/// Checksummed address and `0x` private key for a wallet given by key.
pub fn credentials_from_private_key(private_key: &str) -> Result<(String, String)> {
    let signer = signer_from_private_key(private_key)?;
    Ok((signer.address().to_checksum(None), private_key.trim().to_string()))
}

/// Checksummed address and `0x` private key of the first account of a phrase.
pub fn credentials_from_mnemonic(phrase: &str) -> Result<(String, String)> {
    let signer = MnemonicBuilder::<English>::default()
        .phrase(phrase.trim())
        .derivation_path(DEFAULT_DERIVATION_PATH)?
        .build()?;
    Ok((signer.address().to_checksum(None), signer.to_bytes().to_string()))
}
