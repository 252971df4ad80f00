//! RPC connection: endpoint scheme selects the transport.
//!
//! `ws://` / `wss://` endpoints use alloy's WebSocket transport, everything
//! else goes over HTTP through a reqwest client with the configured timeout.

use crate::error::{Result, SwapError};
use alloy::providers::{DynProvider, Provider, ProviderBuilder, WsConnect};
use alloy::rpc::client::RpcClient;
use alloy::transports::http::Http;
use alloy::transports::TransportErrorKind;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

/// Opens a provider for an endpoint. Tests swap in a mocked transport.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, rpc: &str, timeout: Duration) -> Result<DynProvider>;
}

/// Connector for real HTTP and WebSocket endpoints.
#[derive(Debug, Default, Clone, Copy)]
pub struct RpcConnector;

pub fn is_websocket(rpc: &str) -> bool {
    rpc.trim()
        .get(..2)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("ws"))
}

fn shorten(rpc: &str) -> &str {
    rpc.get(..50).unwrap_or(rpc)
}

#[async_trait]
impl Connector for RpcConnector {
    async fn connect(&self, rpc: &str, timeout: Duration) -> Result<DynProvider> {
        let rpc = rpc.trim();

        let provider = if is_websocket(rpc) {
            let ws = WsConnect::new(rpc);
            tokio::time::timeout(timeout, ProviderBuilder::new().connect_ws(ws))
                .await
                .map_err(|_| SwapError::Timeout(shorten(rpc).to_string()))??
                .erased()
        } else {
            let url: reqwest::Url = rpc.parse().map_err(|e| SwapError::InvalidSetting {
                key: "RPC".into(),
                reason: format!("{}", e),
            })?;
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(TransportErrorKind::custom)?;
            let http = Http::with_client(client, url);
            ProviderBuilder::new()
                .connect_client(RpcClient::new(http, false))
                .erased()
        };

        info!("Connected to RPC: {}", shorten(rpc));
        Ok(provider)
    }
}
