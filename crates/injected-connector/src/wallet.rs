//! The injected wallet interface.

use async_trait::async_trait;
use connector_core::{ConnectorResult, Provider, RawChainId};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Notification pushed by the wallet.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// EIP-1193 `chainChanged`
    ChainChanged(RawChainId),
    /// EIP-1193 `accountsChanged`; empty when the wallet locked or disconnected
    AccountsChanged(Vec<String>),
    /// Legacy `close`
    Close { code: i64, reason: String },
    /// Legacy `networkChanged`
    NetworkChanged(RawChainId),
}

/// An EIP-1193 provider injected by a wallet.
#[async_trait]
pub trait InjectedProvider: Send + Sync {
    /// Send a JSON-RPC request and return its `result`.
    async fn request(&self, method: &str, params: Value) -> ConnectorResult<Value>;

    /// Legacy `enable()`; prompts the user and returns the exposed accounts.
    async fn enable(&self) -> ConnectorResult<Vec<String>>;

    /// Subscribe to wallet notifications.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;

    fn is_metamask(&self) -> bool {
        false
    }

    /// Stop MetaMask from reloading the page on network changes.
    fn disable_auto_refresh(&self) {}

    /// Chain id exposed as a static property, for wallets that answer neither
    /// `eth_chainId` nor `net_version`.
    fn chain_id_hint(&self) -> Option<RawChainId> {
        None
    }
}

/// Exposes an injected wallet as a session provider.
#[derive(Clone)]
pub struct WalletProvider {
    wallet: Arc<dyn InjectedProvider>,
}

impl WalletProvider {
    pub fn new(wallet: Arc<dyn InjectedProvider>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl Provider for WalletProvider {
    async fn request(&self, method: &str, params: Value) -> ConnectorResult<Value> {
        self.wallet.request(method, params).await
    }
}
