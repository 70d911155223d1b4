//! Injected wallet connector.

use crate::wallet::{InjectedProvider, ProviderEvent, WalletProvider};
use async_trait::async_trait;
use connector_core::{
    ensure_supported_chain, normalize_chain_id, ChainId, Connector, ConnectorError,
    ConnectorEvents, ConnectorResult, ConnectorUpdate, NetworkWithInfo, ProviderHandle,
    RawChainId,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Connector for a browser-injected wallet.
///
/// Supported chains are the chain ids of the networks passed at construction;
/// with no networks, any chain the wallet is on is accepted.
pub struct InjectedConnector {
    wallet: Option<Arc<dyn InjectedProvider>>,
    networks: Vec<NetworkWithInfo>,
    supported: Option<Vec<ChainId>>,
    events: Arc<ConnectorEvents>,
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl InjectedConnector {
    /// Create a connector. `wallet` is `None` when no wallet is injected.
    pub fn new(wallet: Option<Arc<dyn InjectedProvider>>, networks: Vec<NetworkWithInfo>) -> Self {
        let supported = if networks.is_empty() {
            None
        } else {
            Some(networks.iter().map(|n| n.chain_id).collect())
        };
        Self {
            wallet,
            networks,
            supported,
            events: Arc::new(ConnectorEvents::new()),
            forwarder: Mutex::new(None),
        }
    }

    /// Returns true if the wallet already exposes at least one account.
    pub async fn is_authorized(wallet: Option<&Arc<dyn InjectedProvider>>) -> bool {
        let Some(wallet) = wallet else {
            return false;
        };
        match wallet.request("eth_accounts", json!([])).await {
            Ok(value) => value.as_array().map_or(false, |accounts| !accounts.is_empty()),
            Err(_) => false,
        }
    }

    fn wallet(&self) -> ConnectorResult<&Arc<dyn InjectedProvider>> {
        self.wallet.as_ref().ok_or(ConnectorError::NoEthereumProvider)
    }

    fn provider_handle(wallet: &Arc<dyn InjectedProvider>) -> ProviderHandle {
        Arc::new(WalletProvider::new(wallet.clone()))
    }

    fn start_forwarding(&self, wallet: &Arc<dyn InjectedProvider>) {
        let receiver = wallet.subscribe();
        let events = self.events.clone();
        let provider = Self::provider_handle(wallet);
        let task = tokio::spawn(forward_wallet_events(receiver, events, provider));

        if let Some(previous) = self.forwarder.lock().replace(task) {
            previous.abort();
        }
    }

    fn stop_forwarding(&self) {
        if let Some(task) = self.forwarder.lock().take() {
            task.abort();
            debug!("Stopped forwarding wallet events");
        }
    }

    async fn request_account(&self, wallet: &Arc<dyn InjectedProvider>) -> ConnectorResult<Option<String>> {
        match wallet.request("eth_requestAccounts", json!([])).await {
            Ok(value) => {
                if let Some(account) = first_account(&value) {
                    return Ok(Some(account));
                }
            }
            Err(e) if e.is_user_rejection() => return Err(ConnectorError::UserRejected),
            Err(e) => {
                warn!(error = %e, "eth_requestAccounts was unsuccessful, falling back to enable");
            }
        }

        let accounts = wallet.enable().await?;
        Ok(accounts.into_iter().next())
    }
}

#[async_trait]
impl Connector for InjectedConnector {
    fn name(&self) -> &str {
        "injected"
    }

    fn supported_chain_ids(&self) -> Option<&[ChainId]> {
        self.supported.as_deref()
    }

    fn events(&self) -> &ConnectorEvents {
        &self.events
    }

    async fn activate(&self) -> ConnectorResult<ConnectorUpdate> {
        let wallet = self.wallet()?.clone();
        self.start_forwarding(&wallet);

        if wallet.is_metamask() {
            wallet.disable_auto_refresh();
        }

        let account = match self.request_account(&wallet).await {
            Ok(account) => account,
            Err(e) => {
                self.stop_forwarding();
                return Err(e);
            }
        };

        let mut update = ConnectorUpdate::new().with_provider(Self::provider_handle(&wallet));
        if let Some(account) = account {
            update = update.with_account(account);
        }
        Ok(update)
    }

    async fn get_provider(&self, chain_id: ChainId) -> ConnectorResult<ProviderHandle> {
        let wallet = self.wallet()?;

        let current = normalize_chain_id(self.get_chain_id().await?)?;
        if current == chain_id {
            return Ok(Self::provider_handle(wallet));
        }

        ensure_supported_chain(self.supported_chain_ids(), chain_id)?;
        let network = self
            .networks
            .iter()
            .find(|n| n.chain_id == chain_id)
            .ok_or(ConnectorError::NetworkNotFound(chain_id))?;

        // The wallet may refuse or already know the chain; either way it keeps
        // serving requests for whatever chain the user ends up on.
        let params = json!([network.to_add_chain_params()]);
        match wallet.request("wallet_addEthereumChain", params).await {
            Ok(_) => debug!(chain_id, "Requested wallet chain switch"),
            Err(e) => warn!(chain_id, error = %e, "wallet_addEthereumChain failed"),
        }

        Ok(Self::provider_handle(wallet))
    }

    async fn get_account(&self) -> ConnectorResult<Option<String>> {
        let wallet = self.wallet()?;

        match wallet.request("eth_accounts", json!([])).await {
            Ok(value) => {
                if let Some(account) = first_account(&value) {
                    return Ok(Some(account));
                }
            }
            Err(e) => warn!(error = %e, "eth_accounts was unsuccessful, falling back to enable"),
        }

        let accounts = wallet.enable().await?;
        Ok(accounts.into_iter().next())
    }

    async fn get_chain_id(&self) -> ConnectorResult<RawChainId> {
        let wallet = self.wallet()?;

        for method in ["eth_chainId", "net_version"] {
            match wallet.request(method, json!([])).await {
                Ok(value) => {
                    if let Some(chain_id) = parse_chain_id(value) {
                        return Ok(chain_id);
                    }
                }
                Err(e) => warn!(method, error = %e, "Chain id request was unsuccessful"),
            }
        }

        wallet.chain_id_hint().ok_or_else(|| {
            ConnectorError::Backend("Unable to determine the wallet's chain id".to_string())
        })
    }

    async fn deactivate(&self) -> ConnectorResult<()> {
        self.stop_forwarding();
        Ok(())
    }
}

impl Drop for InjectedConnector {
    fn drop(&mut self) {
        self.stop_forwarding();
    }
}

async fn forward_wallet_events(
    mut receiver: broadcast::Receiver<ProviderEvent>,
    events: Arc<ConnectorEvents>,
    provider: ProviderHandle,
) {
    loop {
        let event = match receiver.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Dropped wallet events");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        debug!(?event, "Handling wallet event");
        match event {
            ProviderEvent::ChainChanged(chain_id) | ProviderEvent::NetworkChanged(chain_id) => {
                events.emit_update(
                    ConnectorUpdate::new()
                        .with_chain_id(chain_id)
                        .with_provider(provider.clone()),
                );
            }
            ProviderEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
                Some(account) => events.emit_update(ConnectorUpdate::new().with_account(account)),
                None => events.emit_deactivate(),
            },
            ProviderEvent::Close { .. } => events.emit_deactivate(),
        }
    }
}

fn first_account(value: &Value) -> Option<String> {
    value
        .as_array()
        .and_then(|accounts| accounts.first())
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn parse_chain_id(value: Value) -> Option<RawChainId> {
    if value.is_null() {
        return None;
    }
    serde_json::from_value(value).ok()
}
