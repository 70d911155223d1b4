use crate::networks::MagicNetwork;
use crate::sdk::{map_login_error, MagicInstance, MagicSdk};
use async_trait::async_trait;
use connector_core::{
    ensure_supported_chain, ChainId, Connector, ConnectorError, ConnectorEvents,
    ConnectorResult, ConnectorUpdate, Network, ProviderHandle, RawChainId,
};
use futures_util::future::try_join_all;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Arguments for [`MagicConnector::new`].
#[derive(Debug, Clone)]
pub struct MagicConnectorArgs {
    pub api_key: String,
    /// Served networks; the first one is where activation lands.
    pub networks: Vec<Network>,
    /// Custom SDK endpoint.
    pub endpoint: Option<String>,
}

/// Connector for the hosted email-link signer.
pub struct MagicConnector {
    api_key: String,
    networks: Vec<Network>,
    endpoint: Option<String>,
    supported: Vec<ChainId>,
    sdk: Arc<dyn MagicSdk>,
    email: Mutex<Option<String>>,
    instances: Mutex<BTreeMap<ChainId, Arc<dyn MagicInstance>>>,
    active_chain_id: AtomicU64,
    events: ConnectorEvents,
}

impl MagicConnector {
    pub fn new(args: MagicConnectorArgs, sdk: Arc<dyn MagicSdk>) -> ConnectorResult<Self> {
        let first = args.networks.first().ok_or_else(|| {
            ConnectorError::InvalidConfig("at least one network is required".to_string())
        })?;

        if let Some(unknown) = args
            .networks
            .iter()
            .find(|n| MagicNetwork::from_chain_id(n.chain_id).is_none())
        {
            return Err(ConnectorError::InvalidConfig(format!(
                "Unsupported chainId {}",
                unknown.chain_id
            )));
        }

        Ok(Self {
            active_chain_id: AtomicU64::new(first.chain_id),
            supported: args.networks.iter().map(|n| n.chain_id).collect(),
            api_key: args.api_key,
            networks: args.networks,
            endpoint: args.endpoint,
            sdk,
            email: Mutex::new(None),
            instances: Mutex::new(BTreeMap::new()),
            events: ConnectorEvents::new(),
        })
    }

    /// Set the email used by the next activation.
    pub fn set_email(&self, email: impl Into<String>) -> ConnectorResult<()> {
        let email = email.into();
        if email.is_empty() || !email.contains('@') {
            return Err(ConnectorError::InvalidConfig(format!(
                "Invalid email: {}",
                email
            )));
        }
        *self.email.lock() = Some(email);
        Ok(())
    }

    pub fn email(&self) -> Option<String> {
        self.email.lock().clone()
    }

    /// Chain the connector currently serves.
    pub fn active_chain_id(&self) -> ChainId {
        self.active_chain_id.load(Ordering::SeqCst)
    }

    fn initial_chain_id(&self) -> ChainId {
        // `new` rejects an empty network list.
        self.supported[0]
    }

    /// Instance for the first configured network.
    pub fn initial_instance(&self) -> ConnectorResult<Arc<dyn MagicInstance>> {
        self.instances
            .lock()
            .get(&self.initial_chain_id())
            .cloned()
            .ok_or_else(|| {
                ConnectorError::NotActivated(
                    "Unable to get magic instance before calling `activate`".to_string(),
                )
            })
    }

    fn ensure_instances(&self) {
        let mut instances = self.instances.lock();
        for network in &self.networks {
            instances.entry(network.chain_id).or_insert_with(|| {
                debug!(chain_id = network.chain_id, "Creating signer instance");
                self.sdk
                    .create(&self.api_key, network, self.endpoint.as_deref())
            });
        }
    }

    async fn login(&self, magic: &Arc<dyn MagicInstance>, email: &str) -> ConnectorResult<()> {
        if magic.is_logged_in().await? {
            let current = magic.email().await?;
            if current.as_deref() == Some(email) {
                return Ok(());
            }
            info!("Signer is logged in with a different email, logging out");
            magic.logout().await?;
        }

        magic
            .login_with_magic_link(email)
            .await
            .map_err(map_login_error)
    }
}

#[async_trait]
impl Connector for MagicConnector {
    fn name(&self) -> &str {
        "magic"
    }

    fn supported_chain_ids(&self) -> Option<&[ChainId]> {
        Some(&self.supported)
    }

    fn events(&self) -> &ConnectorEvents {
        &self.events
    }

    async fn activate(&self) -> ConnectorResult<ConnectorUpdate> {
        let email = self.email().ok_or_else(|| {
            ConnectorError::InvalidConfig("Cannot activate magic before setting email".to_string())
        })?;

        self.ensure_instances();
        let magic = self.initial_instance()?;
        self.login(&magic, &email).await?;

        let accounts = magic.enable().await?;
        let chain_id = self.initial_chain_id();
        let provider = self.get_provider(chain_id).await?;

        let mut update = ConnectorUpdate::new()
            .with_chain_id(chain_id)
            .with_provider(provider);
        if let Some(account) = accounts.into_iter().next() {
            update = update.with_account(account);
        }

        match magic.id_token().await {
            Ok(token) => update = update.with_auth_token(token),
            Err(e) => warn!(error = %e, "Unable to fetch signer id token"),
        }

        Ok(update)
    }

    async fn get_provider(&self, chain_id: ChainId) -> ConnectorResult<ProviderHandle> {
        ensure_supported_chain(self.supported_chain_ids(), chain_id)?;

        let instance = self.instances.lock().get(&chain_id).cloned().ok_or_else(|| {
            ConnectorError::NotActivated(
                "Unable to get provider before calling `activate`".to_string(),
            )
        })?;

        self.active_chain_id.store(chain_id, Ordering::SeqCst);
        Ok(instance.rpc_provider())
    }

    async fn get_account(&self) -> ConnectorResult<Option<String>> {
        let accounts = self
            .initial_instance()?
            .request("eth_accounts", json!([]))
            .await?;
        Ok(accounts
            .as_array()
            .and_then(|a| a.first())
            .and_then(|a| a.as_str())
            .map(str::to_string))
    }

    async fn get_chain_id(&self) -> ConnectorResult<RawChainId> {
        Ok(RawChainId::Integer(self.active_chain_id()))
    }

    async fn deactivate(&self) -> ConnectorResult<()> {
        let instances: Vec<_> = self.instances.lock().values().cloned().collect();
        try_join_all(instances.iter().map(|instance| instance.logout())).await?;
        self.events.emit_deactivate();
        Ok(())
    }
}
