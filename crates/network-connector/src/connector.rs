use crate::http::HttpProvider;
use async_trait::async_trait;
use connector_core::{
    ensure_supported_chain, ChainId, Connector, ConnectorError, ConnectorEvents,
    ConnectorResult, ConnectorUpdate, Network, ProviderHandle, RawChainId,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Connector serving one RPC endpoint per chain.
pub struct NetworkConnector {
    providers: BTreeMap<ChainId, Arc<HttpProvider>>,
    supported: Vec<ChainId>,
    current_chain_id: AtomicU64,
    events: ConnectorEvents,
}

impl NetworkConnector {
    /// Create a connector from per-chain RPC URLs.
    ///
    /// `default_chain_id` defaults to the lowest configured chain.
    pub fn new(urls: BTreeMap<ChainId, Url>, default_chain_id: Option<ChainId>) -> ConnectorResult<Self> {
        let default_chain_id = match default_chain_id {
            Some(chain_id) => chain_id,
            None => *urls.keys().next().ok_or_else(|| {
                ConnectorError::InvalidConfig("at least one RPC URL is required".to_string())
            })?,
        };
        if !urls.contains_key(&default_chain_id) {
            return Err(ConnectorError::InvalidConfig(format!(
                "no RPC URL for default chain {}",
                default_chain_id
            )));
        }

        let http_client = reqwest::Client::new();
        let providers: BTreeMap<_, _> = urls
            .into_iter()
            .map(|(chain_id, url)| {
                (
                    chain_id,
                    Arc::new(HttpProvider::with_client(http_client.clone(), url)),
                )
            })
            .collect();

        Ok(Self {
            supported: providers.keys().copied().collect(),
            providers,
            current_chain_id: AtomicU64::new(default_chain_id),
            events: ConnectorEvents::new(),
        })
    }

    /// Create a connector from network descriptions, using each one's first RPC URL.
    pub fn from_networks(networks: &[Network], default_chain_id: Option<ChainId>) -> ConnectorResult<Self> {
        let mut urls = BTreeMap::new();
        for network in networks {
            let raw = network.primary_rpc_url().ok_or_else(|| {
                ConnectorError::InvalidConfig(format!("chain {} has no RPC URL", network.chain_id))
            })?;
            let url = Url::parse(raw).map_err(|e| {
                ConnectorError::InvalidConfig(format!(
                    "invalid RPC URL for chain {}: {}",
                    network.chain_id, e
                ))
            })?;
            urls.insert(network.chain_id, url);
        }

        let default_chain_id = default_chain_id.or_else(|| networks.first().map(|n| n.chain_id));
        Self::new(urls, default_chain_id)
    }

    pub fn current_chain_id(&self) -> ChainId {
        self.current_chain_id.load(Ordering::SeqCst)
    }

    fn provider_for(&self, chain_id: ChainId) -> ConnectorResult<ProviderHandle> {
        ensure_supported_chain(self.supported_chain_ids(), chain_id)?;
        let provider = self
            .providers
            .get(&chain_id)
            .cloned()
            .ok_or(ConnectorError::NetworkNotFound(chain_id))?;
        Ok(provider)
    }
}

#[async_trait]
impl Connector for NetworkConnector {
    fn name(&self) -> &str {
        "network"
    }

    fn supported_chain_ids(&self) -> Option<&[ChainId]> {
        Some(&self.supported)
    }

    fn events(&self) -> &ConnectorEvents {
        &self.events
    }

    async fn activate(&self) -> ConnectorResult<ConnectorUpdate> {
        let chain_id = self.current_chain_id();
        Ok(ConnectorUpdate::new()
            .with_chain_id(chain_id)
            .with_provider(self.provider_for(chain_id)?)
            .with_no_account())
    }

    async fn get_provider(&self, chain_id: ChainId) -> ConnectorResult<ProviderHandle> {
        let provider = self.provider_for(chain_id)?;

        let previous = self.current_chain_id.swap(chain_id, Ordering::SeqCst);
        if previous != chain_id {
            debug!(from = previous, to = chain_id, "Switched RPC endpoint");
            self.events.emit_update(
                ConnectorUpdate::new()
                    .with_chain_id(chain_id)
                    .with_provider(provider.clone()),
            );
        }

        Ok(provider)
    }

    async fn get_account(&self) -> ConnectorResult<Option<String>> {
        Ok(None)
    }

    async fn get_chain_id(&self) -> ConnectorResult<RawChainId> {
        Ok(RawChainId::Integer(self.current_chain_id()))
    }

    async fn deactivate(&self) -> ConnectorResult<()> {
        Ok(())
    }
}
