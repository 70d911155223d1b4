//! Test harness for session manager tests.
//!
//! Provides:
//! - MockConnector: a scriptable connector with call counters and
//!   `Notify` gates that hold `activate()`/`get_account()` until released
//! - StubProvider: a provider that answers `eth_chainId`
//! - helpers for accounts and for waiting on published snapshots

use crate::{SessionManager, SessionSnapshot};
use async_trait::async_trait;
use chain_normalizers::{normalize_account, Account, ChainId, RawChainId};
use connector_core::{
    Connector, ConnectorError, ConnectorEvents, ConnectorResult, ConnectorUpdate, Provider,
    ProviderHandle,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::timeout;

/// Lowercase, unchecksummed account string for `n`.
pub fn raw_account(n: u8) -> String {
    format!("0x{:040x}", n)
}

/// Canonical account for `n`.
pub fn account(n: u8) -> Account {
    normalize_account(&raw_account(n)).unwrap()
}

/// Provider that reports a fixed chain.
pub struct StubProvider {
    pub chain_id: ChainId,
}

#[async_trait]
impl Provider for StubProvider {
    async fn request(&self, method: &str, _params: Value) -> ConnectorResult<Value> {
        match method {
            "eth_chainId" => Ok(json!(format!("{:#x}", self.chain_id))),
            other => Err(ConnectorError::rpc(-32601, format!("method {} not found", other))),
        }
    }
}

pub fn stub_provider() -> ProviderHandle {
    Arc::new(StubProvider { chain_id: 1 })
}

/// A gate that holds a call until released.
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until the gated call has started.
    pub async fn entered(&self) {
        timeout(Duration::from_secs(5), self.entered.notified())
            .await
            .expect("gated call never started");
    }

    /// Let the gated call finish.
    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

/// Scriptable connector.
pub struct MockConnector {
    name: String,
    supported: Option<Vec<ChainId>>,
    events: ConnectorEvents,
    activate_result: Mutex<ConnectorResult<ConnectorUpdate>>,
    account: Mutex<ConnectorResult<Option<String>>>,
    chain_id: Mutex<ConnectorResult<RawChainId>>,
    provider_error: Mutex<Option<ConnectorError>>,
    deactivate_error: Mutex<Option<ConnectorError>>,
    activate_gate: Option<Arc<Gate>>,
    account_gate: Mutex<Option<Arc<Gate>>>,
    deactivate_gate: Mutex<Option<Arc<Gate>>>,
    pub activate_calls: AtomicUsize,
    pub get_account_calls: AtomicUsize,
    pub get_chain_id_calls: AtomicUsize,
    pub get_provider_calls: AtomicUsize,
    pub deactivate_calls: AtomicUsize,
}

impl MockConnector {
    pub fn builder() -> MockConnectorBuilder {
        MockConnectorBuilder::default()
    }

    pub fn activate_gate(&self) -> Arc<Gate> {
        self.activate_gate.clone().expect("activation is not gated")
    }

    /// Hold subsequent `get_account()` calls until the returned gate opens.
    pub fn gate_account(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.account_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Hold the next `deactivate()` call until the returned gate opens.
    pub fn gate_deactivate(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.deactivate_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn set_account(&self, account: ConnectorResult<Option<String>>) {
        *self.account.lock().unwrap() = account;
    }

    pub fn set_provider_error(&self, error: Option<ConnectorError>) {
        *self.provider_error.lock().unwrap() = error;
    }

    pub fn set_deactivate_error(&self, error: Option<ConnectorError>) {
        *self.deactivate_error.lock().unwrap() = error;
    }

    pub fn emit_update(&self, update: ConnectorUpdate) {
        self.events.emit_update(update);
    }

    pub fn emit_error(&self, error: ConnectorError) {
        self.events.emit_error(error);
    }

    pub fn emit_deactivate(&self) {
        self.events.emit_deactivate();
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.subscriber_count()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_chain_ids(&self) -> Option<&[ChainId]> {
        self.supported.as_deref()
    }

    fn events(&self) -> &ConnectorEvents {
        &self.events
    }

    async fn activate(&self) -> ConnectorResult<ConnectorUpdate> {
        self.activate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.activate_gate {
            gate.pass().await;
        }
        self.activate_result.lock().unwrap().clone()
    }

    async fn get_provider(&self, chain_id: ChainId) -> ConnectorResult<ProviderHandle> {
        self.get_provider_calls.fetch_add(1, Ordering::SeqCst);
        connector_core::ensure_supported_chain(self.supported_chain_ids(), chain_id)?;
        if let Some(error) = self.provider_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(Arc::new(StubProvider { chain_id }))
    }

    async fn get_account(&self) -> ConnectorResult<Option<String>> {
        self.get_account_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.account_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        self.account.lock().unwrap().clone()
    }

    async fn get_chain_id(&self) -> ConnectorResult<RawChainId> {
        self.get_chain_id_calls.fetch_add(1, Ordering::SeqCst);
        self.chain_id.lock().unwrap().clone()
    }

    async fn deactivate(&self) -> ConnectorResult<()> {
        self.deactivate_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.deactivate_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        match self.deactivate_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

pub struct MockConnectorBuilder {
    name: String,
    supported: Option<Vec<ChainId>>,
    activate_result: ConnectorResult<ConnectorUpdate>,
    account: ConnectorResult<Option<String>>,
    chain_id: ConnectorResult<RawChainId>,
    gated: bool,
}

impl Default for MockConnectorBuilder {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            supported: None,
            activate_result: Ok(ConnectorUpdate::new()),
            account: Ok(Some(raw_account(1))),
            chain_id: Ok(RawChainId::Integer(1)),
            gated: false,
        }
    }
}

impl MockConnectorBuilder {
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn supported(mut self, chain_ids: &[ChainId]) -> Self {
        self.supported = Some(chain_ids.to_vec());
        self
    }

    /// What `activate()` returns.
    pub fn activates_with(mut self, update: ConnectorUpdate) -> Self {
        self.activate_result = Ok(update);
        self
    }

    pub fn activation_fails(mut self, error: ConnectorError) -> Self {
        self.activate_result = Err(error);
        self
    }

    /// What `get_account()` returns.
    pub fn account(mut self, account: Option<String>) -> Self {
        self.account = Ok(account);
        self
    }

    /// What `get_chain_id()` returns.
    pub fn chain_id(mut self, chain_id: impl Into<RawChainId>) -> Self {
        self.chain_id = Ok(chain_id.into());
        self
    }

    /// Hold `activate()` until `activate_gate().release()`.
    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    pub fn build(self) -> Arc<MockConnector> {
        Arc::new(MockConnector {
            name: self.name,
            supported: self.supported,
            events: ConnectorEvents::new(),
            activate_result: Mutex::new(self.activate_result),
            account: Mutex::new(self.account),
            chain_id: Mutex::new(self.chain_id),
            provider_error: Mutex::new(None),
            deactivate_error: Mutex::new(None),
            activate_gate: self.gated.then(|| Arc::new(Gate::default())),
            account_gate: Mutex::new(None),
            deactivate_gate: Mutex::new(None),
            activate_calls: AtomicUsize::new(0),
            get_account_calls: AtomicUsize::new(0),
            get_chain_id_calls: AtomicUsize::new(0),
            get_provider_calls: AtomicUsize::new(0),
            deactivate_calls: AtomicUsize::new(0),
        })
    }
}

/// Upcast for `SessionManager::activate`.
pub fn dyn_connector(connector: &Arc<MockConnector>) -> Arc<dyn Connector> {
    connector.clone()
}

/// Wait until a published snapshot satisfies `predicate`.
pub async fn wait_for<F>(manager: &SessionManager, predicate: F) -> SessionSnapshot
where
    F: FnMut(&SessionSnapshot) -> bool,
{
    let mut receiver = manager.subscribe();
    let snapshot = timeout(Duration::from_secs(5), receiver.wait_for(predicate))
        .await
        .expect("timed out waiting for session snapshot")
        .expect("session manager dropped");
    snapshot.clone()
}

/// Let spawned event pumps drain what is queued.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Collects errors handed to an error handler.
#[derive(Clone, Default)]
pub struct ErrorSink {
    errors: Arc<Mutex<Vec<crate::SessionError>>>,
}

impl ErrorSink {
    pub fn handler(&self) -> impl Fn(crate::SessionError) + Send + Sync + 'static {
        let errors = self.errors.clone();
        move |error| errors.lock().unwrap().push(error)
    }

    pub fn errors(&self) -> Vec<crate::SessionError> {
        self.errors.lock().unwrap().clone()
    }
}
