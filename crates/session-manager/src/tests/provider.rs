use super::harness::{dyn_connector, ErrorSink, MockConnector};
use crate::{ActivateOptions, SessionError, SessionManager, SessionPhase, SessionResult};
use chain_normalizers::NormalizeError;
use connector_core::{ConnectorError, ProviderHandle};
use serde_json::json;
use std::sync::Arc;

fn provider_error(result: SessionResult<Option<ProviderHandle>>) -> SessionError {
    match result {
        Err(error) => error,
        Ok(_) => panic!("expected get_provider to fail"),
    }
}

async fn session(options: ActivateOptions) -> (SessionManager, Arc<MockConnector>) {
    let manager = SessionManager::new();
    let connector = MockConnector::builder().supported(&[1, 5]).build();
    manager
        .activate(dyn_connector(&connector), options)
        .await
        .unwrap();
    (manager, connector)
}

#[tokio::test]
async fn test_provider_cache_hit() {
    let (manager, connector) = session(ActivateOptions::new()).await;
    assert_eq!(MockConnector::count(&connector.get_provider_calls), 1);
    let generation = manager.generation();

    let provider = manager.get_provider(1u64).await.unwrap().unwrap();
    assert_eq!(
        provider.request("eth_chainId", json!([])).await.unwrap(),
        json!("0x1")
    );
    assert_eq!(MockConnector::count(&connector.get_provider_calls), 1);
    assert_eq!(manager.generation(), generation);
}

#[tokio::test]
async fn test_provider_for_other_chain_switches() {
    let (manager, connector) = session(ActivateOptions::new()).await;

    let provider = manager.get_provider("0x5").await.unwrap().unwrap();
    assert_eq!(
        provider.request("eth_chainId", json!([])).await.unwrap(),
        json!("0x5")
    );
    assert_eq!(MockConnector::count(&connector.get_provider_calls), 2);

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.chain_id, Some(5));
    assert!(snapshot.provider.is_some());
    assert!(snapshot.is_active());

    // Now cached for chain 5.
    manager.get_provider(5u64).await.unwrap();
    assert_eq!(MockConnector::count(&connector.get_provider_calls), 2);
}

#[tokio::test]
async fn test_unsupported_provider_chain_is_returned() {
    let (manager, connector) = session(ActivateOptions::new()).await;
    let generation = manager.generation();

    let err = provider_error(manager.get_provider(137u64).await);
    assert!(err.is_unsupported_chain());

    assert_eq!(MockConnector::count(&connector.get_provider_calls), 1);
    assert_eq!(manager.generation(), generation);
    assert!(manager.is_active());
}

#[tokio::test]
async fn test_malformed_provider_chain() {
    let (manager, _connector) = session(ActivateOptions::new()).await;
    assert_eq!(
        provider_error(manager.get_provider("mainnet").await),
        SessionError::Normalize(NormalizeError::InvalidChainId("mainnet".to_string()))
    );
}

#[tokio::test]
async fn test_provider_without_session() {
    let manager = SessionManager::new();
    assert_eq!(
        provider_error(manager.get_provider(1u64).await),
        SessionError::NoActiveSession
    );
}

#[tokio::test]
async fn test_provider_failure_is_stored() {
    let (manager, connector) = session(ActivateOptions::new()).await;
    connector.set_provider_error(Some(ConnectorError::UserRejected));

    assert!(manager.get_provider(5u64).await.unwrap().is_none());

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Errored);
    assert_eq!(
        snapshot.error,
        Some(SessionError::Connector(ConnectorError::UserRejected))
    );
}

#[tokio::test]
async fn test_provider_failure_goes_to_handler() {
    let sink = ErrorSink::default();
    let (manager, connector) = session(ActivateOptions::new().on_error(sink.handler())).await;
    connector.set_provider_error(Some(ConnectorError::UserRejected));

    assert!(manager.get_provider(5u64).await.unwrap().is_none());
    assert_eq!(
        sink.errors(),
        vec![SessionError::Connector(ConnectorError::UserRejected)]
    );
    assert!(manager.is_active());
    assert_eq!(manager.snapshot().chain_id, Some(1));
}
