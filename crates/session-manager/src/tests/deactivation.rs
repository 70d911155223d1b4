use super::harness::{dyn_connector, raw_account, settle, wait_for, MockConnector};
use crate::{ActivateOptions, SessionError, SessionManager, SessionPhase};
use connector_core::{ConnectorError, ConnectorUpdate};

#[tokio::test]
async fn test_deactivate_without_session_fails() {
    let manager = SessionManager::new();
    assert_eq!(
        manager.deactivate().await,
        Err(SessionError::NoActiveSession)
    );
    assert_eq!(manager.generation(), 0);
}

#[tokio::test]
async fn test_deactivate_active_session() {
    let manager = SessionManager::new();
    let connector = MockConnector::builder().build();
    manager
        .activate(dyn_connector(&connector), ActivateOptions::new())
        .await
        .unwrap();

    manager.deactivate().await.unwrap();

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Empty);
    assert!(snapshot.connector.is_none());
    assert!(snapshot.account.is_none());
    assert!(snapshot.chain_id.is_none());
    assert!(snapshot.provider.is_none());
    assert_eq!(connector.subscriber_count(), 0);
    assert_eq!(MockConnector::count(&connector.deactivate_calls), 1);
}

#[tokio::test]
async fn test_deactivate_errored_session() {
    let manager = SessionManager::new();
    let connector = MockConnector::builder()
        .supported(&[5])
        .chain_id(1u64)
        .build();
    manager
        .activate(dyn_connector(&connector), ActivateOptions::new())
        .await
        .unwrap();
    assert_eq!(manager.phase(), SessionPhase::Errored);

    manager.deactivate().await.unwrap();
    assert_eq!(manager.phase(), SessionPhase::Empty);
    assert!(manager.snapshot().error.is_none());
}

#[tokio::test]
async fn test_deactivate_clears_even_when_connector_fails() {
    let manager = SessionManager::new();
    let connector = MockConnector::builder().build();
    manager
        .activate(dyn_connector(&connector), ActivateOptions::new())
        .await
        .unwrap();
    connector.set_deactivate_error(Some(ConnectorError::Backend("busy".to_string())));

    let err = manager.deactivate().await.unwrap_err();
    assert_eq!(
        err,
        SessionError::Connector(ConnectorError::Backend("busy".to_string()))
    );
    assert_eq!(manager.phase(), SessionPhase::Empty);
}

#[tokio::test]
async fn test_deactivate_clears_connector_attached_meanwhile() {
    let manager = SessionManager::new();
    let first = MockConnector::builder().name("a").build();
    manager
        .activate(dyn_connector(&first), ActivateOptions::new())
        .await
        .unwrap();

    let second = MockConnector::builder()
        .name("b")
        .account(Some(raw_account(2)))
        .gated()
        .build();
    let activation = {
        let manager = manager.clone();
        let connector = dyn_connector(&second);
        tokio::spawn(async move { manager.activate(connector, ActivateOptions::new()).await })
    };
    second.activate_gate().entered().await;

    let gate = first.gate_deactivate();
    let deactivation = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.deactivate().await })
    };
    gate.entered().await;

    // "b" commits while "a" is still deactivating.
    second.activate_gate().release();
    assert_eq!(activation.await.unwrap(), Ok(None));
    assert_eq!(manager.snapshot().connector_name.as_deref(), Some("b"));

    gate.release();
    assert_eq!(deactivation.await.unwrap(), Ok(()));

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Empty);
    assert!(!snapshot.is_active());
    assert!(snapshot.connector.is_none());
    assert_eq!(second.subscriber_count(), 0);
    assert_eq!(MockConnector::count(&second.deactivate_calls), 1);
}

#[tokio::test]
async fn test_set_error_without_session_cannot_be_deactivated() {
    let manager = SessionManager::new();
    manager.set_error(SessionError::Reported("no wallet".to_string()));
    assert_eq!(manager.phase(), SessionPhase::Errored);
    assert_eq!(
        manager.deactivate().await,
        Err(SessionError::NoActiveSession)
    );
}

#[tokio::test]
async fn test_deactivate_event_clears_session() {
    let manager = SessionManager::new();
    let connector = MockConnector::builder()
        .supported(&[1, 5])
        .activates_with(
            ConnectorUpdate::new()
                .with_account(raw_account(1))
                .with_chain_id(1u64),
        )
        .build();
    manager
        .activate(dyn_connector(&connector), ActivateOptions::new())
        .await
        .unwrap();
    assert!(manager.is_active());

    connector.emit_deactivate();
    let snapshot = wait_for(&manager, |s| s.phase == SessionPhase::Empty).await;

    assert!(!snapshot.is_active());
    assert!(snapshot.connector.is_none());
    assert_eq!(MockConnector::count(&connector.deactivate_calls), 1);
    assert_eq!(connector.subscriber_count(), 0);
}

#[tokio::test]
async fn test_deactivate_event_while_errored() {
    let manager = SessionManager::new();
    let connector = MockConnector::builder().build();
    manager
        .activate(dyn_connector(&connector), ActivateOptions::new())
        .await
        .unwrap();
    connector.emit_error(ConnectorError::UserRejected);
    wait_for(&manager, |s| s.phase == SessionPhase::Errored).await;

    connector.emit_deactivate();
    wait_for(&manager, |s| s.phase == SessionPhase::Empty).await;
}

#[tokio::test]
async fn test_deactivate_event_clears_even_when_connector_fails() {
    let manager = SessionManager::new();
    let connector = MockConnector::builder().build();
    manager
        .activate(dyn_connector(&connector), ActivateOptions::new())
        .await
        .unwrap();
    connector.set_deactivate_error(Some(ConnectorError::Backend("gone".to_string())));

    connector.emit_deactivate();
    wait_for(&manager, |s| s.phase == SessionPhase::Empty).await;
}

#[tokio::test]
async fn test_events_after_deactivate_are_ignored() {
    let manager = SessionManager::new();
    let connector = MockConnector::builder().build();
    manager
        .activate(dyn_connector(&connector), ActivateOptions::new())
        .await
        .unwrap();
    manager.deactivate().await.unwrap();
    let generation = manager.generation();

    connector.emit_update(ConnectorUpdate::new().with_account(raw_account(2)));
    connector.emit_error(ConnectorError::UserRejected);
    connector.emit_deactivate();
    settle().await;

    assert_eq!(manager.phase(), SessionPhase::Empty);
    assert_eq!(manager.generation(), generation);
    assert_eq!(MockConnector::count(&connector.deactivate_calls), 1);
}
