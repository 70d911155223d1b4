//! Behavioural tests for the session manager.
//!
//! - `activation.rs`     - activate: augmentation, error routing, replacement
//! - `staleness.rs`      - generation guard across overlapping operations
//! - `reconciliation.rs` - Update/Error events on healthy and errored sessions
//! - `deactivation.rs`   - explicit deactivate and Deactivate events
//! - `provider.rs`       - provider cache and chain switching

pub(crate) mod harness;

mod deactivation;
mod provider;

use crate::{ActivateOptions, SessionManager, SessionPhase};
use chain_normalizers::normalize_account;
use connector_core::ConnectorUpdate;
use harness::{dyn_connector, raw_account, settle, MockConnector};

/// Activate, receive an account switch, deactivate.
#[tokio::test]
async fn test_basic_workflow() {
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
    assert_eq!(manager.phase(), SessionPhase::Active);

    connector.emit_update(ConnectorUpdate::new().with_account(raw_account(2)));
    settle().await;
    assert_eq!(
        manager.snapshot().account(),
        Some(&normalize_account(&raw_account(2)).unwrap())
    );

    manager.deactivate().await.unwrap();
    assert_eq!(manager.phase(), SessionPhase::Empty);
    assert!(!manager.is_active());
    assert_eq!(MockConnector::count(&connector.deactivate_calls), 1);
}
