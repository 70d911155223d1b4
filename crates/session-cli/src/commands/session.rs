use crate::output::{describe_error, print_snapshot, OutputFormat};
use anyhow::{bail, Result};
use connector_core::ChainId;
use network_connector::NetworkConnector;
use session_config_and_utils::Config;
use session_manager::{ActivateOptions, SessionManager};
use std::sync::Arc;
use tracing::{debug, info};

/// Activate a read-only session over the configured RPC endpoints.
async fn start(config: &Config, chain_id: Option<ChainId>) -> Result<SessionManager> {
    let connector = NetworkConnector::new(config.rpc_urls()?, chain_id)?;
    let manager = SessionManager::new();

    manager
        .activate(Arc::new(connector), ActivateOptions::new().throw_errors())
        .await?;
    debug!(chain_id = ?manager.snapshot().chain_id, "Session started");

    Ok(manager)
}

/// Activate, print the session, and tear it down.
pub async fn status(config: &Config, chain_id: Option<ChainId>, format: &OutputFormat) -> Result<()> {
    let manager = start(config, chain_id).await?;
    print_snapshot(&manager.snapshot(), format)?;
    manager.deactivate().await?;
    Ok(())
}

/// Activate, switch to `chain_id`, and print the session.
pub async fn switch(config: &Config, chain_id: &str, format: &OutputFormat) -> Result<()> {
    let manager = start(config, None).await?;

    if manager.get_provider(chain_id).await?.is_none() {
        let snapshot = manager.snapshot();
        manager.deactivate().await?;
        match &snapshot.error {
            Some(error) => bail!(describe_error(error)),
            None => bail!("the session changed while switching chains"),
        }
    }

    let snapshot = manager.snapshot();
    info!(chain_id = ?snapshot.chain_id, "Switched chain");
    print_snapshot(&snapshot, format)?;
    manager.deactivate().await?;
    Ok(())
}
