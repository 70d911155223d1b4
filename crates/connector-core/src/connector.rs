//! The connector trait.

use crate::{ConnectorError, ConnectorEvents, ConnectorResult, ConnectorUpdate, ProviderHandle};
use async_trait::async_trait;
use chain_normalizers::{ChainId, RawChainId};

/// One authentication backend.
///
/// All calls may suspend and may fail. Values returned here are raw; the
/// session manager normalizes them. Implementations must stay usable behind
/// `Arc<dyn Connector>`.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Chains this connector accepts, fixed at construction. `None` accepts any.
    fn supported_chain_ids(&self) -> Option<&[ChainId]>;

    /// Event hub for Update/Error/Deactivate notifications.
    fn events(&self) -> &ConnectorEvents;

    /// Authenticate with the backend. Fields left unset in the returned
    /// update are resolved through the getters below.
    async fn activate(&self) -> ConnectorResult<ConnectorUpdate>;

    /// Provider bound to `chain_id`. Fails with `UnsupportedChainId` when the
    /// chain is outside `supported_chain_ids`.
    async fn get_provider(&self, chain_id: ChainId) -> ConnectorResult<ProviderHandle>;

    /// Current account, or `None` when the backend exposes no account.
    async fn get_account(&self) -> ConnectorResult<Option<String>>;

    /// Current chain id as reported by the backend.
    async fn get_chain_id(&self) -> ConnectorResult<RawChainId>;

    /// Release backend resources. Calling it twice is not an error.
    async fn deactivate(&self) -> ConnectorResult<()>;
}

/// Reject `chain_id` when `supported` is set and does not contain it.
pub fn ensure_supported_chain(
    supported: Option<&[ChainId]>,
    chain_id: ChainId,
) -> ConnectorResult<()> {
    match supported {
        Some(ids) if !ids.contains(&chain_id) => Err(ConnectorError::UnsupportedChainId {
            chain_id,
            supported: ids.to_vec(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_supported_chain() {
        assert!(ensure_supported_chain(None, 137).is_ok());
        assert!(ensure_supported_chain(Some(&[1, 5]), 5).is_ok());

        let err = ensure_supported_chain(Some(&[1, 5]), 137).unwrap_err();
        assert_eq!(
            err,
            ConnectorError::UnsupportedChainId {
                chain_id: 137,
                supported: vec![1, 5],
            }
        );
    }

    #[test]
    fn test_empty_supported_set_rejects_everything() {
        assert!(ensure_supported_chain(Some(&[]), 1).is_err());
    }
}
