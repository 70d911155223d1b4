//! Partial connector state.

use crate::ProviderHandle;
use chain_normalizers::RawChainId;
use std::fmt;

/// Partial state reported by `Connector::activate` or an Update event.
///
/// Every field is optional; absent fields are resolved by the session manager
/// or left untouched, depending on where the update came from. `account` is
/// doubly optional: `Some(None)` means the connector positively reports that
/// no account is available, which differs from not reporting an account.
/// Values are raw and get normalized at the session boundary.
#[derive(Clone, Default)]
pub struct ConnectorUpdate {
    pub account: Option<Option<String>>,
    pub chain_id: Option<RawChainId>,
    pub provider: Option<ProviderHandle>,
    pub auth_token: Option<String>,
}

impl ConnectorUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(Some(account.into()));
        self
    }

    /// Report that the connector is active but exposes no account.
    pub fn with_no_account(mut self) -> Self {
        self.account = Some(None);
        self
    }

    pub fn with_chain_id(mut self, chain_id: impl Into<RawChainId>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }

    pub fn with_provider(mut self, provider: ProviderHandle) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Returns true if no field is present.
    pub fn is_empty(&self) -> bool {
        self.account.is_none()
            && self.chain_id.is_none()
            && self.provider.is_none()
            && self.auth_token.is_none()
    }
}

impl fmt::Debug for ConnectorUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorUpdate")
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .field("provider", &self.provider.as_ref().map(|_| "<provider>"))
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
