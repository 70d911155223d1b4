//! Signer SDK interface.

use async_trait::async_trait;
use connector_core::{ConnectorError, ConnectorResult, Network, ProviderHandle};
use serde_json::Value;
use std::sync::Arc;

/// The login link could not be verified.
pub const FAILED_VERIFICATION_CODE: i64 = -10000;
/// The login link expired before it was used.
pub const LINK_EXPIRED_CODE: i64 = -10001;
/// Too many login links were requested.
pub const RATE_LIMITED_CODE: i64 = -10002;
/// JSON-RPC internal error; raised when the user closes the login window.
pub const INTERNAL_ERROR_CODE: i64 = -32603;

/// One SDK instance bound to a single network.
#[async_trait]
pub trait MagicInstance: Send + Sync {
    async fn is_logged_in(&self) -> ConnectorResult<bool>;

    /// Email of the logged-in user, if any.
    async fn email(&self) -> ConnectorResult<Option<String>>;

    async fn logout(&self) -> ConnectorResult<()>;

    /// Send a login link to `email` and wait for it to be used.
    ///
    /// SDK failures are reported as [`ConnectorError::Rpc`] with the SDK's code.
    async fn login_with_magic_link(&self, email: &str) -> ConnectorResult<()>;

    /// Returns the accounts of the logged-in user.
    async fn enable(&self) -> ConnectorResult<Vec<String>>;

    async fn request(&self, method: &str, params: Value) -> ConnectorResult<Value>;

    fn rpc_provider(&self) -> ProviderHandle;

    /// DID token proving the login.
    async fn id_token(&self) -> ConnectorResult<String>;
}

/// Factory for [`MagicInstance`]s.
pub trait MagicSdk: Send + Sync {
    fn create(&self, api_key: &str, network: &Network, endpoint: Option<&str>) -> Arc<dyn MagicInstance>;
}

/// Map an SDK login failure onto a typed connector error.
pub fn map_login_error(error: ConnectorError) -> ConnectorError {
    match error {
        ConnectorError::Rpc { code, message } => match code {
            FAILED_VERIFICATION_CODE => ConnectorError::FailedVerification,
            LINK_EXPIRED_CODE => ConnectorError::MagicLinkExpired,
            RATE_LIMITED_CODE => ConnectorError::MagicLinkRateLimited,
            INTERNAL_ERROR_CODE => ConnectorError::UserRejected,
            _ => ConnectorError::Rpc { code, message },
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_login_error() {
        assert_eq!(
            map_login_error(ConnectorError::rpc(-10000, "failed")),
            ConnectorError::FailedVerification
        );
        assert_eq!(
            map_login_error(ConnectorError::rpc(-10001, "expired")),
            ConnectorError::MagicLinkExpired
        );
        assert_eq!(
            map_login_error(ConnectorError::rpc(-10002, "slow down")),
            ConnectorError::MagicLinkRateLimited
        );
        assert_eq!(
            map_login_error(ConnectorError::rpc(-32603, "window closed")),
            ConnectorError::UserRejected
        );
    }

    #[test]
    fn test_unknown_login_errors_pass_through() {
        assert_eq!(
            map_login_error(ConnectorError::rpc(-32000, "other")),
            ConnectorError::rpc(-32000, "other")
        );
        assert_eq!(
            map_login_error(ConnectorError::Http("offline".to_string())),
            ConnectorError::Http("offline".to_string())
        );
    }
}
