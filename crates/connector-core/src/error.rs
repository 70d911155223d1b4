//! Connector error types.

use chain_normalizers::{ChainId, NormalizeError};
use thiserror::Error;

/// EIP-1193 code for a request the user declined in their wallet.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Connector error type.
///
/// Errors raised by a backend are carried through the session untouched, so
/// every variant is cheap to clone and compare.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectorError {
    /// Chain id outside the connector's declared set
    #[error("Unsupported chain id: {chain_id}. Supported chain ids are: {}.", format_chain_ids(.supported))]
    UnsupportedChainId {
        chain_id: ChainId,
        supported: Vec<ChainId>,
    },

    /// The user declined the request in their wallet
    #[error("The user rejected the request.")]
    UserRejected,

    /// No injected provider is available
    #[error("No injected Ethereum provider was found.")]
    NoEthereumProvider,

    /// Chain id has no network description
    #[error("Network with chainId {0} not found. Pass the network to the connector constructor.")]
    NetworkNotFound(ChainId),

    /// Operation requires a prior successful activation
    #[error("Connector not activated: {0}")]
    NotActivated(String),

    /// Hosted signer could not verify the email link
    #[error("The email verification failed.")]
    FailedVerification,

    /// Hosted signer login link expired
    #[error("The Magic link has expired.")]
    MagicLinkExpired,

    /// Hosted signer rate limit reached
    #[error("The Magic rate limit has been reached.")]
    MagicLinkRateLimited,

    /// Connector was constructed or configured incorrectly
    #[error("Invalid connector configuration: {0}")]
    InvalidConfig(String),

    /// JSON-RPC error object returned by a provider
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Transport failure talking to a provider
    #[error("HTTP error: {0}")]
    Http(String),

    /// Malformed chain id or account reported by a backend
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// Any other backend failure, surfaced verbatim
    #[error("{0}")]
    Backend(String),
}

impl ConnectorError {
    /// Build an RPC error from a code and message.
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        ConnectorError::Rpc {
            code,
            message: message.into(),
        }
    }

    /// Returns true if the user declined the request.
    pub fn is_user_rejection(&self) -> bool {
        match self {
            ConnectorError::UserRejected => true,
            ConnectorError::Rpc { code, .. } => *code == USER_REJECTED_CODE,
            _ => false,
        }
    }

    /// Returns true if the error is an unsupported chain rejection.
    pub fn is_unsupported_chain(&self) -> bool {
        matches!(self, ConnectorError::UnsupportedChainId { .. })
    }
}

fn format_chain_ids(chain_ids: &[ChainId]) -> String {
    chain_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Result type alias using ConnectorError.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
