//! Session error types.

use chain_normalizers::NormalizeError;
use connector_core::ConnectorError;
use thiserror::Error;

/// Session error type.
///
/// Stored in the session record and handed to error handlers, so it must
/// stay cheap to clone.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Operation needs an attached connector
    #[error("No active session: call activate first")]
    NoActiveSession,

    /// Error raised by the connector, surfaced verbatim
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    /// Malformed chain id or account at the session boundary
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidTransition(String),

    /// Error reported by the application through `set_error`
    #[error("{0}")]
    Reported(String),
}

impl SessionError {
    /// Returns true if the error is an unsupported chain rejection.
    pub fn is_unsupported_chain(&self) -> bool {
        matches!(self, SessionError::Connector(e) if e.is_unsupported_chain())
    }

    /// Returns true if the user declined a wallet request.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, SessionError::Connector(e) if e.is_user_rejection())
    }
}

/// Result type alias using SessionError.
pub type SessionResult<T> = Result<T, SessionError>;
