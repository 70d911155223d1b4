//! Normalization error types.

use thiserror::Error;

/// Raised when a chain id or account cannot be brought into canonical form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// Chain id is not a non-negative integer in decimal or hex form
    #[error("chainId {0} is not an integer")]
    InvalidChainId(String),

    /// Account is not a 20-byte hex address, or carries a bad checksum
    #[error("Invalid account: {0}")]
    InvalidAccount(String),
}

/// Result type alias using NormalizeError.
pub type NormalizeResult<T> = Result<T, NormalizeError>;
