//! Request-capable provider handles.

use crate::ConnectorResult;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// An EIP-1193 style provider: something that answers JSON-RPC requests for
/// one chain.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Send a JSON-RPC request and return its `result` value.
    async fn request(&self, method: &str, params: Value) -> ConnectorResult<Value>;
}

/// Shared, opaque provider handle returned by connectors.
pub type ProviderHandle = Arc<dyn Provider>;
