//! JSON-RPC 2.0 over HTTP.

use async_trait::async_trait;
use connector_core::{ConnectorError, ConnectorResult, Provider};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Provider that POSTs each request to a single RPC URL.
pub struct HttpProvider {
    http_client: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
}

impl HttpProvider {
    pub fn new(url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Share a client between providers.
    pub fn with_client(http_client: reqwest::Client, url: Url) -> Self {
        Self {
            http_client,
            url,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpProvider")
            .field("host", &self.url.host_str())
            .finish()
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> ConnectorResult<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        tracing::debug!(method, id = request.id, "Sending JSON-RPC request");

        let response = self
            .http_client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| ConnectorError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            tracing::warn!(method, status, "JSON-RPC endpoint returned an error status");
            return Err(ConnectorError::Http(format!(
                "endpoint responded with status {}",
                status
            )));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ConnectorError::Http(format!("invalid JSON-RPC response: {}", e)))?;

        if let Some(error) = body.error {
            return Err(ConnectorError::rpc(error.code, error.message));
        }
        Ok(body.result.unwrap_or(Value::Null))
    }
}
