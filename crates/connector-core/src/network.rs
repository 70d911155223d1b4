//! Network descriptions shared by connector implementations.

use chain_normalizers::ChainId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A chain reachable over JSON-RPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub chain_id: ChainId,
    pub rpc_url: Vec<String>,
    #[serde(default)]
    pub explorer_url: Vec<String>,
}

impl Network {
    pub fn new(chain_id: ChainId, rpc_url: impl Into<String>) -> Self {
        Self {
            chain_id,
            rpc_url: vec![rpc_url.into()],
            explorer_url: Vec::new(),
        }
    }

    pub fn with_explorer(mut self, url: impl Into<String>) -> Self {
        self.explorer_url.push(url.into());
        self
    }

    /// First RPC URL, if any.
    pub fn primary_rpc_url(&self) -> Option<&str> {
        self.rpc_url.first().map(String::as_str)
    }
}

/// Native currency of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl NativeCurrency {
    pub fn ether() -> Self {
        Self {
            name: "Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }

    pub fn matic() -> Self {
        Self {
            name: "Matic".to_string(),
            symbol: "MATIC".to_string(),
            decimals: 18,
        }
    }
}

/// A network with enough metadata for a wallet to add it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkWithInfo {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub block_explorer_urls: Vec<String>,
}

impl NetworkWithInfo {
    /// Parameters for `wallet_addEthereumChain` (EIP-3085).
    ///
    /// The chain id is sent as a `0x`-prefixed hex string.
    pub fn to_add_chain_params(&self) -> Value {
        json!({
            "chainId": format!("{:#x}", self.chain_id),
            "chainName": self.chain_name,
            "nativeCurrency": self.native_currency,
            "rpcUrls": self.rpc_urls,
            "blockExplorerUrls": self.block_explorer_urls,
        })
    }

    /// Drop the wallet metadata.
    pub fn to_network(&self) -> Network {
        Network {
            chain_id: self.chain_id,
            rpc_url: self.rpc_urls.clone(),
            explorer_url: self.block_explorer_urls.clone(),
        }
    }
}
