//! Configuration management for session tools.

use crate::{CoreError, CoreResult, Paths};
use connector_core::{ChainId, Network};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const ENV_LOG_LEVEL: &str = "WEB3_SESSION_LOG_LEVEL";
const ENV_NETWORK: &str = "WEB3_SESSION_NETWORK";
const ENV_INFURA_API_KEY: &str = "WEB3_SESSION_INFURA_API_KEY";
const ENV_MATIC_VIGIL_API_KEY: &str = "WEB3_SESSION_MATIC_VIGIL_API_KEY";
const ENV_MAGIC_API_KEY: &str = "WEB3_SESSION_MAGIC_API_KEY";

/// Which preset network pair to use when no networks are configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    /// Ethereum mainnet and Polygon
    Mainnet,
    /// Goerli and Mumbai
    #[default]
    Testnet,
}

impl FromStr for NetworkMode {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(NetworkMode::Mainnet),
            "testnet" => Ok(NetworkMode::Testnet),
            other => Err(CoreError::Config(format!(
                "unknown network mode '{}', expected mainnet or testnet",
                other
            ))),
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkMode::Mainnet => f.write_str("mainnet"),
            NetworkMode::Testnet => f.write_str("testnet"),
        }
    }
}

/// Hosted signer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicConfig {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Session tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Preset networks used when `networks` is empty.
    #[serde(default)]
    pub network: NetworkMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infura_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matic_vigil_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magic: Option<MagicConfig>,
    /// Explicit networks; overrides the presets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<Network>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            network: NetworkMode::default(),
            infura_api_key: None,
            matic_vigil_api_key: None,
            magic: None,
            networks: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            debug!(path = %config_path.display(), "Loading config file");
            Self::load_from_file(&config_path)?
        } else {
            debug!(path = %config_path.display(), "No config file, using defaults");
            Self::default()
        };

        config.load_from_env()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) -> CoreResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides looked up by environment variable name. Blank values
    /// are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Values may be API keys; only the variable name is logged.
        let get = |name: &str| {
            let value = lookup(name).and_then(non_empty);
            if value.is_some() {
                debug!(variable = name, "Applying environment override");
            }
            value
        };

        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(mode) = get(ENV_NETWORK) {
            self.network = mode.parse()?;
        }
        if let Some(key) = get(ENV_INFURA_API_KEY) {
            self.infura_api_key = Some(key);
        }
        if let Some(key) = get(ENV_MATIC_VIGIL_API_KEY) {
            self.matic_vigil_api_key = Some(key);
        }
        if let Some(api_key) = get(ENV_MAGIC_API_KEY) {
            let endpoint = self.magic.take().and_then(|m| m.endpoint);
            self.magic = Some(MagicConfig { api_key, endpoint });
        }
        Ok(())
    }

    /// Networks to serve: the explicit list, or the presets for `network`.
    pub fn resolved_networks(&self) -> Vec<Network> {
        if !self.networks.is_empty() {
            return self.networks.clone();
        }

        if self.infura_api_key.is_none() || self.matic_vigil_api_key.is_none() {
            warn!(
                network = %self.network,
                "Preset networks without an Infura or MaticVigil API key"
            );
        }
        let infura = self.infura_api_key.as_deref().unwrap_or_default();
        let matic_vigil = self.matic_vigil_api_key.as_deref().unwrap_or_default();
        match self.network {
            NetworkMode::Mainnet => vec![
                Network::new(1, format!("https://mainnet.infura.io/v3/{}", infura))
                    .with_explorer("https://etherscan.io"),
                Network::new(
                    137,
                    format!("https://rpc-mainnet.maticvigil.com/v1/{}", matic_vigil),
                )
                .with_explorer("https://explorer-mainnet.maticvigil.com"),
            ],
            NetworkMode::Testnet => vec![
                Network::new(5, format!("https://goerli.infura.io/v3/{}", infura))
                    .with_explorer("https://goerli.etherscan.io"),
                Network::new(
                    80001,
                    format!("https://rpc-mumbai.maticvigil.com/v1/{}", matic_vigil),
                )
                .with_explorer("https://explorer-mumbai.maticvigil.com"),
            ],
        }
    }

    /// Parsed primary RPC URL of each resolved network.
    pub fn rpc_urls(&self) -> CoreResult<BTreeMap<ChainId, Url>> {
        self.resolved_networks()
            .iter()
            .map(|network| -> CoreResult<(ChainId, Url)> {
                let raw = network.primary_rpc_url().ok_or_else(|| {
                    CoreError::Config(format!("chain {} has no RPC URL", network.chain_id))
                })?;
                Ok((network.chain_id, Url::parse(raw)?))
            })
            .collect()
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
