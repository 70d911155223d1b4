use connector_core::ChainId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Networks the signer can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagicNetwork {
    Mainnet,
    Ropsten,
    Rinkeby,
    Goerli,
    Kovan,
    Matic,
    Mumbai,
}

impl MagicNetwork {
    pub const ALL: [MagicNetwork; 7] = [
        MagicNetwork::Mainnet,
        MagicNetwork::Ropsten,
        MagicNetwork::Rinkeby,
        MagicNetwork::Goerli,
        MagicNetwork::Kovan,
        MagicNetwork::Matic,
        MagicNetwork::Mumbai,
    ];

    pub fn from_chain_id(chain_id: ChainId) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.chain_id() == chain_id)
    }

    pub fn chain_id(&self) -> ChainId {
        match self {
            MagicNetwork::Mainnet => 1,
            MagicNetwork::Ropsten => 3,
            MagicNetwork::Rinkeby => 4,
            MagicNetwork::Goerli => 5,
            MagicNetwork::Kovan => 42,
            MagicNetwork::Matic => 137,
            MagicNetwork::Mumbai => 80001,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MagicNetwork::Mainnet => "mainnet",
            MagicNetwork::Ropsten => "ropsten",
            MagicNetwork::Rinkeby => "rinkeby",
            MagicNetwork::Goerli => "goerli",
            MagicNetwork::Kovan => "kovan",
            MagicNetwork::Matic => "matic",
            MagicNetwork::Mumbai => "mumbai",
        }
    }
}

impl fmt::Display for MagicNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
