//! Connector for browser-injected EIP-1193 wallets.
//!
//! The wallet itself is consumed through [`InjectedProvider`]; this crate
//! only adapts it to the `Connector` contract: account/chain discovery with
//! fallbacks for older wallets, chain switching through
//! `wallet_addEthereumChain`, and forwarding of wallet events.

mod connector;
mod wallet;

pub use connector::InjectedConnector;
pub use wallet::{InjectedProvider, ProviderEvent, WalletProvider};
