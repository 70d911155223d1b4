//! Connector capability contract.
//!
//! A connector is one backend able to authenticate a user and report the
//! account, chain and provider it is bound to (a browser-injected wallet, a
//! hosted email signer, a plain RPC endpoint). The session manager drives
//! connectors only through the [`Connector`] trait and listens to them only
//! through their [`ConnectorEvents`] hub.
//!
//! ## Crate Structure
//!
//! - [`connector`] - The `Connector` trait
//! - [`events`] - Update/Error/Deactivate events and the subscription hub
//! - [`provider`] - Request-capable provider handles
//! - [`network`] - Network descriptions shared by connector implementations
//! - [`update`] - Partial connector state reported by activation and events

pub mod connector;
mod error;
pub mod events;
pub mod network;
pub mod provider;
pub mod update;

pub use chain_normalizers::{normalize_account, normalize_chain_id, Account, ChainId, RawChainId};
pub use connector::{ensure_supported_chain, Connector};
pub use error::{ConnectorError, ConnectorResult, USER_REJECTED_CODE};
pub use events::{ConnectorEvent, ConnectorEvents, EventSubscription, SubscriptionId};
pub use network::{NativeCurrency, Network, NetworkWithInfo};
pub use provider::{Provider, ProviderHandle};
pub use update::ConnectorUpdate;
