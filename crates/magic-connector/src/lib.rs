//! Hosted email-link signer connector.
//!
//! The signer SDK is consumed through the [`MagicSdk`] factory and the
//! [`MagicInstance`] handles it creates, one per configured network. Login
//! failures reported by the SDK as JSON-RPC codes are mapped onto the typed
//! [`ConnectorError`](connector_core::ConnectorError) variants.

mod connector;
mod networks;
mod sdk;

pub use connector::{MagicConnector, MagicConnectorArgs};
pub use networks::MagicNetwork;
pub use sdk::{
    map_login_error, MagicInstance, MagicSdk, FAILED_VERIFICATION_CODE, INTERNAL_ERROR_CODE,
    LINK_EXPIRED_CODE, RATE_LIMITED_CODE,
};
