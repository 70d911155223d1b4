//! Read-only connector backed by plain JSON-RPC endpoints.
//!
//! There is no wallet behind this connector, so it never exposes an account.
//! It is useful for rendering chain data before the user connects anything.

mod connector;
mod http;

pub use connector::NetworkConnector;
pub use http::HttpProvider;
