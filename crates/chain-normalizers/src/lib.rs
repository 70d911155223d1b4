//! Canonical forms for values crossing the session boundary.
//!
//! Wallets report chain identifiers in several shapes (`1`, `"1"`, `"0x1"`,
//! and on some mobile builds `"Ox1"`) and accounts in arbitrary letter case.
//! Everything entering the session is funneled through these functions so
//! comparisons and display are stable.
//!
//! ```rust
//! use chain_normalizers::{normalize_account, normalize_chain_id};
//!
//! assert_eq!(normalize_chain_id("0x89").unwrap(), 137);
//! assert_eq!(
//!     normalize_account("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap().as_str(),
//!     "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
//! );
//! ```

mod account;
mod chain_id;
mod error;

pub use account::{normalize_account, Account};
pub use chain_id::{normalize_chain_id, ChainId, RawChainId};
pub use error::{NormalizeError, NormalizeResult};
