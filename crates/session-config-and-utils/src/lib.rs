//! Configuration, paths and logging setup for web3 session tools.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, MagicConfig, NetworkMode, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_to_file};
pub use paths::Paths;
