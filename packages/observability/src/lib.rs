//! # Observability
//!
//! Centralized logging setup for the web3 session workspace.
//!
//! Binaries call `observability::init()` once at startup and use standard
//! `tracing` macros everywhere else. Library crates never install a
//! subscriber themselves.
//!
//! ## Output
//!
//! Without a log file, events go to stderr through a compact `fmt` layer.
//! With [`LogConfig::log_path`] set, every event is written as one JSON line
//! to that file (append-only, flushed per line) and optionally mirrored to
//! stderr. Session identity fields are grouped under `session`:
//!
//! - `tail -f ~/.web3-session/logs/session.jsonl | jq` for pretty JSON
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init("web3-session");
//!     tracing::info!("ready");
//! }
//! ```
//!
//! Or with configuration:
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "web3-session".into(),
//!     default_level: "debug".into(),
//!     log_path: Some("/tmp/session.jsonl".into()),
//!     also_stderr: true,
//! });
//! ```

mod file;
mod json_layer;

pub use file::CentralLogWriter;
pub use json_layer::{JsonLayer, LogRecord, SESSION_KEYS};

use std::path::PathBuf;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every JSON log line.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// JSONL log file. `None` logs to stderr only.
    pub log_path: Option<PathBuf>,

    /// Mirror file output to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize logging with default settings.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// Does nothing if a global subscriber is already installed. Falls back to
/// stderr when the log file cannot be opened.
pub fn init_with_config(config: LogConfig) {
    if let Some(log_path) = &config.log_path {
        match file::init_file_subscriber(&config, log_path) {
            Ok(()) => return,
            Err(e) => eprintln!(
                "failed to open log file {}: {}; logging to stderr",
                log_path.display(),
                e
            ),
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.default_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .finish()
        .try_init();
}

/// `RUST_LOG` if set, else `default_level`.
pub(crate) fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Re-export tracing macros for convenience.
/// Services can use `observability::info!()` or `tracing::info!()`.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
