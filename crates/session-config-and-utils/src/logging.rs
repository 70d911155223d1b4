//! Logging initialization for session tools.
//!
//! Thin wrappers over the observability crate so binaries share one service
//! name and log file location.

use crate::Paths;
use observability::LogConfig;

const SERVICE_NAME: &str = "web3-session";

/// Initialize stderr logging.
///
/// `level` is the default filter (trace, debug, info, warn, error);
/// `RUST_LOG` overrides it.
pub fn init_logging(level: &str) {
    observability::init_with_config(LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: level.into(),
        ..Default::default()
    });
}

/// Initialize JSONL logging to `~/.web3-session/logs/session.jsonl`,
/// mirrored to stderr.
pub fn init_logging_to_file(level: &str, paths: &Paths) {
    observability::init_with_config(LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: level.into(),
        log_path: Some(paths.log_file()),
        also_stderr: true,
    });
}
