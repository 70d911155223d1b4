//! CLI command implementations.

mod networks;
mod normalize;
mod session;

pub use networks::networks;
pub use normalize::{normalize_account, normalize_chain};
pub use session::{status, switch};

use anyhow::Result;
use session_config_and_utils::{Config, Paths};

/// Resolve paths, honoring an explicit base directory.
pub fn resolve_paths(base_dir: Option<&std::path::Path>) -> Result<Paths> {
    match base_dir {
        Some(dir) => Ok(Paths::with_base_dir(dir.to_path_buf())),
        None => Ok(Paths::new()?),
    }
}

/// Load the configuration under `paths`.
pub fn load_config(paths: &Paths) -> Result<Config> {
    Ok(Config::load(paths)?)
}
