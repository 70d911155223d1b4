//! web3-session - inspect wallet sessions from the command line.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use connector_core::ChainId;
use session_config_and_utils::Config;
use session_manager::SessionError;
use std::path::{Path, PathBuf};

/// web3-session - Normalize chain data and drive read-only wallet sessions.
#[derive(Parser)]
#[command(name = "web3-session")]
#[command(about = "Normalize chain data and drive read-only wallet sessions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Base directory holding config.json (defaults to ~/.web3-session)
    #[arg(long, env = "WEB3_SESSION_HOME", global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical form of a chain id
    NormalizeChain {
        /// Chain id as decimal or 0x-prefixed hex
        value: String,
    },

    /// Print the checksummed form of an account address
    NormalizeAccount {
        /// 0x-prefixed, 40 hex digit address
        value: String,
    },

    /// Open a read-only session and print it
    Status {
        /// Chain to start on (defaults to the first configured network)
        #[arg(long)]
        chain_id: Option<ChainId>,
    },

    /// Open a read-only session, switch to a chain and print it
    Switch {
        /// Chain id as decimal or 0x-prefixed hex
        chain_id: String,
    },

    /// List the configured networks
    Networks,
}

/// Load the configuration and start logging for session commands.
fn setup(base_dir: Option<&Path>, log_level: Option<&str>) -> anyhow::Result<Config> {
    let paths = commands::resolve_paths(base_dir)?;
    let config = commands::load_config(&paths)?;
    session_config_and_utils::init_logging(log_level.unwrap_or(&config.log_level));
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let base_dir = cli.base_dir.as_deref();
    let log_level = cli.log_level.as_deref();

    match cli.command {
        Commands::NormalizeChain { value } => commands::normalize_chain(&value, &cli.format),
        Commands::NormalizeAccount { value } => commands::normalize_account(&value, &cli.format),
        Commands::Status { chain_id } => {
            let config = setup(base_dir, log_level)?;
            commands::status(&config, chain_id, &cli.format).await
        }
        Commands::Switch { chain_id } => {
            let config = setup(base_dir, log_level)?;
            commands::switch(&config, &chain_id, &cli.format).await
        }
        Commands::Networks => {
            let config = setup(base_dir, log_level)?;
            commands::networks(&config, &cli.format)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = run(cli).await {
        let message = match e.downcast_ref::<SessionError>() {
            Some(error) => output::describe_error(error),
            None => e.to_string(),
        };
        output::print_error(&message, &format);
        std::process::exit(1);
    }
}
