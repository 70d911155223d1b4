use crate::output::{print_heading, print_json, print_row, OutputFormat};
use anyhow::Result;
use session_config_and_utils::Config;

/// Print the networks the configuration resolves to.
pub fn networks(config: &Config, format: &OutputFormat) -> Result<()> {
    let networks = config.resolved_networks();
    match format {
        OutputFormat::Json => print_json(&networks)?,
        OutputFormat::Text => {
            print_heading(&format!("Networks ({})", config.network));
            for network in &networks {
                print_row(
                    &network.chain_id.to_string(),
                    &network.rpc_url.join(", "),
                );
                for explorer in &network.explorer_url {
                    print_row("  explorer", explorer);
                }
            }
        }
    }
    Ok(())
}
