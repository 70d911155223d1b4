//! Output formatting for the CLI.

use clap::ValueEnum;
use serde::Serialize;
use session_manager::{SessionError, SessionSnapshot};

/// Output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `value` as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({"status": "error", "message": message}));
        }
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", label), value);
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "-".repeat(50));
}

/// Print a heading.
pub fn print_heading(text: &str) {
    println!("\n{}", text);
    print_divider();
}

/// Print a session snapshot.
pub fn print_snapshot(snapshot: &SessionSnapshot, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(snapshot),
        OutputFormat::Text => {
            print_heading("Session");
            print_row("Connector", snapshot.connector_name.as_deref().unwrap_or("-"));
            print_row("Phase", &format!("{:?}", snapshot.phase).to_lowercase());
            print_row("Active", if snapshot.is_active() { "yes" } else { "no" });
            print_row(
                "Chain ID",
                &snapshot
                    .chain_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            );
            let account = match &snapshot.account {
                Some(Some(account)) => account.to_string(),
                Some(None) => "none (read only)".to_string(),
                None => "-".to_string(),
            };
            print_row("Account", &account);
            if let Some(error) = &snapshot.error {
                print_row("Error", &describe_error(error));
            }
            Ok(())
        }
    }
}

/// User-facing message for a session error.
pub fn describe_error(error: &SessionError) -> String {
    use connector_core::ConnectorError;

    if error.is_unsupported_chain() {
        return "You're connected to an unsupported network.".to_string();
    }
    if error.is_user_rejection() {
        return "Please authorize this application to access your Ethereum account.".to_string();
    }
    match error {
        SessionError::Connector(ConnectorError::NoEthereumProvider) => {
            "No Ethereum wallet detected. Install a browser wallet or use a dApp browser."
                .to_string()
        }
        SessionError::NoActiveSession => "No wallet is connected.".to_string(),
        other => format!("An unknown error occurred: {}", other),
    }
}
