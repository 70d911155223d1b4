use crate::output::{print_json, OutputFormat};
use anyhow::Result;
use chain_normalizers::RawChainId;

/// Print the canonical chain id for `value`.
pub fn normalize_chain(value: &str, format: &OutputFormat) -> Result<()> {
    let chain_id = chain_normalizers::normalize_chain_id(RawChainId::from(value))?;
    match format {
        OutputFormat::Text => println!("{}", chain_id),
        OutputFormat::Json => print_json(&serde_json::json!({ "chain_id": chain_id }))?,
    }
    Ok(())
}

/// Print the checksummed form of `value`.
pub fn normalize_account(value: &str, format: &OutputFormat) -> Result<()> {
    let account = chain_normalizers::normalize_account(value)?;
    match format {
        OutputFormat::Text => println!("{}", account),
        OutputFormat::Json => print_json(&serde_json::json!({ "account": account }))?,
    }
    Ok(())
}
