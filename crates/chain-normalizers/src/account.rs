//! EIP-55 account normalization.

use crate::{NormalizeError, NormalizeResult};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

const ADDRESS_HEX_LEN: usize = 40;

/// An account address in EIP-55 checksummed form.
///
/// Can only be built through [`normalize_account`], so holding an `Account`
/// means the value is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Account(String);

impl Account {
    /// The checksummed `0x`-prefixed address.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Account {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Account {
    type Err = NormalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_account(s)
    }
}

impl TryFrom<String> for Account {
    type Error = NormalizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        normalize_account(&value)
    }
}

impl From<Account> for String {
    fn from(account: Account) -> Self {
        account.0
    }
}

/// Canonicalize an account address into its EIP-55 checksummed form.
///
/// Accepts 40 hex digits with or without a `0x` prefix. All-lowercase and
/// all-uppercase inputs are checksummed; mixed-case inputs must already carry
/// a valid checksum.
pub fn normalize_account(value: &str) -> NormalizeResult<Account> {
    let invalid = || NormalizeError::InvalidAccount(value.to_string());

    let trimmed = value.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex.len() != ADDRESS_HEX_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let checksummed = to_checksum(&hex.to_ascii_lowercase());

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && &checksummed[2..] != hex {
        return Err(invalid());
    }

    Ok(Account(checksummed))
}

fn to_checksum(lower_hex: &str) -> String {
    let digest = Keccak256::digest(lower_hex.as_bytes());

    let mut out = String::with_capacity(ADDRESS_HEX_LEN + 2);
    out.push_str("0x");
    for (i, c) in lower_hex.chars().enumerate() {
        let byte = digest[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
