//! Canonical textual forms of account addresses and transaction hashes.
//!
//! Addresses are always stored and compared in their EIP-55 checksummed form.
//! All-lowercase and all-uppercase inputs are accepted and checksummed, while
//! mixed-case inputs must already carry a valid checksum.

use ethers_core::{
    types::{TxHash, H160},
    utils::to_checksum,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

const ADDRESS_HEX_LENGTH: usize = 40;
const TX_HASH_HEX_LENGTH: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid address '{input}': {reason}")]
pub struct InvalidAddressError {
    pub input: String,
    pub reason: &'static str,
}

impl InvalidAddressError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid transaction hash '{input}': {reason}")]
pub struct InvalidHashError {
    pub input: String,
    pub reason: &'static str,
}

/// 20-byte account identifier.
///
/// Two addresses are equal iff their checksummed forms are equal. As the checksum
/// is a function of the underlying bytes, comparing bytes gives the same result.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(H160);

impl Address {
    pub fn to_checksum(&self) -> String {
        to_checksum(&self.0, None)
    }

    /// Lower-cased `0x`-prefixed form, as expected by most indexers.
    pub fn to_lowercase_hex(&self) -> String {
        format!("{:#x}", self.0)
    }

    pub fn as_h160(&self) -> &H160 {
        &self.0
    }
}

impl From<H160> for Address {
    fn from(value: H160) -> Self {
        Self(value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_checksum()
    }
}

impl TryFrom<String> for Address {
    type Error = InvalidAddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        canonicalize(&value)
    }
}

impl FromStr for Address {
    type Err = InvalidAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        canonicalize(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

/// Validates `raw` is a well-formed account identifier and returns its checksummed form.
pub fn canonicalize(raw: &str) -> Result<Address, InvalidAddressError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| InvalidAddressError::new(raw, "missing 0x prefix"))?;
    if digits.len() != ADDRESS_HEX_LENGTH {
        return Err(InvalidAddressError::new(raw, "expected 40 hex digits"));
    }
    let bytes =
        hex::decode(digits).map_err(|_| InvalidAddressError::new(raw, "non-hex characters"))?;
    let address = Address(H160::from_slice(&bytes));

    let has_lowercase = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_uppercase = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lowercase && has_uppercase && address.to_checksum() != raw {
        return Err(InvalidAddressError::new(raw, "checksum mismatch"));
    }

    Ok(address)
}

/// The only address equality test used by reconciliation.
/// Malformed inputs are never equal to anything.
pub fn equal_address(a: &str, b: &str) -> bool {
    match (canonicalize(a), canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

pub fn parse_tx_hash(raw: &str) -> Result<TxHash, InvalidHashError> {
    let invalid = |reason| InvalidHashError {
        input: raw.to_string(),
        reason,
    };
    let digits = raw.strip_prefix("0x").ok_or_else(|| invalid("missing 0x prefix"))?;
    if digits.len() != TX_HASH_HEX_LENGTH {
        return Err(invalid("expected 64 hex digits"));
    }
    let bytes = hex::decode(digits).map_err(|_| invalid("non-hex characters"))?;
    Ok(TxHash::from_slice(&bytes))
}
