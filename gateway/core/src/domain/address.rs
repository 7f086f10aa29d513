// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Strict parsing for 20-byte account addresses coming off the wire.

use alloy_primitives::Address;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,

    #[error("address must be 40 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("address contains non-hex characters")]
    InvalidHex,

    #[error("address has an invalid EIP-55 checksum")]
    InvalidChecksum,
}

/// Parse a `0x`-prefixed address.
///
/// All-lowercase and all-uppercase inputs carry no checksum and are accepted;
/// mixed-case inputs must match their EIP-55 checksum exactly.
pub fn parse_address(value: &str) -> Result<Address, AddressError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or(AddressError::MissingPrefix)?;

    if digits.len() != 40 {
        return Err(AddressError::InvalidLength(digits.len()));
    }

    let bytes = hex::decode(digits).map_err(|_| AddressError::InvalidHex)?;
    let address = Address::from_slice(&bytes);

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper && address.to_checksum(None)[2..] != *digits {
        return Err(AddressError::InvalidChecksum);
    }

    Ok(address)
}
