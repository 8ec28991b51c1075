use std::str::FromStr;

use alloy_primitives::{Address, B256, U256};
use num_bigint::BigUint;

use crate::execution::errors::ExecutionError;

/// Converts a `BigUint` into a `U256`, failing if it does not fit in 256 bits.
pub fn biguint_to_u256(value: &BigUint) -> Result<U256, ExecutionError> {
    if value.bits() > 256 {
        return Err(ExecutionError::InvalidInput(format!("Amount {} exceeds uint256", value)));
    }
    let bytes = value.to_bytes_be();
    Ok(U256::from_be_slice(&bytes))
}

/// Parses a hex account address.
///
/// All-lowercase and all-uppercase inputs are accepted as is. Mixed-case inputs are treated as
/// EIP-55 checksummed and must carry a valid checksum.
pub fn parse_address(value: &str) -> Result<Address, ExecutionError> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ExecutionError::InvalidInput(format!("Invalid address: {:?}", value)));
    }

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    let prefixed = format!("0x{}", digits);
    if has_lower && has_upper {
        Address::parse_checksummed(&prefixed, None).map_err(|_| {
            ExecutionError::InvalidInput(format!("Address {} has an invalid checksum", value))
        })
    } else {
        Address::from_str(&prefixed)
            .map_err(|_| ExecutionError::InvalidInput(format!("Invalid address: {:?}", value)))
    }
}

/// Parses a 32-byte hex private key, with or without `0x` prefix.
pub fn parse_private_key(value: &str) -> Result<B256, ExecutionError> {
    B256::from_str(value.trim()).map_err(|_| {
        ExecutionError::InvalidInput("Credential is not a 32-byte hex private key".to_string())
    })
}
