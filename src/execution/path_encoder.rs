use std::str::FromStr;

use crate::execution::{
    errors::ExecutionError,
    models::{EncodedPath, FeeTier, SwapPath, TokenAddress},
};

const ADDRESS_SIZE: usize = 20;
const FEE_SIZE: usize = 3;

/// Serializes a path into the router's packed format:
/// `token[0] || fee[0] || token[1] || ... || fee[n-2] || token[n-1]`, fees as 3-byte big-endian.
pub fn encode_path(path: &SwapPath) -> EncodedPath {
    let mut encoded =
        Vec::with_capacity(path.tokens().len() * ADDRESS_SIZE + path.fees().len() * FEE_SIZE);
    for (token, fee) in path
        .tokens()
        .iter()
        .zip(path.fees())
    {
        encoded.extend_from_slice(token.as_slice());
        encoded.extend_from_slice(&fee.to_be_bytes());
    }
    encoded.extend_from_slice(path.token_out().as_slice());
    EncodedPath::new(encoded)
}

/// Validates raw token and fee inputs and encodes them.
pub fn encode(tokens: &[&str], fees: &[u32]) -> Result<EncodedPath, ExecutionError> {
    let tokens = tokens
        .iter()
        .map(|token| TokenAddress::from_str(token))
        .collect::<Result<Vec<_>, _>>()?;
    let fees = fees
        .iter()
        .map(|fee| FeeTier::new(*fee))
        .collect::<Result<Vec<_>, _>>()?;
    let path = SwapPath::new(tokens, fees)?;
    Ok(encode_path(&path))
}
