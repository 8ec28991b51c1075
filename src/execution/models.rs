use std::{fmt, str::FromStr};

use alloy_primitives::{Address, Bytes, B256, U256};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::execution::{
    constants::{DEFAULT_FEE_TIER, MAX_FEE_TIER},
    errors::{ExecutionError, SwapFailure},
    serde_primitives::{biguint_string, status_bit},
    utils::{biguint_to_u256, parse_address},
};

/// The named environments a swap can be executed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Testnet,
    Mainnet,
}

impl Network {
    pub fn name(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pool fee in hundredths of a basis point, limited to the uint24 range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FeeTier(u32);

impl FeeTier {
    pub fn new(fee: u32) -> Result<Self, ExecutionError> {
        if fee > MAX_FEE_TIER {
            return Err(ExecutionError::InvalidInput(format!(
                "Fee tier {} exceeds uint24 max value",
                fee
            )));
        }
        Ok(Self(fee))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Big-endian uint24 encoding.
    pub fn to_be_bytes(&self) -> [u8; 3] {
        let [_, b0, b1, b2] = self.0.to_be_bytes();
        [b0, b1, b2]
    }
}

impl Default for FeeTier {
    fn default() -> Self {
        Self(DEFAULT_FEE_TIER)
    }
}

/// A token contract address, normalized to its checksummed form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TokenAddress(Address);

impl TokenAddress {
    pub fn address(&self) -> Address {
        self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl FromStr for TokenAddress {
    type Err = ExecutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s).map(Self)
    }
}

impl From<Address> for TokenAddress {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_checksum(None))
    }
}

/// An ordered sequence of tokens with one fee tier per hop.
///
/// Construction enforces at least two tokens and `fees.len() == tokens.len() - 1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapPath {
    tokens: Vec<TokenAddress>,
    fees: Vec<FeeTier>,
}

impl SwapPath {
    pub fn new(tokens: Vec<TokenAddress>, fees: Vec<FeeTier>) -> Result<Self, ExecutionError> {
        if tokens.len() < 2 {
            return Err(ExecutionError::InvalidInput(format!(
                "Swap path needs at least 2 tokens, got {}",
                tokens.len()
            )));
        }
        if fees.len() != tokens.len() - 1 {
            return Err(ExecutionError::InvalidInput(format!(
                "Swap path with {} tokens needs {} fee tiers, got {}",
                tokens.len(),
                tokens.len() - 1,
                fees.len()
            )));
        }
        Ok(Self { tokens, fees })
    }

    /// Builds a path from address strings, applying `fee` to every hop.
    pub fn with_uniform_fee(tokens: &[String], fee: FeeTier) -> Result<Self, ExecutionError> {
        let tokens = tokens
            .iter()
            .map(|token| TokenAddress::from_str(token))
            .collect::<Result<Vec<_>, _>>()?;
        let fees = vec![fee; tokens.len().saturating_sub(1)];
        Self::new(tokens, fees)
    }

    pub fn tokens(&self) -> &[TokenAddress] {
        &self.tokens
    }

    pub fn fees(&self) -> &[FeeTier] {
        &self.fees
    }

    pub fn token_in(&self) -> TokenAddress {
        self.tokens[0]
    }

    pub fn token_out(&self) -> TokenAddress {
        self.tokens[self.tokens.len() - 1]
    }

    pub fn hops(&self) -> usize {
        self.fees.len()
    }
}

/// The router's packed representation of a `SwapPath`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedPath(Bytes);

impl EncodedPath {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

/// Inbound swap request, as received from the request layer.
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub network: Network,
    /// Ordered token addresses, input token first.
    pub token_path: Vec<String>,
    /// Amount of the input token, in its smallest unit.
    #[serde(with = "biguint_string")]
    pub amount_in: BigUint,
    /// Hex private key of the account executing the swap. Never serialized.
    #[serde(skip_serializing)]
    pub credential: String,
    /// Per-hop fee tiers. When absent every hop uses the default tier.
    #[serde(default)]
    pub fees: Option<Vec<u32>>,
}

impl fmt::Debug for SwapRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapRequest")
            .field("network", &self.network)
            .field("token_path", &self.token_path)
            .field("amount_in", &self.amount_in)
            .field("credential", &"<redacted>")
            .field("fees", &self.fees)
            .finish()
    }
}

/// A validated swap: the path to route through and the exact input amount.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapOrder {
    pub path: SwapPath,
    pub amount_in: U256,
}

impl SwapOrder {
    pub fn new(path: SwapPath, amount_in: U256) -> Self {
        Self { path, amount_in }
    }

    pub fn from_request(request: &SwapRequest) -> Result<Self, ExecutionError> {
        let path = match &request.fees {
            Some(fees) => {
                let tokens = request
                    .token_path
                    .iter()
                    .map(|token| TokenAddress::from_str(token))
                    .collect::<Result<Vec<_>, _>>()?;
                let fees = fees
                    .iter()
                    .map(|fee| FeeTier::new(*fee))
                    .collect::<Result<Vec<_>, _>>()?;
                SwapPath::new(tokens, fees)?
            }
            None => SwapPath::with_uniform_fee(&request.token_path, FeeTier::default())?,
        };
        let amount_in = biguint_to_u256(&request.amount_in)?;
        Ok(Self { path, amount_in })
    }

    /// An allowance grant precedes the swap whenever a non-zero amount is sold.
    pub fn needs_allowance(&self) -> bool {
        !self.amount_in.is_zero()
    }
}

/// The kind of contract call a transaction carries. Determines its gas limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    Approval,
    Swap,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallKind::Approval => f.write_str("approval"),
            CallKind::Swap => f.write_str("swap"),
        }
    }
}

/// A contract interaction before it is turned into a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCall {
    pub kind: CallKind,
    /// Address of the contract to call with the calldata.
    pub to: Address,
    /// Encoded calldata, selector included.
    pub data: Bytes,
    /// Native currency attached to the call.
    pub value: U256,
}

/// A fully specified EIP-1559 transaction, ready to be signed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    pub kind: CallKind,
    pub chain_id: u64,
    pub sender: Address,
    pub to: Address,
    pub data: Bytes,
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub value: U256,
    pub nonce: u64,
}

/// A signed transaction in its network encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    pub hash: B256,
    pub raw: Bytes,
}

/// Handle to a transaction that was accepted for broadcast but not yet confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingTransactionId {
    pub hash: B256,
    pub kind: CallKind,
    pub nonce: u64,
}

/// Outcome of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    /// True when the transaction executed successfully, false when it reverted.
    #[serde(with = "status_bit")]
    pub status: bool,
    pub gas_used: u64,
    pub block_number: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SwapResult {
    pub transaction: TransactionReceipt,
}

/// Outbound payload reported to the request layer.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SwapResponse {
    pub success: bool,
    /// HTTP-equivalent status: 200 on success, otherwise the failure's status code.
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub transaction: Option<TransactionReceipt>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl From<Result<SwapResult, SwapFailure>> for SwapResponse {
    fn from(outcome: Result<SwapResult, SwapFailure>) -> Self {
        match outcome {
            Ok(result) => SwapResponse {
                success: true,
                status: 200,
                transaction: Some(result.transaction),
                error: None,
            },
            Err(failure) => SwapResponse {
                success: false,
                status: failure.status_code(),
                transaction: None,
                error: Some(failure.to_string()),
            },
        }
    }
}

/// States of the swap protocol.
///
/// `Init -> (AllowanceNeeded -> Approving -> Approved) -> Building -> Signing -> Submitting ->
/// Awaiting -> Done | Failed`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapState {
    Init,
    AllowanceNeeded,
    Approving,
    Approved,
    Building,
    Signing,
    Submitting,
    Awaiting,
    Done,
    Failed,
}

impl SwapState {
    /// The state that follows `Init` for an order.
    pub fn after_init(order: &SwapOrder) -> SwapState {
        if order.needs_allowance() {
            SwapState::AllowanceNeeded
        } else {
            SwapState::Building
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SwapState::Done | SwapState::Failed)
    }
}

impl fmt::Display for SwapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwapState::Init => "init",
            SwapState::AllowanceNeeded => "allowance_needed",
            SwapState::Approving => "approving",
            SwapState::Approved => "approved",
            SwapState::Building => "building",
            SwapState::Signing => "signing",
            SwapState::Submitting => "submitting",
            SwapState::Awaiting => "awaiting",
            SwapState::Done => "done",
            SwapState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn usdc() -> String {
        "0x1c7d4b196cb0c7b01d743fbc6116a902379c7238".to_string()
    }

    fn weth() -> String {
        "0xfff9976782d46cc05630d1f6ebab18b2324d6b14".to_string()
    }

    fn uni() -> String {
        "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984".to_string()
    }

    #[rstest]
    #[case::zero(0, true)]
    #[case::lowest(100, true)]
    #[case::max(0xFF_FFFF, true)]
    #[case::overflow(0x100_0000, false)]
    fn test_fee_tier_range(#[case] fee: u32, #[case] valid: bool) {
        assert_eq!(FeeTier::new(fee).is_ok(), valid);
    }

    #[test]
    fn test_fee_tier_bytes() {
        assert_eq!(FeeTier::new(3000).unwrap().to_be_bytes(), [0x00, 0x0B, 0xB8]);
        assert_eq!(FeeTier::new(0xABCDEF).unwrap().to_be_bytes(), [0xAB, 0xCD, 0xEF]);
    }

    #[test]
    fn test_token_address_displays_checksummed() {
        let token = TokenAddress::from_str("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap();
        assert_eq!(token.to_string(), "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
    }

    #[rstest]
    #[case::single_token(1, 0)]
    #[case::missing_fee(2, 0)]
    #[case::three_tokens_one_fee(3, 1)]
    #[case::too_many_fees(3, 3)]
    #[case::four_tokens_two_fees(4, 2)]
    fn test_swap_path_rejects_mismatched_fees(#[case] tokens: usize, #[case] fees: usize) {
        let tokens = (0..tokens)
            .map(|i| TokenAddress::from(Address::with_last_byte(i as u8 + 1)))
            .collect();
        let fees = vec![FeeTier::default(); fees];
        assert!(matches!(SwapPath::new(tokens, fees), Err(ExecutionError::InvalidInput(_))));
    }

    #[test]
    fn test_swap_order_from_request_uses_default_fee() {
        let request: SwapRequest = serde_json::from_value(json!({
            "network": "testnet",
            "tokenPath": [usdc(), uni(), weth()],
            "amountIn": 1000000,
            "credential": "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
        }))
        .unwrap();

        let order = SwapOrder::from_request(&request).unwrap();
        assert_eq!(order.path.hops(), 2);
        assert!(order
            .path
            .fees()
            .iter()
            .all(|fee| fee.value() == 3000));
        assert_eq!(order.amount_in, U256::from(1_000_000u64));
        assert!(order.needs_allowance());
    }

    #[test]
    fn test_swap_order_from_request_with_fee_override() {
        let request: SwapRequest = serde_json::from_value(json!({
            "network": "mainnet",
            "tokenPath": [usdc(), weth()],
            "amountIn": "0",
            "credential": "0x01",
            "fees": [500]
        }))
        .unwrap();

        let order = SwapOrder::from_request(&request).unwrap();
        assert_eq!(order.path.fees(), &[FeeTier::new(500).unwrap()]);
        assert!(!order.needs_allowance());
        assert_eq!(SwapState::after_init(&order), SwapState::Building);
    }

    #[test]
    fn test_swap_order_from_request_rejects_bad_fee_count() {
        let request: SwapRequest = serde_json::from_value(json!({
            "network": "mainnet",
            "tokenPath": [usdc(), uni(), weth()],
            "amountIn": "10",
            "credential": "0x01",
            "fees": [500]
        }))
        .unwrap();

        assert!(matches!(SwapOrder::from_request(&request), Err(ExecutionError::InvalidInput(_))));
    }

    #[test]
    fn test_swap_request_debug_redacts_credential() {
        let request: SwapRequest = serde_json::from_value(json!({
            "network": "testnet",
            "tokenPath": [usdc(), weth()],
            "amountIn": "1",
            "credential": "0xdeadbeefdeadbeef"
        }))
        .unwrap();
        let debug = format!("{:?}", request);
        assert!(!debug.contains("deadbeef"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_swap_request_serialization_omits_credential() {
        let request: SwapRequest = serde_json::from_value(json!({
            "network": "testnet",
            "tokenPath": [usdc(), weth()],
            "amountIn": "1",
            "credential": "0xdeadbeefdeadbeef"
        }))
        .unwrap();
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("credential").is_none());
        assert_eq!(value["amountIn"], json!("1"));
        assert!(!value.to_string().contains("deadbeef"));
    }

    #[rstest]
    #[case::init(SwapState::Init, false)]
    #[case::awaiting(SwapState::Awaiting, false)]
    #[case::done(SwapState::Done, true)]
    #[case::failed(SwapState::Failed, true)]
    fn test_swap_state_is_terminal(#[case] state: SwapState, #[case] terminal: bool) {
        assert_eq!(state.is_terminal(), terminal);
    }

    #[test]
    fn test_swap_response_serialization() {
        let receipt = TransactionReceipt {
            transaction_hash: B256::with_last_byte(0xab),
            status: true,
            gas_used: 120_000,
            block_number: 42,
        };
        let response = SwapResponse::from(Ok(SwapResult { transaction: receipt }));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "success": true,
                "status": 200,
                "transaction": {
                    "transaction_hash": format!("0x{}ab", "00".repeat(31)),
                    "status": 1,
                    "gas_used": 120000,
                    "block_number": 42
                }
            })
        );

        let failure = SwapFailure::new(
            SwapState::Approving,
            ExecutionError::AllowanceFailed("reverted".to_string()),
        );
        let response = SwapResponse::from(Err(failure));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "success": false,
                "status": 502,
                "error": "Swap failed while approving: Allowance failed: reverted"
            })
        );
    }
}
