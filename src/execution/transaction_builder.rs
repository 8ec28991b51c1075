use alloy_primitives::Address;
use tracing::debug;

use crate::execution::{
    client::ChainClient,
    config::{FeePolicy, GasLimits},
    errors::ExecutionError,
    models::{ContractCall, TransactionRequest},
};

/// Turns contract calls into EIP-1559 transaction requests.
///
/// # Fields
/// * `chain_id` - Chain the transactions are replay-protected for.
/// * `fee_policy` - How fee caps are derived from the current base fee.
/// * `gas_limits` - Fixed gas limit per call kind.
#[derive(Clone, Debug)]
pub struct TransactionBuilder {
    chain_id: u64,
    fee_policy: FeePolicy,
    gas_limits: GasLimits,
}

impl TransactionBuilder {
    pub fn new(chain_id: u64, fee_policy: FeePolicy, gas_limits: GasLimits) -> Self {
        Self { chain_id, fee_policy, gas_limits }
    }

    /// Builds the request for `call` sent by `sender` with `nonce`. The base fee is read from
    /// the node right before building.
    pub async fn build<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        call: &ContractCall,
        sender: Address,
        nonce: u64,
    ) -> Result<TransactionRequest, ExecutionError> {
        let base_fee = client.base_fee().await?;
        let (max_fee_per_gas, max_priority_fee_per_gas) = self.fee_policy.fee_bounds(base_fee)?;
        let gas_limit = self.gas_limits.for_call(call.kind);
        debug!(
            kind = %call.kind,
            nonce,
            base_fee,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            gas_limit,
            "Built transaction"
        );

        Ok(TransactionRequest {
            kind: call.kind,
            chain_id: self.chain_id,
            sender,
            to: call.to,
            data: call.data.clone(),
            gas_limit,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            value: call.value,
            nonce,
        })
    }
}
