use alloy::{
    network::ReceiptResponse,
    providers::{Provider, ProviderBuilder, RootProvider},
    transports::{BoxTransport, RpcError, TransportError},
};
use alloy_primitives::{Address, B256};
use async_trait::async_trait;

use crate::execution::{errors::ExecutionError, models::TransactionReceipt};

/// The node operations the executor depends on.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ExecutionError>;

    /// Number of transactions sent from `address`, pending ones included.
    async fn transaction_count(&self, address: Address) -> Result<u64, ExecutionError>;

    /// Current gas price, used as the base for fee bounds.
    async fn base_fee(&self) -> Result<u128, ExecutionError>;

    /// Broadcasts an EIP-2718 encoded transaction and returns its hash.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ExecutionError>;

    /// Returns the receipt if the transaction has been mined.
    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, ExecutionError>;
}

/// `ChainClient` over a JSON-RPC node.
#[derive(Clone)]
pub struct RpcChainClient {
    provider: RootProvider<BoxTransport>,
}

impl RpcChainClient {
    pub async fn connect(rpc_url: &str) -> Result<Self, ExecutionError> {
        let provider = ProviderBuilder::new()
            .on_builtin(rpc_url)
            .await
            .map_err(|e| {
                ExecutionError::FatalError(format!("Failed to connect to {}: {}", rpc_url, e))
            })?;
        Ok(Self::new(provider))
    }

    pub fn new(provider: RootProvider<BoxTransport>) -> Self {
        Self { provider }
    }
}

/// A JSON-RPC error response means the node refused the request. Anything else leaves the
/// outcome unknown.
fn map_rpc_error(context: &str, err: TransportError) -> ExecutionError {
    match err {
        RpcError::ErrorResp(payload) => ExecutionError::Rejected(format!(
            "{}: {} (code {})",
            context, payload.message, payload.code
        )),
        other => ExecutionError::Transport(format!("{}: {}", context, other)),
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn chain_id(&self) -> Result<u64, ExecutionError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ExecutionError::Transport(format!("Failed to fetch chain id: {}", e)))
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, ExecutionError> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| ExecutionError::Transport(format!("Failed to fetch nonce: {}", e)))
    }

    async fn base_fee(&self) -> Result<u128, ExecutionError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| ExecutionError::Transport(format!("Failed to fetch gas price: {}", e)))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ExecutionError> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| map_rpc_error("Failed to send transaction", e))?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, ExecutionError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| ExecutionError::Transport(format!("Failed to fetch receipt: {}", e)))?;

        let Some(receipt) = receipt else {
            return Ok(None);
        };
        // Nodes can return a receipt for a pending block without a number.
        let Some(block_number) = receipt.block_number else {
            return Ok(None);
        };
        let gas_used = u64::try_from(receipt.gas_used).map_err(|_| {
            ExecutionError::FatalError(format!("Gas used by {} overflows u64", tx_hash))
        })?;
        Ok(Some(TransactionReceipt {
            transaction_hash: receipt.transaction_hash,
            status: ReceiptResponse::status(&receipt),
            gas_used,
            block_number,
        }))
    }
}
