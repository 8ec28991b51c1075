use std::time::Duration;

use tracing::{debug, warn};

use crate::execution::{
    client::ChainClient,
    errors::ExecutionError,
    models::{PendingTransactionId, TransactionReceipt},
};

/// Waits for submitted transactions to be mined by polling for their receipt.
#[derive(Clone, Copy, Debug)]
pub struct ConfirmationPoller {
    interval: Duration,
}

impl ConfirmationPoller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Suspends until `pending` is mined or `timeout` elapses.
    ///
    /// A reverted transaction is returned as a receipt with `status == false`. Failed receipt
    /// queries are logged and retried until the timeout.
    pub async fn await_confirmation<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        pending: &PendingTransactionId,
        timeout: Duration,
    ) -> Result<TransactionReceipt, ExecutionError> {
        tokio::time::timeout(timeout, self.poll(client, pending))
            .await
            .map_err(|_| ExecutionError::ConfirmationTimeout { tx_hash: pending.hash, waited: timeout })
    }

    async fn poll<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        pending: &PendingTransactionId,
    ) -> TransactionReceipt {
        loop {
            match client
                .transaction_receipt(pending.hash)
                .await
            {
                Ok(Some(receipt)) => {
                    debug!(
                        tx_hash = %pending.hash,
                        block_number = receipt.block_number,
                        status = receipt.status,
                        "Transaction mined"
                    );
                    return receipt;
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(tx_hash = %pending.hash, error = %err, "Receipt query failed, retrying");
                }
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
