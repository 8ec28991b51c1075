use std::{sync::Arc, time::Duration};

use tracing::info;

use crate::execution::{
    client::ChainClient,
    config::NetworkConfig,
    confirmation::ConfirmationPoller,
    errors::ExecutionError,
    models::{ContractCall, SwapState, TransactionReceipt},
    nonce_manager::NonceManager,
    signer::{submit_signed, TransactionSigner},
    transaction_builder::TransactionBuilder,
};

/// Runs one contract call through build, sign, submit and confirmation.
///
/// The account's nonce gate is held from building until the node accepted or refused the
/// transaction. A transaction that is not confirmed in time makes the next one resync its nonce
/// from the node.
pub struct TransactionDispatcher<C: ?Sized> {
    client: Arc<C>,
    nonces: NonceManager,
    builder: TransactionBuilder,
    poller: ConfirmationPoller,
    confirmation_timeout: Duration,
    network: Option<NetworkConfig>,
}

impl<C: ChainClient + ?Sized> TransactionDispatcher<C> {
    pub fn new(
        client: Arc<C>,
        builder: TransactionBuilder,
        poller: ConfirmationPoller,
        confirmation_timeout: Duration,
    ) -> Self {
        Self {
            client,
            nonces: NonceManager::new(),
            builder,
            poller,
            confirmation_timeout,
            network: None,
        }
    }

    /// Network the transactions go to. Used for explorer links in the logs.
    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = Some(network);
        self
    }

    /// Sends `call` from `signer` and waits for its receipt.
    ///
    /// `stage` tracks the step in progress and is left on the failing step when an error is
    /// returned. A mined but reverted transaction is returned as a receipt.
    pub async fn dispatch(
        &self,
        call: &ContractCall,
        signer: &TransactionSigner,
        stage: &mut SwapState,
    ) -> Result<TransactionReceipt, ExecutionError> {
        *stage = SwapState::Building;
        let lease = self
            .nonces
            .reserve(self.client.as_ref(), signer.address())
            .await?;
        let request = self
            .builder
            .build(self.client.as_ref(), call, signer.address(), lease.nonce())
            .await?;

        *stage = SwapState::Signing;
        let signed = signer.sign(&request)?;

        *stage = SwapState::Submitting;
        let pending =
            match submit_signed(self.client.as_ref(), &signed, request.kind, request.nonce).await {
                Ok(pending) => {
                    lease.commit();
                    pending
                }
                Err(err) => {
                    lease.release();
                    return Err(err);
                }
            };
        if let Some(link) = self
            .network
            .as_ref()
            .and_then(|network| network.explorer_link(&pending.hash))
        {
            info!(tx_hash = %pending.hash, %link, "Track transaction on explorer");
        }

        *stage = SwapState::Awaiting;
        let result = self
            .poller
            .await_confirmation(self.client.as_ref(), &pending, self.confirmation_timeout)
            .await;
        if let Err(ExecutionError::ConfirmationTimeout { .. }) = &result {
            self.nonces
                .reset(signer.address())
                .await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use alloy::{consensus::TxEnvelope, eips::eip2718::Decodable2718};
    use alloy_primitives::{Address, U256};

    use super::*;
    use crate::execution::{
        client::mock::{MockChainClient, Outcome},
        config::{FeePolicy, GasLimits},
        contracts::approve_call,
    };

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn dispatcher(client: Arc<MockChainClient>) -> TransactionDispatcher<MockChainClient> {
        TransactionDispatcher::new(
            client,
            TransactionBuilder::new(1, FeePolicy::default(), GasLimits::default()),
            ConfirmationPoller::new(Duration::from_millis(5)),
            Duration::from_millis(100),
        )
        .with_network(NetworkConfig {
            chain_id: 1,
            rpc_url: "http://localhost:8545".to_string(),
            router_address: Address::with_last_byte(2),
            explorer_url: Some("https://etherscan.io".to_string()),
        })
    }

    fn call() -> ContractCall {
        approve_call(Address::with_last_byte(1), Address::with_last_byte(2), U256::from(5u64))
    }

    fn nonce_of(raw: &[u8]) -> u64 {
        match TxEnvelope::decode_2718(&mut &raw[..]).unwrap() {
            TxEnvelope::Eip1559(signed) => signed.tx().nonce,
            _ => panic!("Expected an EIP-1559 transaction"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let client = Arc::new(MockChainClient::new(1).with_pending_nonce(3));
        let dispatcher = dispatcher(client.clone());
        let signer = TransactionSigner::from_credential(DEV_KEY).unwrap();
        let mut stage = SwapState::Init;

        let receipt = dispatcher
            .dispatch(&call(), &signer, &mut stage)
            .await
            .unwrap();

        assert!(receipt.status);
        assert_eq!(stage, SwapState::Awaiting);
        assert_eq!(nonce_of(&client.submitted()[0]), 3);
    }

    #[tokio::test]
    async fn test_dispatch_rejection_stops_at_submitting() {
        let client = Arc::new(MockChainClient::new(1).with_outcomes(vec![Outcome::Rejected]));
        let dispatcher = dispatcher(client.clone());
        let signer = TransactionSigner::from_credential(DEV_KEY).unwrap();
        let mut stage = SwapState::Init;

        let result = dispatcher
            .dispatch(&call(), &signer, &mut stage)
            .await;

        assert!(matches!(result, Err(ExecutionError::Rejected(_))));
        assert_eq!(stage, SwapState::Submitting);
        assert!(client.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_timeout_stops_at_awaiting() {
        let client = Arc::new(MockChainClient::new(1).with_outcomes(vec![Outcome::NeverMined]));
        let dispatcher = dispatcher(client.clone());
        let signer = TransactionSigner::from_credential(DEV_KEY).unwrap();
        let mut stage = SwapState::Init;

        let result = dispatcher
            .dispatch(&call(), &signer, &mut stage)
            .await;

        assert!(matches!(result, Err(ExecutionError::ConfirmationTimeout { .. })));
        assert_eq!(stage, SwapState::Awaiting);
    }

    #[tokio::test]
    async fn test_sequential_dispatches_use_increasing_nonces() {
        let client = Arc::new(MockChainClient::new(1).with_pending_nonce(8));
        let dispatcher = dispatcher(client.clone());
        let signer = TransactionSigner::from_credential(DEV_KEY).unwrap();

        for _ in 0..3 {
            let mut stage = SwapState::Init;
            dispatcher
                .dispatch(&call(), &signer, &mut stage)
                .await
                .unwrap();
        }

        let nonces: Vec<u64> = client
            .submitted()
            .iter()
            .map(|raw| nonce_of(raw))
            .collect();
        assert_eq!(nonces, vec![8, 9, 10]);
    }

    #[tokio::test]
    async fn test_timeout_resyncs_nonce_from_node() {
        let client = Arc::new(
            MockChainClient::new(1)
                .with_pending_nonce(5)
                .with_outcomes(vec![Outcome::NeverMined]),
        );
        let dispatcher = dispatcher(client.clone());
        let signer = TransactionSigner::from_credential(DEV_KEY).unwrap();

        let mut stage = SwapState::Init;
        let result = dispatcher
            .dispatch(&call(), &signer, &mut stage)
            .await;
        assert!(matches!(result, Err(ExecutionError::ConfirmationTimeout { .. })));

        // The stuck transaction was dropped from the mempool.
        client.set_pending_nonce(5);
        for _ in 0..2 {
            let mut stage = SwapState::Init;
            dispatcher
                .dispatch(&call(), &signer, &mut stage)
                .await
                .unwrap();
        }

        let nonces: Vec<u64> = client
            .submitted()
            .iter()
            .map(|raw| nonce_of(raw))
            .collect();
        assert_eq!(nonces, vec![5, 5, 6]);
    }
}
