use alloy_primitives::{Address, U256};
use tracing::info;

use crate::execution::{
    client::ChainClient,
    contracts::approve_call,
    dispatcher::TransactionDispatcher,
    errors::ExecutionError,
    models::{SwapState, TransactionReceipt},
    signer::TransactionSigner,
};

/// Grants a spender the allowance a swap needs before it is sent.
///
/// The current allowance is never read: a non-zero amount is always approved again.
pub struct AllowanceManager<'a, C: ?Sized> {
    dispatcher: &'a TransactionDispatcher<C>,
}

impl<'a, C: ChainClient + ?Sized> AllowanceManager<'a, C> {
    pub fn new(dispatcher: &'a TransactionDispatcher<C>) -> Self {
        Self { dispatcher }
    }

    /// Sets the allowance of `spender` over the owner's `token` to exactly `amount` and waits for
    /// the approval to be mined. The owner is the signing account.
    ///
    /// Returns `None` without sending anything when `amount` is zero. Any failure, including a
    /// reverted approval, is reported as `AllowanceFailed`.
    pub async fn ensure_allowance(
        &self,
        owner: &TransactionSigner,
        spender: Address,
        token: Address,
        amount: U256,
    ) -> Result<Option<TransactionReceipt>, ExecutionError> {
        if amount.is_zero() {
            return Ok(None);
        }

        let call = approve_call(token, spender, amount);
        let mut step = SwapState::Building;
        let result = self
            .dispatcher
            .dispatch(&call, owner, &mut step)
            .await;
        let receipt = result.map_err(|err| {
            ExecutionError::AllowanceFailed(format!("Approval failed while {}: {}", step, err))
        })?;

        if !receipt.status {
            return Err(ExecutionError::AllowanceFailed(format!(
                "Approval {} reverted in block {}",
                receipt.transaction_hash, receipt.block_number
            )));
        }
        info!(
            tx_hash = %receipt.transaction_hash,
            %token,
            %spender,
            %amount,
            "Allowance granted"
        );
        Ok(Some(receipt))
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use rstest::rstest;

    use super::*;
    use crate::execution::{
        client::mock::{MockChainClient, Outcome},
        config::{FeePolicy, GasLimits},
        confirmation::ConfirmationPoller,
        transaction_builder::TransactionBuilder,
    };

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn dispatcher(client: Arc<MockChainClient>) -> TransactionDispatcher<MockChainClient> {
        TransactionDispatcher::new(
            client,
            TransactionBuilder::new(1, FeePolicy::default(), GasLimits::default()),
            ConfirmationPoller::new(Duration::from_millis(5)),
            Duration::from_millis(50),
        )
    }

    fn signer() -> TransactionSigner {
        TransactionSigner::from_credential(DEV_KEY).unwrap()
    }

    #[tokio::test]
    async fn test_zero_amount_sends_nothing() {
        let client = Arc::new(MockChainClient::new(1));
        let dispatcher = dispatcher(client.clone());

        let receipt = AllowanceManager::new(&dispatcher)
            .ensure_allowance(
                &signer(),
                Address::with_last_byte(2),
                Address::with_last_byte(1),
                U256::ZERO,
            )
            .await
            .unwrap();

        assert!(receipt.is_none());
        assert!(client.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_approves_exact_amount() {
        let client = Arc::new(MockChainClient::new(1));
        let dispatcher = dispatcher(client.clone());

        let receipt = AllowanceManager::new(&dispatcher)
            .ensure_allowance(
                &signer(),
                Address::with_last_byte(2),
                Address::with_last_byte(1),
                U256::from(1_000_000u64),
            )
            .await
            .unwrap()
            .unwrap();

        assert!(receipt.status);
        let submitted = client.submitted();
        assert_eq!(submitted.len(), 1);
        let expected = approve_call(
            Address::with_last_byte(1),
            Address::with_last_byte(2),
            U256::from(1_000_000u64),
        );
        assert!(submitted[0]
            .windows(expected.data.len())
            .any(|window| window == &expected.data[..]));
    }

    #[rstest]
    #[case::reverted(Outcome::Mined { success: false })]
    #[case::never_mined(Outcome::NeverMined)]
    #[case::rejected(Outcome::Rejected)]
    #[case::transport(Outcome::TransportFailure)]
    #[tokio::test]
    async fn test_failures_become_allowance_errors(#[case] outcome: Outcome) {
        let client = Arc::new(MockChainClient::new(1).with_outcomes(vec![outcome]));
        let dispatcher = dispatcher(client.clone());

        let result = AllowanceManager::new(&dispatcher)
            .ensure_allowance(
                &signer(),
                Address::with_last_byte(2),
                Address::with_last_byte(1),
                U256::from(1u64),
            )
            .await;

        assert!(matches!(result, Err(ExecutionError::AllowanceFailed(_))));
    }
}
