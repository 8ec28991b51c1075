use std::sync::Arc;

use tracing::{error, info};

use crate::execution::{
    allowance_manager::AllowanceManager,
    client::ChainClient,
    config::{ExecutionPolicy, NetworkConfig},
    confirmation::ConfirmationPoller,
    contracts::exact_input_call,
    dispatcher::TransactionDispatcher,
    errors::{ExecutionError, SwapFailure},
    models::{Network, SwapOrder, SwapRequest, SwapResult, SwapState},
    path_encoder::encode_path,
    signer::TransactionSigner,
    transaction_builder::TransactionBuilder,
};

/// Executes swaps on one network: an optional approval of the router, then `exactInput`.
///
/// Steps within a swap run strictly in order. Independent swaps may run concurrently on one
/// executor; nonces of a shared account are handed out through a per-account gate.
pub struct SwapExecutor<C: ?Sized> {
    network: Network,
    network_config: NetworkConfig,
    policy: ExecutionPolicy,
    dispatcher: TransactionDispatcher<C>,
}

impl<C: ChainClient + ?Sized> SwapExecutor<C> {
    pub fn new(
        network: Network,
        network_config: NetworkConfig,
        policy: ExecutionPolicy,
        client: Arc<C>,
    ) -> Self {
        let builder = TransactionBuilder::new(
            network_config.chain_id,
            policy.fee_policy,
            policy.gas_limits,
        );
        let dispatcher = TransactionDispatcher::new(
            client,
            builder,
            ConfirmationPoller::new(policy.poll_interval()),
            policy.confirmation_timeout(),
        )
        .with_network(network_config.clone());
        Self { network, network_config, policy, dispatcher }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn network_config(&self) -> &NetworkConfig {
        &self.network_config
    }

    pub fn policy(&self) -> &ExecutionPolicy {
        &self.policy
    }

    /// Validates an inbound request and executes it.
    pub async fn execute_request(&self, request: &SwapRequest) -> Result<SwapResult, SwapFailure> {
        if request.network != self.network {
            return Err(fail(
                SwapState::Init,
                ExecutionError::InvalidInput(format!(
                    "Request targets {} but the executor is configured for {}",
                    request.network, self.network
                )),
            ));
        }
        let order = SwapOrder::from_request(request).map_err(|e| fail(SwapState::Init, e))?;
        let signer = TransactionSigner::from_credential(&request.credential)
            .map_err(|e| fail(SwapState::Init, e))?;
        self.execute(&order, &signer).await
    }

    /// Runs the swap protocol for `order`, signed by `signer`.
    ///
    /// The output tokens are sent to the signer. The approval receipt, if any, is not part of
    /// the result.
    pub async fn execute(
        &self,
        order: &SwapOrder,
        signer: &TransactionSigner,
    ) -> Result<SwapResult, SwapFailure> {
        let router = self.network_config.router_address;
        let mut state = SwapState::Init;
        info!(
            network = %self.network,
            account = %signer.address(),
            token_in = %order.path.token_in(),
            token_out = %order.path.token_out(),
            hops = order.path.hops(),
            amount_in = %order.amount_in,
            "Starting swap"
        );

        transition(&mut state, SwapState::after_init(order));
        if state == SwapState::AllowanceNeeded {
            transition(&mut state, SwapState::Approving);
            AllowanceManager::new(&self.dispatcher)
                .ensure_allowance(signer, router, order.path.token_in().address(), order.amount_in)
                .await
                .map_err(|e| fail(state, e))?;
            transition(&mut state, SwapState::Approved);
        }

        let call = exact_input_call(
            router,
            encode_path(&order.path),
            signer.address(),
            order.amount_in,
        );
        let result = self
            .dispatcher
            .dispatch(&call, signer, &mut state)
            .await;
        let receipt = result.map_err(|e| fail(state, e))?;

        if !receipt.status && self.policy.fail_on_revert {
            return Err(fail(
                state,
                ExecutionError::OnChainRevert {
                    tx_hash: receipt.transaction_hash,
                    block_number: receipt.block_number,
                    gas_used: receipt.gas_used,
                },
            ));
        }

        transition(&mut state, SwapState::Done);
        info!(
            tx_hash = %receipt.transaction_hash,
            status = receipt.status,
            gas_used = receipt.gas_used,
            block_number = receipt.block_number,
            "Swap confirmed"
        );
        Ok(SwapResult { transaction: receipt })
    }
}

fn transition(state: &mut SwapState, next: SwapState) {
    info!(from = %state, to = %next, terminal = next.is_terminal(), "Swap state changed");
    *state = next;
}

/// Moves from `stage` into `Failed`. The failure keeps the stage it happened in.
fn fail(stage: SwapState, error: ExecutionError) -> SwapFailure {
    let mut state = stage;
    transition(&mut state, SwapState::Failed);
    error!(%stage, %error, "Swap failed");
    SwapFailure::new(stage, error)
}
