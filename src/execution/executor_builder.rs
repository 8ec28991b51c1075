use std::sync::Arc;

use alloy_primitives::Address;
use tracing::info;

use crate::execution::{
    client::{ChainClient, RpcChainClient},
    config::{ExecutionPolicy, NetworkConfig, NetworksConfig},
    errors::ExecutionError,
    models::Network,
    swap_executor::SwapExecutor,
};

/// Builder pattern for constructing a `SwapExecutor` with customizable options.
///
/// Only the network is required. Everything else falls back to the bundled network table and
/// the default execution policy.
pub struct SwapExecutorBuilder {
    network: Option<Network>,
    networks_file_path: Option<String>,
    policy: Option<ExecutionPolicy>,
    rpc_url: Option<String>,
    router_address: Option<Address>,
}

impl Default for SwapExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SwapExecutorBuilder {
    pub fn new() -> Self {
        SwapExecutorBuilder {
            network: None,
            networks_file_path: None,
            policy: None,
            rpc_url: None,
            router_address: None,
        }
    }

    pub fn network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    /// Sets the `networks_file_path` manually.
    /// If it's not set, the default table will be used (config/networks.json)
    pub fn networks_file_path(mut self, networks_file_path: String) -> Self {
        self.networks_file_path = Some(networks_file_path);
        self
    }

    pub fn policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Overrides the RPC endpoint of the network table.
    pub fn rpc_url(mut self, rpc_url: String) -> Self {
        self.rpc_url = Some(rpc_url);
        self
    }

    /// Overrides the router address of the network table.
    pub fn router_address(mut self, router_address: Address) -> Self {
        self.router_address = Some(router_address);
        self
    }

    fn resolve(&self) -> Result<(Network, NetworkConfig), ExecutionError> {
        let network = self.network.ok_or_else(|| {
            ExecutionError::FatalError(
                "Please set the network before building the executor".to_string(),
            )
        })?;
        let networks = NetworksConfig::load(self.networks_file_path.clone())?;
        let mut config = networks.get(network)?.clone();
        if let Some(rpc_url) = &self.rpc_url {
            config.rpc_url = rpc_url.clone();
        }
        if let Some(router_address) = self.router_address {
            config.router_address = router_address;
        }
        Ok((network, config))
    }

    /// Connects to the network's node and builds the executor.
    ///
    /// Fails if the node serves a different chain than the one configured for the network.
    pub async fn build(self) -> Result<SwapExecutor<RpcChainClient>, ExecutionError> {
        let (network, config) = self.resolve()?;
        let client = RpcChainClient::connect(&config.rpc_url).await?;
        Self::assemble(network, config, self.policy, Arc::new(client)).await
    }

    /// Builds the executor on top of an existing client.
    pub async fn build_with_client<C: ChainClient + ?Sized>(
        self,
        client: Arc<C>,
    ) -> Result<SwapExecutor<C>, ExecutionError> {
        let (network, config) = self.resolve()?;
        Self::assemble(network, config, self.policy, client).await
    }

    async fn assemble<C: ChainClient + ?Sized>(
        network: Network,
        config: NetworkConfig,
        policy: Option<ExecutionPolicy>,
        client: Arc<C>,
    ) -> Result<SwapExecutor<C>, ExecutionError> {
        let chain_id = client.chain_id().await?;
        if chain_id != config.chain_id {
            return Err(ExecutionError::FatalError(format!(
                "Node serves chain {} but {} expects chain {}",
                chain_id, network, config.chain_id
            )));
        }
        info!(%network, chain_id, router = %config.router_address, "Swap executor ready");
        Ok(SwapExecutor::new(network, config, policy.unwrap_or_default(), client))
    }
}
