use std::{collections::HashMap, fs, time::Duration};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::execution::{
    constants::{
        DEFAULT_APPROVAL_GAS_LIMIT, DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_MAX_FEE_MULTIPLIER,
        DEFAULT_NETWORKS_JSON, DEFAULT_POLL_INTERVAL, DEFAULT_PRIORITY_FEE_MULTIPLIER,
        DEFAULT_SWAP_GAS_LIMIT,
    },
    errors::ExecutionError,
    models::{CallKind, Network},
};

/// Connection and contract settings of one network.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    /// The swap router that receives approvals and executes swaps.
    pub router_address: Address,
    #[serde(default)]
    pub explorer_url: Option<String>,
}

impl NetworkConfig {
    /// Link to a transaction on the network's block explorer, if one is configured.
    pub fn explorer_link(&self, tx_hash: &impl std::fmt::Display) -> Option<String> {
        self.explorer_url
            .as_ref()
            .map(|url| format!("{}/tx/{}", url.trim_end_matches('/'), tx_hash))
    }
}

/// Registry of known networks keyed by network name.
#[derive(Clone, Debug)]
pub struct NetworksConfig {
    networks: HashMap<String, NetworkConfig>,
}

impl NetworksConfig {
    /// Loads the registry from a JSON file, or from the built-in defaults when no path is given.
    pub fn load(path: Option<String>) -> Result<Self, ExecutionError> {
        let config_str = if let Some(ref path) = path {
            fs::read_to_string(path).map_err(|e| {
                ExecutionError::FatalError(format!(
                    "Failed to read networks file {}: {}",
                    path, e
                ))
            })?
        } else {
            DEFAULT_NETWORKS_JSON.to_string()
        };
        Self::from_json(&config_str)
    }

    pub fn from_json(config_str: &str) -> Result<Self, ExecutionError> {
        let networks: HashMap<String, NetworkConfig> = serde_json::from_str(config_str)?;
        Ok(Self { networks })
    }

    pub fn get(&self, network: Network) -> Result<&NetworkConfig, ExecutionError> {
        self.networks.get(network.name()).ok_or_else(|| {
            ExecutionError::FatalError(format!("No configuration for network {}", network))
        })
    }
}

/// Gas limits per kind of call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GasLimits {
    pub approval: u64,
    pub swap: u64,
}

impl GasLimits {
    pub fn for_call(&self, kind: CallKind) -> u64 {
        match kind {
            CallKind::Approval => self.approval,
            CallKind::Swap => self.swap,
        }
    }
}

impl Default for GasLimits {
    fn default() -> Self {
        Self { approval: DEFAULT_APPROVAL_GAS_LIMIT, swap: DEFAULT_SWAP_GAS_LIMIT }
    }
}

/// Derives EIP-1559 fee caps from the network's current base fee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeePolicy {
    pub max_fee_multiplier: u128,
    pub priority_fee_multiplier: u128,
}

impl FeePolicy {
    /// Returns `(max_fee_per_gas, max_priority_fee_per_gas)`.
    pub fn fee_bounds(&self, base_fee: u128) -> Result<(u128, u128), ExecutionError> {
        let overflow = || {
            ExecutionError::MalformedTransaction(format!("Fee for base fee {} overflows", base_fee))
        };
        let max_fee = base_fee
            .checked_mul(self.max_fee_multiplier)
            .ok_or_else(overflow)?;
        let priority_fee = base_fee
            .checked_mul(self.priority_fee_multiplier)
            .ok_or_else(overflow)?;
        Ok((max_fee, priority_fee))
    }
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            max_fee_multiplier: DEFAULT_MAX_FEE_MULTIPLIER,
            priority_fee_multiplier: DEFAULT_PRIORITY_FEE_MULTIPLIER,
        }
    }
}

/// Tunable execution settings. Every field is optional in the JSON form.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionPolicy {
    pub gas_limits: GasLimits,
    pub fee_policy: FeePolicy,
    pub confirmation_timeout_secs: u64,
    pub poll_interval_ms: u64,
    /// When set, a swap that is mined but reverted ends in `Failed` instead of `Done`.
    pub fail_on_revert: bool,
}

impl ExecutionPolicy {
    pub fn load(path: Option<String>) -> Result<Self, ExecutionError> {
        match path {
            Some(path) => {
                let policy_str = fs::read_to_string(&path).map_err(|e| {
                    ExecutionError::FatalError(format!(
                        "Failed to read policy file {}: {}",
                        path, e
                    ))
                })?;
                Ok(serde_json::from_str(&policy_str)?)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            gas_limits: GasLimits::default(),
            fee_policy: FeePolicy::default(),
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT.as_secs(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            fail_on_revert: true,
        }
    }
}
