use std::time::Duration;

pub const DEFAULT_NETWORKS_JSON: &str = include_str!("../../config/networks.json");

/// Fee tier applied to every hop when the caller does not give per-hop fees (0.3%).
pub const DEFAULT_FEE_TIER: u32 = 3000;

/// Largest value representable by the router's uint24 fee field.
pub const MAX_FEE_TIER: u32 = 0x00FF_FFFF;

pub const DEFAULT_APPROVAL_GAS_LIMIT: u64 = 100_000;
pub const DEFAULT_SWAP_GAS_LIMIT: u64 = 30_000_000;

pub const DEFAULT_MAX_FEE_MULTIPLIER: u128 = 2;
pub const DEFAULT_PRIORITY_FEE_MULTIPLIER: u128 = 1;

pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
