pub use clap::Parser;

#[derive(Parser)]
/// Execute a multi-hop Uniswap V3 swap
///
/// Reads a JSON object from stdin with the following structure:
/// ```json
/// {
///     "network": "testnet",
///     "tokenPath": ["0x...", "0x...", "0x..."],
///     "amountIn": "1000000",
///     "credential": "0x...",
///     "fees": [3000, 500]
/// }
/// ```
/// `fees` is optional and defaults to 3000 for every hop. The result is written to stdout as
/// `{"success": true, "status": 200, "transaction": {...}}` or
/// `{"success": false, "status": 504, "error": "..."}`.
///
/// Exit codes: 0 success, 2 invalid input (400), 3 swap reverted (422), 4 node or approval
/// failure (502), 5 not confirmed in time (504, may still be mined), 1 anything else.
///
/// The RPC endpoint of a network can be overridden with `<NETWORK>_RPC_URL` (for example
/// `TESTNET_RPC_URL`), read from the environment or a `.env` file.
pub struct Cli {
    /// JSON file with the per-network settings (chain id, RPC URL, router address)
    #[arg(long)]
    pub networks_file: Option<String>,

    /// JSON file with gas limits, fee multipliers, timeouts and the revert policy
    #[arg(long)]
    pub policy_file: Option<String>,

    /// RPC endpoint to use instead of the configured one
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Log filter, e.g. "info" or "swap_execution=debug". Logs go to stderr.
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}
