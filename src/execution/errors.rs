use std::{io, time::Duration};

use alloy_primitives::B256;
use thiserror::Error;

use crate::execution::models::SwapState;

/// Represents the outer-level, user-facing errors of the swap execution package.
///
/// Variants:
/// - `InvalidInput`: The request was malformed (path, fees, amount, credential). Nothing was sent.
/// - `AllowanceFailed`: The approval transaction failed, reverted or was not confirmed in time.
/// - `MalformedTransaction`: A built transaction failed local checks before signing or sending.
/// - `Transport`: The node could not be reached. For a submission it is unknown whether the
///   transaction was received.
/// - `Rejected`: The node refused the transaction (nonce too low, insufficient funds, ...).
/// - `ConfirmationTimeout`: The transaction was not mined within the wait budget. It may still
///   land later.
/// - `OnChainRevert`: The transaction was mined but executed with failure status.
/// - `FatalError`: There is a problem with the application setup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Allowance failed: {0}")]
    AllowanceFailed(String),
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Transaction rejected: {0}")]
    Rejected(String),
    #[error("Transaction {tx_hash} was not confirmed within {waited:?}")]
    ConfirmationTimeout { tx_hash: B256, waited: Duration },
    #[error("Transaction {tx_hash} reverted in block {block_number} (gas used: {gas_used})")]
    OnChainRevert { tx_hash: B256, block_number: u64, gas_used: u64 },
    #[error("Fatal error: {0}")]
    FatalError(String),
}

impl ExecutionError {
    /// HTTP-equivalent status for reporting this error at a request boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            ExecutionError::InvalidInput(_) | ExecutionError::MalformedTransaction(_) => 400,
            ExecutionError::OnChainRevert { .. } => 422,
            ExecutionError::AllowanceFailed(_) |
            ExecutionError::Transport(_) |
            ExecutionError::Rejected(_) => 502,
            ExecutionError::ConfirmationTimeout { .. } => 504,
            ExecutionError::FatalError(_) => 500,
        }
    }

    /// Process exit code for this error, one per status class.
    ///
    /// `5` (timeout) means the transaction may still be mined and must not be resubmitted
    /// blindly.
    pub fn exit_code(&self) -> i32 {
        match self.status_code() {
            400 => 2,
            422 => 3,
            502 => 4,
            504 => 5,
            _ => 1,
        }
    }
}

impl From<io::Error> for ExecutionError {
    fn from(err: io::Error) -> Self {
        ExecutionError::FatalError(err.to_string())
    }
}

impl From<serde_json::Error> for ExecutionError {
    fn from(err: serde_json::Error) -> Self {
        ExecutionError::FatalError(err.to_string())
    }
}

/// A swap that ended in the `Failed` state, tagged with the stage it failed in.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Swap failed while {stage}: {error}")]
pub struct SwapFailure {
    pub stage: SwapState,
    pub error: ExecutionError,
}

impl SwapFailure {
    pub fn new(stage: SwapState, error: ExecutionError) -> Self {
        Self { stage, error }
    }

    pub fn status_code(&self) -> u16 {
        self.error.status_code()
    }

    pub fn exit_code(&self) -> i32 {
        self.error.exit_code()
    }
}
