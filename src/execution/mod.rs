pub mod allowance_manager;
pub mod client;
pub mod config;
pub mod confirmation;
mod constants;
pub mod contracts;
pub mod dispatcher;
pub mod errors;
pub mod executor_builder;
pub mod models;
pub mod nonce_manager;
pub mod path_encoder;
mod serde_primitives;
pub mod signer;
pub mod swap_executor;
pub mod transaction_builder;
pub mod utils;
