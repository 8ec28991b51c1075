use std::{
    io::{self, Read},
    str::FromStr,
};

use swap_execution::execution::{
    config::ExecutionPolicy,
    errors::{ExecutionError, SwapFailure},
    executor_builder::SwapExecutorBuilder,
    models::{SwapRequest, SwapResponse, SwapResult, SwapState},
};
use tracing_subscriber::EnvFilter;

mod lib {
    pub mod cli;
}

use lib::cli::{Cli, Parser};

fn setup_logging(log_level: &str) {
    let filter = EnvFilter::from_str(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    // Read from stdin until EOF
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| format!("Failed to read from stdin: {}", e))?;

    if buffer.trim().is_empty() {
        eprintln!("Error: No input provided");
        std::process::exit(1);
    }

    let outcome = execute_swap(&cli, &buffer).await;
    let exit_code = match &outcome {
        Ok(_) => 0,
        Err(failure) => {
            tracing::error!(status = failure.status_code(), "{}", failure);
            failure.exit_code()
        }
    };
    let response = SwapResponse::from(outcome);

    println!(
        "{}",
        serde_json::to_string(&response)
            .map_err(|e| format!("Failed to serialize output: {}", e))?
    );

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

async fn execute_swap(cli: &Cli, input: &str) -> Result<SwapResult, SwapFailure> {
    let at_init = |error: ExecutionError| SwapFailure::new(SwapState::Init, error);

    let request: SwapRequest = serde_json::from_str(input)
        .map_err(|e| at_init(ExecutionError::InvalidInput(format!("Invalid request: {}", e))))?;
    let policy = ExecutionPolicy::load(cli.policy_file.clone()).map_err(at_init)?;

    let mut builder = SwapExecutorBuilder::new()
        .network(request.network)
        .policy(policy);
    if let Some(networks_file) = &cli.networks_file {
        builder = builder.networks_file_path(networks_file.clone());
    }
    let env_key = format!("{}_RPC_URL", request.network.name().to_uppercase());
    if let Some(rpc_url) = cli
        .rpc_url
        .clone()
        .or_else(|| std::env::var(&env_key).ok())
    {
        builder = builder.rpc_url(rpc_url);
    }

    let executor = builder.build().await.map_err(at_init)?;
    executor.execute_request(&request).await
}
