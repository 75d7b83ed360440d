//! Cosmos Node Mock Server
//!
//! A lightweight in-memory stand-in for a Cosmos-SDK node: LCD, Tendermint RPC
//! and a faucet on one port. Designed for wallet development and tests.

use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;

use node_mock::{run_server, MockChain};

#[derive(Debug)]
struct Config {
    // Chain
    denom: String,
    seed_address: Option<String>,
    seed_amount: u128,

    // Server
    server_host: String,
    server_port: u16,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let denom = env::var("MOCK_DENOM").unwrap_or_else(|_| "stake".to_string());

        let seed_address = env::var("MOCK_SEED_ADDRESS").ok();

        let seed_amount = env::var("MOCK_SEED_AMOUNT")
            .unwrap_or_else(|_| "100000000".to_string())
            .parse()
            .context("Invalid MOCK_SEED_AMOUNT")?;

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "1317".to_string())
            .parse()
            .context("Invalid SERVER_PORT")?;

        Ok(Self {
            denom,
            seed_address,
            seed_amount,
            server_host,
            server_port,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Cosmos node mock...");

    let config = Config::from_env().context("Failed to load configuration")?;
    log::info!("Server will listen on {}:{}", config.server_host, config.server_port);

    let chain = Arc::new(MockChain::new(&config.denom));
    if let Some(address) = &config.seed_address {
        chain.fund(address, &config.denom, config.seed_amount);
        log::info!("💰 Seeded {} with {}{}", address, config.seed_amount, config.denom);
    }

    run_server(chain, config.server_host, config.server_port)
        .await
        .context("Server error")?;

    Ok(())
}
