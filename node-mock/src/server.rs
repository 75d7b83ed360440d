//! Axum HTTP server setup and routing

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::state::MockChain;

pub fn create_router(chain: Arc<MockChain>) -> Router {
    // Browser wallets call the node cross-origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // LCD
        .route("/cosmos/auth/v1beta1/accounts/:address", get(get_account))
        .route("/cosmos/bank/v1beta1/balances/:address", get(get_balances))
        .route(
            "/cosmos/tx/v1beta1/txs",
            get(get_txs_by_event).post(broadcast_tx),
        )
        .route("/txs", get(get_legacy_txs))
        // Identity module
        .route("/vietchain/identity/identity", get(list_identities))
        .route("/vietchain/identity/identity/:creator", get(get_identity))
        // Tendermint RPC
        .route("/tx_search", get(tx_search))
        .route("/block", get(get_block))
        // Faucet
        .route("/faucet", post(request_faucet))
        // Shared state
        .with_state(chain)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(chain: Arc<MockChain>, host: String, port: u16) -> anyhow::Result<()> {
    let app = create_router(chain);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("🚀 Node mock listening on http://{}", addr);
    log::info!("📡 LCD and Tendermint RPC share this address");
    log::info!("🚰 Faucet endpoint: POST /faucet");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve `chain` on an ephemeral localhost port in the background
pub async fn spawn(chain: Arc<MockChain>) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_router(chain);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("Node mock stopped: {}", e);
        }
    });

    log::debug!("Node mock spawned on {}", addr);
    Ok((addr, handle))
}
