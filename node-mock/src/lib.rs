/// Cosmos Node Mock Library
///
/// This crate provides both a standalone binary and library components
/// for mocking a Cosmos-SDK node (LCD, Tendermint RPC and faucet) with in-memory state.

pub mod handlers;
pub mod server;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use server::{create_router, run_server, spawn};
pub use state::{MockChain, MockTx, Surface};
pub use types::*;
