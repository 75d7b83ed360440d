//! Common test utilities for wallet integration tests
//!
//! Each test spawns its own in-memory node on an ephemeral port and points a
//! `WalletManager` at it, backed by a temporary wallet directory.

#![allow(dead_code)]

use node_mock::MockChain;
use phi_wallet::config::{ChainConfig, VaultParams};
use phi_wallet::keys::KeyManager;
use phi_wallet::{FileWalletStore, WalletManager};
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;

pub const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
pub const PASSWORD: &str = "correct horse battery";

pub fn init_logging() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

/// Config with every endpoint on the mock and cheap vault parameters
pub fn config_for(addr: SocketAddr) -> ChainConfig {
    let base = format!("http://{}", addr);
    let mut config = ChainConfig::default();
    config.rest_endpoint = base.clone();
    config.rpc_endpoint = base.clone();
    config.explorer_url = base.clone();
    config.faucet_endpoint = format!("{}/faucet", base);
    config.request_timeout_secs = 5;
    config.vault = VaultParams {
        m_cost: 64,
        t_cost: 1,
        p_cost: 1,
    };
    config
}

/// Second address of the test phrase, used as a counterparty
pub fn counterparty(config: &ChainConfig) -> String {
    KeyManager::derive_account(PHRASE, "m/44'/118'/0'/0/1", &config.address_prefix)
        .unwrap()
        .address
        .clone()
}

/// Test environment with automatic cleanup
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub chain: Arc<MockChain>,
    pub config: ChainConfig,
    pub manager: WalletManager,
}

impl TestEnvironment {
    pub async fn new() -> anyhow::Result<Self> {
        init_logging();

        let chain = Arc::new(MockChain::default());
        let (addr, _handle) = node_mock::spawn(chain.clone()).await?;
        let config = config_for(addr);

        let temp_dir = TempDir::new()?;
        log::info!("📁 Test directory: {:?}", temp_dir.path());
        let store = FileWalletStore::new_with_base_dir(temp_dir.path().to_path_buf());

        let manager = WalletManager::new(config.clone(), Arc::new(store))?;

        Ok(Self {
            temp_dir,
            chain,
            config,
            manager,
        })
    }

    /// Import the test phrase under `PASSWORD` and return its address
    pub fn import_test_wallet(&self) -> anyhow::Result<String> {
        let info = self.manager.import_wallet("Main", PHRASE, PASSWORD)?;
        Ok(info.accounts[0].address.clone())
    }
}
