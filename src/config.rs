/// Chain configuration from defaults, environment variables or a TOML file
///
/// Controls node endpoints, address prefix, currency, fees and vault cost parameters.
/// Defaults target a local Ignite-scaffolded chain (`vietchain`).

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::error::{StorageError, WalletError};

/// Display and minimal denomination of the native token
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Human-facing denom, e.g. `STAKE`
    pub display_denom: String,
    /// On-chain denom, e.g. `stake`
    pub minimal_denom: String,
    /// Number of fraction digits between display and minimal units
    pub decimals: u32,
}

/// A single fee coin plus gas limit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    pub amount: u64,
    pub denom: String,
    pub gas: u64,
}

impl FeeConfig {
    pub fn new(amount: u64, denom: &str, gas: u64) -> Self {
        Self {
            amount,
            denom: denom.to_string(),
            gas,
        }
    }
}

/// Fixed fees per message family. Not user-editable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub transfer: FeeConfig,
    pub identity_create: FeeConfig,
    pub identity_update: FeeConfig,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            transfer: FeeConfig::new(5_000, "stake", 200_000),
            identity_create: FeeConfig::new(1_000, "token", 200_000),
            identity_update: FeeConfig::new(0, "token", 200_000),
        }
    }
}

/// Argon2id cost parameters for mnemonic encryption
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultParams {
    /// Memory cost in KiB
    pub m_cost: u32,
    /// Number of passes
    pub t_cost: u32,
    /// Degree of parallelism
    pub p_cost: u32,
}

impl Default for VaultParams {
    fn default() -> Self {
        Self {
            m_cost: 19_456,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

/// Bounds for the history fallback chain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryParams {
    /// Maximum number of recent blocks inspected by the linear scan
    pub block_scan_cap: u64,
    /// Upper bound on `per_page` for Tendermint `tx_search`
    pub search_page_cap: usize,
}

impl Default for HistoryParams {
    fn default() -> Self {
        Self {
            block_scan_cap: 50,
            search_page_cap: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub chain_id: String,
    pub chain_name: String,
    /// Tendermint RPC endpoint (block lookup, tx_search)
    pub rpc_endpoint: String,
    /// Cosmos LCD endpoint (txs, accounts, balances, broadcast)
    pub rest_endpoint: String,
    /// Bech32 human-readable prefix for account addresses
    pub address_prefix: String,
    pub currency: Currency,
    /// Base URL used to build `{explorer_url}/tx/{hash}` links
    pub explorer_url: String,
    pub faucet_endpoint: String,
    /// Faucet request amount in minimal units
    pub faucet_amount: String,
    /// BIP44 derivation path for the single account
    pub derivation_path: String,
    pub fees: FeeSchedule,
    pub vault: VaultParams,
    pub history: HistoryParams,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: "vietchain".to_string(),
            chain_name: "VietChain".to_string(),
            rpc_endpoint: "http://localhost:26657".to_string(),
            rest_endpoint: "http://localhost:1317".to_string(),
            address_prefix: "cosmos".to_string(),
            currency: Currency {
                display_denom: "STAKE".to_string(),
                minimal_denom: "stake".to_string(),
                decimals: 6,
            },
            explorer_url: "http://localhost:1317".to_string(),
            faucet_endpoint: "http://localhost:4500".to_string(),
            faucet_amount: "1000000".to_string(),
            derivation_path: "m/44'/118'/0'/0/0".to_string(),
            fees: FeeSchedule::default(),
            vault: VaultParams::default(),
            history: HistoryParams::default(),
            request_timeout_secs: 15,
        }
    }
}

impl ChainConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables (all optional):
    /// - `PHI_CHAIN_ID`: chain id (default `vietchain`)
    /// - `PHI_RPC_URL`: Tendermint RPC endpoint
    /// - `PHI_REST_URL`: LCD endpoint
    /// - `PHI_ADDRESS_PREFIX`: bech32 prefix
    /// - `PHI_EXPLORER_URL`: explorer base URL (defaults to the LCD endpoint)
    /// - `PHI_FAUCET_URL`: faucet endpoint
    /// - `PHI_REQUEST_TIMEOUT_SECS`: HTTP timeout
    ///
    /// # Examples
    ///
    /// ```bash
    /// PHI_REST_URL=http://node:1317 PHI_RPC_URL=http://node:26657 cargo test
    /// ```
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(chain_id) = env::var("PHI_CHAIN_ID") {
            config.chain_id = chain_id;
        }
        if let Ok(url) = env::var("PHI_RPC_URL") {
            log::info!("🔗 RPC endpoint: {}", url);
            config.rpc_endpoint = url;
        }
        if let Ok(url) = env::var("PHI_REST_URL") {
            log::info!("📡 REST endpoint: {}", url);
            config.explorer_url = url.clone();
            config.rest_endpoint = url;
        }
        if let Ok(prefix) = env::var("PHI_ADDRESS_PREFIX") {
            config.address_prefix = prefix;
        }
        if let Ok(url) = env::var("PHI_EXPLORER_URL") {
            config.explorer_url = url;
        }
        if let Ok(url) = env::var("PHI_FAUCET_URL") {
            config.faucet_endpoint = url;
        }
        if let Ok(raw) = env::var("PHI_REQUEST_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout_secs = secs,
                _ => log::warn!(
                    "⚠️  Invalid PHI_REQUEST_TIMEOUT_SECS '{}', keeping {}s",
                    raw,
                    config.request_timeout_secs
                ),
            }
        }

        config
    }

    /// Parse a TOML document. Missing keys take their default values.
    pub fn from_toml_str(raw: &str) -> Result<Self, WalletError> {
        toml::from_str(raw)
            .map_err(|e| WalletError::invalid_input(format!("Invalid chain config: {}", e)))
    }

    /// Load a TOML configuration file from disk
    pub fn from_file(path: &Path) -> Result<Self, WalletError> {
        let contents = std::fs::read_to_string(path).map_err(StorageError::from)?;
        Self::from_toml_str(&contents)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Explorer link for a transaction hash
    pub fn explorer_tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_local_chain() {
        let config = ChainConfig::default();
        assert_eq!(config.chain_id, "vietchain");
        assert_eq!(config.currency.decimals, 6);
        assert_eq!(config.history.block_scan_cap, 50);
        assert_eq!(config.fees.transfer.amount, 5_000);
        assert_eq!(config.fees.identity_update.amount, 0);
    }

    #[test]
    fn test_toml_overrides_only_given_keys() {
        let config = ChainConfig::from_toml_str(
            r#"
            chain_id = "phi-testnet"
            rest_endpoint = "http://10.0.0.5:1317"

            [currency]
            display_denom = "PHI"
            minimal_denom = "uphi"
            decimals = 6
            "#,
        )
        .unwrap();

        assert_eq!(config.chain_id, "phi-testnet");
        assert_eq!(config.rest_endpoint, "http://10.0.0.5:1317");
        assert_eq!(config.currency.minimal_denom, "uphi");
        assert_eq!(config.rpc_endpoint, "http://localhost:26657");
    }

    #[test]
    fn test_invalid_toml_is_validation_error() {
        let err = ChainConfig::from_toml_str("chain_id = [").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_explorer_url_strips_trailing_slash() {
        let config = ChainConfig {
            explorer_url: "http://explorer.local/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.explorer_tx_url("ABC123"),
            "http://explorer.local/tx/ABC123"
        );
    }
}
