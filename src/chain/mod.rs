//! Node access: LCD (REST), Tendermint RPC and faucet
//!
//! [`ChainClient`] builds the endpoint URLs and decodes responses; the actual
//! HTTP exchange goes through an injected [`NodeTransport`].

mod transport;
pub mod types;

pub use transport::{HttpTransport, NodeTransport};
pub use types::{
    AccountInfo, Balance, BlockSummary, CoinAmount, FaucetReceipt, Identity, TxResponse,
};

#[cfg(test)]
pub(crate) use transport::scripted;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;

use crate::config::ChainConfig;
use crate::error::WalletError;
use crate::tx::amount::format_units;
use types::{
    value_as_u64, AccountResponse, BalancesResponse, BroadcastRequest, BroadcastResponse,
    FaucetRequest,
};

#[derive(Clone)]
pub struct ChainClient {
    config: ChainConfig,
    transport: Arc<dyn NodeTransport>,
}

impl ChainClient {
    pub fn new(config: ChainConfig, transport: Arc<dyn NodeTransport>) -> Self {
        Self { config, transport }
    }

    /// Client over reqwest with the configured request timeout
    pub fn http(config: ChainConfig) -> Result<Self, WalletError> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn rest_url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, WalletError> {
        build_url(&self.config.rest_endpoint, path, params)
    }

    fn rpc_url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, WalletError> {
        build_url(&self.config.rpc_endpoint, path, params)
    }

    // -----------------------------------------------------------------------
    // Transactions by event (LCD)
    // -----------------------------------------------------------------------

    /// `GET /cosmos/tx/v1beta1/txs?{param}={event}&pagination.limit={limit}`
    ///
    /// `param` is `events` (SDK <= 0.47) or `query` (SDK 0.50).
    pub async fn txs_by_event(
        &self,
        param: &str,
        event: &str,
        limit: usize,
    ) -> Result<Vec<Value>, WalletError> {
        let url = self.rest_url(
            "/cosmos/tx/v1beta1/txs",
            &[
                (param, event.to_string()),
                ("pagination.limit", limit.to_string()),
            ],
        )?;
        let data = self.transport.get_json(url.as_str()).await?;
        Ok(tx_array(&data))
    }

    /// Legacy `GET /txs?{key}={address}&limit={limit}`
    pub async fn legacy_txs(
        &self,
        key: &str,
        address: &str,
        limit: usize,
    ) -> Result<Vec<Value>, WalletError> {
        let url = self.rest_url(
            "/txs",
            &[(key, address.to_string()), ("limit", limit.to_string())],
        )?;
        let data = self.transport.get_json(url.as_str()).await?;
        Ok(tx_array(&data))
    }

    // -----------------------------------------------------------------------
    // Tendermint RPC
    // -----------------------------------------------------------------------

    /// `GET /tx_search?query="{query}"&per_page={n}&order_by="desc"`
    pub async fn tx_search(&self, query: &str, per_page: usize) -> Result<Vec<Value>, WalletError> {
        let url = self.rpc_url(
            "/tx_search",
            &[
                ("query", format!("\"{}\"", query)),
                ("per_page", per_page.to_string()),
                ("order_by", "\"desc\"".to_string()),
            ],
        )?;
        let data = self.transport.get_json(url.as_str()).await?;
        Ok(data
            .pointer("/result/txs")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    pub async fn latest_block(&self) -> Result<BlockSummary, WalletError> {
        let url = self.rpc_url("/block", &[])?;
        let data = self.transport.get_json(url.as_str()).await?;
        block_summary(&data)
    }

    pub async fn block(&self, height: u64) -> Result<BlockSummary, WalletError> {
        let url = self.rpc_url("/block", &[("height", height.to_string())])?;
        let data = self.transport.get_json(url.as_str()).await?;
        block_summary(&data)
    }

    // -----------------------------------------------------------------------
    // Accounts and balances
    // -----------------------------------------------------------------------

    pub async fn account(&self, address: &str) -> Result<AccountInfo, WalletError> {
        let url = self.rest_url(&format!("/cosmos/auth/v1beta1/accounts/{}", address), &[])?;
        let data = self.transport.get_json(url.as_str()).await?;
        let response: AccountResponse = serde_json::from_value(data)
            .map_err(|e| WalletError::network(format!("Malformed account response: {}", e)))?;
        Ok(response.account)
    }

    /// Balance of the configured minimal denom; zero when the denom is absent.
    pub async fn balance(&self, address: &str) -> Result<Balance, WalletError> {
        let url = self.rest_url(&format!("/cosmos/bank/v1beta1/balances/{}", address), &[])?;
        let data = self.transport.get_json(url.as_str()).await?;
        let response: BalancesResponse = serde_json::from_value(data)
            .map_err(|e| WalletError::network(format!("Malformed balance response: {}", e)))?;

        let currency = &self.config.currency;
        let amount = response
            .balances
            .iter()
            .find(|b| b.denom == currency.minimal_denom)
            .map(|b| b.amount.parse::<u128>())
            .transpose()
            .map_err(|e| WalletError::network(format!("Malformed balance amount: {}", e)))?
            .unwrap_or(0);

        Ok(Balance {
            amount,
            denom: currency.minimal_denom.clone(),
            readable: format!(
                "{} {}",
                format_units(amount, currency.decimals),
                currency.display_denom
            ),
        })
    }

    // -----------------------------------------------------------------------
    // Broadcast
    // -----------------------------------------------------------------------

    /// `POST /cosmos/tx/v1beta1/txs` in sync mode.
    ///
    /// Returns the node's `tx_response` as is; interpreting `code` is up to the caller.
    pub async fn broadcast(&self, tx_bytes: &[u8]) -> Result<TxResponse, WalletError> {
        let url = self.rest_url("/cosmos/tx/v1beta1/txs", &[])?;
        let request = BroadcastRequest::sync(STANDARD.encode(tx_bytes));
        let body = serde_json::to_value(&request)
            .map_err(|e| WalletError::Internal(e.to_string()))?;

        let data = self.transport.post_json(url.as_str(), &body).await?;
        let response: BroadcastResponse = serde_json::from_value(data)
            .map_err(|e| WalletError::network(format!("Malformed broadcast response: {}", e)))?;
        Ok(response.tx_response)
    }

    // -----------------------------------------------------------------------
    // Faucet
    // -----------------------------------------------------------------------

    pub async fn request_faucet(
        &self,
        address: &str,
        amount: Option<&str>,
    ) -> Result<FaucetReceipt, WalletError> {
        if address.trim().is_empty() {
            return Err(WalletError::invalid_input("Address is required"));
        }
        let amount = amount.unwrap_or(&self.config.faucet_amount).to_string();
        let denom = self.config.currency.minimal_denom.clone();

        log::info!("🚰 Requesting {}{} from faucet for {}", amount, denom, address);
        let request = FaucetRequest {
            address: address.to_string(),
            amount: amount.clone(),
            denom: denom.clone(),
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| WalletError::Internal(e.to_string()))?;
        let data = self
            .transport
            .post_json(&self.config.faucet_endpoint, &body)
            .await?;

        let tx_hash = ["txhash", "tx_hash", "transactionHash"]
            .iter()
            .find_map(|k| data.get(*k).and_then(Value::as_str))
            .map(str::to_string);

        Ok(FaucetReceipt {
            explorer_url: tx_hash.as_deref().map(|h| self.config.explorer_tx_url(h)),
            tx_hash,
            amount,
            denom,
            message: data
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Tokens sent successfully")
                .to_string(),
        })
    }

    // -----------------------------------------------------------------------
    // Identity module
    // -----------------------------------------------------------------------

    /// Identity owned by `creator`, searching the list endpoint then the
    /// per-address path. `Ok(None)` when neither has it.
    pub async fn identity_by_creator(&self, creator: &str) -> Result<Option<Identity>, WalletError> {
        let endpoints = [
            self.rest_url("/vietchain/identity/identity", &[])?,
            self.rest_url(&format!("/vietchain/identity/identity/{}", creator), &[])?,
        ];

        let mut failures = Vec::new();
        for url in &endpoints {
            match self.transport.get_json(url.as_str()).await {
                Ok(data) => {
                    if let Some(identity) = find_identity(&data, creator) {
                        return Ok(Some(identity));
                    }
                }
                Err(e) => {
                    log::debug!("Identity endpoint {} failed: {}", url, e);
                    failures.push(e);
                }
            }
        }

        // Unreachable node is an error; reachable but unknown creator is not
        match failures.pop() {
            Some(e) if failures.len() + 1 == endpoints.len() => Err(e),
            _ => Ok(None),
        }
    }
}

fn build_url(base: &str, path: &str, params: &[(&str, String)]) -> Result<Url, WalletError> {
    let raw = format!("{}{}", base.trim_end_matches('/'), path);
    let url = if params.is_empty() {
        Url::parse(&raw)
    } else {
        Url::parse_with_params(&raw, params.iter().map(|(k, v)| (*k, v.as_str())))
    };
    url.map_err(|e| WalletError::invalid_input(format!("Invalid endpoint URL {}: {}", raw, e)))
}

/// Transactions under `tx_responses` (preferred) or `txs`.
fn tx_array(data: &Value) -> Vec<Value> {
    ["tx_responses", "txs"]
        .iter()
        .filter_map(|k| data.get(*k).and_then(Value::as_array))
        .find(|a| !a.is_empty())
        .cloned()
        .unwrap_or_default()
}

fn block_summary(data: &Value) -> Result<BlockSummary, WalletError> {
    // Some RPC proxies drop the JSON-RPC `result` wrapper
    let block = data
        .pointer("/result/block")
        .or_else(|| data.get("block"))
        .ok_or_else(|| WalletError::network("Block response has no block"))?;

    let height = block
        .pointer("/header/height")
        .and_then(value_as_u64)
        .ok_or_else(|| WalletError::network("Block header has no height"))?;

    Ok(BlockSummary {
        height,
        time: block
            .pointer("/header/time")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        tx_count: block
            .pointer("/data/txs")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0),
    })
}

fn find_identity(data: &Value, creator: &str) -> Option<Identity> {
    let parse = |v: &Value| serde_json::from_value::<Identity>(v.clone()).ok();
    match data.get("identity")? {
        Value::Array(items) => items
            .iter()
            .filter_map(parse)
            .find(|id| id.creator == creator),
        single @ Value::Object(_) => parse(single).filter(|id| id.creator == creator),
        _ => None,
    }
}
