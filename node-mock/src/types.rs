//! Cosmos LCD and Tendermint RPC response types
//!
//! These match the shapes a Cosmos-SDK 0.47 node returns so clients can consume them transparently.

use serde::{Deserialize, Serialize};

// ============================================================================
// LCD (REST)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseAccount {
    #[serde(rename = "@type")]
    pub type_url: String,
    pub address: String,
    pub account_number: String,
    pub sequence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account: BaseAccount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinJson {
    pub denom: String,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancesResponse {
    pub balances: Vec<CoinJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeJson {
    pub amount: Vec<CoinJson>,
    pub gas_limit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthInfoJson {
    pub fee: FeeJson,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyJson {
    pub memo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxJson {
    pub body: BodyJson,
    pub auth_info: AuthInfoJson,
}

/// One entry of `tx_responses`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedTx {
    pub txhash: String,
    pub height: String,
    pub code: u32,
    pub timestamp: String,
    pub tx: TxJson,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxsResponse {
    pub tx_responses: Vec<IndexedTx>,
}

/// Legacy `/txs` answers under `txs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyTxsResponse {
    pub txs: Vec<IndexedTx>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastRequest {
    pub tx_bytes: String,
    #[serde(default)]
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastTxResponse {
    pub code: u32,
    pub txhash: String,
    pub height: String,
    pub raw_log: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastResponse {
    pub tx_response: BroadcastTxResponse,
}

// ============================================================================
// Tendermint RPC
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcEnvelope<T> {
    pub jsonrpc: String,
    pub id: i64,
    pub result: T,
}

impl<T> RpcEnvelope<T> {
    pub fn new(result: T) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: -1,
            result,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxResult {
    pub code: u32,
    /// Tendermint 0.34 style: base64 keys and values
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchTx {
    pub hash: String,
    pub height: String,
    pub tx_result: TxResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxSearchResult {
    pub txs: Vec<SearchTx>,
    pub total_count: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockData {
    pub txs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub data: BlockData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockResult {
    pub block: Block,
}

// ============================================================================
// Faucet and identity module
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct FaucetRequest {
    pub address: String,
    #[serde(default)]
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaucetResponse {
    pub txhash: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityJson {
    pub id: String,
    pub creator: String,
    pub full_name: String,
    pub date_of_birth: String,
    pub cccd_id: String,
    pub is_verified: bool,
    pub verified_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityListResponse {
    pub identity: Vec<IdentityJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub identity: IdentityJson,
}
