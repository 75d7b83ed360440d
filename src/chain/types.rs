//! JSON shapes exchanged with the LCD, Tendermint RPC and faucet

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Accepts `"123"`, `123` or `null` (LCD and RPC disagree on integer encoding).
pub fn de_u64_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("not a u64: {}", n))),
        Value::String(s) if s.is_empty() => Ok(0),
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!(
            "expected integer, got {}",
            other
        ))),
    }
}

/// Integer in a JSON value that may be a string or a number
pub fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct BroadcastRequest {
    pub tx_bytes: String,
    pub mode: String,
}

impl BroadcastRequest {
    pub fn sync(tx_bytes: String) -> Self {
        Self {
            tx_bytes,
            mode: "BROADCAST_MODE_SYNC".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BroadcastResponse {
    pub tx_response: TxResponse,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TxResponse {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub txhash: String,
    #[serde(default, deserialize_with = "de_u64_lenient")]
    pub height: u64,
    #[serde(default)]
    pub raw_log: String,
}

/// `BaseAccount` fields needed for signing
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub address: String,
    #[serde(default, deserialize_with = "de_u64_lenient")]
    pub account_number: u64,
    #[serde(default, deserialize_with = "de_u64_lenient")]
    pub sequence: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AccountResponse {
    pub account: AccountInfo,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinAmount {
    pub denom: String,
    pub amount: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BalancesResponse {
    #[serde(default)]
    pub balances: Vec<CoinAmount>,
}

/// Balance of the configured minimal denom
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Balance {
    /// Minimal units
    pub amount: u128,
    pub denom: String,
    /// e.g. `1.500000 STAKE`
    pub readable: String,
}

/// Header fields and transaction count of one block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockSummary {
    pub height: u64,
    pub time: String,
    pub tx_count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct FaucetRequest {
    pub address: String,
    pub amount: String,
    pub denom: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FaucetReceipt {
    pub tx_hash: Option<String>,
    pub amount: String,
    pub denom: String,
    pub explorer_url: Option<String>,
    pub message: String,
}

/// On-chain identity record
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(default, deserialize_with = "de_u64_lenient")]
    pub id: u64,
    #[serde(default)]
    pub creator: String,
    #[serde(default, alias = "full_name")]
    pub full_name: String,
    #[serde(default, alias = "date_of_birth")]
    pub date_of_birth: String,
    #[serde(default, alias = "cccd_id", alias = "cccdId")]
    pub national_id: String,
    #[serde(default, alias = "is_verified")]
    pub is_verified: bool,
    #[serde(default, alias = "verified_by")]
    pub verified_by: String,
}
