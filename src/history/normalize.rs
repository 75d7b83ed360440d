//! Mapping tier output into [`HistoryRecord`]s

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::record::{HistoryRecord, RawRecord, TxDirection};
use crate::config::ChainConfig;
use crate::tx::amount::{format_units, split_amount_denom};

/// Attribute keys that are never base64-encoded
const PLAIN_KEYS: &[&str] = &[
    "amount",
    "sender",
    "recipient",
    "spender",
    "receiver",
    "minter",
    "burner",
    "module",
    "action",
    "msg_index",
    "fee",
    "fee_payer",
    "acc_seq",
    "signature",
];

/// Decoded attribute values of the last `transfer` event
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransferAttributes {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<String>,
}

fn decode_base64_utf8(s: &str) -> Option<String> {
    let bytes = STANDARD.decode(s).ok()?;
    String::from_utf8(bytes).ok()
}

/// Decode an attribute pair that may arrive base64-encoded (Tendermint 0.34).
///
/// A key that is not a known plain key and decodes to UTF-8 marks the pair as
/// encoded; the value is then decoded too, falling back to its raw text.
pub fn decode_attribute(key: &str, value: &str) -> (String, String) {
    if PLAIN_KEYS.contains(&key) {
        return (key.to_string(), value.to_string());
    }
    match decode_base64_utf8(key) {
        Some(decoded_key) => {
            let decoded_value = decode_base64_utf8(value).unwrap_or_else(|| value.to_string());
            (decoded_key, decoded_value)
        }
        None => (key.to_string(), value.to_string()),
    }
}

/// Pull sender/recipient/amount out of an `events` array.
///
/// Later attributes overwrite earlier ones, so the last transfer event wins.
pub fn extract_transfer(events: &Value, decode: bool) -> TransferAttributes {
    let mut attrs = TransferAttributes::default();

    let transfers = events
        .as_array()
        .into_iter()
        .flatten()
        .filter(|e| e.get("type").and_then(Value::as_str) == Some("transfer"));

    for event in transfers {
        let pairs = event
            .get("attributes")
            .and_then(Value::as_array)
            .into_iter()
            .flatten();
        for attr in pairs {
            let key = attr.get("key").and_then(Value::as_str).unwrap_or_default();
            let value = attr.get("value").and_then(Value::as_str).unwrap_or_default();
            let (key, value) = if decode {
                decode_attribute(key, value)
            } else {
                (key.to_string(), value.to_string())
            };

            match key.as_str() {
                "sender" => attrs.sender = Some(value),
                "recipient" => attrs.recipient = Some(value),
                "amount" => attrs.amount = Some(value),
                _ => {}
            }
        }
    }
    attrs
}

fn parse_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

/// Map one raw record into the canonical shape for `queried`.
pub fn normalize(raw: RawRecord, queried: &str, config: &ChainConfig) -> HistoryRecord {
    let currency = &config.currency;

    let (amount, denom) = raw
        .amount
        .as_deref()
        .and_then(split_amount_denom)
        .unwrap_or_else(|| ("0".to_string(), currency.minimal_denom.clone()));
    let units = amount.parse::<u128>().unwrap_or(0);

    let from_address = raw.sender.unwrap_or_default();
    let to_address = raw.recipient.unwrap_or_default();

    HistoryRecord {
        direction: TxDirection::classify(&from_address, &to_address, queried),
        timestamp: parse_timestamp(raw.timestamp.as_deref()),
        readable_amount: format!(
            "{} {}",
            format_units(units, currency.decimals),
            currency.display_denom
        ),
        amount,
        denom,
        from_address,
        to_address,
        fee: raw
            .fee
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| "N/A".to_string()),
        memo: raw.memo.unwrap_or_default(),
        success: raw.code.map_or(true, |c| c == 0),
        explorer_url: config.explorer_tx_url(&raw.hash),
        hash: raw.hash,
        height: raw.height,
        source: raw.source,
    }
}
