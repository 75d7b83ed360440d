use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a transfer relative to the queried address
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxDirection {
    Sent,
    Received,
    Unknown,
}

impl TxDirection {
    /// `Sent` if the queried address sent, else `Received` if it received, else `Unknown`.
    pub fn classify(from: &str, to: &str, queried: &str) -> Self {
        if !queried.is_empty() && from == queried {
            TxDirection::Sent
        } else if !queried.is_empty() && to == queried {
            TxDirection::Received
        } else {
            TxDirection::Unknown
        }
    }
}

/// Which fallback tier produced a record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    Indexed,
    Search,
    /// Synthetic: one record per non-empty block, contents not decoded
    BlockScan,
    /// Synthetic: fixed sample data
    Placeholder,
}

impl RecordSource {
    pub fn is_synthetic(self) -> bool {
        matches!(self, RecordSource::BlockScan | RecordSource::Placeholder)
    }
}

/// Tier output before normalization.
///
/// Transfer fields hold the decoded attribute values of the last `transfer`
/// event, or fixed values for synthetic tiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRecord {
    pub source: RecordSource,
    pub hash: String,
    pub height: u64,
    /// RFC 3339; `None` or unparseable means "now"
    pub timestamp: Option<String>,
    pub sender: Option<String>,
    pub recipient: Option<String>,
    /// Composite coin string, e.g. `1000000stake`
    pub amount: Option<String>,
    pub fee: Option<String>,
    pub memo: Option<String>,
    /// Missing code means the node omitted a zero result code
    pub code: Option<u32>,
}

impl RawRecord {
    pub fn new(source: RecordSource, hash: impl Into<String>, height: u64) -> Self {
        Self {
            source,
            hash: hash.into(),
            height,
            timestamp: None,
            sender: None,
            recipient: None,
            amount: None,
            fee: None,
            memo: None,
            code: None,
        }
    }
}

/// Canonical history entry handed to the UI
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub hash: String,
    pub height: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub direction: TxDirection,
    /// Minimal units
    pub amount: String,
    pub readable_amount: String,
    pub denom: String,
    pub from_address: String,
    pub to_address: String,
    pub fee: String,
    pub memo: String,
    pub success: bool,
    pub explorer_url: String,
    pub source: RecordSource,
}
