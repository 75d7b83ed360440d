//! The four retrieval tiers, most faithful first

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use std::collections::HashSet;

use super::normalize::extract_transfer;
use super::record::{RawRecord, RecordSource};
use crate::chain::types::value_as_u64;
use crate::chain::ChainClient;
use crate::error::WalletError;

/// One tier of the history fallback chain.
#[async_trait]
pub trait HistoryStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Synthetic tier: always answers, ignores `limit`.
    fn is_placeholder(&self) -> bool {
        false
    }

    async fn attempt(&self, address: &str, limit: usize) -> Result<Vec<RawRecord>, WalletError>;
}

/// Union of variant results, keyed by hash, first occurrence kept.
#[derive(Default)]
struct Union {
    seen: HashSet<String>,
    records: Vec<RawRecord>,
}

impl Union {
    fn extend(&mut self, records: impl IntoIterator<Item = RawRecord>) {
        for record in records {
            if self.seen.insert(record.hash.clone()) {
                self.records.push(record);
            }
        }
    }

    fn finish(mut self, limit: usize) -> Vec<RawRecord> {
        self.records.truncate(limit);
        self.records
    }
}

/// Probe variants in order. Failures are logged and skipped; the tier only
/// errors when every variant failed.
fn settle(
    tier: &str,
    union: Union,
    failures: usize,
    variants: usize,
    last_error: Option<WalletError>,
    limit: usize,
) -> Result<Vec<RawRecord>, WalletError> {
    match last_error {
        Some(e) if failures == variants => {
            log::debug!("{}: all {} variants failed", tier, variants);
            Err(e)
        }
        _ => Ok(union.finish(limit)),
    }
}

// ---------------------------------------------------------------------------
// Tier 1: indexed event queries (LCD)
// ---------------------------------------------------------------------------

pub struct IndexedQueryStrategy {
    client: ChainClient,
}

impl IndexedQueryStrategy {
    pub fn new(client: ChainClient) -> Self {
        Self { client }
    }

    fn to_raw(tx: &Value) -> Option<RawRecord> {
        let hash = tx
            .get("txhash")
            .or_else(|| tx.get("hash"))
            .and_then(Value::as_str)?;
        let height = tx.get("height").and_then(value_as_u64).unwrap_or(0);

        let events = tx
            .get("events")
            .filter(|e| e.as_array().is_some_and(|a| !a.is_empty()))
            .or_else(|| tx.pointer("/logs/0/events"))
            .cloned()
            .unwrap_or(Value::Null);
        let transfer = extract_transfer(&events, false);

        let mut raw = RawRecord::new(RecordSource::Indexed, hash, height);
        raw.timestamp = tx.get("timestamp").and_then(Value::as_str).map(str::to_string);
        raw.sender = transfer.sender;
        raw.recipient = transfer.recipient;
        raw.amount = transfer.amount;
        raw.fee = tx
            .pointer("/tx/auth_info/fee/amount/0/amount")
            .and_then(Value::as_str)
            .map(str::to_string);
        raw.memo = tx.pointer("/tx/body/memo").and_then(Value::as_str).map(str::to_string);
        raw.code = tx
            .get("code")
            .and_then(value_as_u64)
            .map(|c| u32::try_from(c).unwrap_or(u32::MAX));
        Some(raw)
    }
}

enum IndexedVariant {
    Event(&'static str, &'static str),
    Legacy(&'static str),
}

const INDEXED_VARIANTS: [IndexedVariant; 6] = [
    IndexedVariant::Event("events", "transfer.recipient"),
    IndexedVariant::Event("events", "transfer.sender"),
    IndexedVariant::Event("query", "transfer.recipient"),
    IndexedVariant::Event("query", "transfer.sender"),
    IndexedVariant::Legacy("transfer.recipient"),
    IndexedVariant::Legacy("transfer.sender"),
];

#[async_trait]
impl HistoryStrategy for IndexedQueryStrategy {
    fn name(&self) -> &'static str {
        "indexed query"
    }

    async fn attempt(&self, address: &str, limit: usize) -> Result<Vec<RawRecord>, WalletError> {
        let mut union = Union::default();
        let mut failures = 0;
        let mut last_error = None;

        for variant in &INDEXED_VARIANTS {
            let result = match variant {
                IndexedVariant::Event(param, key) => {
                    let event = format!("{}='{}'", key, address);
                    self.client.txs_by_event(param, &event, limit).await
                }
                IndexedVariant::Legacy(key) => self.client.legacy_txs(key, address, limit).await,
            };

            match result {
                Ok(txs) => union.extend(txs.iter().filter_map(Self::to_raw)),
                Err(e) => {
                    log::debug!("Indexed variant failed: {}", e);
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        settle(self.name(), union, failures, INDEXED_VARIANTS.len(), last_error, limit)
    }
}

// ---------------------------------------------------------------------------
// Tier 2: Tendermint tx_search
// ---------------------------------------------------------------------------

pub struct SearchQueryStrategy {
    client: ChainClient,
}

const SEARCH_QUERIES: [&str; 3] = ["transfer.recipient", "transfer.sender", "message.sender"];

impl SearchQueryStrategy {
    pub fn new(client: ChainClient) -> Self {
        Self { client }
    }

    fn to_raw(tx: &Value) -> Option<RawRecord> {
        let hash = tx.get("hash").and_then(Value::as_str)?;
        let height = tx.get("height").and_then(value_as_u64).unwrap_or(0);
        let result = tx.get("tx_result").cloned().unwrap_or(Value::Null);

        let transfer = extract_transfer(result.get("events").unwrap_or(&Value::Null), true);

        let mut raw = RawRecord::new(RecordSource::Search, hash, height);
        raw.timestamp = result
            .get("timestamp")
            .and_then(Value::as_str)
            .map(str::to_string);
        raw.sender = transfer.sender;
        raw.recipient = transfer.recipient;
        raw.amount = transfer.amount;
        raw.code = result
            .get("code")
            .and_then(value_as_u64)
            .map(|c| u32::try_from(c).unwrap_or(u32::MAX));
        Some(raw)
    }
}

#[async_trait]
impl HistoryStrategy for SearchQueryStrategy {
    fn name(&self) -> &'static str {
        "search query"
    }

    async fn attempt(&self, address: &str, limit: usize) -> Result<Vec<RawRecord>, WalletError> {
        let per_page = limit.min(self.client.config().history.search_page_cap).max(1);
        let mut union = Union::default();
        let mut failures = 0;
        let mut last_error = None;

        for key in SEARCH_QUERIES {
            let query = format!("{}='{}'", key, address);
            match self.client.tx_search(&query, per_page).await {
                Ok(txs) => union.extend(txs.iter().filter_map(Self::to_raw)),
                Err(e) => {
                    log::debug!("Search query {} failed: {}", query, e);
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        settle(self.name(), union, failures, SEARCH_QUERIES.len(), last_error, limit)
    }
}

// ---------------------------------------------------------------------------
// Tier 3: linear block scan (stub)
// ---------------------------------------------------------------------------

/// Walks back from the latest block and emits one synthetic record per block
/// that contains transactions. Transaction bytes are not decoded, so these
/// records carry no amounts or addresses.
pub struct BlockScanStrategy {
    client: ChainClient,
}

impl BlockScanStrategy {
    pub fn new(client: ChainClient) -> Self {
        Self { client }
    }

    fn placeholder(height: u64, time: String) -> RawRecord {
        let mut raw = RawRecord::new(RecordSource::BlockScan, format!("block_{}_tx_1", height), height);
        raw.timestamp = Some(time);
        raw.sender = Some("unknown".to_string());
        raw.recipient = Some("unknown".to_string());
        raw.memo = Some(format!("Transaction in block {}", height));
        raw.code = Some(0);
        raw
    }
}

#[async_trait]
impl HistoryStrategy for BlockScanStrategy {
    fn name(&self) -> &'static str {
        "block scan"
    }

    async fn attempt(&self, _address: &str, limit: usize) -> Result<Vec<RawRecord>, WalletError> {
        let latest = self.client.latest_block().await?;
        let cap = self.client.config().history.block_scan_cap.min(latest.height);
        log::debug!("Scanning up to {} blocks below height {}", cap, latest.height);

        let mut records = Vec::new();
        for offset in 0..cap {
            if records.len() >= limit {
                break;
            }
            let height = latest.height - offset;
            match self.client.block(height).await {
                Ok(block) if block.tx_count > 0 => {
                    log::debug!("📦 Block {} has {} transactions", height, block.tx_count);
                    records.push(Self::placeholder(height, block.time));
                }
                Ok(_) => {}
                Err(e) => log::warn!("⚠️  Failed to get block {}: {}", height, e),
            }
        }
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Tier 4: fixed placeholder history
// ---------------------------------------------------------------------------

/// Two clearly marked sample records so the UI has something to render offline.
pub struct PlaceholderStrategy {
    faucet_address: String,
    minimal_denom: String,
}

impl PlaceholderStrategy {
    pub fn new(address_prefix: &str, minimal_denom: &str) -> Self {
        Self {
            faucet_address: format!("{}1faucet123456789abcdef", address_prefix),
            minimal_denom: minimal_denom.to_string(),
        }
    }

    fn sample(&self, hash: &str, height: u64, hours_ago: i64, memo: &str, to: &str) -> RawRecord {
        let mut raw = RawRecord::new(RecordSource::Placeholder, hash, height);
        raw.timestamp = Some((Utc::now() - Duration::hours(hours_ago)).to_rfc3339());
        raw.sender = Some(self.faucet_address.clone());
        raw.recipient = Some(to.to_string());
        raw.amount = Some(format!("1000000{}", self.minimal_denom));
        raw.fee = Some("5000".to_string());
        raw.memo = Some(memo.to_string());
        raw.code = Some(0);
        raw
    }
}

#[async_trait]
impl HistoryStrategy for PlaceholderStrategy {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn is_placeholder(&self) -> bool {
        true
    }

    async fn attempt(&self, address: &str, _limit: usize) -> Result<Vec<RawRecord>, WalletError> {
        Ok(vec![
            self.sample("MOCK_ABC123DEF456", 12_345, 1, "Faucet tokens (Mock)", address),
            self.sample("MOCK_DEF789GHI012", 12_346, 2, "Second faucet request (Mock)", address),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::scripted::ScriptedTransport;
    use crate::config::ChainConfig;
    use serde_json::json;
    use std::sync::Arc;

    fn client(transport: ScriptedTransport) -> (ChainClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        (
            ChainClient::new(ChainConfig::default(), transport.clone()),
            transport,
        )
    }

    fn lcd_tx(hash: &str, from: &str, to: &str) -> Value {
        json!({
            "txhash": hash,
            "height": "15",
            "code": 0,
            "timestamp": "2024-03-01T12:00:00Z",
            "tx": {"body": {"memo": "hi"}, "auth_info": {"fee": {"amount": [{"denom": "stake", "amount": "5000"}]}}},
            "events": [{"type": "transfer", "attributes": [
                {"key": "sender", "value": from},
                {"key": "recipient", "value": to},
                {"key": "amount", "value": "250stake"}
            ]}]
        })
    }

    #[tokio::test]
    async fn test_indexed_unions_and_dedupes() {
        let (client, transport) = client(
            ScriptedTransport::new()
                .ok(
                    "recipient%3D",
                    json!({"tx_responses": [lcd_tx("A", "cosmos1x", "cosmos1me")]}),
                )
                .ok(
                    "sender%3D",
                    json!({"tx_responses": [lcd_tx("B", "cosmos1me", "cosmos1x"), lcd_tx("A", "cosmos1x", "cosmos1me")]}),
                )
                .fail("/txs?"),
        );

        let records = IndexedQueryStrategy::new(client)
            .attempt("cosmos1me", 10)
            .await
            .unwrap();
        let hashes: Vec<_> = records.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(hashes, vec!["A", "B"]);
        assert_eq!(records[0].fee.as_deref(), Some("5000"));
        assert_eq!(records[0].memo.as_deref(), Some("hi"));
        // every variant probed in order, failures skipped
        assert_eq!(transport.calls().len(), 6);
    }

    #[tokio::test]
    async fn test_indexed_all_failed_is_error() {
        let (client, _) = client(ScriptedTransport::new());
        assert!(IndexedQueryStrategy::new(client)
            .attempt("cosmos1me", 10)
            .await
            .is_err());
    }

    #[test]
    fn test_indexed_reads_legacy_log_events() {
        let tx = json!({
            "txhash": "L", "height": 3,
            "logs": [{"events": [{"type": "transfer", "attributes": [
                {"key": "sender", "value": "cosmos1me"}
            ]}]}]
        });
        let raw = IndexedQueryStrategy::to_raw(&tx).unwrap();
        assert_eq!(raw.sender.as_deref(), Some("cosmos1me"));
        assert_eq!(raw.code, None);
    }

    #[test]
    fn test_oversized_result_code_saturates() {
        let mut tx = lcd_tx("BIG", "cosmos1me", "cosmos1x");
        tx["code"] = json!(5_000_000_000u64);
        let raw = IndexedQueryStrategy::to_raw(&tx).unwrap();
        assert_eq!(raw.code, Some(u32::MAX));

        let hit = json!({"hash": "S", "height": "1", "tx_result": {"code": 4_294_967_296u64, "events": []}});
        let raw = SearchQueryStrategy::to_raw(&hit).unwrap();
        assert_eq!(raw.code, Some(u32::MAX));
    }

    #[tokio::test]
    async fn test_search_caps_page_size() {
        let (client, transport) = client(ScriptedTransport::new().ok(
            "tx_search",
            json!({"result": {"txs": [{
                "hash": "S1", "height": "9",
                "tx_result": {"code": 0, "events": [{"type": "transfer", "attributes": [
                    {"key": "c2VuZGVy", "value": "Y29zbW9zMW1l"}
                ]}]}
            }]}}),
        ));
        let records = SearchQueryStrategy::new(client)
            .attempt("cosmos1me", 100)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sender.as_deref(), Some("cosmos1me"));
        assert!(transport.calls().iter().all(|u| u.contains("per_page=10")));
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_block_scan_stops_at_limit() {
        let (client, transport) = client(
            ScriptedTransport::new()
                .ok(
                    "height=",
                    json!({"result": {"block": {
                        "header": {"height": "1", "time": "2024-03-01T12:00:00Z"},
                        "data": {"txs": ["AA=="]}
                    }}}),
                )
                .ok(
                    "/block",
                    json!({"result": {"block": {
                        "header": {"height": "500", "time": "2024-03-01T12:00:00Z"},
                        "data": {"txs": []}
                    }}}),
                ),
        );
        let records = BlockScanStrategy::new(client)
            .attempt("cosmos1me", 3)
            .await
            .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].hash, "block_500_tx_1");
        assert_eq!(records[2].memo.as_deref(), Some("Transaction in block 498"));
        // latest + 3 block lookups
        assert_eq!(transport.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_block_scan_is_capped() {
        let (client, transport) = client(
            ScriptedTransport::new()
                .ok(
                    "height=",
                    json!({"result": {"block": {"header": {"height": "1"}, "data": {"txs": null}}}}),
                )
                .ok(
                    "/block",
                    json!({"result": {"block": {"header": {"height": "1000"}, "data": {}}}}),
                ),
        );
        let records = BlockScanStrategy::new(client)
            .attempt("cosmos1me", 10)
            .await
            .unwrap();
        assert!(records.is_empty());
        assert_eq!(transport.calls().len(), 1 + 50);
    }

    #[tokio::test]
    async fn test_placeholder_records() {
        let records = PlaceholderStrategy::new("cosmos", "stake")
            .attempt("cosmos1me", 10)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].hash, "MOCK_ABC123DEF456");
        assert_eq!(records[1].height, 12_346);
        assert_eq!(
            records[0].sender.as_deref(),
            Some("cosmos1faucet123456789abcdef")
        );
    }
}
