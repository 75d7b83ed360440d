//! Best-effort transaction history across heterogeneous node APIs
//!
//! [`HistoryResolver`] walks an ordered chain of [`HistoryStrategy`] tiers.
//! A tier that errors or returns nothing hands over to the next one; the
//! first non-empty tier wins and its records are normalized into
//! [`HistoryRecord`]s. The resolver itself never fails: when every real tier
//! comes up empty the placeholder tier supplies two sample records.

mod normalize;
mod record;
mod strategies;

pub use normalize::{decode_attribute, extract_transfer, normalize, TransferAttributes};
pub use record::{HistoryRecord, RawRecord, RecordSource, TxDirection};
pub use strategies::{
    BlockScanStrategy, HistoryStrategy, IndexedQueryStrategy, PlaceholderStrategy,
    SearchQueryStrategy,
};

use std::collections::HashSet;

use crate::chain::ChainClient;
use crate::config::ChainConfig;

pub struct HistoryResolver {
    config: ChainConfig,
    strategies: Vec<Box<dyn HistoryStrategy>>,
}

impl HistoryResolver {
    /// Standard chain: indexed query, search query, block scan, placeholder.
    pub fn new(client: ChainClient) -> Self {
        let config = client.config().clone();
        let strategies: Vec<Box<dyn HistoryStrategy>> = vec![
            Box::new(IndexedQueryStrategy::new(client.clone())),
            Box::new(SearchQueryStrategy::new(client.clone())),
            Box::new(BlockScanStrategy::new(client)),
            Box::new(PlaceholderStrategy::new(
                &config.address_prefix,
                &config.currency.minimal_denom,
            )),
        ];
        Self { config, strategies }
    }

    /// Custom tier order; `config` drives normalization only.
    pub fn with_strategies(config: ChainConfig, strategies: Vec<Box<dyn HistoryStrategy>>) -> Self {
        Self { config, strategies }
    }

    pub fn tiers(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// History for `address`, at most `limit` real records.
    ///
    /// Placeholder records are never truncated: when the real tiers come up
    /// empty (or `limit` is 0) the full placeholder set is returned.
    pub async fn resolve(&self, address: &str, limit: usize) -> Vec<HistoryRecord> {
        for strategy in &self.strategies {
            if limit == 0 && !strategy.is_placeholder() {
                continue;
            }
            log::debug!("📋 Trying {} tier for {}", strategy.name(), address);
            let raw = match strategy.attempt(address, limit).await {
                Ok(raw) if !raw.is_empty() => raw,
                Ok(_) => {
                    log::debug!("{} tier returned no transactions", strategy.name());
                    continue;
                }
                Err(e) => {
                    log::warn!("⚠️  {} tier failed: {}", strategy.name(), e);
                    continue;
                }
            };

            let records = self.finish(raw, address, limit);
            log::info!(
                "✅ {} transactions for {} from {} tier",
                records.len(),
                address,
                strategy.name()
            );
            return records;
        }

        log::warn!("⚠️  No history tier produced records for {}", address);
        Vec::new()
    }

    fn finish(&self, raw: Vec<RawRecord>, address: &str, limit: usize) -> Vec<HistoryRecord> {
        let mut seen = HashSet::new();
        let mut kept = 0;
        raw.into_iter()
            .filter(|r| seen.insert(r.hash.clone()))
            .filter(|r| {
                if r.source == RecordSource::Placeholder {
                    return true;
                }
                kept += 1;
                kept <= limit
            })
            .map(|r| normalize(r, address, &self.config))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::scripted::ScriptedTransport;
    use crate::error::WalletError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixed {
        name: &'static str,
        outcome: Result<Vec<RawRecord>, String>,
        calls: Arc<AtomicUsize>,
    }

    impl Fixed {
        fn boxed(
            name: &'static str,
            outcome: Result<Vec<RawRecord>, String>,
            calls: &Arc<AtomicUsize>,
        ) -> Box<dyn HistoryStrategy> {
            Box::new(Self {
                name,
                outcome,
                calls: calls.clone(),
            })
        }
    }

    #[async_trait]
    impl HistoryStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn attempt(&self, _: &str, _: usize) -> Result<Vec<RawRecord>, WalletError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone().map_err(WalletError::network)
        }
    }

    fn transfer(hash: &str, from: &str, to: &str) -> RawRecord {
        let mut raw = RawRecord::new(RecordSource::Indexed, hash, 1);
        raw.sender = Some(from.to_string());
        raw.recipient = Some(to.to_string());
        raw.amount = Some("2500000stake".to_string());
        raw
    }

    #[tokio::test]
    async fn test_first_non_empty_tier_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let later = Arc::new(AtomicUsize::new(0));
        let resolver = HistoryResolver::with_strategies(
            ChainConfig::default(),
            vec![
                Fixed::boxed("broken", Err("down".into()), &calls),
                Fixed::boxed("empty", Ok(vec![]), &calls),
                Fixed::boxed(
                    "real",
                    Ok(vec![
                        transfer("H1", "cosmos1me", "cosmos1you"),
                        transfer("H2", "cosmos1you", "cosmos1me"),
                        transfer("H1", "cosmos1me", "cosmos1you"),
                    ]),
                    &calls,
                ),
                Fixed::boxed("never", Ok(vec![transfer("X", "a", "b")]), &later),
            ],
        );

        let records = resolver.resolve("cosmos1me", 10).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].direction, TxDirection::Sent);
        assert_eq!(records[1].direction, TxDirection::Received);
        assert_eq!(records[1].readable_amount, "2.500000 STAKE");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_limit_caps_real_tiers_and_zero_skips_them() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = HistoryResolver::with_strategies(
            ChainConfig::default(),
            vec![
                Fixed::boxed(
                    "real",
                    Ok(vec![transfer("A", "x", "y"), transfer("B", "x", "y")]),
                    &calls,
                ),
                Box::new(PlaceholderStrategy::new("cosmos", "stake")),
            ],
        );
        assert_eq!(resolver.resolve("cosmos1me", 1).await.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let records = resolver.resolve("cosmos1me", 0).await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.source == RecordSource::Placeholder));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_placeholder_set_ignores_limit() {
        let transport = Arc::new(ScriptedTransport::new());
        let resolver = HistoryResolver::new(ChainClient::new(ChainConfig::default(), transport));
        for limit in [0, 1, 2, 10] {
            let records = resolver.resolve("cosmos1me", limit).await;
            assert_eq!(records.len(), 2, "limit {}", limit);
            assert_eq!(records[0].hash, "MOCK_ABC123DEF456");
            assert_eq!(records[1].hash, "MOCK_DEF789GHI012");
        }
    }

    #[tokio::test]
    async fn test_unreachable_node_degrades_to_placeholder() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = ChainClient::new(ChainConfig::default(), transport);
        let resolver = HistoryResolver::new(client);
        assert_eq!(
            resolver.tiers(),
            vec!["indexed query", "search query", "block scan", "placeholder"]
        );

        let records = resolver.resolve("cosmos1me", 10).await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.source == RecordSource::Placeholder));
        assert!(records.iter().all(|r| r.direction == TxDirection::Received));
        assert_eq!(records[0].readable_amount, "1.000000 STAKE");
        assert_eq!(records[0].fee, "5000");
    }

    #[tokio::test]
    async fn test_search_tier_used_when_indexed_is_empty() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .ok("/cosmos/tx/v1beta1/txs", json!({"tx_responses": []}))
                .ok("/txs?", json!({"txs": []}))
                .ok(
                    "tx_search",
                    json!({"result": {"txs": [{
                        "hash": "S1", "height": "42",
                        "tx_result": {"code": 0, "events": [{"type": "transfer", "attributes": [
                            {"key": "sender", "value": "cosmos1me"},
                            {"key": "recipient", "value": "cosmos1you"},
                            {"key": "amount", "value": "10stake"}
                        ]}]}
                    }]}}),
                ),
        );
        let client = ChainClient::new(ChainConfig::default(), transport);
        let records = HistoryResolver::new(client).resolve("cosmos1me", 5).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hash, "S1");
        assert_eq!(records[0].height, 42);
        assert_eq!(records[0].direction, TxDirection::Sent);
        assert_eq!(records[0].source, RecordSource::Search);
    }
}
