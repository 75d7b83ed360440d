//! In-memory chain state behind the mock endpoints

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::types::{Attribute, Event, IdentityJson};

/// Query surfaces that can be switched off to exercise client fallbacks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
    /// `/cosmos/tx/v1beta1/txs` and legacy `/txs`
    Indexed,
    /// `/tx_search`
    Search,
    /// `/block`
    Blocks,
}

/// A committed transfer
#[derive(Clone, Debug)]
pub struct MockTx {
    pub hash: String,
    pub height: u64,
    pub timestamp: String,
    pub sender: String,
    pub recipient: String,
    /// Composite coin string, e.g. `1000000stake`
    pub amount: String,
    pub fee: String,
    pub memo: String,
    pub code: u32,
    /// base64 `TxRaw` as it appears in block data
    pub raw: String,
}

impl MockTx {
    pub fn transfer(sender: &str, recipient: &str, amount: &str) -> Self {
        Self {
            hash: String::new(),
            height: 0,
            timestamp: Utc::now().to_rfc3339(),
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            amount: amount.to_string(),
            fee: "5000".to_string(),
            memo: String::new(),
            code: 0,
            raw: "dHg=".to_string(),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        vec![Event {
            kind: "transfer".to_string(),
            attributes: vec![
                Attribute::new("recipient", &self.recipient),
                Attribute::new("sender", &self.sender),
                Attribute::new("amount", &self.amount),
            ],
        }]
    }

    /// True when `key` (`transfer.sender`, `message.sender`, ...) equals `address`
    pub fn matches(&self, key: &str, address: &str) -> bool {
        match key {
            "transfer.recipient" => self.recipient == address,
            "transfer.sender" | "message.sender" => self.sender == address,
            _ => false,
        }
    }
}

#[derive(Clone, Debug)]
struct Account {
    number: u64,
    sequence: u64,
    balances: HashMap<String, u128>,
}

#[derive(Debug)]
struct Inner {
    height: u64,
    block_times: HashMap<u64, String>,
    accounts: HashMap<String, Account>,
    txs: Vec<MockTx>,
    identities: Vec<IdentityJson>,
    broadcast_outcome: (u32, String),
    broadcasts: Vec<String>,
    down: Vec<Surface>,
    faucet_denom: String,
}

/// Shared state; every handler takes the lock for the duration of one request.
#[derive(Debug)]
pub struct MockChain {
    inner: Mutex<Inner>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new("stake")
    }
}

impl MockChain {
    pub fn new(faucet_denom: &str) -> Self {
        Self {
            inner: Mutex::new(Inner {
                height: 1,
                block_times: HashMap::new(),
                accounts: HashMap::new(),
                txs: Vec::new(),
                identities: Vec::new(),
                broadcast_outcome: (0, String::new()),
                broadcasts: Vec::new(),
                down: Vec::new(),
                faucet_denom: faucet_denom.to_string(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ============================================================================
    // Setup
    // ============================================================================

    /// Create or top up an account
    pub fn fund(&self, address: &str, denom: &str, amount: u128) {
        let mut inner = self.lock();
        let next_number = inner.accounts.len() as u64;
        let account = inner
            .accounts
            .entry(address.to_string())
            .or_insert_with(|| Account {
                number: next_number,
                sequence: 0,
                balances: HashMap::new(),
            });
        *account.balances.entry(denom.to_string()).or_insert(0) += amount;
    }

    /// Commit a transfer in a new block and return its hash
    pub fn commit(&self, mut tx: MockTx) -> String {
        let mut inner = self.lock();
        inner.height += 1;
        tx.height = inner.height;
        if tx.hash.is_empty() {
            tx.hash = format!("MOCKTX{:058X}", inner.txs.len() + 1);
        }
        let hash = tx.hash.clone();
        inner.block_times.insert(tx.height, tx.timestamp.clone());
        inner.txs.push(tx);
        hash
    }

    /// Advance the chain by `count` empty blocks
    pub fn mine_empty(&self, count: u64) {
        let mut inner = self.lock();
        inner.height += count;
    }

    pub fn add_identity(&self, identity: IdentityJson) {
        self.lock().identities.push(identity);
    }

    /// Result code and raw log returned by the next broadcasts
    pub fn set_broadcast_outcome(&self, code: u32, raw_log: &str) {
        self.lock().broadcast_outcome = (code, raw_log.to_string());
    }

    pub fn set_down(&self, surface: Surface, down: bool) {
        let mut inner = self.lock();
        inner.down.retain(|s| *s != surface);
        if down {
            inner.down.push(surface);
        }
    }

    // ============================================================================
    // Reads
    // ============================================================================

    pub fn is_down(&self, surface: Surface) -> bool {
        self.lock().down.contains(&surface)
    }

    pub fn height(&self) -> u64 {
        self.lock().height
    }

    /// `(account_number, sequence)`
    pub fn account(&self, address: &str) -> Option<(u64, u64)> {
        self.lock()
            .accounts
            .get(address)
            .map(|a| (a.number, a.sequence))
    }

    pub fn balances(&self, address: &str) -> Vec<(String, u128)> {
        let inner = self.lock();
        let mut balances: Vec<_> = inner
            .accounts
            .get(address)
            .map(|a| a.balances.iter().map(|(d, v)| (d.clone(), *v)).collect())
            .unwrap_or_default();
        balances.sort();
        balances
    }

    /// Committed transfers matching `key = address`, newest first
    pub fn txs_matching(&self, key: &str, address: &str, limit: usize) -> Vec<MockTx> {
        self.lock()
            .txs
            .iter()
            .rev()
            .filter(|tx| tx.matches(key, address))
            .take(limit)
            .cloned()
            .collect()
    }

    /// `(time, raw txs)` of block `height`; `None` above the tip
    pub fn block(&self, height: u64) -> Option<(String, Vec<String>)> {
        let inner = self.lock();
        if height == 0 || height > inner.height {
            return None;
        }
        let time = inner
            .block_times
            .get(&height)
            .cloned()
            .unwrap_or_else(|| Utc::now().to_rfc3339());
        let txs = inner
            .txs
            .iter()
            .filter(|tx| tx.height == height)
            .map(|tx| tx.raw.clone())
            .collect();
        Some((time, txs))
    }

    pub fn identities(&self) -> Vec<IdentityJson> {
        self.lock().identities.clone()
    }

    /// base64 `tx_bytes` of every broadcast received, in order
    pub fn broadcasts(&self) -> Vec<String> {
        self.lock().broadcasts.clone()
    }

    // ============================================================================
    // Writes
    // ============================================================================

    /// Record a broadcast and answer with the configured outcome.
    ///
    /// Returns `(code, txhash, height, raw_log)`. The hash is the uppercase hex
    /// sha256 of the raw bytes, as on a real node. Accepted broadcasts land in
    /// a new block without decoding the transaction.
    pub fn broadcast(&self, tx_bytes_b64: &str, tx_bytes: &[u8]) -> (u32, String, u64, String) {
        let mut inner = self.lock();
        inner.broadcasts.push(tx_bytes_b64.to_string());
        let hash = hex::encode_upper(Sha256::digest(tx_bytes));
        let (code, raw_log) = inner.broadcast_outcome.clone();

        if code != 0 {
            return (code, hash, 0, raw_log);
        }

        inner.height += 1;
        let height = inner.height;
        inner.block_times.insert(height, Utc::now().to_rfc3339());
        (code, hash, height, raw_log)
    }

    /// Credit the faucet denom and commit the matching transfer
    pub fn faucet(&self, address: &str, amount: u128) -> String {
        let denom = self.lock().faucet_denom.clone();
        self.fund(address, &denom, amount);

        let mut tx = MockTx::transfer("faucet", address, &format!("{}{}", amount, denom));
        tx.memo = "Faucet tokens".to_string();
        self.commit(tx)
    }
}
