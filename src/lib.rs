//! PhiWallet: transaction construction and history resolution for a
//! Cosmos-SDK identity chain
//!
//! This crate holds the signing-key lifecycle, the hand-rolled protobuf
//! encoder for chain messages the stock client libraries do not know about,
//! and a history resolver that degrades across incompatible node APIs.
//!
//! # Architecture
//!
//! - **Wire Encoder** (`encoding`): byte-exact proto3 output from static field tables
//! - **Credential Vault** (`vault`): recovery phrase at rest only as AEAD ciphertext
//! - **Transaction Builder** (`tx`): compose, resolve credential, sign, broadcast once
//! - **History Resolver** (`history`): ordered fallback tiers, never fails
//! - **Wallet Manager** (`manager`): lifecycle orchestration over an injected repository
//!
//! # Example
//!
//! ```ignore
//! use phi_wallet::{ChainConfig, Credential, FileWalletStore, TxRequest, WalletManager};
//! use std::sync::Arc;
//!
//! let manager = WalletManager::new(ChainConfig::from_env(), Arc::new(FileWalletStore::new()))?;
//! let created = manager.create_wallet("Main", "correct horse")?;
//!
//! let mut tx = manager.prepare(
//!     TxRequest::CreateIdentity { national_id: "001234567890".into() },
//!     None,
//! )?;
//! let receipt = manager.execute(&mut tx, Credential::Password("correct horse")).await?;
//! println!("{}", receipt.explorer_url);
//! ```

// Public modules
pub mod chain;
pub mod config;
pub mod encoding;
pub mod error;
pub mod history;
pub mod keys;
pub mod manager;
pub mod storage;
pub mod tx;
pub mod vault;

// Re-exports for convenience
pub use chain::{ChainClient, HttpTransport, NodeTransport};
pub use config::{ChainConfig, FeeConfig, VaultParams};
pub use encoding::{FieldSpec, FieldValue, TxMessage};
pub use error::{StorageError, WalletError};
pub use history::{HistoryRecord, HistoryResolver, HistoryStrategy, TxDirection};
pub use keys::KeyManager;
pub use manager::{CreatedWallet, WalletManager};
pub use storage::{FileWalletStore, MemoryWalletStore, WalletRepository};
pub use tx::{
    Credential, OfflineSigner, PreparedTx, TransactionBuilder, TxPhase, TxReceipt, TxRequest,
};
pub use vault::{CredentialVault, StoredWallet, WalletKind, WalletRecord};

// Common result type
pub type Result<T> = std::result::Result<T, WalletError>;
