//! Wallet persistence
//!
//! - `WalletRepository`: load/save/clear seam injected into the manager
//! - File-system store (one JSON document)
//! - In-memory store for tests and ephemeral sessions

mod file_system;
mod memory;

pub use file_system::FileWalletStore;
pub use memory::MemoryWalletStore;

use crate::error::StorageError;
use crate::vault::WalletRecord;

/// Storage for the single active wallet record.
///
/// Implementations only move records; they never inspect or transform the
/// secret fields.
pub trait WalletRepository: Send + Sync {
    /// `Ok(None)` when nothing is stored
    fn load(&self) -> Result<Option<WalletRecord>, StorageError>;

    fn save(&self, record: &WalletRecord) -> Result<(), StorageError>;

    /// Remove the stored record. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), StorageError>;
}
