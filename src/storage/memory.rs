use std::sync::Mutex;

use super::WalletRepository;
use crate::error::StorageError;
use crate::vault::WalletRecord;

#[derive(Debug, Default)]
pub struct MemoryWalletStore {
    record: Mutex<Option<WalletRecord>>,
}

impl MemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<WalletRecord>> {
        // A poisoned lock still holds a complete record; writes are single assignments.
        self.record.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl WalletRepository for MemoryWalletStore {
    fn load(&self) -> Result<Option<WalletRecord>, StorageError> {
        Ok(self.slot().clone())
    }

    fn save(&self, record: &WalletRecord) -> Result<(), StorageError> {
        *self.slot() = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.slot() = None;
        Ok(())
    }
}
