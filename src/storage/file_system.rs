use std::fs;
use std::path::{Path, PathBuf};

use super::WalletRepository;
use crate::error::StorageError;
use crate::vault::WalletRecord;

const RECORD_FILE: &str = "wallet.json";

#[derive(Clone, Debug)]
pub struct FileWalletStore {
    base_path: PathBuf,
}

impl FileWalletStore {
    /// Store under the default base directory ("./wallets")
    pub fn new() -> Self {
        Self {
            base_path: PathBuf::from("./wallets"),
        }
    }

    /// Store under a custom base directory (for testing)
    pub fn new_with_base_dir(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_path
    }

    fn record_path(&self) -> PathBuf {
        self.base_path.join(RECORD_FILE)
    }
}

impl Default for FileWalletStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletRepository for FileWalletStore {
    fn load(&self) -> Result<Option<WalletRecord>, StorageError> {
        let path = self.record_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        let record = serde_json::from_str(&contents)?;
        Ok(Some(record))
    }

    fn save(&self, record: &WalletRecord) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path)?;

        // Write-then-rename: readers never observe a partial record
        let path = self.record_path();
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        log::debug!("Saved wallet record '{}' to {:?}", record.name, path);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let path = self.record_path();
        if !path.exists() {
            return Ok(());
        }

        log::warn!("Deleting wallet record: {:?}", path);
        fs::remove_file(&path)?;
        Ok(())
    }
}
