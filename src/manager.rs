//! Wallet Manager - Orchestration Layer
//!
//! Ties the repository, the credential vault and the chain client together
//! for the single active wallet. Secrets pass through here only as
//! `Zeroizing` buffers or ciphertext.

use std::sync::Arc;
use zeroize::Zeroizing;

use crate::chain::{Balance, ChainClient, FaucetReceipt, Identity};
use crate::config::ChainConfig;
use crate::error::WalletError;
use crate::history::{HistoryRecord, HistoryResolver};
use crate::keys::{decode_address, KeyManager};
use crate::storage::WalletRepository;
use crate::tx::{Credential, PreparedTx, TransactionBuilder, TxReceipt, TxRequest};
use crate::vault::{CredentialVault, StoredWallet, WalletInfo};

/// A freshly generated wallet. The phrase is handed out once for backup.
pub struct CreatedWallet {
    pub info: WalletInfo,
    pub mnemonic: Zeroizing<String>,
}

pub struct WalletManager {
    config: ChainConfig,
    repository: Arc<dyn WalletRepository>,
    vault: CredentialVault,
    client: ChainClient,
    builder: TransactionBuilder,
    history: HistoryResolver,
}

impl WalletManager {
    // ============================================================================
    // Constructor
    // ============================================================================

    /// Manager over reqwest, configured from `config`
    pub fn new(config: ChainConfig, repository: Arc<dyn WalletRepository>) -> Result<Self, WalletError> {
        let client = ChainClient::http(config)?;
        Ok(Self::with_client(client, repository))
    }

    /// Create WalletManager with a custom client (for testing)
    pub fn with_client(client: ChainClient, repository: Arc<dyn WalletRepository>) -> Self {
        let config = client.config().clone();
        let vault = CredentialVault::new(config.vault);
        Self {
            builder: TransactionBuilder::new(client.clone(), vault.clone()),
            history: HistoryResolver::new(client.clone()),
            config,
            repository,
            vault,
            client,
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    // ============================================================================
    // Wallet lifecycle
    // ============================================================================

    pub fn create_wallet(&self, name: &str, password: &str) -> Result<CreatedWallet, WalletError> {
        let mnemonic = KeyManager::generate()?;
        let info = self.store_encrypted(name, &mnemonic, password)?;
        Ok(CreatedWallet { info, mnemonic })
    }

    pub fn import_wallet(
        &self,
        name: &str,
        phrase: &str,
        password: &str,
    ) -> Result<WalletInfo, WalletError> {
        KeyManager::validate(phrase)?;
        let mnemonic = KeyManager::normalize_phrase(phrase)?;
        self.store_encrypted(name, &mnemonic, password)
    }

    /// Import a plaintext wallet. Use [`encrypt_legacy`](Self::encrypt_legacy) to migrate it.
    pub fn import_legacy(&self, name: &str, phrase: &str) -> Result<WalletInfo, WalletError> {
        KeyManager::validate(phrase)?;
        let mnemonic = KeyManager::normalize_phrase(phrase)?;
        let info = WalletInfo::new(&validated_name(name)?, &self.derive_address(&mnemonic)?);

        log::warn!("⚠️  Wallet '{}' stored without encryption", info.name);
        self.persist(StoredWallet::Legacy {
            info: info.clone(),
            mnemonic,
        })?;
        Ok(info)
    }

    /// Register a wallet whose keys live in an external keyring.
    pub fn register_keyring(&self, name: &str, address: &str) -> Result<WalletInfo, WalletError> {
        let address = address.trim();
        decode_address(&self.config.address_prefix, address)?;
        let info = WalletInfo::new(&validated_name(name)?, address);

        log::info!("🔑 Registered keyring wallet '{}' ({})", info.name, address);
        self.persist(StoredWallet::ExternalKeyring { info: info.clone() })?;
        Ok(info)
    }

    /// The stored wallet, if any
    pub fn load_active(&self) -> Result<Option<StoredWallet>, WalletError> {
        let Some(record) = self.repository.load()? else {
            return Ok(None);
        };
        Ok(Some(StoredWallet::try_from(record)?))
    }

    fn active(&self) -> Result<StoredWallet, WalletError> {
        self.load_active()?
            .ok_or_else(|| WalletError::invalid_input("No wallet connected"))
    }

    /// Check a password against the stored ciphertext without keeping the phrase.
    pub fn unlock(&self, password: &str) -> Result<(), WalletError> {
        match self.active()? {
            StoredWallet::Encrypted { ciphertext, .. } => {
                self.vault.unlock(&ciphertext, password)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn change_password(&self, old_password: &str, new_password: &str) -> Result<(), WalletError> {
        match self.active()? {
            StoredWallet::Encrypted { info, ciphertext } => {
                let ciphertext = self
                    .vault
                    .change_password(&ciphertext, old_password, new_password)?;
                self.persist(StoredWallet::Encrypted { info, ciphertext })?;
                log::info!("🔐 Password changed");
                Ok(())
            }
            other => Err(WalletError::invalid_input(format!(
                "Only encrypted wallets have a password (found {:?})",
                other.kind()
            ))),
        }
    }

    /// Migrate the active legacy wallet to encrypted storage in place.
    pub fn encrypt_legacy(&self, password: &str) -> Result<(), WalletError> {
        let migrated = self.vault.encrypt_legacy(self.active()?, password)?;
        self.persist(migrated)
    }

    pub fn reveal_phrase(&self, password: &str) -> Result<Zeroizing<String>, WalletError> {
        self.vault.reveal_phrase(&self.active()?, password)
    }

    pub fn disconnect(&self) -> Result<(), WalletError> {
        self.repository.clear()?;
        log::info!("👋 Wallet disconnected");
        Ok(())
    }

    fn store_encrypted(
        &self,
        name: &str,
        mnemonic: &str,
        password: &str,
    ) -> Result<WalletInfo, WalletError> {
        let name = validated_name(name)?;
        if password.is_empty() {
            return Err(WalletError::invalid_input("Password is required"));
        }
        let info = WalletInfo::new(&name, &self.derive_address(mnemonic)?);
        let ciphertext = self.vault.encrypt(mnemonic, password)?;

        log::info!("✅ Wallet '{}' ready at {}", info.name, info.accounts[0].address);
        self.persist(StoredWallet::Encrypted {
            info: info.clone(),
            ciphertext,
        })?;
        Ok(info)
    }

    fn derive_address(&self, mnemonic: &str) -> Result<String, WalletError> {
        let keys = KeyManager::derive_account(
            mnemonic,
            &self.config.derivation_path,
            &self.config.address_prefix,
        )?;
        Ok(keys.address.clone())
    }

    fn persist(&self, wallet: StoredWallet) -> Result<(), WalletError> {
        self.repository.save(&wallet.into_record())?;
        Ok(())
    }

    fn active_address(&self) -> Result<String, WalletError> {
        self.active()?
            .address()
            .map(str::to_string)
            .ok_or_else(|| WalletError::invalid_input("Wallet has no account"))
    }

    // ============================================================================
    // Chain queries
    // ============================================================================

    pub async fn balance(&self) -> Result<Balance, WalletError> {
        self.client.balance(&self.active_address()?).await
    }

    pub async fn request_faucet(&self, amount: Option<&str>) -> Result<FaucetReceipt, WalletError> {
        self.client.request_faucet(&self.active_address()?, amount).await
    }

    pub async fn identity(&self) -> Result<Option<Identity>, WalletError> {
        self.client.identity_by_creator(&self.active_address()?).await
    }

    /// Best-effort history; an empty list only when no wallet is connected.
    pub async fn history(&self, limit: usize) -> Vec<HistoryRecord> {
        match self.active_address() {
            Ok(address) => self.history.resolve(&address, limit).await,
            Err(e) => {
                log::debug!("No history without a wallet: {}", e);
                Vec::new()
            }
        }
    }

    // ============================================================================
    // Transactions
    // ============================================================================

    pub fn prepare(&self, request: TxRequest, memo: Option<&str>) -> Result<PreparedTx, WalletError> {
        self.builder.prepare(&self.active()?, request, memo)
    }

    pub async fn execute(
        &self,
        tx: &mut PreparedTx,
        credential: Credential<'_>,
    ) -> Result<TxReceipt, WalletError> {
        self.builder.execute(tx, credential).await
    }

    pub fn transactions(&self) -> &TransactionBuilder {
        &self.builder
    }
}

fn validated_name(name: &str) -> Result<String, WalletError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WalletError::invalid_input("Wallet name is required"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::scripted::ScriptedTransport;
    use crate::config::VaultParams;
    use crate::storage::MemoryWalletStore;
    use crate::vault::WalletKind;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn manager() -> (WalletManager, Arc<MemoryWalletStore>) {
        let mut config = ChainConfig::default();
        config.vault = VaultParams {
            m_cost: 64,
            t_cost: 1,
            p_cost: 1,
        };
        let store = Arc::new(MemoryWalletStore::default());
        let client = ChainClient::new(config, Arc::new(ScriptedTransport::new()));
        (WalletManager::with_client(client, store.clone()), store)
    }

    #[test]
    fn test_create_persists_only_ciphertext() {
        let (manager, store) = manager();
        let created = manager.create_wallet("Main", "pw").unwrap();
        assert_eq!(created.mnemonic.split_whitespace().count(), 24);

        let record = store.load().unwrap().unwrap();
        assert!(record.mnemonic.is_none());
        assert!(record.encrypted_mnemonic.as_deref().unwrap().starts_with("v1:"));
        assert_eq!(record.accounts[0].address, created.info.accounts[0].address);
    }

    #[test]
    fn test_import_then_reveal_and_change_password() {
        let (manager, _) = manager();
        manager.import_wallet("Main", PHRASE, "old").unwrap();

        assert!(matches!(manager.unlock("bad"), Err(WalletError::Credential)));
        manager.change_password("old", "new").unwrap();
        assert!(matches!(manager.reveal_phrase("old"), Err(WalletError::Credential)));
        assert_eq!(manager.reveal_phrase("new").unwrap().as_str(), PHRASE);
    }

    #[test]
    fn test_legacy_migration_removes_plaintext() {
        let (manager, store) = manager();
        manager.import_legacy("Old", PHRASE).unwrap();
        assert_eq!(
            manager.load_active().unwrap().unwrap().kind(),
            WalletKind::Legacy
        );

        manager.encrypt_legacy("pw").unwrap();
        let record = store.load().unwrap().unwrap();
        assert!(record.mnemonic.is_none());
        assert!(record.encrypted_mnemonic.is_some());
        assert_eq!(manager.reveal_phrase("pw").unwrap().as_str(), PHRASE);
    }

    #[test]
    fn test_invalid_inputs_fail_before_storage() {
        let (manager, store) = manager();
        assert!(manager.import_wallet("Main", "one two three", "pw").unwrap_err().is_validation());
        assert!(manager.import_wallet("", PHRASE, "pw").unwrap_err().is_validation());
        assert!(matches!(manager.create_wallet("Main", ""), Err(e) if e.is_validation()));
        assert!(manager.register_keyring("K", "osmo1xyz").unwrap_err().is_validation());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_keyring_wallet_has_no_phrase() {
        let (manager, _) = manager();
        let created = manager.create_wallet("tmp", "pw").unwrap();
        let address = created.info.accounts[0].address.clone();

        manager.register_keyring("Keplr", &address).unwrap();
        assert!(manager.reveal_phrase("pw").is_err());
        assert!(manager.change_password("pw", "x").is_err());

        manager.disconnect().unwrap();
        assert!(manager.load_active().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_history_without_wallet_is_empty() {
        let (manager, _) = manager();
        assert!(manager.history(10).await.is_empty());
    }
}
