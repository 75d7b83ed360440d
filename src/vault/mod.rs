//! Credential vault
//!
//! Owns the at-rest form of the recovery phrase. Plaintext only leaves the
//! vault inside a [`Zeroizing`] buffer, which wipes itself when dropped.

mod cipher;
mod record;

pub use cipher::CIPHERTEXT_VERSION;
pub use record::{classify, AccountRef, StoredWallet, WalletInfo, WalletKind, WalletRecord};

use zeroize::Zeroizing;

use crate::config::VaultParams;
use crate::error::WalletError;
use crate::keys::KeyManager;

#[derive(Clone, Debug, Default)]
pub struct CredentialVault {
    params: VaultParams,
}

impl CredentialVault {
    pub fn new(params: VaultParams) -> Self {
        Self { params }
    }

    /// Encrypt a recovery phrase under `password`.
    ///
    /// The phrase is normalized first; a wrong word count fails before any
    /// key stretching happens.
    pub fn encrypt(&self, mnemonic: &str, password: &str) -> Result<String, WalletError> {
        let normalized = KeyManager::normalize_phrase(mnemonic)?;
        if password.is_empty() {
            return Err(WalletError::invalid_input("Password is required"));
        }
        cipher::seal(&normalized, password, &self.params)
    }

    /// `None` covers both a wrong password and corrupted data.
    pub fn decrypt(&self, ciphertext: &str, password: &str) -> Option<Zeroizing<String>> {
        cipher::open(ciphertext, password, &self.params)
    }

    /// Like [`decrypt`](Self::decrypt) but mapped into the error taxonomy.
    pub fn unlock(&self, ciphertext: &str, password: &str) -> Result<Zeroizing<String>, WalletError> {
        self.decrypt(ciphertext, password).ok_or_else(|| {
            log::warn!("🔒 Vault unlock failed");
            WalletError::Credential
        })
    }

    /// Re-encrypt under a new password. The old password must open the blob.
    pub fn change_password(
        &self,
        ciphertext: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<String, WalletError> {
        if new_password.is_empty() {
            return Err(WalletError::invalid_input("New password is required"));
        }
        let mnemonic = self.unlock(ciphertext, old_password)?;
        self.encrypt(&mnemonic, new_password)
    }

    /// Recovery phrase for backup display.
    ///
    /// Always takes the password, whether or not a signing session is open.
    /// Legacy wallets have no password and hand back their stored phrase.
    pub fn reveal_phrase(
        &self,
        wallet: &StoredWallet,
        password: &str,
    ) -> Result<Zeroizing<String>, WalletError> {
        match wallet {
            StoredWallet::Encrypted { ciphertext, .. } => {
                if password.is_empty() {
                    return Err(WalletError::invalid_input("Password is required"));
                }
                self.unlock(ciphertext, password)
            }
            StoredWallet::Legacy { mnemonic, .. } => Ok(mnemonic.clone()),
            StoredWallet::ExternalKeyring { .. } => Err(WalletError::invalid_input(
                "Keyring wallets cannot reveal a recovery phrase",
            )),
        }
    }

    /// Migrate a plaintext wallet to the encrypted variant.
    ///
    /// The returned wallet carries no plaintext; the caller persists it in place
    /// of the legacy record.
    pub fn encrypt_legacy(
        &self,
        wallet: StoredWallet,
        password: &str,
    ) -> Result<StoredWallet, WalletError> {
        match wallet {
            StoredWallet::Legacy { info, mnemonic } => {
                let ciphertext = self.encrypt(&mnemonic, password)?;
                log::info!("🔐 Wallet '{}' migrated to encrypted storage", info.name);
                Ok(StoredWallet::Encrypted { info, ciphertext })
            }
            other => Err(WalletError::invalid_input(format!(
                "Only legacy wallets can be migrated (found {:?})",
                other.kind()
            ))),
        }
    }
}
