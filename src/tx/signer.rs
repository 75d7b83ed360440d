use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::config::ChainConfig;
use crate::encoding::SignDoc;
use crate::error::WalletError;
use crate::keys::{AccountKeys, KeyManager};

/// Public half of a signing account
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerAccount {
    pub address: String,
    /// Compressed secp256k1 public key
    pub public_key: [u8; 33],
}

/// Direct-mode signer. Keyring integrations implement this so the core never
/// touches their key material.
#[async_trait]
pub trait OfflineSigner: Send + Sync {
    async fn account(&self) -> Result<SignerAccount, WalletError>;

    /// 64-byte compact signature over `sha256(sign_doc.encode())`
    async fn sign_direct(&self, sign_doc: &SignDoc) -> Result<[u8; 64], WalletError>;
}

/// Signer backed by a key derived from the recovery phrase.
///
/// The phrase itself is not kept; the derived key is wiped on drop.
#[derive(Debug)]
pub struct MnemonicSigner {
    keys: AccountKeys,
}

impl MnemonicSigner {
    pub fn from_phrase(phrase: Zeroizing<String>, config: &ChainConfig) -> Result<Self, WalletError> {
        let keys =
            KeyManager::derive_account(&phrase, &config.derivation_path, &config.address_prefix)?;
        Ok(Self { keys })
    }

    pub fn address(&self) -> &str {
        &self.keys.address
    }
}

#[async_trait]
impl OfflineSigner for MnemonicSigner {
    async fn account(&self) -> Result<SignerAccount, WalletError> {
        Ok(SignerAccount {
            address: self.keys.address.clone(),
            public_key: self.keys.public_key,
        })
    }

    async fn sign_direct(&self, sign_doc: &SignDoc) -> Result<[u8; 64], WalletError> {
        Ok(self.keys.sign(&sign_doc.encode()))
    }
}
