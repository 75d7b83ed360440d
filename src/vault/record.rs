//! Persisted wallet record and its variants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

use crate::error::StorageError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRef {
    pub address: String,
}

/// JSON shape shared with the surrounding application.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_mnemonic: Option<String>,
    #[serde(default)]
    pub accounts: Vec<AccountRef>,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "***HIDDEN***"))
            .field("encrypted_mnemonic", &self.encrypted_mnemonic.is_some())
            .field("accounts", &self.accounts)
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalletKind {
    Legacy,
    Encrypted,
    ExternalKeyring,
    Unknown,
}

/// Classify a raw record by which secret fields it carries.
///
/// Precedence: encrypted-only, then plaintext, then accounts-only. A record
/// carrying both secret fields is a precondition violation; it classifies as
/// `Legacy` here and is refused by [`StoredWallet::try_from`].
pub fn classify(record: &WalletRecord) -> WalletKind {
    match (&record.mnemonic, &record.encrypted_mnemonic) {
        (None, Some(_)) => WalletKind::Encrypted,
        (Some(_), _) => WalletKind::Legacy,
        (None, None) if !record.accounts.is_empty() => WalletKind::ExternalKeyring,
        (None, None) => WalletKind::Unknown,
    }
}

/// Non-secret part of a wallet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletInfo {
    pub id: String,
    pub name: String,
    pub accounts: Vec<AccountRef>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl WalletInfo {
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            accounts: vec![AccountRef {
                address: address.to_string(),
            }],
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Address of the single account, if any
    pub fn address(&self) -> Option<&str> {
        self.accounts.first().map(|a| a.address.as_str())
    }
}

/// A wallet record validated into exactly one variant.
#[derive(Clone)]
pub enum StoredWallet {
    /// Plaintext phrase at rest (pre-encryption wallets)
    Legacy {
        info: WalletInfo,
        mnemonic: Zeroizing<String>,
    },
    Encrypted {
        info: WalletInfo,
        ciphertext: String,
    },
    /// Keys live in a browser keyring; only addresses are known
    ExternalKeyring { info: WalletInfo },
}

impl StoredWallet {
    pub fn info(&self) -> &WalletInfo {
        match self {
            StoredWallet::Legacy { info, .. }
            | StoredWallet::Encrypted { info, .. }
            | StoredWallet::ExternalKeyring { info } => info,
        }
    }

    pub fn kind(&self) -> WalletKind {
        match self {
            StoredWallet::Legacy { .. } => WalletKind::Legacy,
            StoredWallet::Encrypted { .. } => WalletKind::Encrypted,
            StoredWallet::ExternalKeyring { .. } => WalletKind::ExternalKeyring,
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.info().address()
    }

    pub fn into_record(self) -> WalletRecord {
        let (info, mnemonic, encrypted_mnemonic) = match self {
            StoredWallet::Legacy { info, mnemonic } => (info, Some(mnemonic.to_string()), None),
            StoredWallet::Encrypted { info, ciphertext } => (info, None, Some(ciphertext)),
            StoredWallet::ExternalKeyring { info } => (info, None, None),
        };
        WalletRecord {
            id: info.id,
            name: info.name,
            mnemonic,
            encrypted_mnemonic,
            accounts: info.accounts,
            is_active: info.is_active,
            created_at: info.created_at,
        }
    }
}

impl fmt::Debug for StoredWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredWallet")
            .field("kind", &self.kind())
            .field("info", self.info())
            .finish()
    }
}

impl TryFrom<WalletRecord> for StoredWallet {
    type Error = StorageError;

    fn try_from(record: WalletRecord) -> Result<Self, Self::Error> {
        let info = WalletInfo {
            id: record.id,
            name: record.name,
            accounts: record.accounts,
            is_active: record.is_active,
            created_at: record.created_at,
        };

        match (record.mnemonic, record.encrypted_mnemonic) {
            (Some(_), Some(_)) => Err(StorageError::MalformedRecord(
                "record carries both a plaintext and an encrypted phrase".to_string(),
            )),
            (Some(mnemonic), None) => Ok(StoredWallet::Legacy {
                info,
                mnemonic: Zeroizing::new(mnemonic),
            }),
            (None, Some(ciphertext)) => Ok(StoredWallet::Encrypted { info, ciphertext }),
            (None, None) if !info.accounts.is_empty() => Ok(StoredWallet::ExternalKeyring { info }),
            (None, None) => Err(StorageError::MalformedRecord(
                "record has no phrase and no accounts".to_string(),
            )),
        }
    }
}
