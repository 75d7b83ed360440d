//! Error types for PhiWallet operations
//!
//! One public error type covers every failure the core can surface to a caller.
//! Variants group into the classes the wallet UI reacts to differently:
//!
//! - validation (`InvalidInput`, `InvalidMnemonic`): bad user input, raised before any
//!   network or cryptographic call
//! - `Credential`: wrong password *or* corrupted ciphertext, deliberately indistinguishable
//! - `Network`: node unreachable or non-success HTTP status
//! - `Chain`: the node accepted the request but chain logic rejected the transaction

use thiserror::Error;

/// Generic message for every credential failure.
pub const CREDENTIAL_FAILURE: &str = "Incorrect password or corrupted wallet data";

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("{}", CREDENTIAL_FAILURE)]
    Credential,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Transaction rejected by chain (code {code}): {raw_log}")]
    Chain { code: u32, raw_log: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Key derivation error: {0}")]
    Key(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    /// True for errors caused by malformed user input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::InvalidMnemonic(_))
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(err: reqwest::Error) -> Self {
        WalletError::Network(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed wallet record: {0}")]
    MalformedRecord(String),
}
