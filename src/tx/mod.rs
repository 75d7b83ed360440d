//! Transaction construction, signing and broadcast

pub mod amount;
mod builder;
mod signer;

pub use builder::{
    Credential, PendingTransaction, PreparedTx, TransactionBuilder, TxPhase, TxReceipt, TxRequest,
};
pub use signer::{MnemonicSigner, OfflineSigner, SignerAccount};
