//! Transaction builder
//!
//! One [`PreparedTx`] per user action. Its phase only moves forward:
//!
//! ```text
//! Idle -> [AwaitingCredential] -> Signing -> Broadcasting -> Completed | Failed
//! ```
//!
//! `AwaitingCredential` applies to encrypted wallets only. A wrong password
//! leaves the transaction there so the caller can prompt again; any failure
//! after signing starts is terminal.
//!
//! Broadcast is at most once. Nothing here retries, and there is no
//! idempotency key: if the node accepted a transaction but the response was
//! lost, the caller sees a `Network` error for a transaction that may still be
//! included. Resubmitting is a new user-initiated cycle.

use crate::chain::ChainClient;
use crate::config::FeeConfig;
use crate::encoding::messages::{MsgCreateIdentity, MsgSend, MsgUpdateIdentity, TxMessage};
use crate::encoding::tx::{pubkey_any, AuthInfo, Coin, Fee, SignDoc, SignerInfo, TxBody, TxRaw};
use crate::encoding::wire::{FieldSpec, FieldValue};
use crate::error::WalletError;
use crate::keys::decode_address;
use crate::tx::amount::{format_units, parse_amount};
use crate::tx::signer::{MnemonicSigner, OfflineSigner};
use crate::vault::{CredentialVault, StoredWallet};
use zeroize::Zeroizing;

/// What the user asked for, before the signer's address is bound in
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxRequest {
    Transfer {
        recipient: String,
        /// Display units, e.g. "1.5"
        amount: String,
    },
    CreateIdentity {
        national_id: String,
    },
    UpdateIdentity {
        id: u64,
        full_name: String,
        date_of_birth: String,
        is_verified: bool,
        verified_by: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxPhase {
    Idle,
    AwaitingCredential,
    Signing,
    Broadcasting,
    Completed,
    Failed,
}

/// Composed message plus fixed fee and memo
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTransaction {
    pub message: TxMessage,
    pub fee: FeeConfig,
    pub memo: String,
}

impl PendingTransaction {
    pub fn message_type(&self) -> &'static str {
        self.message.type_url()
    }

    pub fn fields(&self) -> Vec<(FieldSpec, FieldValue)> {
        self.message.fields()
    }

    /// Zero-amount fee coins are dropped; the SDK rejects zero coins.
    fn fee_record(&self) -> Fee {
        let amount = if self.fee.amount == 0 {
            Vec::new()
        } else {
            vec![Coin::new(u128::from(self.fee.amount), &self.fee.denom)]
        };
        Fee {
            amount,
            gas_limit: self.fee.gas,
        }
    }
}

pub struct PreparedTx {
    pending: PendingTransaction,
    wallet: StoredWallet,
    signer_address: String,
    phase: TxPhase,
}

impl PreparedTx {
    pub fn phase(&self) -> TxPhase {
        self.phase
    }

    pub fn pending(&self) -> &PendingTransaction {
        &self.pending
    }

    pub fn signer_address(&self) -> &str {
        &self.signer_address
    }

    fn fail(&mut self, err: WalletError) -> WalletError {
        log::error!("❌ Transaction failed: {}", err);
        self.phase = TxPhase::Failed;
        err
    }
}

enum SigningKey<'a> {
    Phrase(Zeroizing<String>),
    External(&'a dyn OfflineSigner),
}

/// What the caller supplies to unlock signing
pub enum Credential<'a> {
    None,
    Password(&'a str),
    External(&'a dyn OfflineSigner),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub success: bool,
    pub hash: String,
    pub height: u64,
    pub raw_log: String,
    pub explorer_url: String,
}

pub struct TransactionBuilder {
    client: ChainClient,
    vault: CredentialVault,
}

impl TransactionBuilder {
    pub fn new(client: ChainClient, vault: CredentialVault) -> Self {
        Self { client, vault }
    }

    /// Validate input and compose the message. No network or crypto calls.
    pub fn prepare(
        &self,
        wallet: &StoredWallet,
        request: TxRequest,
        memo: Option<&str>,
    ) -> Result<PreparedTx, WalletError> {
        let signer_address = wallet
            .address()
            .ok_or_else(|| WalletError::invalid_input("Wallet has no account"))?
            .to_string();

        let (message, fee) = self.compose(request, &signer_address)?;
        message.validate()?;

        let phase = match wallet {
            StoredWallet::Encrypted { .. } => TxPhase::AwaitingCredential,
            _ => TxPhase::Idle,
        };

        Ok(PreparedTx {
            pending: PendingTransaction {
                message,
                fee,
                memo: memo.unwrap_or_default().to_string(),
            },
            wallet: wallet.clone(),
            signer_address,
            phase,
        })
    }

    fn compose(
        &self,
        request: TxRequest,
        creator: &str,
    ) -> Result<(TxMessage, FeeConfig), WalletError> {
        let config = self.client.config();

        match request {
            TxRequest::Transfer { recipient, amount } => {
                let recipient = recipient.trim();
                if recipient.is_empty() {
                    return Err(WalletError::invalid_input("Recipient address is required"));
                }
                decode_address(&config.address_prefix, recipient)?;

                let units = parse_amount(&amount, config.currency.decimals)?;
                if units == 0 {
                    return Err(WalletError::invalid_input("Amount must be greater than zero"));
                }

                log::info!(
                    "💸 Transfer {} {} to {}",
                    format_units(units, config.currency.decimals),
                    config.currency.display_denom,
                    recipient
                );
                let msg = MsgSend {
                    from_address: creator.to_string(),
                    to_address: recipient.to_string(),
                    amount: vec![Coin::new(units, &config.currency.minimal_denom)],
                };
                Ok((TxMessage::Send(msg), config.fees.transfer.clone()))
            }
            TxRequest::CreateIdentity { national_id } => {
                let digits: String = national_id.chars().filter(char::is_ascii_digit).collect();
                log::info!("🆔 Create identity for {} (cccd ***HIDDEN***)", creator);
                let msg = MsgCreateIdentity {
                    creator: creator.to_string(),
                    cccd_id: digits,
                };
                Ok((TxMessage::CreateIdentity(msg), config.fees.identity_create.clone()))
            }
            TxRequest::UpdateIdentity {
                id,
                full_name,
                date_of_birth,
                is_verified,
                verified_by,
            } => {
                log::info!("🆔 Update identity #{} for {}", id, creator);
                let msg = MsgUpdateIdentity {
                    creator: creator.to_string(),
                    id,
                    full_name: full_name.trim().to_string(),
                    date_of_birth: date_of_birth.trim().to_string(),
                    is_verified,
                    verified_by: verified_by.trim().to_string(),
                };
                Ok((TxMessage::UpdateIdentity(msg), config.fees.identity_update.clone()))
            }
        }
    }

    /// Resolve the credential, sign and broadcast.
    ///
    /// The decrypted phrase lives only inside this call. Concurrent calls on
    /// the same wallet must be serialized by the caller.
    pub async fn execute(
        &self,
        tx: &mut PreparedTx,
        credential: Credential<'_>,
    ) -> Result<TxReceipt, WalletError> {
        if !matches!(tx.phase, TxPhase::Idle | TxPhase::AwaitingCredential) {
            return Err(WalletError::invalid_input(format!(
                "Transaction already {:?}; start a new one",
                tx.phase
            )));
        }

        let config = self.client.config();
        let key = match (&tx.wallet, credential) {
            (StoredWallet::Encrypted { ciphertext, .. }, Credential::Password(password))
                if !password.is_empty() =>
            {
                SigningKey::Phrase(self.vault.unlock(ciphertext, password)?)
            }
            (StoredWallet::Encrypted { .. }, _) => {
                return Err(WalletError::invalid_input(
                    "Password required for encrypted wallet",
                ))
            }
            (StoredWallet::Legacy { mnemonic, .. }, _) => SigningKey::Phrase(mnemonic.clone()),
            (StoredWallet::ExternalKeyring { .. }, Credential::External(signer)) => {
                SigningKey::External(signer)
            }
            (StoredWallet::ExternalKeyring { .. }, _) => {
                return Err(WalletError::invalid_input(
                    "Keyring wallets need an external signer",
                ))
            }
        };

        let derived;
        let signer: &dyn OfflineSigner = match key {
            SigningKey::Phrase(phrase) => {
                derived = MnemonicSigner::from_phrase(phrase, config).map_err(|e| tx.fail(e))?;
                &derived
            }
            SigningKey::External(signer) => signer,
        };

        tx.phase = TxPhase::Signing;
        let raw = match self.sign(&tx.pending, &tx.signer_address, signer).await {
            Ok(raw) => raw,
            Err(e) => return Err(tx.fail(e)),
        };

        tx.phase = TxPhase::Broadcasting;
        log::info!("📡 Broadcasting {}", tx.pending.message_type());
        let response = match self.client.broadcast(&raw.encode()).await {
            Ok(response) => response,
            Err(e) => return Err(tx.fail(e)),
        };

        if response.code != 0 {
            return Err(tx.fail(WalletError::Chain {
                code: response.code,
                raw_log: response.raw_log,
            }));
        }

        tx.phase = TxPhase::Completed;
        log::info!("✅ Transaction {} accepted", response.txhash);
        Ok(TxReceipt {
            success: true,
            explorer_url: config.explorer_tx_url(&response.txhash),
            hash: response.txhash,
            height: response.height,
            raw_log: response.raw_log,
        })
    }

    async fn sign(
        &self,
        pending: &PendingTransaction,
        expected_address: &str,
        signer: &dyn OfflineSigner,
    ) -> Result<TxRaw, WalletError> {
        let config = self.client.config();

        let account = signer.account().await?;
        if account.address != expected_address {
            return Err(WalletError::Key(format!(
                "Signer address {} does not match wallet account {}",
                account.address, expected_address
            )));
        }

        let chain_account = self.client.account(&account.address).await?;
        log::debug!(
            "Account #{} at sequence {}",
            chain_account.account_number,
            chain_account.sequence
        );

        if let TxMessage::Send(msg) = &pending.message {
            self.check_balance(msg, &pending.fee).await?;
        }

        let body = TxBody {
            messages: vec![pending.message.to_any()],
            memo: pending.memo.clone(),
        };
        let auth_info = AuthInfo {
            signer_infos: vec![SignerInfo {
                public_key: pubkey_any(&account.public_key),
                sequence: chain_account.sequence,
            }],
            fee: pending.fee_record(),
        };

        let sign_doc = SignDoc {
            body_bytes: body.encode(),
            auth_info_bytes: auth_info.encode(),
            chain_id: config.chain_id.clone(),
            account_number: chain_account.account_number,
        };
        let signature = signer.sign_direct(&sign_doc).await?;

        Ok(TxRaw {
            body_bytes: sign_doc.body_bytes,
            auth_info_bytes: sign_doc.auth_info_bytes,
            signatures: vec![signature.to_vec()],
        })
    }

    /// Amount plus same-denom fee must fit in the spendable balance
    async fn check_balance(&self, msg: &MsgSend, fee: &FeeConfig) -> Result<(), WalletError> {
        let currency = &self.client.config().currency;
        let balance = self.client.balance(&msg.from_address).await?;

        let mut needed: u128 = msg
            .amount
            .iter()
            .filter(|c| c.denom == balance.denom)
            .map(|c| c.amount)
            .sum();
        if fee.denom == balance.denom {
            needed += u128::from(fee.amount);
        }

        if needed > balance.amount {
            return Err(WalletError::invalid_input(format!(
                "Insufficient balance. Available: {} {}",
                format_units(balance.amount, currency.decimals),
                currency.display_denom
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::scripted::ScriptedTransport;
    use crate::config::{ChainConfig, VaultParams};
    use crate::encoding::messages::MSG_SEND_TYPE_URL;
    use crate::keys::KeyManager;
    use crate::vault::WalletInfo;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::json;
    use std::sync::Arc;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const FAST: VaultParams = VaultParams {
        m_cost: 64,
        t_cost: 1,
        p_cost: 1,
    };

    fn address(index: u32) -> String {
        KeyManager::derive_account(PHRASE, &format!("m/44'/118'/0'/0/{}", index), "cosmos")
            .unwrap()
            .address
            .clone()
    }

    fn node(code: u32, raw_log: &str) -> ScriptedTransport {
        ScriptedTransport::new()
            .ok(
                "/accounts/",
                json!({"account": {"account_number": "3", "sequence": "1"}}),
            )
            .ok(
                "/balances/",
                json!({"balances": [{"denom": "stake", "amount": "50000000"}]}),
            )
            .ok(
                "/cosmos/tx/v1beta1/txs",
                json!({"tx_response": {"code": code, "txhash": "ABC123", "height": "77", "raw_log": raw_log}}),
            )
    }

    fn builder(transport: ScriptedTransport) -> (TransactionBuilder, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let client = ChainClient::new(ChainConfig::default(), transport.clone());
        (
            TransactionBuilder::new(client, CredentialVault::new(FAST)),
            transport,
        )
    }

    fn legacy_wallet() -> StoredWallet {
        StoredWallet::Legacy {
            info: WalletInfo::new("Main", &address(0)),
            mnemonic: Zeroizing::new(PHRASE.to_string()),
        }
    }

    fn transfer(amount: &str) -> TxRequest {
        TxRequest::Transfer {
            recipient: address(1),
            amount: amount.to_string(),
        }
    }

    #[test]
    fn test_validation_happens_before_any_call() {
        let (builder, transport) = builder(node(0, ""));
        let wallet = legacy_wallet();

        let empty = TxRequest::Transfer {
            recipient: " ".to_string(),
            amount: "1".to_string(),
        };
        assert!(matches!(builder.prepare(&wallet, empty, None), Err(e) if e.is_validation()));
        assert!(matches!(
            builder.prepare(&wallet, transfer("0"), None),
            Err(e) if e.is_validation()
        ));
        assert!(matches!(
            builder.prepare(&wallet, transfer("0.0000001"), None),
            Err(e) if e.is_validation()
        ));

        let no_id = TxRequest::CreateIdentity {
            national_id: "abc".to_string(),
        };
        assert!(builder.prepare(&wallet, no_id, None).is_err());
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_compose_binds_fee_and_creator() {
        let (builder, _) = builder(node(0, ""));
        let wallet = legacy_wallet();

        let tx = builder
            .prepare(
                &wallet,
                TxRequest::CreateIdentity {
                    national_id: "0790-1234 5678".to_string(),
                },
                Some("Register identity"),
            )
            .unwrap();
        assert_eq!(tx.phase(), TxPhase::Idle);
        assert_eq!(tx.pending().fee, FeeConfig::new(1_000, "token", 200_000));
        assert_eq!(tx.pending().memo, "Register identity");
        match &tx.pending().message {
            TxMessage::CreateIdentity(m) => {
                assert_eq!(m.cccd_id, "079012345678");
                assert_eq!(m.creator, address(0));
            }
            other => panic!("unexpected message {:?}", other),
        }

        let send = builder.prepare(&wallet, transfer("1.5"), None).unwrap();
        assert_eq!(send.pending().message_type(), MSG_SEND_TYPE_URL);
        assert_eq!(send.pending().fee.amount, 5_000);
    }

    #[test]
    fn test_zero_fee_has_no_coin() {
        let pending = PendingTransaction {
            message: TxMessage::UpdateIdentity(MsgUpdateIdentity {
                creator: "c".to_string(),
                id: 1,
                full_name: "A".to_string(),
                ..Default::default()
            }),
            fee: FeeConfig::new(0, "token", 200_000),
            memo: String::new(),
        };
        let fee = pending.fee_record();
        assert!(fee.amount.is_empty());
        assert_eq!(fee.gas_limit, 200_000);
    }

    #[tokio::test]
    async fn test_legacy_wallet_broadcast_success() {
        let (builder, transport) = builder(node(0, ""));
        let mut tx = builder.prepare(&legacy_wallet(), transfer("1"), None).unwrap();

        let receipt = builder.execute(&mut tx, Credential::None).await.unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.hash, "ABC123");
        assert_eq!(receipt.height, 77);
        assert_eq!(receipt.explorer_url, "http://localhost:1317/tx/ABC123");
        assert_eq!(tx.phase(), TxPhase::Completed);

        let posted = transport.posts.lock().unwrap()[0].clone();
        let bytes = STANDARD.decode(posted["tx_bytes"].as_str().unwrap()).unwrap();
        assert_eq!(bytes[0], 0x0A);
        let needle = MSG_SEND_TYPE_URL.as_bytes();
        assert!(bytes.windows(needle.len()).any(|w| w == needle));
        // 64-byte signature is the last field
        assert_eq!(&bytes[bytes.len() - 66..bytes.len() - 64], &[0x1A, 64]);
    }

    #[tokio::test]
    async fn test_chain_rejection_surfaces_raw_log() {
        let (builder, _) = builder(node(5, "insufficient funds"));
        let mut tx = builder.prepare(&legacy_wallet(), transfer("1"), None).unwrap();

        match builder.execute(&mut tx, Credential::None).await {
            Err(WalletError::Chain { code, raw_log }) => {
                assert_eq!(code, 5);
                assert_eq!(raw_log, "insufficient funds");
            }
            other => panic!("expected chain error, got {:?}", other),
        }
        assert_eq!(tx.phase(), TxPhase::Failed);

        // No second attempt on the same transaction
        assert!(builder.execute(&mut tx, Credential::None).await.is_err());
    }

    #[tokio::test]
    async fn test_encrypted_wallet_waits_for_password() {
        let (builder, _) = builder(node(0, ""));
        let vault = CredentialVault::new(FAST);
        let wallet = StoredWallet::Encrypted {
            info: WalletInfo::new("Main", &address(0)),
            ciphertext: vault.encrypt(PHRASE, "pw").unwrap(),
        };

        let mut tx = builder.prepare(&wallet, transfer("2"), None).unwrap();
        assert_eq!(tx.phase(), TxPhase::AwaitingCredential);

        assert!(builder.execute(&mut tx, Credential::None).await.is_err());
        assert!(matches!(
            builder.execute(&mut tx, Credential::Password("wrong")).await,
            Err(WalletError::Credential)
        ));
        assert_eq!(tx.phase(), TxPhase::AwaitingCredential);

        let receipt = builder
            .execute(&mut tx, Credential::Password("pw"))
            .await
            .unwrap();
        assert_eq!(receipt.hash, "ABC123");
        assert_eq!(tx.phase(), TxPhase::Completed);
    }

    #[tokio::test]
    async fn test_insufficient_balance_fails_before_broadcast() {
        let (builder, transport) = builder(node(0, ""));
        let mut tx = builder.prepare(&legacy_wallet(), transfer("50"), None).unwrap();

        let err = builder.execute(&mut tx, Credential::None).await.unwrap_err();
        assert!(err.to_string().contains("Insufficient balance"));
        assert_eq!(tx.phase(), TxPhase::Failed);
        assert!(transport.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keyring_wallet_uses_external_signer() {
        let (builder, _) = builder(node(0, ""));
        let wallet = StoredWallet::ExternalKeyring {
            info: WalletInfo::new("Keplr", &address(0)),
        };
        let external =
            MnemonicSigner::from_phrase(Zeroizing::new(PHRASE.to_string()), &ChainConfig::default())
                .unwrap();

        let mut tx = builder.prepare(&wallet, transfer("1"), None).unwrap();
        assert!(builder.execute(&mut tx, Credential::None).await.is_err());
        let receipt = builder
            .execute(&mut tx, Credential::External(&external))
            .await
            .unwrap();
        assert!(receipt.success);
    }

    #[tokio::test]
    async fn test_signer_address_mismatch_is_rejected() {
        let (builder, _) = builder(node(0, ""));
        let wallet = StoredWallet::Legacy {
            info: WalletInfo::new("Main", &address(2)),
            mnemonic: Zeroizing::new(PHRASE.to_string()),
        };
        let mut tx = builder.prepare(&wallet, transfer("1"), None).unwrap();
        assert!(matches!(
            builder.execute(&mut tx, Credential::None).await,
            Err(WalletError::Key(_))
        ));
    }
}
