use bech32::{FromBase32, ToBase32, Variant};
use bip39::Mnemonic;
use bitcoin::bip32::{DerivationPath, Xpriv};
use bitcoin::hashes::{hash160, Hash};
use bitcoin::secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey};
use bitcoin::Network;
use sha2::{Digest, Sha256};
use std::str::FromStr;
use zeroize::Zeroizing;

use crate::error::WalletError;

/// Word counts accepted for a recovery phrase
pub const VALID_WORD_COUNTS: [usize; 2] = [12, 24];

pub struct KeyManager;

impl KeyManager {
    /// Generate a fresh 24-word recovery phrase
    pub fn generate() -> Result<Zeroizing<String>, WalletError> {
        let entropy = Zeroizing::new(rand::random::<[u8; 32]>());

        let mnemonic = Mnemonic::from_entropy(&entropy[..])
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;

        // Fixed capacity: no reallocation copies
        let mut phrase = Zeroizing::new(String::with_capacity(24 * 9));
        for (i, word) in mnemonic.words().enumerate() {
            if i > 0 {
                phrase.push(' ');
            }
            phrase.push_str(word);
        }
        Ok(phrase)
    }

    /// Collapse whitespace and check the word count.
    ///
    /// Runs before any wordlist lookup or key derivation.
    pub fn normalize_phrase(phrase: &str) -> Result<Zeroizing<String>, WalletError> {
        let count = phrase.split_whitespace().count();
        if !VALID_WORD_COUNTS.contains(&count) {
            return Err(WalletError::InvalidMnemonic(format!(
                "expected 12 or 24 words, got {}",
                count
            )));
        }

        let mut normalized = Zeroizing::new(String::with_capacity(phrase.len() * 4));
        for (i, word) in phrase.split_whitespace().enumerate() {
            if i > 0 {
                normalized.push(' ');
            }
            normalized.extend(word.chars().flat_map(char::to_lowercase));
        }
        Ok(normalized)
    }

    /// Word count plus BIP-39 wordlist and checksum validation
    pub fn validate(phrase: &str) -> Result<(), WalletError> {
        let normalized = Self::normalize_phrase(phrase)?;
        Mnemonic::parse(normalized.as_str())
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
        Ok(())
    }

    /// Derive the single account key at `path` and its bech32 address
    pub fn derive_account(
        phrase: &str,
        path: &str,
        prefix: &str,
    ) -> Result<AccountKeys, WalletError> {
        let normalized = Self::normalize_phrase(phrase)?;
        let mnemonic = Mnemonic::parse(normalized.as_str())
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;

        let secp = Secp256k1::new();
        let seed = Zeroizing::new(mnemonic.to_seed(""));

        // The network only affects xpriv serialization, which is never exported.
        let master_key = Xpriv::new_master(Network::Bitcoin, &seed[..])
            .map_err(|e| WalletError::Key(e.to_string()))?;

        let derivation_path =
            DerivationPath::from_str(path).map_err(|e| WalletError::Key(e.to_string()))?;

        let account_key = master_key
            .derive_priv(&secp, &derivation_path)
            .map_err(|e| WalletError::Key(e.to_string()))?;

        let secret = account_key.private_key;
        let public_key = PublicKey::from_secret_key(&secp, &secret).serialize();
        let address = address_from_pubkey(prefix, &public_key)?;

        Ok(AccountKeys {
            secret,
            public_key,
            address,
        })
    }
}

/// Bech32 account address: `bech32(prefix, ripemd160(sha256(pubkey)))`
pub fn address_from_pubkey(prefix: &str, compressed: &[u8; 33]) -> Result<String, WalletError> {
    let hash = hash160::Hash::hash(compressed).to_byte_array();
    bech32::encode(prefix, hash.to_base32(), Variant::Bech32)
        .map_err(|e| WalletError::Key(e.to_string()))
}

/// Decode a bech32 account address, checking its prefix and 20-byte payload.
pub fn decode_address(prefix: &str, address: &str) -> Result<[u8; 20], WalletError> {
    let (hrp, data, variant) = bech32::decode(address)
        .map_err(|e| WalletError::invalid_input(format!("Invalid address: {}", e)))?;

    if hrp != prefix || variant != Variant::Bech32 {
        return Err(WalletError::invalid_input(format!(
            "Address must start with {}1",
            prefix
        )));
    }

    let bytes = Vec::<u8>::from_base32(&data)
        .map_err(|e| WalletError::invalid_input(format!("Invalid address: {}", e)))?;

    bytes
        .try_into()
        .map_err(|_| WalletError::invalid_input("Address payload must be 20 bytes"))
}

/// Secp256k1 account key derived from a recovery phrase
pub struct AccountKeys {
    secret: SecretKey,
    pub public_key: [u8; 33],
    pub address: String,
}

impl AccountKeys {
    /// Sign `sha256(sign_doc)` and return the 64-byte compact (r || s) signature.
    ///
    /// libsecp256k1 always produces low-s signatures.
    pub fn sign(&self, sign_doc: &[u8]) -> [u8; 64] {
        let secp = Secp256k1::signing_only();
        let digest: [u8; 32] = Sha256::digest(sign_doc).into();
        let message = Message::from_digest(digest);
        secp.sign_ecdsa(&message, &self.secret).serialize_compact()
    }

    /// Check a compact signature against this account's public key
    pub fn verify(&self, sign_doc: &[u8], signature: &[u8; 64]) -> bool {
        let secp = Secp256k1::verification_only();
        let digest: [u8; 32] = Sha256::digest(sign_doc).into();
        let message = Message::from_digest(digest);

        let (Ok(sig), Ok(pk)) = (
            Signature::from_compact(signature),
            PublicKey::from_slice(&self.public_key),
        ) else {
            return false;
        };
        secp.verify_ecdsa(&message, &sig, &pk).is_ok()
    }
}

impl Drop for AccountKeys {
    fn drop(&mut self) {
        self.secret.non_secure_erase();
    }
}

impl std::fmt::Debug for AccountKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountKeys")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
