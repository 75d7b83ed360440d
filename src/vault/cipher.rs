//! Password-based authenticated encryption for the recovery phrase.
//!
//! Argon2id stretches the password into a 256-bit key; AES-256-GCM seals the
//! phrase. The stored form is `v1:` followed by standard base64 of
//! `salt (16) || nonce (12) || ciphertext+tag`.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::config::VaultParams;
use crate::error::WalletError;

pub const CIPHERTEXT_VERSION: &str = "v1:";

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Associated data binding the ciphertext to its format version
const AAD: &[u8] = b"phi-wallet/mnemonic/v1";

fn derive_key(
    password: &str,
    salt: &[u8],
    params: &VaultParams,
) -> Option<Zeroizing<[u8; KEY_LEN]>> {
    let params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(KEY_LEN)).ok()?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt, key.as_mut_slice())
        .ok()?;
    Some(key)
}

/// Seal `plaintext` under `password`.
pub fn seal(plaintext: &str, password: &str, params: &VaultParams) -> Result<String, WalletError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(password, &salt, params)
        .ok_or_else(|| WalletError::Internal("key derivation failed".to_string()))?;

    let cipher = Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|_| WalletError::Internal("invalid key length".to_string()))?;

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext.as_bytes(),
                aad: AAD,
            },
        )
        .map_err(|_| WalletError::Internal("encryption failed".to_string()))?;

    let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);

    Ok(format!("{}{}", CIPHERTEXT_VERSION, STANDARD.encode(blob)))
}

/// Open a sealed blob.
///
/// Every failure (wrong password, bad version, truncated or tampered data,
/// non-UTF-8 plaintext) yields `None`.
pub fn open(sealed: &str, password: &str, params: &VaultParams) -> Option<Zeroizing<String>> {
    let encoded = sealed.strip_prefix(CIPHERTEXT_VERSION)?;
    let blob = STANDARD.decode(encoded.trim()).ok()?;
    if blob.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
        return None;
    }

    let (salt, rest) = blob.split_at(SALT_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_key(password, salt, params)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_slice()).ok()?;

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad: AAD,
                },
            )
            .ok()?,
    );

    let text = std::str::from_utf8(&plaintext).ok()?;
    Some(Zeroizing::new(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low-cost parameters keep the tests fast
    const FAST: VaultParams = VaultParams {
        m_cost: 64,
        t_cost: 1,
        p_cost: 1,
    };

    #[test]
    fn test_seal_open() {
        let sealed = seal("hello world", "pw", &FAST).unwrap();
        assert!(sealed.starts_with(CIPHERTEXT_VERSION));
        assert_eq!(open(&sealed, "pw", &FAST).unwrap().as_str(), "hello world");
    }

    #[test]
    fn test_ciphertexts_are_salted() {
        let a = seal("same", "pw", &FAST).unwrap();
        let b = seal("same", "pw", &FAST).unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("same"));
    }

    #[test]
    fn test_wrong_password_and_corruption_look_the_same() {
        let sealed = seal("secret", "right", &FAST).unwrap();
        assert!(open(&sealed, "wrong", &FAST).is_none());

        let mut tampered = sealed.clone().into_bytes();
        let last = tampered.len() - 3;
        tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).unwrap();
        assert!(open(&tampered, "right", &FAST).is_none());

        assert!(open("v1:", "right", &FAST).is_none());
        assert!(open("v1:not base64!", "right", &FAST).is_none());
        assert!(open(&sealed.replacen("v1:", "v2:", 1), "right", &FAST).is_none());
    }

    #[test]
    fn test_params_are_part_of_the_key() {
        let sealed = seal("secret", "pw", &FAST).unwrap();
        let other = VaultParams { t_cost: 2, ..FAST };
        assert!(open(&sealed, "pw", &other).is_none());
    }
}
