//! Cosmos SDK transaction envelope for `SIGN_MODE_DIRECT`
//!
//! `TxBody`, `AuthInfo`, `SignDoc` and `TxRaw` are encoded with the same field
//! tables as the chain messages, so the bytes that get signed are exactly the
//! bytes that get broadcast.

use crate::encoding::wire::{encode_message, FieldSpec, FieldValue};

pub const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";

/// `cosmos.tx.signing.v1beta1.SignMode.SIGN_MODE_DIRECT`
pub const SIGN_MODE_DIRECT: u64 = 1;

/// `google.protobuf.Any`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Any {
    pub type_url: String,
    pub value: Vec<u8>,
}

impl Any {
    const TYPE_URL: FieldSpec = FieldSpec::string(1, "type_url");
    const VALUE: FieldSpec = FieldSpec::bytes(2, "value");

    pub fn encode(&self) -> Vec<u8> {
        encode_message(&[
            (Self::TYPE_URL, FieldValue::from(self.type_url.as_str())),
            (Self::VALUE, FieldValue::Bytes(self.value.clone())),
        ])
    }
}

/// `cosmos.base.v1beta1.Coin`; the amount travels as a decimal string
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    const DENOM: FieldSpec = FieldSpec::string(1, "denom");
    const AMOUNT: FieldSpec = FieldSpec::string(2, "amount");

    pub fn new(amount: u128, denom: &str) -> Self {
        Self {
            denom: denom.to_string(),
            amount,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        encode_message(&[
            (Self::DENOM, FieldValue::from(self.denom.as_str())),
            (Self::AMOUNT, FieldValue::Str(self.amount.to_string())),
        ])
    }
}

/// Compressed secp256k1 public key wrapped as `Any`
pub fn pubkey_any(compressed: &[u8; 33]) -> Any {
    const KEY: FieldSpec = FieldSpec::bytes(1, "key");
    Any {
        type_url: SECP256K1_PUBKEY_TYPE_URL.to_string(),
        value: encode_message(&[(KEY, FieldValue::Bytes(compressed.to_vec()))]),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxBody {
    pub messages: Vec<Any>,
    pub memo: String,
}

impl TxBody {
    const MESSAGES: FieldSpec = FieldSpec::message(1, "messages");
    const MEMO: FieldSpec = FieldSpec::string(2, "memo");

    pub fn encode(&self) -> Vec<u8> {
        let mut fields: Vec<(FieldSpec, FieldValue)> = self
            .messages
            .iter()
            .map(|m| (Self::MESSAGES, FieldValue::Bytes(m.encode())))
            .collect();
        fields.push((Self::MEMO, FieldValue::from(self.memo.as_str())));
        encode_message(&fields)
    }
}

/// Single signer in direct mode
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerInfo {
    pub public_key: Any,
    pub sequence: u64,
}

impl SignerInfo {
    const PUBLIC_KEY: FieldSpec = FieldSpec::message(1, "public_key");
    const MODE_INFO: FieldSpec = FieldSpec::message(2, "mode_info");
    const SEQUENCE: FieldSpec = FieldSpec::varint(3, "sequence");

    fn mode_info_direct() -> Vec<u8> {
        const SINGLE: FieldSpec = FieldSpec::message(1, "single");
        const MODE: FieldSpec = FieldSpec::varint(1, "mode");

        let single = encode_message(&[(MODE, FieldValue::Uint(SIGN_MODE_DIRECT))]);
        encode_message(&[(SINGLE, FieldValue::Bytes(single))])
    }

    pub fn encode(&self) -> Vec<u8> {
        encode_message(&[
            (Self::PUBLIC_KEY, FieldValue::Bytes(self.public_key.encode())),
            (Self::MODE_INFO, FieldValue::Bytes(Self::mode_info_direct())),
            (Self::SEQUENCE, FieldValue::Uint(self.sequence)),
        ])
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fee {
    pub amount: Vec<Coin>,
    pub gas_limit: u64,
}

impl Fee {
    const AMOUNT: FieldSpec = FieldSpec::message(1, "amount");
    const GAS_LIMIT: FieldSpec = FieldSpec::varint(2, "gas_limit");

    pub fn encode(&self) -> Vec<u8> {
        let mut fields: Vec<(FieldSpec, FieldValue)> = self
            .amount
            .iter()
            .map(|c| (Self::AMOUNT, FieldValue::Bytes(c.encode())))
            .collect();
        fields.push((Self::GAS_LIMIT, FieldValue::Uint(self.gas_limit)));
        encode_message(&fields)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthInfo {
    pub signer_infos: Vec<SignerInfo>,
    pub fee: Fee,
}

impl AuthInfo {
    const SIGNER_INFOS: FieldSpec = FieldSpec::message(1, "signer_infos");
    const FEE: FieldSpec = FieldSpec::message(2, "fee");

    pub fn encode(&self) -> Vec<u8> {
        let mut fields: Vec<(FieldSpec, FieldValue)> = self
            .signer_infos
            .iter()
            .map(|s| (Self::SIGNER_INFOS, FieldValue::Bytes(s.encode())))
            .collect();
        fields.push((Self::FEE, FieldValue::Bytes(self.fee.encode())));
        encode_message(&fields)
    }
}

/// The document whose SHA-256 digest is signed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignDoc {
    pub body_bytes: Vec<u8>,
    pub auth_info_bytes: Vec<u8>,
    pub chain_id: String,
    pub account_number: u64,
}

impl SignDoc {
    const BODY_BYTES: FieldSpec = FieldSpec::bytes(1, "body_bytes");
    const AUTH_INFO_BYTES: FieldSpec = FieldSpec::bytes(2, "auth_info_bytes");
    const CHAIN_ID: FieldSpec = FieldSpec::string(3, "chain_id");
    const ACCOUNT_NUMBER: FieldSpec = FieldSpec::varint(4, "account_number");

    pub fn encode(&self) -> Vec<u8> {
        encode_message(&[
            (Self::BODY_BYTES, FieldValue::Bytes(self.body_bytes.clone())),
            (Self::AUTH_INFO_BYTES, FieldValue::Bytes(self.auth_info_bytes.clone())),
            (Self::CHAIN_ID, FieldValue::from(self.chain_id.as_str())),
            (Self::ACCOUNT_NUMBER, FieldValue::Uint(self.account_number)),
        ])
    }
}

/// Broadcastable transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxRaw {
    pub body_bytes: Vec<u8>,
    pub auth_info_bytes: Vec<u8>,
    pub signatures: Vec<Vec<u8>>,
}

impl TxRaw {
    const BODY_BYTES: FieldSpec = FieldSpec::bytes(1, "body_bytes");
    const AUTH_INFO_BYTES: FieldSpec = FieldSpec::bytes(2, "auth_info_bytes");
    const SIGNATURES: FieldSpec = FieldSpec::bytes(3, "signatures");

    pub fn encode(&self) -> Vec<u8> {
        let mut fields = vec![
            (Self::BODY_BYTES, FieldValue::Bytes(self.body_bytes.clone())),
            (Self::AUTH_INFO_BYTES, FieldValue::Bytes(self.auth_info_bytes.clone())),
        ];
        for sig in &self.signatures {
            fields.push((Self::SIGNATURES, FieldValue::Bytes(sig.clone())));
        }
        encode_message(&fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_amount_is_decimal_string() {
        let coin = Coin::new(5000, "stake");
        assert_eq!(
            coin.encode(),
            vec![0x0A, 0x05, b's', b't', b'a', b'k', b'e', 0x12, 0x04, b'5', b'0', b'0', b'0']
        );
    }

    #[test]
    fn test_zero_fee_coin_omits_nothing_but_amount_string() {
        // "0" is a non-empty string, so it stays on the wire
        let coin = Coin::new(0, "token");
        assert!(coin.encode().ends_with(&[0x12, 0x01, b'0']));
    }

    #[test]
    fn test_mode_info_is_direct() {
        assert_eq!(SignerInfo::mode_info_direct(), vec![0x0A, 0x02, 0x08, 0x01]);
    }

    #[test]
    fn test_pubkey_any_wraps_key() {
        let key = [2u8; 33];
        let any = pubkey_any(&key);
        assert_eq!(any.type_url, SECP256K1_PUBKEY_TYPE_URL);
        assert_eq!(&any.value[..2], &[0x0A, 33]);
        assert_eq!(any.value.len(), 35);
    }

    #[test]
    fn test_sequence_zero_is_omitted() {
        let info = SignerInfo {
            public_key: pubkey_any(&[3u8; 33]),
            sequence: 0,
        };
        let encoded = info.encode();
        // ends with mode_info, no sequence tag
        assert!(encoded.ends_with(&[0x12, 0x04, 0x0A, 0x02, 0x08, 0x01]));
    }

    #[test]
    fn test_sign_doc_layout() {
        let doc = SignDoc {
            body_bytes: vec![1],
            auth_info_bytes: vec![2],
            chain_id: "c".to_string(),
            account_number: 7,
        };
        assert_eq!(
            doc.encode(),
            vec![0x0A, 0x01, 1, 0x12, 0x01, 2, 0x1A, 0x01, b'c', 0x20, 0x07]
        );
    }

    #[test]
    fn test_tx_raw_carries_signature() {
        let raw = TxRaw {
            body_bytes: vec![1],
            auth_info_bytes: vec![2],
            signatures: vec![vec![9; 64]],
        };
        let encoded = raw.encode();
        assert_eq!(encoded.len(), 3 + 3 + 2 + 64);
        assert_eq!(&encoded[6..8], &[0x1A, 64]);
    }

    #[test]
    fn test_body_memo_after_messages() {
        let body = TxBody {
            messages: vec![Any {
                type_url: "/x".to_string(),
                value: vec![],
            }],
            memo: "hi".to_string(),
        };
        // Any{type_url="/x"} = 0A 02 2F 78
        assert_eq!(
            body.encode(),
            vec![0x0A, 0x04, 0x0A, 0x02, b'/', b'x', 0x12, 0x02, b'h', b'i']
        );
    }
}
