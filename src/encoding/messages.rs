//! Chain messages the wallet can submit
//!
//! The identity module messages are custom types that no client-side schema
//! knows about, so each one declares its field table here and is encoded through
//! [`crate::encoding::wire`].

use crate::encoding::tx::{Any, Coin};
use crate::encoding::wire::{encode_message, DecodeUnsupported, FieldSpec, FieldValue};
use crate::error::WalletError;

/// A message that can be packed into a transaction body.
pub trait ChainMsg {
    /// Protobuf type URL, e.g. `/cosmos.bank.v1beta1.MsgSend`
    fn type_url(&self) -> &'static str;

    /// Field values bound to the message's fixed table.
    fn fields(&self) -> Vec<(FieldSpec, FieldValue)>;

    /// Required-field checks, run before any signing or network call.
    fn validate(&self) -> Result<(), WalletError>;

    fn encode(&self) -> Vec<u8> {
        encode_message(&self.fields())
    }

    fn to_any(&self) -> Any {
        Any {
            type_url: self.type_url().to_string(),
            value: self.encode(),
        }
    }

    /// Outbound-only: the wallet never parses these messages back.
    fn decode(_bytes: &[u8]) -> Result<Self, DecodeUnsupported>
    where
        Self: Sized;
}

fn require(value: &str, what: &str) -> Result<(), WalletError> {
    if value.trim().is_empty() {
        return Err(WalletError::invalid_input(format!("{} is required", what)));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// MsgSend
// ---------------------------------------------------------------------------

pub const MSG_SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";

pub mod msg_send_fields {
    use super::FieldSpec;

    pub const FROM_ADDRESS: FieldSpec = FieldSpec::string(1, "from_address");
    pub const TO_ADDRESS: FieldSpec = FieldSpec::string(2, "to_address");
    pub const AMOUNT: FieldSpec = FieldSpec::message(3, "amount");
}

/// Bank transfer (`cosmos.bank.v1beta1.MsgSend`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgSend {
    pub from_address: String,
    pub to_address: String,
    pub amount: Vec<Coin>,
}

impl ChainMsg for MsgSend {
    fn type_url(&self) -> &'static str {
        MSG_SEND_TYPE_URL
    }

    fn fields(&self) -> Vec<(FieldSpec, FieldValue)> {
        use msg_send_fields::*;

        let mut fields = vec![
            (FROM_ADDRESS, FieldValue::from(self.from_address.as_str())),
            (TO_ADDRESS, FieldValue::from(self.to_address.as_str())),
        ];
        for coin in &self.amount {
            fields.push((AMOUNT, FieldValue::Bytes(coin.encode())));
        }
        fields
    }

    fn validate(&self) -> Result<(), WalletError> {
        require(&self.from_address, "Sender address")?;
        require(&self.to_address, "Recipient address")?;
        if self.amount.is_empty() || self.amount.iter().all(|c| c.amount == 0) {
            return Err(WalletError::invalid_input("Amount must be greater than zero"));
        }
        Ok(())
    }

    fn decode(_bytes: &[u8]) -> Result<Self, DecodeUnsupported> {
        Err(DecodeUnsupported {
            type_url: MSG_SEND_TYPE_URL,
        })
    }
}

// ---------------------------------------------------------------------------
// MsgCreateIdentity
// ---------------------------------------------------------------------------

pub const MSG_CREATE_IDENTITY_TYPE_URL: &str = "/vietchain.identity.MsgCreateIdentity";

pub mod create_identity_fields {
    use super::FieldSpec;

    pub const CREATOR: FieldSpec = FieldSpec::string(1, "creator");
    pub const CCCD_ID: FieldSpec = FieldSpec::string(2, "cccd_id");
}

/// Registers an identity bound to a national (CCCD) id number
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgCreateIdentity {
    pub creator: String,
    pub cccd_id: String,
}

impl ChainMsg for MsgCreateIdentity {
    fn type_url(&self) -> &'static str {
        MSG_CREATE_IDENTITY_TYPE_URL
    }

    fn fields(&self) -> Vec<(FieldSpec, FieldValue)> {
        use create_identity_fields::*;

        vec![
            (CREATOR, FieldValue::from(self.creator.as_str())),
            (CCCD_ID, FieldValue::from(self.cccd_id.as_str())),
        ]
    }

    fn validate(&self) -> Result<(), WalletError> {
        require(&self.creator, "Creator address")?;
        require(&self.cccd_id, "National id")
    }

    fn decode(_bytes: &[u8]) -> Result<Self, DecodeUnsupported> {
        Err(DecodeUnsupported {
            type_url: MSG_CREATE_IDENTITY_TYPE_URL,
        })
    }
}

// ---------------------------------------------------------------------------
// MsgUpdateIdentity
// ---------------------------------------------------------------------------

pub const MSG_UPDATE_IDENTITY_TYPE_URL: &str = "/vietchain.identity.MsgUpdateIdentity";

pub mod update_identity_fields {
    use super::FieldSpec;

    pub const CREATOR: FieldSpec = FieldSpec::string(1, "creator");
    /// Always on the wire: identity 0 is a real record, not "unset".
    pub const ID: FieldSpec = FieldSpec::varint(2, "id").explicit();
    pub const FULL_NAME: FieldSpec = FieldSpec::string(3, "full_name");
    pub const DATE_OF_BIRTH: FieldSpec = FieldSpec::string(4, "date_of_birth");
    pub const IS_VERIFIED: FieldSpec = FieldSpec::varint(5, "is_verified");
    pub const VERIFIED_BY: FieldSpec = FieldSpec::string(6, "verified_by");
}

/// Updates the identity record `id` owned by `creator`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MsgUpdateIdentity {
    pub creator: String,
    pub id: u64,
    pub full_name: String,
    pub date_of_birth: String,
    pub is_verified: bool,
    pub verified_by: String,
}

impl ChainMsg for MsgUpdateIdentity {
    fn type_url(&self) -> &'static str {
        MSG_UPDATE_IDENTITY_TYPE_URL
    }

    fn fields(&self) -> Vec<(FieldSpec, FieldValue)> {
        use update_identity_fields::*;

        vec![
            (CREATOR, FieldValue::from(self.creator.as_str())),
            (ID, FieldValue::Uint(self.id)),
            (FULL_NAME, FieldValue::from(self.full_name.as_str())),
            (DATE_OF_BIRTH, FieldValue::from(self.date_of_birth.as_str())),
            (IS_VERIFIED, FieldValue::Bool(self.is_verified)),
            (VERIFIED_BY, FieldValue::from(self.verified_by.as_str())),
        ]
    }

    fn validate(&self) -> Result<(), WalletError> {
        require(&self.creator, "Creator address")?;
        if self.full_name.trim().is_empty()
            && self.date_of_birth.trim().is_empty()
            && !self.is_verified
            && self.verified_by.trim().is_empty()
        {
            return Err(WalletError::invalid_input(
                "Identity update must change at least one field",
            ));
        }
        Ok(())
    }

    fn decode(_bytes: &[u8]) -> Result<Self, DecodeUnsupported> {
        Err(DecodeUnsupported {
            type_url: MSG_UPDATE_IDENTITY_TYPE_URL,
        })
    }
}

/// Closed set of messages the transaction builder composes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxMessage {
    Send(MsgSend),
    CreateIdentity(MsgCreateIdentity),
    UpdateIdentity(MsgUpdateIdentity),
}

impl TxMessage {
    fn inner(&self) -> &dyn ChainMsg {
        match self {
            TxMessage::Send(m) => m,
            TxMessage::CreateIdentity(m) => m,
            TxMessage::UpdateIdentity(m) => m,
        }
    }

    pub fn type_url(&self) -> &'static str {
        self.inner().type_url()
    }

    pub fn fields(&self) -> Vec<(FieldSpec, FieldValue)> {
        self.inner().fields()
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        self.inner().validate()
    }

    pub fn encode(&self) -> Vec<u8> {
        self.inner().encode()
    }

    pub fn to_any(&self) -> Any {
        self.inner().to_any()
    }
}
