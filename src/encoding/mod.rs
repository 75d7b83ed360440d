//! Protobuf encoding for chain messages and the transaction envelope

pub mod messages;
pub mod tx;
pub mod wire;

pub use messages::{ChainMsg, MsgCreateIdentity, MsgSend, MsgUpdateIdentity, TxMessage};
pub use tx::{AuthInfo, Coin, Fee, SignDoc, SignerInfo, TxBody, TxRaw};
pub use wire::{encode_message, FieldSpec, FieldValue, Presence, WireType};
