//! Hand-rolled protobuf wire encoder
//!
//! Produces byte-exact proto3 output for message types that have no generated
//! schema on the client. Each message type owns a fixed table of [`FieldSpec`]s;
//! values are supplied at encode time and emitted in ascending field-number order.
//!
//! Only the two wire types the chain messages need are supported:
//! varint (0) and length-delimited (2). Decoding is not supported.

use std::fmt;

/// Largest field number protobuf allows (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireType {
    Varint = 0,
    LengthDelimited = 2,
}

/// Whether a field is emitted when it holds its default value.
///
/// `Implicit` follows proto3: empty strings, zero and `false` are omitted.
/// `Explicit` always emits the field, so an explicit zero survives on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    Implicit,
    Explicit,
}

/// One entry of a message's immutable field table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub number: u32,
    pub name: &'static str,
    pub wire_type: WireType,
    pub presence: Presence,
}

impl FieldSpec {
    pub const fn string(number: u32, name: &'static str) -> Self {
        Self {
            number,
            name,
            wire_type: WireType::LengthDelimited,
            presence: Presence::Implicit,
        }
    }

    pub const fn bytes(number: u32, name: &'static str) -> Self {
        Self::string(number, name)
    }

    /// Embedded message (always length-delimited)
    pub const fn message(number: u32, name: &'static str) -> Self {
        Self::string(number, name)
    }

    pub const fn varint(number: u32, name: &'static str) -> Self {
        Self {
            number,
            name,
            wire_type: WireType::Varint,
            presence: Presence::Implicit,
        }
    }

    pub const fn explicit(mut self) -> Self {
        self.presence = Presence::Explicit;
        self
    }

    /// `(field_number << 3) | wire_type`
    pub const fn tag(&self) -> u64 {
        ((self.number as u64) << 3) | self.wire_type as u64
    }
}

/// A runtime value bound to a field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Uint(u64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
}

impl FieldValue {
    fn wire_type(&self) -> WireType {
        match self {
            FieldValue::Uint(_) | FieldValue::Bool(_) => WireType::Varint,
            FieldValue::Str(_) | FieldValue::Bytes(_) => WireType::LengthDelimited,
        }
    }

    /// Default (proto3 "unset") values: 0, false, empty string, empty bytes
    pub fn is_default(&self) -> bool {
        match self {
            FieldValue::Uint(n) => *n == 0,
            FieldValue::Bool(b) => !*b,
            FieldValue::Str(s) => s.is_empty(),
            FieldValue::Bytes(b) => b.is_empty(),
        }
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        FieldValue::Uint(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(b: Vec<u8>) -> Self {
        FieldValue::Bytes(b)
    }
}

/// Decoding ad hoc messages is unsupported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeUnsupported {
    pub type_url: &'static str,
}

impl fmt::Display for DecodeUnsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decoding {} is not supported", self.type_url)
    }
}

impl std::error::Error for DecodeUnsupported {}

/// Append `n` as a base-128 little-endian varint.
pub fn write_varint(out: &mut Vec<u8>, mut n: u64) {
    while n >= 0x80 {
        out.push((n as u8 & 0x7F) | 0x80);
        n >>= 7;
    }
    out.push(n as u8);
}

/// Number of bytes `write_varint` emits for `n`.
pub fn varint_len(n: u64) -> usize {
    let bits = 64 - (n | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Encode a varint field: tag `(field << 3) | 0`, then the value.
pub fn encode_varint(field_number: u32, n: u64) -> Vec<u8> {
    assert_field_number(field_number);
    let mut out = Vec::with_capacity(1 + varint_len(n));
    write_varint(&mut out, (field_number as u64) << 3);
    write_varint(&mut out, n);
    out
}

/// Encode a length-delimited field: tag `(field << 3) | 2`, length varint, raw bytes.
pub fn encode_length_delimited(field_number: u32, bytes: &[u8]) -> Vec<u8> {
    assert_field_number(field_number);
    let mut out = Vec::with_capacity(2 + varint_len(bytes.len() as u64) + bytes.len());
    write_varint(&mut out, ((field_number as u64) << 3) | WireType::LengthDelimited as u64);
    write_varint(&mut out, bytes.len() as u64);
    out.extend_from_slice(bytes);
    out
}

/// Encode a single field against its spec. Returns an empty vector when the
/// field is omitted under implicit presence.
///
/// # Panics
///
/// If the value's wire type does not match the spec. The field tables are
/// compile-time constants, so this is a programming error, not a runtime condition.
pub fn encode_field(spec: &FieldSpec, value: &FieldValue) -> Vec<u8> {
    assert_eq!(
        spec.wire_type,
        value.wire_type(),
        "field {} ({}) bound to a value of the wrong wire type",
        spec.number,
        spec.name
    );

    if spec.presence == Presence::Implicit && value.is_default() {
        return Vec::new();
    }

    match value {
        FieldValue::Uint(n) => encode_varint(spec.number, *n),
        FieldValue::Bool(b) => encode_varint(spec.number, u64::from(*b)),
        FieldValue::Str(s) => encode_length_delimited(spec.number, s.as_bytes()),
        FieldValue::Bytes(b) => encode_length_delimited(spec.number, b),
    }
}

/// Encode a full message from `(spec, value)` pairs.
///
/// Fields are emitted in ascending field-number order regardless of the order
/// given; a repeated field is expressed by passing the same spec several times,
/// and its entries keep their relative order.
///
/// # Panics
///
/// If two different specs share a field number, or any wire type mismatches.
pub fn encode_message(fields: &[(FieldSpec, FieldValue)]) -> Vec<u8> {
    let mut ordered: Vec<&(FieldSpec, FieldValue)> = fields.iter().collect();
    ordered.sort_by_key(|(spec, _)| spec.number);

    for pair in ordered.windows(2) {
        let (a, b) = (&pair[0].0, &pair[1].0);
        assert!(
            a.number != b.number || a == b,
            "field number {} declared twice with different specs",
            a.number
        );
    }

    let mut out = Vec::new();
    for (spec, value) in ordered {
        out.extend(encode_field(spec, value));
    }
    out
}

fn assert_field_number(field_number: u32) {
    assert!(
        (1..=MAX_FIELD_NUMBER).contains(&field_number),
        "field number {} outside the valid protobuf range",
        field_number
    );
}
