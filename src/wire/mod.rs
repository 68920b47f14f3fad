//! Raw wire-level representation.
//!
//! A [`WireObject`] stays as close to the encoded bytes as possible: integers keep their raw bit
//! patterns and fields keep their order. The only interpretation applied at this level is the
//! resolution of length-delimited payloads into strings, bytes, embedded messages or packed
//! arrays, driven by [`DecodeOptions`](crate::DecodeOptions).

use bytes::Bytes;
use snafu::Snafu;

mod api;
pub(crate) mod decode;
pub(crate) mod encode;
pub mod varint;

pub use encode::MAX_ENCODE_DEPTH;

/// Protocol buffer wire type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType
{
    /// Variable length integer (wire type = 0).
    Varint,

    /// 64-bit value (wire type = 1).
    Fixed64,

    /// Length-delimited value, also known as LEN (wire type = 2).
    Len,

    /// Group start (wire type = 3).
    StartGroup,

    /// Group end (wire type = 4).
    EndGroup,

    /// 32-bit value (wire type = 5).
    Fixed32,

    /// Zigzag encoded variable length integer.
    ///
    /// Shares wire type 0 with [`WireType::Varint`]. The decoder never produces this wire type,
    /// it only exists to mark values that should be zigzag encoded.
    SignedVarint,
}

/// Raw decoded value.
///
/// The value carries no wire type of its own; see [`WireField::wire_type`].
#[derive(Debug, PartialEq, Clone)]
pub enum WireValue
{
    /// 32-bit integer.
    Int32(i32),

    /// 64-bit integer.
    Int64(i64),

    /// UTF-8 string.
    String(String),

    /// Opaque bytes.
    Bytes(Bytes),

    /// Embedded message or group.
    Message(WireObject),

    /// Packed 32-bit integers.
    Int32Array(Vec<i32>),

    /// Packed 64-bit integers.
    Int64Array(Vec<i64>),
}

/// Kind of the active [`WireValue`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireValueKind
{
    /// [`WireValue::Int32`]
    Int32,
    /// [`WireValue::Int64`]
    Int64,
    /// [`WireValue::String`]
    String,
    /// [`WireValue::Bytes`]
    Bytes,
    /// [`WireValue::Message`]
    Message,
    /// [`WireValue::Int32Array`]
    Int32Array,
    /// [`WireValue::Int64Array`]
    Int64Array,
}

/// A single raw field.
#[derive(Debug, PartialEq, Clone)]
pub struct WireField
{
    /// Field number.
    pub number: i32,

    /// Wire type used for the field.
    pub wire_type: WireType,

    /// Field value.
    pub value: WireValue,

    /// Element wire type when the value is an array decoded from a packed payload.
    pub packed_wire_type: Option<WireType>,
}

/// Raw message as an ordered list of fields.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct WireObject
{
    /// Fields in the order they appeared on the wire.
    pub fields: Vec<WireField>,
}

/// Error decoding a protocol buffer payload.
#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum DecodeError
{
    /// A varint was truncated or longer than 10 bytes.
    #[snafu(display("Malformed varint in field {}", field))]
    MalformedVarint
    {
        /// Field number, 0 when reading the tag.
        field: i32,
    },

    /// The tag named field number zero or a number that does not fit into 29 bits.
    #[snafu(display("Invalid field number {}", number))]
    InvalidFieldNumber
    {
        /// The field number.
        number: u64,
    },

    /// The tag used reserved wire type 6 or 7.
    #[snafu(display("Invalid wire type {} in field {}", wire_type, field))]
    InvalidWireType
    {
        /// Field number.
        field: i32,

        /// Raw wire type bits.
        wire_type: u8,
    },

    /// The payload ended before the value did.
    #[snafu(display("Payload of field {} ended unexpectedly", field))]
    TruncatedPayload
    {
        /// Field number.
        field: i32,
    },

    /// An end group tag appeared outside a group.
    #[snafu(display("Unexpected end of group {}", field))]
    UnexpectedEndGroup
    {
        /// Field number of the end group tag.
        field: i32,
    },

    /// An end group tag closed a different group than the one that was open.
    #[snafu(display("Group {} was closed by end group {}", start, end))]
    MismatchedEndGroup
    {
        /// Field number of the start group tag.
        start: i32,

        /// Field number of the end group tag.
        end: i32,
    },

    /// The payload ended inside a group.
    #[snafu(display("Group {} was not terminated", field))]
    UnterminatedGroup
    {
        /// Field number of the start group tag.
        field: i32,
    },

    /// Messages or groups were nested deeper than allowed.
    #[snafu(display("Nesting depth exceeded the limit of {}", limit))]
    DepthLimitExceeded
    {
        /// The configured limit.
        limit: usize,
    },
}

/// Error encoding a message.
#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum EncodeError
{
    /// Field number was not in the valid range.
    #[snafu(display("Invalid field number {}", number))]
    FieldNumberOutOfRange
    {
        /// The field number.
        number: i32,
    },

    /// The value cannot be encoded with the wire type of the field.
    #[snafu(display("Field {} cannot encode {} as {:?}", field, value, wire_type))]
    IncompatibleWireType
    {
        /// Field number.
        field: i32,

        /// Wire type of the field.
        wire_type: WireType,

        /// Description of the value kind.
        value: &'static str,
    },

    /// The packed element wire type is not valid for the value.
    #[snafu(display("Field {} cannot pack {} as {:?}", field, value, packed_wire_type))]
    IncompatiblePackedWireType
    {
        /// Field number.
        field: i32,

        /// Packed element wire type of the field.
        packed_wire_type: Option<WireType>,

        /// Description of the value kind.
        value: &'static str,
    },

    /// A well-known value cannot be represented in its message encoding.
    #[snafu(display("Field {} holds a {} outside the encodable range", field, value))]
    ValueOutOfRange
    {
        /// Field number.
        field: i32,

        /// Description of the value kind.
        value: &'static str,
    },

    /// A non-packed repeated field has no elements and so no wire representation.
    #[snafu(display("Repeated field {} has no elements", field))]
    EmptyRepeatedField
    {
        /// Field number.
        field: i32,
    },

    /// Messages were nested deeper than allowed.
    #[snafu(display("Nesting depth exceeded the limit of {}", limit))]
    EncodeDepthExceeded
    {
        /// The limit.
        limit: usize,
    },
}

impl WireType
{
    /// Converts raw wire type bits into a wire type.
    ///
    /// Returns `None` for the reserved values 6 and 7.
    pub fn from_raw(raw: u8) -> Option<Self>
    {
        match raw {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::Len),
            3 => Some(WireType::StartGroup),
            4 => Some(WireType::EndGroup),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }

    /// Raw wire type bits used in the tag.
    pub fn raw(self) -> u8
    {
        match self {
            WireType::Varint | WireType::SignedVarint => 0,
            WireType::Fixed64 => 1,
            WireType::Len => 2,
            WireType::StartGroup => 3,
            WireType::EndGroup => 4,
            WireType::Fixed32 => 5,
        }
    }
}
