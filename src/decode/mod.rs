//! Semantic decoding.
//!
//! The semantic layer turns the raw [`WireObject`] into an [`Object`] of native values: fixed
//! width integers are reinterpreted as floating point numbers when configured, embedded messages
//! matching a well-known layout become GUIDs, date times, time spans or decimals, and repeated
//! occurrences of a field are grouped into arrays.

use crate::known::DateTime;
use crate::wire::{DecodeError, WireObject, WireType};
use crate::DecodeOptions;
use bytes::Bytes;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use time::Duration;
use uuid::Uuid;

mod api;
mod interpret;

/// Decoded value.
#[derive(Debug, PartialEq, Clone)]
pub enum Value
{
    /// 32-bit integer.
    Int32(i32),

    /// 64-bit integer.
    Int64(i64),

    /// 32-bit floating point value.
    Float32(f32),

    /// 64-bit floating point value.
    Float64(f64),

    /// UTF-8 string.
    String(String),

    /// Opaque bytes.
    Bytes(Bytes),

    /// Decimal number.
    Decimal(Decimal),

    /// Date and time.
    DateTime(DateTime),

    /// Time span.
    TimeSpan(Duration),

    /// GUID.
    Guid(Uuid),

    /// Embedded message or group.
    Object(Object),

    /// Repeated or packed 32-bit integers.
    Int32Array(Vec<i32>),

    /// Repeated or packed 64-bit integers.
    Int64Array(Vec<i64>),

    /// Repeated or packed 32-bit floating point values.
    Float32Array(Vec<f32>),

    /// Repeated or packed 64-bit floating point values.
    Float64Array(Vec<f64>),

    /// Repeated decimals.
    DecimalArray(Vec<Decimal>),

    /// Repeated embedded messages or groups.
    ObjectArray(Vec<Object>),

    /// Repeated strings.
    StringArray(Vec<String>),

    /// Repeated byte payloads.
    BytesArray(Vec<Bytes>),

    /// Repeated GUIDs.
    GuidArray(Vec<Uuid>),

    /// Repeated date times.
    DateTimeArray(Vec<DateTime>),

    /// Repeated time spans.
    TimeSpanArray(Vec<Duration>),
}

/// Decoded field.
#[derive(Debug, PartialEq, Clone)]
pub struct Field
{
    /// Field number.
    pub number: i32,

    /// Wire type of the field.
    ///
    /// For arrays grouped from repeated fields this is the wire type of each occurrence.
    pub wire_type: WireType,

    /// Element wire type for arrays decoded from a single packed payload.
    pub packed_wire_type: Option<WireType>,

    /// Field value.
    pub value: Value,
}

/// Decoded message.
///
/// Fields keep the order in which they were decoded. An index from field numbers to field
/// positions is maintained alongside the fields.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Object
{
    fields: Vec<Field>,
    index: BTreeMap<i32, Vec<usize>>,
}

impl Object
{
    /// Decodes a payload into an object.
    ///
    /// ```
    /// # use protoprobe::{DecodeOptions, Object, Value};
    /// let object = Object::decode(b"\x08\x96\x01\x12\x04fish", &DecodeOptions::default()).unwrap();
    /// assert_eq!(object.fields()[0].value, Value::Int64(150));
    /// assert_eq!(object.fields()[1].value, Value::String("fish".to_string()));
    /// ```
    pub fn decode(data: &[u8], options: &DecodeOptions) -> Result<Self, DecodeError>
    {
        let wire = WireObject::decode(data, options)?;
        Ok(wire.into_object(options))
    }

    /// Decodes a payload into an object, returning `None` if the payload is not a valid message.
    pub fn try_decode(data: &[u8], options: &DecodeOptions) -> Option<Self>
    {
        match Self::decode(data, options) {
            Ok(object) => Some(object),
            Err(e) => {
                tracing::debug!(error = %e, len = data.len(), "payload is not a message");
                None
            }
        }
    }
}

impl WireObject
{
    /// Interprets the raw fields as semantic values.
    pub fn into_object(self, options: &DecodeOptions) -> Object
    {
        interpret::interpret(self, options)
    }
}
