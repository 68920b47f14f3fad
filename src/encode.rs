//! Semantic encoding.
//!
//! Objects are encoded by lowering them back into a [`WireObject`]: floating point values are
//! bit-cast to integers, well-known values are turned into their nested messages and arrays are
//! either written as a packed payload or expanded into one field per element.

use crate::decode::{Field, Object, Value};
use crate::known::{self, DateTime};
use crate::wire::{
    EmptyRepeatedField, EncodeDepthExceeded, EncodeError, IncompatiblePackedWireType,
    IncompatibleWireType, ValueOutOfRange, WireField, WireObject, WireType, WireValue,
    MAX_ENCODE_DEPTH,
};
use bytes::{BufMut, Bytes};
use rust_decimal::Decimal;
use snafu::{ensure, OptionExt};
use time::Duration;
use uuid::Uuid;

impl Object
{
    /// Checks whether the object can be encoded.
    pub fn can_be_encoded(&self) -> bool
    {
        match self.to_wire_object() {
            Ok(wire) => wire.can_be_encoded(),
            Err(_) => false,
        }
    }

    /// Encodes the object, returning an error if any field cannot be encoded.
    pub fn try_encode(&self) -> Result<Bytes, EncodeError>
    {
        self.to_wire_object()?.try_encode()
    }

    /// Encodes the object.
    ///
    /// Will **panic** if the object cannot be encoded. Objects produced by decoding can always be
    /// encoded; use [`Object::try_encode`] for objects built by hand.
    ///
    /// ```
    /// # use protoprobe::{DecodeOptions, Object};
    /// let data = b"\x08\x96\x01\x12\x04fish";
    /// let object = Object::decode(data, &DecodeOptions::default()).unwrap();
    /// assert_eq!(object.encode(), &data[..]);
    /// ```
    pub fn encode(&self) -> Bytes
    {
        match self.try_encode() {
            Ok(bytes) => bytes,
            Err(e) => panic!("Object cannot be encoded: {}", e),
        }
    }

    /// Encodes the object into a buffer.
    ///
    /// Will **panic** if the object cannot be encoded, before anything is written.
    pub fn encode_to<B: BufMut>(&self, buf: &mut B)
    {
        match self.to_wire_object() {
            Ok(wire) => wire.encode_to(buf),
            Err(e) => panic!("Object cannot be encoded: {}", e),
        }
    }

    /// Lowers the object into raw wire fields.
    pub fn to_wire_object(&self) -> Result<WireObject, EncodeError>
    {
        lower_object(self, 0)
    }
}

fn lower_object(object: &Object, depth: usize) -> Result<WireObject, EncodeError>
{
    ensure!(
        depth <= MAX_ENCODE_DEPTH,
        EncodeDepthExceeded {
            limit: MAX_ENCODE_DEPTH
        }
    );

    let mut fields = Vec::with_capacity(object.len());
    for field in object.fields() {
        lower_field(field, depth, &mut fields)?;
    }

    Ok(WireObject::new(fields))
}

fn lower_field(field: &Field, depth: usize, out: &mut Vec<WireField>) -> Result<(), EncodeError>
{
    let number = field.number;
    let wire_type = field.wire_type;

    if let Some(packed) = field.packed_wire_type {
        let value = match &field.value {
            Value::Int32Array(a) => WireValue::Int32Array(a.clone()),
            Value::Int64Array(a) => WireValue::Int64Array(a.clone()),
            Value::Float32Array(a) => {
                WireValue::Int32Array(a.iter().map(|v| v.to_bits() as i32).collect())
            }
            Value::Float64Array(a) if packed == WireType::Fixed64 => {
                WireValue::Int64Array(a.iter().map(|v| v.to_bits() as i64).collect())
            }
            other => {
                return IncompatiblePackedWireType {
                    field: number,
                    packed_wire_type: Some(packed),
                    value: kind_name(other),
                }
                .fail()
            }
        };

        out.push(WireField {
            number,
            wire_type,
            value,
            packed_wire_type: Some(packed),
        });
        return Ok(());
    }

    ensure!(
        !(field.value.is_array() && field.value.is_empty()),
        EmptyRepeatedField { field: number }
    );

    macro_rules! expand {
        ($values:expr, |$v:ident| $lower:expr) => {
            for $v in $values.iter() {
                let value: Result<WireValue, EncodeError> = $lower;
                out.push(WireField::new(number, wire_type, value?));
            }
        };
    }

    match &field.value {
        Value::Int32(v) => out.push(WireField::new(number, wire_type, WireValue::Int32(*v))),
        Value::Int64(v) => out.push(WireField::new(number, wire_type, WireValue::Int64(*v))),
        Value::Float32(v) => out.push(WireField::new(number, wire_type, float32(field, *v)?)),
        Value::Float64(v) => out.push(WireField::new(number, wire_type, float64(field, *v)?)),
        Value::String(s) => out.push(WireField::new(number, wire_type, string(s))),
        Value::Bytes(b) => out.push(WireField::new(number, wire_type, bytes(b))),
        Value::Decimal(d) => out.push(WireField::new(number, wire_type, decimal(d))),
        Value::DateTime(d) => out.push(WireField::new(number, wire_type, date_time(field, d)?)),
        Value::TimeSpan(d) => out.push(WireField::new(number, wire_type, time_span(field, d)?)),
        Value::Guid(g) => out.push(WireField::new(number, wire_type, guid(g))),
        Value::Object(o) => {
            let value = WireValue::Message(lower_object(o, depth + 1)?);
            out.push(WireField::new(number, wire_type, value));
        }
        Value::Int32Array(a) => expand!(a, |v| Ok(WireValue::Int32(*v))),
        Value::Int64Array(a) => expand!(a, |v| Ok(WireValue::Int64(*v))),
        Value::Float32Array(a) => expand!(a, |v| float32(field, *v)),
        Value::Float64Array(a) => expand!(a, |v| float64(field, *v)),
        Value::StringArray(a) => expand!(a, |v| Ok(string(v))),
        Value::BytesArray(a) => expand!(a, |v| Ok(bytes(v))),
        Value::DecimalArray(a) => expand!(a, |v| Ok(decimal(v))),
        Value::DateTimeArray(a) => expand!(a, |v| date_time(field, v)),
        Value::TimeSpanArray(a) => expand!(a, |v| time_span(field, v)),
        Value::GuidArray(a) => expand!(a, |v| Ok(guid(v))),
        Value::ObjectArray(a) => {
            expand!(a, |o| lower_object(o, depth + 1).map(WireValue::Message))
        }
    }

    Ok(())
}

fn float32(field: &Field, value: f32) -> Result<WireValue, EncodeError>
{
    ensure!(
        field.wire_type == WireType::Fixed32,
        IncompatibleWireType {
            field: field.number,
            wire_type: field.wire_type,
            value: "float32",
        }
    );
    Ok(WireValue::Int32(value.to_bits() as i32))
}

fn float64(field: &Field, value: f64) -> Result<WireValue, EncodeError>
{
    ensure!(
        field.wire_type == WireType::Fixed64,
        IncompatibleWireType {
            field: field.number,
            wire_type: field.wire_type,
            value: "float64",
        }
    );
    Ok(WireValue::Int64(value.to_bits() as i64))
}

fn string(value: &str) -> WireValue
{
    WireValue::String(value.to_string())
}

fn bytes(value: &Bytes) -> WireValue
{
    WireValue::Bytes(value.clone())
}

fn decimal(value: &Decimal) -> WireValue
{
    WireValue::Message(known::decimal::encode(value))
}

fn guid(value: &Uuid) -> WireValue
{
    WireValue::Message(known::guid::encode(value))
}

fn date_time(field: &Field, value: &DateTime) -> Result<WireValue, EncodeError>
{
    let message = known::time::encode_date_time(value).context(ValueOutOfRange {
        field: field.number,
        value: "date time",
    })?;
    Ok(WireValue::Message(message))
}

fn time_span(field: &Field, value: &Duration) -> Result<WireValue, EncodeError>
{
    let message = known::time::encode_time_span(value).context(ValueOutOfRange {
        field: field.number,
        value: "time span",
    })?;
    Ok(WireValue::Message(message))
}

fn kind_name(value: &Value) -> &'static str
{
    match value {
        Value::Int32(..) => "int32",
        Value::Int64(..) => "int64",
        Value::Float32(..) => "float32",
        Value::Float64(..) => "float64",
        Value::String(..) => "string",
        Value::Bytes(..) => "bytes",
        Value::Decimal(..) => "decimal",
        Value::DateTime(..) => "date time",
        Value::TimeSpan(..) => "time span",
        Value::Guid(..) => "guid",
        Value::Object(..) => "object",
        Value::Int32Array(..) => "int32 array",
        Value::Int64Array(..) => "int64 array",
        Value::Float32Array(..) => "float32 array",
        Value::Float64Array(..) => "float64 array",
        Value::DecimalArray(..) => "decimal array",
        Value::ObjectArray(..) => "object array",
        Value::StringArray(..) => "string array",
        Value::BytesArray(..) => "bytes array",
        Value::GuidArray(..) => "guid array",
        Value::DateTimeArray(..) => "date time array",
        Value::TimeSpanArray(..) => "time span array",
    }
}
