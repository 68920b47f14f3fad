//! Lowering of raw wire fields into semantic fields.

use super::*;
use crate::known;
use crate::options::FixedDecodingMode;
use crate::wire::{WireField, WireValue};
use std::collections::HashMap;
use std::mem::discriminant;

pub(crate) fn interpret(object: WireObject, options: &DecodeOptions) -> Object
{
    let fields = object
        .fields
        .into_iter()
        .map(|field| lower(field, options))
        .collect();

    Object::new(group_repeated(fields))
}

fn lower(field: WireField, options: &DecodeOptions) -> Field
{
    let WireField {
        number,
        wire_type,
        value,
        packed_wire_type,
    } = field;

    let floating32 = options.fixed32_decoding_mode == FixedDecodingMode::FloatingPoint;
    let floating64 = options.fixed64_decoding_mode == FixedDecodingMode::FloatingPoint;

    let value = match value {
        WireValue::Int32(v) if floating32 && wire_type == WireType::Fixed32 => {
            Value::Float32(f32::from_bits(v as u32))
        }
        WireValue::Int64(v) if floating64 && wire_type == WireType::Fixed64 => {
            Value::Float64(f64::from_bits(v as u64))
        }
        WireValue::Int32(v) => Value::Int32(v),
        WireValue::Int64(v) => Value::Int64(v),
        WireValue::String(s) => Value::String(s),
        WireValue::Bytes(b) => Value::Bytes(b),
        WireValue::Message(m) => {
            let known = match wire_type {
                WireType::Len => known::decode(&m, options),
                _ => None,
            };
            known.unwrap_or_else(|| Value::Object(interpret(m, options)))
        }
        WireValue::Int32Array(a) if floating32 && packed_wire_type == Some(WireType::Fixed32) => {
            Value::Float32Array(a.into_iter().map(|v| f32::from_bits(v as u32)).collect())
        }
        WireValue::Int64Array(a) if floating64 && packed_wire_type == Some(WireType::Fixed64) => {
            Value::Float64Array(a.into_iter().map(|v| f64::from_bits(v as u64)).collect())
        }
        WireValue::Int32Array(a) => Value::Int32Array(a),
        WireValue::Int64Array(a) => Value::Int64Array(a),
    };

    Field {
        number,
        wire_type,
        packed_wire_type,
        value,
    }
}

/// Groups repeated occurrences of a field into a single array field.
///
/// Occurrences are grouped only when they form the single contiguous run of their field number,
/// share the wire type and value kind and are not packed arrays themselves. Anything else would
/// change the field order or the wire types on re-encoding.
fn group_repeated(fields: Vec<Field>) -> Vec<Field>
{
    let mut runs: Vec<Vec<Field>> = vec![];
    for field in fields {
        match runs.last_mut() {
            Some(run) if run[0].number == field.number => run.push(field),
            _ => runs.push(vec![field]),
        }
    }

    let mut runs_per_number = HashMap::new();
    for run in &runs {
        *runs_per_number.entry(run[0].number).or_insert(0) += 1;
    }

    let mut output = vec![];
    for run in runs {
        if run.len() >= 2 && runs_per_number[&run[0].number] == 1 && can_merge(&run) {
            output.push(merge(run));
        } else {
            output.extend(run);
        }
    }

    output
}

fn can_merge(run: &[Field]) -> bool
{
    let first = &run[0];
    let has_array_form = matches!(
        first.value,
        Value::Int32(..)
            | Value::Int64(..)
            | Value::Float32(..)
            | Value::Float64(..)
            | Value::String(..)
            | Value::Bytes(..)
            | Value::Decimal(..)
            | Value::DateTime(..)
            | Value::TimeSpan(..)
            | Value::Guid(..)
            | Value::Object(..)
    );

    has_array_form
        && run.iter().all(|f| {
            f.wire_type == first.wire_type
                && f.packed_wire_type.is_none()
                && discriminant(&f.value) == discriminant(&first.value)
        })
}

/// Merges a run accepted by [`can_merge`].
fn merge(run: Vec<Field>) -> Field
{
    let number = run[0].number;
    let wire_type = run[0].wire_type;

    macro_rules! collect {
        ($scalar:ident => $array:ident) => {
            Value::$array(
                run.into_iter()
                    .filter_map(|f| match f.value {
                        Value::$scalar(v) => Some(v),
                        _ => None,
                    })
                    .collect(),
            )
        };
    }

    let value = match run[0].value {
        Value::Int32(..) => collect!(Int32 => Int32Array),
        Value::Int64(..) => collect!(Int64 => Int64Array),
        Value::Float32(..) => collect!(Float32 => Float32Array),
        Value::Float64(..) => collect!(Float64 => Float64Array),
        Value::String(..) => collect!(String => StringArray),
        Value::Bytes(..) => collect!(Bytes => BytesArray),
        Value::Decimal(..) => collect!(Decimal => DecimalArray),
        Value::DateTime(..) => collect!(DateTime => DateTimeArray),
        Value::TimeSpan(..) => collect!(TimeSpan => TimeSpanArray),
        Value::Guid(..) => collect!(Guid => GuidArray),
        _ => collect!(Object => ObjectArray),
    };

    Field::new(number, wire_type, value)
}
