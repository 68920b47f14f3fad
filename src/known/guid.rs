//! GUIDs encoded as `message Guid { fixed64 lo = 1; fixed64 hi = 2; }`.
//!
//! The two halves are the first and last eight bytes of the GUID in its little-endian mixed
//! layout, the same layout [`Uuid::to_bytes_le`] produces.

use crate::wire::{WireField, WireObject, WireType, WireValue};
use crate::DecodeOptions;
use uuid::Uuid;

/// Decodes a GUID candidate.
pub(crate) fn decode(object: &WireObject, options: &DecodeOptions) -> Option<Uuid>
{
    let (low, high) = match object.fields.as_slice() {
        [lo, hi] => (fixed64(lo, 1)?, fixed64(hi, 2)?),
        _ => return None,
    };

    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&low.to_le_bytes());
    bytes[8..].copy_from_slice(&high.to_le_bytes());

    let value = Uuid::from_bytes_le(bytes);
    let version = version(&bytes);

    if !(options.guid_validator)(&(value, version)) {
        tracing::trace!(%value, version, "guid rejected by validator");
        return None;
    }

    Some(value)
}

/// Encodes a GUID as its nested message.
pub fn encode(value: &Uuid) -> WireObject
{
    let (low, high) = split(value);
    WireObject::new(vec![
        WireField::fixed64(1, low as i64),
        WireField::fixed64(2, high as i64),
    ])
}

/// Version nibble of a GUID in the little-endian layout.
///
/// The version lives in the high nibble of the eighth byte.
pub fn version(bytes_le: &[u8; 16]) -> u8
{
    bytes_le[7] >> 4
}

fn split(value: &Uuid) -> (u64, u64)
{
    let bytes = value.to_bytes_le();
    let mut low = [0u8; 8];
    let mut high = [0u8; 8];
    low.copy_from_slice(&bytes[..8]);
    high.copy_from_slice(&bytes[8..]);
    (u64::from_le_bytes(low), u64::from_le_bytes(high))
}

fn fixed64(field: &WireField, number: i32) -> Option<u64>
{
    match (field.number, field.wire_type, &field.value) {
        (n, WireType::Fixed64, WireValue::Int64(v)) if n == number => Some(*v as u64),
        _ => None,
    }
}
