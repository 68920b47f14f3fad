//! Varint, zigzag and fixed-width primitives.
//!
//! Readers advance a `&mut &[u8]` cursor and return `None` without consuming anything when the
//! input is truncated or malformed. Writers append to any [`BufMut`].

use super::WireType;
use bytes::BufMut;
use std::convert::TryInto;

/// Largest field number representable in a tag.
pub const MAX_FIELD_NUMBER: i32 = (1 << 29) - 1;

/// Reads an unsigned varint of at most 10 bytes.
pub fn read_varint(data: &mut &[u8]) -> Option<u64>
{
    let mut result = 0u64;
    let mut idx = 0;
    loop {
        if idx >= data.len() || idx >= 10 {
            return None;
        }

        let b = data[idx];

        // The tenth byte holds only the 64th bit.
        if idx == 9 && b > 1 {
            return None;
        }

        result |= u64::from(b & 0x7f) << (idx * 7);

        idx += 1;
        if b & 0x80 == 0 {
            break;
        }
    }

    *data = &data[idx..];
    Some(result)
}

/// Reads a tag and splits it into the field number and the raw wire type bits.
///
/// Tags are at most five bytes long. The field number is not validated beyond fitting into 29
/// bits.
pub fn read_tag(data: &mut &[u8]) -> Option<(u64, u8)>
{
    let tag = read_tag_u32(data)?;
    let len = data.iter().position(|b| b & 0x80 == 0)? + 1;
    *data = &data[len..];

    Some((u64::from(tag >> 3), (tag & 0x07) as u8))
}

/// Reads eight bytes.
pub fn try_read_8_bytes(data: &mut &[u8]) -> Option<[u8; 8]>
{
    if data.len() < 8 {
        return None;
    }

    match (data[..8]).try_into() {
        Ok(v) => {
            *data = &data[8..];
            Some(v)
        }
        Err(_) => None,
    }
}

/// Reads four bytes.
pub fn try_read_4_bytes(data: &mut &[u8]) -> Option<[u8; 4]>
{
    if data.len() < 4 {
        return None;
    }

    match (data[..4]).try_into() {
        Ok(v) => {
            *data = &data[4..];
            Some(v)
        }
        Err(_) => None,
    }
}

/// Reads a length prefix and splits off the payload it covers.
pub fn read_length_delimited<'a>(data: &mut &'a [u8]) -> Option<&'a [u8]>
{
    let original = *data;
    let len = read_varint(data)?;
    if len > data.len() as u64 {
        *data = original;
        return None;
    }

    let (payload, remainder) = data.split_at(len as usize);
    *data = remainder;
    Some(payload)
}

/// Decodes a zigzag encoded value.
#[inline]
pub fn zigzag_decode(raw: u64) -> i64
{
    let raw = raw as i64;
    -(raw & 1) ^ ((raw >> 1) & !(1i64 << 63))
}

/// Encodes a value with zigzag encoding.
#[inline]
pub fn zigzag_encode(value: i64) -> u64
{
    ((value << 1) ^ (value >> 63)) as u64
}

/// Checks whether the data starts with a plausible field header.
///
/// The header must fit into five bytes, name a field number of at least one and use one of the
/// wire types that may start a field. Passing the probe does not mean the data is a message; it
/// only filters out data that clearly isn't one before attempting a full parse.
pub fn has_valid_field_header(data: &[u8]) -> bool
{
    let tag = match read_tag_u32(data) {
        Some(tag) => tag,
        None => return false,
    };

    if tag >> 3 < 1 {
        return false;
    }

    match WireType::from_raw((tag & 0x07) as u8) {
        Some(WireType::EndGroup) | None => false,
        Some(_) => true,
    }
}

fn read_tag_u32(data: &[u8]) -> Option<u32>
{
    let mut value = 0u32;
    for (idx, b) in data.iter().take(5).enumerate() {
        if idx == 4 {
            // Only the low nibble of the fifth byte fits into 32 bits.
            return match b & 0xf0 {
                0 => Some(value | (u32::from(*b) << 28)),
                _ => None,
            };
        }

        value |= u32::from(b & 0x7f) << (idx * 7);
        if b & 0x80 == 0 {
            return Some(value);
        }
    }

    None
}

/// Writes an unsigned varint.
pub fn write_varint<B: BufMut>(buf: &mut B, mut value: u64)
{
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Writes a tag. [`WireType::SignedVarint`] is written as a varint tag.
pub fn write_tag<B: BufMut>(buf: &mut B, number: i32, wire_type: WireType)
{
    write_varint(buf, (number as u64) << 3 | u64::from(wire_type.raw()));
}

/// Number of bytes `value` takes as a varint.
pub fn varint_len(value: u64) -> usize
{
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Number of bytes the tag of `number` takes.
pub fn tag_len(number: i32) -> usize
{
    varint_len((number as u64) << 3)
}
