//! Wire-level decoding.
//!
//! The decoder is a single recursive descent over the payload. Structural errors anywhere in the
//! payload fail the whole decode, with one exception: a length-delimited payload that fails to
//! parse as an embedded message simply falls through to the next decoding mode.

use super::varint::*;
use super::*;
use crate::options::{DecodeOptions, StringDecodingMode};
use snafu::{ensure, OptionExt};

impl WireObject
{
    /// Decodes a payload into raw fields.
    ///
    /// Only the options that affect length-delimited payloads and the nesting limit are used at
    /// this level.
    pub fn decode(data: &[u8], options: &DecodeOptions) -> Result<Self, DecodeError>
    {
        let mut data = data;
        let fields = decode_fields(&mut data, options, 0, None)?;
        Ok(WireObject::new(fields))
    }

    /// Decodes a payload into raw fields, returning `None` if the payload is not a valid message.
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

/// Decodes fields until the data ends or, inside a group, until the matching end group tag.
fn decode_fields(
    data: &mut &[u8],
    options: &DecodeOptions,
    depth: usize,
    group: Option<i32>,
) -> Result<Vec<WireField>, DecodeError>
{
    let mut fields = vec![];
    loop {
        if data.is_empty() {
            return match group {
                Some(field) => UnterminatedGroup { field }.fail(),
                None => Ok(fields),
            };
        }

        let (number, raw_wire_type) = read_tag(data).context(MalformedVarint { field: 0 })?;
        ensure!(
            number >= 1 && number <= MAX_FIELD_NUMBER as u64,
            InvalidFieldNumber { number }
        );

        let number = number as i32;
        let wire_type = WireType::from_raw(raw_wire_type).context(InvalidWireType {
            field: number,
            wire_type: raw_wire_type,
        })?;

        let mut packed_wire_type = None;
        let value = match wire_type {
            WireType::Varint | WireType::SignedVarint => {
                let v = read_varint(data).context(MalformedVarint { field: number })?;
                WireValue::Int64(v as i64)
            }
            WireType::Fixed64 => {
                let b = try_read_8_bytes(data).context(TruncatedPayload { field: number })?;
                WireValue::Int64(i64::from_le_bytes(b))
            }
            WireType::Fixed32 => {
                let b = try_read_4_bytes(data).context(TruncatedPayload { field: number })?;
                WireValue::Int32(i32::from_le_bytes(b))
            }
            WireType::Len => {
                let payload =
                    read_length_delimited(data).context(TruncatedPayload { field: number })?;
                let (value, packed) = resolve_len(number, payload, options, depth);
                packed_wire_type = packed;
                value
            }
            WireType::StartGroup => {
                ensure!(
                    depth < options.max_depth,
                    DepthLimitExceeded {
                        limit: options.max_depth
                    }
                );

                let inner = decode_fields(data, options, depth + 1, Some(number))?;
                WireValue::Message(WireObject::new(inner))
            }
            WireType::EndGroup => {
                return match group {
                    Some(start) if start == number => Ok(fields),
                    Some(start) => MismatchedEndGroup { start, end: number }.fail(),
                    None => UnexpectedEndGroup { field: number }.fail(),
                };
            }
        };

        fields.push(WireField {
            number,
            wire_type,
            value,
            packed_wire_type,
        });
    }
}

/// Picks the interpretation of a length-delimited payload.
///
/// Returns the value and, for packed arrays, the element wire type.
fn resolve_len(
    number: i32,
    payload: &[u8],
    options: &DecodeOptions,
    depth: usize,
) -> (WireValue, Option<WireType>)
{
    if payload.is_empty() {
        return empty_value(options.empty_string_decoding_mode);
    }

    for mode in &options.preferred_string_decoding_modes {
        if let Some(resolved) = try_mode(*mode, payload, options, depth) {
            return resolved;
        }

        tracing::trace!(field = number, mode = ?mode, "decoding mode rejected payload");
    }

    (WireValue::Bytes(Bytes::copy_from_slice(payload)), None)
}

fn empty_value(mode: StringDecodingMode) -> (WireValue, Option<WireType>)
{
    match mode {
        StringDecodingMode::EmbeddedMessage => (WireValue::Message(WireObject::default()), None),
        StringDecodingMode::String => (WireValue::String(String::new()), None),
        StringDecodingMode::Bytes => (WireValue::Bytes(Bytes::new()), None),
        StringDecodingMode::PackedVarint => (WireValue::Int64Array(vec![]), Some(WireType::Varint)),
        StringDecodingMode::PackedFixed32 => {
            (WireValue::Int32Array(vec![]), Some(WireType::Fixed32))
        }
        StringDecodingMode::PackedFixed64 => {
            (WireValue::Int64Array(vec![]), Some(WireType::Fixed64))
        }
    }
}

fn try_mode(
    mode: StringDecodingMode,
    payload: &[u8],
    options: &DecodeOptions,
    depth: usize,
) -> Option<(WireValue, Option<WireType>)>
{
    macro_rules! read_packed {
        ($variant:ident, $packed:ident @ $val:ident = $try_read:expr => $insert:expr) => {{
            let mut array = payload;
            let mut output = vec![];
            loop {
                if array.is_empty() {
                    break Some((WireValue::$variant(output), Some(WireType::$packed)));
                }

                match $try_read(&mut array) {
                    Some($val) => output.push($insert),
                    None => break None,
                }
            }
        }};
    }

    match mode {
        StringDecodingMode::EmbeddedMessage => {
            decode_embedded(payload, options, depth).map(|m| (WireValue::Message(m), None))
        }
        StringDecodingMode::String => std::str::from_utf8(payload)
            .ok()
            .filter(|s| (options.string_validator)(s))
            .map(|s| (WireValue::String(s.to_string()), None)),
        StringDecodingMode::Bytes => Some((WireValue::Bytes(Bytes::copy_from_slice(payload)), None)),
        StringDecodingMode::PackedVarint => {
            let packed = read_packed! { Int64Array, Varint @ v = read_varint => v as i64 };

            // Padded elements would be shortened on encode.
            packed.filter(|(value, _)| {
                let values = value.int64_array_value();
                values.iter().map(|v| varint_len(*v as u64)).sum::<usize>() == payload.len()
            })
        }
        StringDecodingMode::PackedFixed32 => {
            read_packed! { Int32Array, Fixed32 @ b = try_read_4_bytes => i32::from_le_bytes(b) }
        }
        StringDecodingMode::PackedFixed64 => {
            read_packed! { Int64Array, Fixed64 @ b = try_read_8_bytes => i64::from_le_bytes(b) }
        }
    }
}

/// Attempts to parse the payload as an embedded message.
fn decode_embedded(payload: &[u8], options: &DecodeOptions, depth: usize) -> Option<WireObject>
{
    if !(options.embedded_message_validator)(payload) || !has_valid_field_header(payload) {
        return None;
    }

    if depth >= options.max_depth {
        tracing::trace!(limit = options.max_depth, "embedded message exceeds depth limit");
        return None;
    }

    let mut data = payload;
    match decode_fields(&mut data, options, depth + 1, None) {
        Ok(fields) => {
            // Non-minimal varints parse fine but would not be written back the same way.
            let object = WireObject::new(fields);
            if object.encoded_len() != payload.len() {
                tracing::trace!(len = payload.len(), "embedded message is not canonically encoded");
                return None;
            }

            Some(object)
        }
        Err(e) => {
            tracing::trace!(error = %e, "payload is not an embedded message");
            None
        }
    }
}

#[cfg(test)]
mod test
{
    use super::*;

    fn decode(data: &[u8]) -> Result<WireObject, DecodeError>
    {
        WireObject::decode(data, &DecodeOptions::default())
    }

    #[test]
    fn scalars()
    {
        let data = [
            0x08, 0x96, 0x01, // 1: varint 150
            0x11, 1, 0, 0, 0, 0, 0, 0, 0x80, // 2: fixed64
            0x1d, 0xff, 0xff, 0xff, 0xff, // 3: fixed32 -1
            0x20, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01, // 4: varint -1
        ];

        assert_eq!(
            decode(&data).unwrap(),
            WireObject::new(vec![
                WireField::varint(1, 150),
                WireField::fixed64(2, i64::MIN + 1),
                WireField::fixed32(3, -1),
                WireField::varint(4, -1),
            ])
        );
    }

    #[test]
    fn groups()
    {
        // 1: { 2: 1 } closed by end group 1.
        let data = [0x0b, 0x10, 0x01, 0x0c, 0x18, 0x02];
        assert_eq!(
            decode(&data).unwrap(),
            WireObject::new(vec![
                WireField::group(1, WireObject::new(vec![WireField::varint(2, 1)])),
                WireField::varint(3, 2),
            ])
        );
    }

    #[test]
    fn group_errors()
    {
        assert_eq!(decode(&[0x0c]), Err(DecodeError::UnexpectedEndGroup { field: 1 }));
        assert_eq!(
            decode(&[0x0b, 0x14]),
            Err(DecodeError::MismatchedEndGroup { start: 1, end: 2 })
        );
        assert_eq!(
            decode(&[0x0b, 0x10, 0x01]),
            Err(DecodeError::UnterminatedGroup { field: 1 })
        );
    }

    #[test]
    fn group_depth_limit()
    {
        let mut data = vec![0x0b; 3];
        data.extend_from_slice(&[0x0c; 3]);

        let options = DecodeOptions::default().with_max_depth(3);
        assert!(WireObject::decode(&data, &options).is_ok());

        let options = DecodeOptions::default().with_max_depth(2);
        assert_eq!(
            WireObject::decode(&data, &options),
            Err(DecodeError::DepthLimitExceeded { limit: 2 })
        );
    }

    #[test]
    fn embedded_depth_limit_falls_back()
    {
        // 1: { 1: { 1: 1 } }
        let data = [0x0a, 0x04, 0x0a, 0x02, 0x08, 0x01];

        let nested = decode(&data).unwrap();
        let inner = nested.fields[0].value.message_value();
        assert_eq!(inner.fields[0].value.message_value().fields.len(), 1);

        let options = DecodeOptions::default().with_max_depth(1);
        let limited = WireObject::decode(&data, &options).unwrap();
        let inner = limited.fields[0].value.message_value();
        assert_eq!(inner.fields[0].value, WireValue::Bytes(Bytes::from_static(&[0x08, 0x01])));
    }

    #[test]
    fn malformed()
    {
        assert_eq!(decode(&[0x08]), Err(DecodeError::MalformedVarint { field: 1 }));
        assert_eq!(decode(&[0x80]), Err(DecodeError::MalformedVarint { field: 0 }));
        assert_eq!(
            decode(&[0x88, 0x80, 0x80, 0x80, 0x80, 0x00, 0x01]),
            Err(DecodeError::MalformedVarint { field: 0 })
        );
        assert_eq!(decode(&[0x00]), Err(DecodeError::InvalidFieldNumber { number: 0 }));
        assert_eq!(
            decode(&[0x0e, 0x00]),
            Err(DecodeError::InvalidWireType {
                field: 1,
                wire_type: 6
            })
        );
        assert_eq!(decode(&[0x0a, 0x05, 0x01]), Err(DecodeError::TruncatedPayload { field: 1 }));
        assert_eq!(decode(&[0x0d, 0x01, 0x02]), Err(DecodeError::TruncatedPayload { field: 1 }));
        assert_eq!(
            decode(&[0x09, 0x01, 0x02, 0x03]),
            Err(DecodeError::TruncatedPayload { field: 1 })
        );
    }

    #[test]
    fn len_modes_in_order()
    {
        // 1: "abc"
        let data = [0x0a, 0x03, b'a', b'b', b'c'];
        assert_eq!(decode(&data).unwrap(), WireObject::new(vec![WireField::string(1, "abc")]));

        let options = DecodeOptions::default()
            .with_string_decoding_modes(vec![StringDecodingMode::Bytes, StringDecodingMode::String]);
        assert_eq!(
            WireObject::decode(&data, &options).unwrap(),
            WireObject::new(vec![WireField::bytes(1, &b"abc"[..])])
        );

        // Control characters fail the string validator and fall back to bytes.
        let data = [0x0a, 0x02, 0x01, 0x02];
        assert_eq!(
            decode(&data).unwrap(),
            WireObject::new(vec![WireField::bytes(1, Bytes::from_static(&[0x01, 0x02]))])
        );
    }

    #[test]
    fn no_mode_matches()
    {
        let options = DecodeOptions::default()
            .with_string_decoding_modes(vec![StringDecodingMode::PackedFixed32]);

        let data = [0x0a, 0x03, 1, 2, 3];
        assert_eq!(
            WireObject::decode(&data, &options).unwrap(),
            WireObject::new(vec![WireField::bytes(1, Bytes::from_static(&[1, 2, 3]))])
        );
    }

    #[test]
    fn packed_modes()
    {
        let data = [0x0a, 0x04, 0x01, 0x96, 0x01, 0x7f];
        let options = DecodeOptions::default()
            .with_string_decoding_modes(vec![StringDecodingMode::PackedVarint]);
        assert_eq!(
            WireObject::decode(&data, &options).unwrap(),
            WireObject::new(vec![WireField::packed_int64(
                1,
                WireType::Varint,
                vec![1, 150, 127]
            )])
        );

        let data = [0x0a, 0x08, 1, 0, 0, 0, 0xff, 0xff, 0xff, 0xff];
        let options = DecodeOptions::default()
            .with_string_decoding_modes(vec![StringDecodingMode::PackedFixed32]);
        assert_eq!(
            WireObject::decode(&data, &options).unwrap(),
            WireObject::new(vec![WireField::packed_fixed32(1, vec![1, -1])])
        );

        let options = DecodeOptions::default()
            .with_string_decoding_modes(vec![StringDecodingMode::PackedFixed64]);
        assert_eq!(
            WireObject::decode(&data, &options).unwrap(),
            WireObject::new(vec![WireField::packed_int64(
                1,
                WireType::Fixed64,
                vec![-4_294_967_295]
            )])
        );
    }

    #[test]
    fn packed_varint_rejects_truncated_run()
    {
        let data = [0x0a, 0x02, 0x01, 0x96];
        let options = DecodeOptions::default().with_string_decoding_modes(vec![
            StringDecodingMode::PackedVarint,
            StringDecodingMode::Bytes,
        ]);
        assert_eq!(
            WireObject::decode(&data, &options).unwrap(),
            WireObject::new(vec![WireField::bytes(1, Bytes::from_static(&[0x01, 0x96]))])
        );
    }

    #[test]
    fn padded_varints_stay_bytes()
    {
        // 1: { 1: 0 } with the inner value padded to two bytes.
        let data = [0x0a, 0x03, 0x08, 0x80, 0x00];
        assert_eq!(
            decode(&data).unwrap(),
            WireObject::new(vec![WireField::bytes(1, Bytes::from_static(&[0x08, 0x80, 0x00]))])
        );

        // Padded tag inside the payload.
        let data = [0x0a, 0x03, 0x88, 0x00, 0x01];
        assert_eq!(
            decode(&data).unwrap(),
            WireObject::new(vec![WireField::bytes(1, Bytes::from_static(&[0x88, 0x00, 0x01]))])
        );

        let data = [0x0a, 0x03, 0x01, 0x80, 0x00];
        let options = DecodeOptions::default().with_string_decoding_modes(vec![
            StringDecodingMode::PackedVarint,
            StringDecodingMode::Bytes,
        ]);
        let object = WireObject::decode(&data, &options).unwrap();
        assert_eq!(
            object,
            WireObject::new(vec![WireField::bytes(1, Bytes::from_static(&[0x01, 0x80, 0x00]))])
        );
        assert_eq!(object.encode(), &data[..]);
    }

    #[test]
    fn empty_payload_modes()
    {
        let data = [0x0a, 0x00];
        let cases = vec![
            (StringDecodingMode::Bytes, WireField::bytes(1, Bytes::new())),
            (StringDecodingMode::String, WireField::string(1, "")),
            (
                StringDecodingMode::EmbeddedMessage,
                WireField::message(1, WireObject::default()),
            ),
            (
                StringDecodingMode::PackedFixed32,
                WireField::packed_fixed32(1, vec![]),
            ),
        ];

        for (mode, expected) in cases {
            let options = DecodeOptions::default().with_empty_string_decoding_mode(mode);
            assert_eq!(
                WireObject::decode(&data, &options).unwrap(),
                WireObject::new(vec![expected])
            );
        }
    }

    #[test]
    fn try_decode()
    {
        assert!(WireObject::try_decode(&[0x08, 0x01], &DecodeOptions::default()).is_some());
        assert!(WireObject::try_decode(&[0xff, 0xff], &DecodeOptions::default()).is_none());
        assert_eq!(
            WireObject::try_decode(&[], &DecodeOptions::default()),
            Some(WireObject::default())
        );
    }
}
