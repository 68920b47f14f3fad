//! Wire-level encoding.
//!
//! Encoding happens in two passes: the object is first checked against the wire type rules, then
//! written out. Nested message lengths are computed up front so the output is written in a
//! single pass without patching length prefixes.

use super::varint::*;
use super::*;
use bytes::{BufMut, BytesMut};
use snafu::ensure;

/// Maximum nesting depth of messages and groups when encoding.
pub const MAX_ENCODE_DEPTH: usize = 1024;

impl WireObject
{
    /// Checks whether the object can be encoded.
    pub fn can_be_encoded(&self) -> bool
    {
        self.check(0).is_ok()
    }

    /// Encodes the object, returning an error if any field cannot be encoded.
    pub fn try_encode(&self) -> Result<Bytes, EncodeError>
    {
        self.check(0)?;

        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.write(&mut buf);
        Ok(buf.freeze())
    }

    /// Encodes the object.
    ///
    /// Will **panic** if the object cannot be encoded. Use [`WireObject::try_encode`] for objects
    /// that are not known to be valid.
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
        if let Err(e) = self.check(0) {
            panic!("Object cannot be encoded: {}", e);
        }

        self.write(buf);
    }

    /// Number of bytes the encoded object takes.
    ///
    /// The result is only meaningful for objects that can be encoded.
    pub fn encoded_len(&self) -> usize
    {
        self.fields.iter().map(WireField::encoded_len).sum()
    }

    fn check(&self, depth: usize) -> Result<(), EncodeError>
    {
        ensure!(
            depth <= MAX_ENCODE_DEPTH,
            EncodeDepthExceeded {
                limit: MAX_ENCODE_DEPTH
            }
        );

        for field in &self.fields {
            field.check(depth)?;
        }

        Ok(())
    }

    fn write<B: BufMut>(&self, buf: &mut B)
    {
        for field in &self.fields {
            field.write(buf);
        }
    }
}

impl WireField
{
    fn check(&self, depth: usize) -> Result<(), EncodeError>
    {
        ensure!(
            self.number >= 1 && self.number <= MAX_FIELD_NUMBER,
            FieldNumberOutOfRange {
                number: self.number
            }
        );

        let packed_ok = match (&self.value, self.packed_wire_type) {
            (WireValue::Int32Array(..), Some(WireType::Fixed32)) => true,
            (WireValue::Int64Array(..), Some(WireType::Fixed64))
            | (WireValue::Int64Array(..), Some(WireType::Varint))
            | (WireValue::Int64Array(..), Some(WireType::SignedVarint)) => true,
            (WireValue::Int32Array(..), _) | (WireValue::Int64Array(..), _) => false,
            (_, packed) => packed.is_none(),
        };
        ensure!(
            packed_ok,
            IncompatiblePackedWireType {
                field: self.number,
                packed_wire_type: self.packed_wire_type,
                value: self.value.kind_name(),
            }
        );

        let wire_type_ok = match (self.wire_type, &self.value) {
            (WireType::Varint, WireValue::Int32(..))
            | (WireType::Varint, WireValue::Int64(..))
            | (WireType::SignedVarint, WireValue::Int32(..))
            | (WireType::SignedVarint, WireValue::Int64(..))
            | (WireType::Fixed32, WireValue::Int32(..))
            | (WireType::Fixed64, WireValue::Int32(..))
            | (WireType::Fixed64, WireValue::Int64(..))
            | (WireType::Len, WireValue::String(..))
            | (WireType::Len, WireValue::Bytes(..))
            | (WireType::Len, WireValue::Message(..))
            | (WireType::Len, WireValue::Int32Array(..))
            | (WireType::Len, WireValue::Int64Array(..))
            | (WireType::StartGroup, WireValue::Message(..)) => true,
            _ => false,
        };
        ensure!(
            wire_type_ok,
            IncompatibleWireType {
                field: self.number,
                wire_type: self.wire_type,
                value: self.value.kind_name(),
            }
        );

        if let WireValue::Message(m) = &self.value {
            m.check(depth + 1)?;
        }

        Ok(())
    }

    fn encoded_len(&self) -> usize
    {
        let tag = tag_len(self.number);
        match self.wire_type {
            WireType::Len => {
                let len = self.payload_len();
                tag + varint_len(len as u64) + len
            }
            WireType::StartGroup => 2 * tag + self.payload_len(),
            _ => tag + self.payload_len(),
        }
    }

    /// Length of the value without the tag and length prefix.
    fn payload_len(&self) -> usize
    {
        match (self.wire_type, &self.value) {
            (WireType::Varint, WireValue::Int32(v)) => varint_len(i64::from(*v) as u64),
            (WireType::Varint, WireValue::Int64(v)) => varint_len(*v as u64),
            (WireType::SignedVarint, WireValue::Int32(v)) => {
                varint_len(zigzag_encode(i64::from(*v)))
            }
            (WireType::SignedVarint, WireValue::Int64(v)) => varint_len(zigzag_encode(*v)),
            (WireType::Fixed32, _) => 4,
            (WireType::Fixed64, _) => 8,
            (_, WireValue::String(s)) => s.len(),
            (_, WireValue::Bytes(b)) => b.len(),
            (_, WireValue::Message(m)) => m.encoded_len(),
            (_, WireValue::Int32Array(a)) => 4 * a.len(),
            (_, WireValue::Int64Array(a)) => match self.packed_wire_type {
                Some(WireType::Varint) => a.iter().map(|v| varint_len(*v as u64)).sum(),
                Some(WireType::SignedVarint) => {
                    a.iter().map(|v| varint_len(zigzag_encode(*v))).sum()
                }
                _ => 8 * a.len(),
            },
            _ => 0,
        }
    }

    fn write<B: BufMut>(&self, buf: &mut B)
    {
        write_tag(buf, self.number, self.wire_type);

        match (self.wire_type, &self.value) {
            (WireType::Varint, WireValue::Int32(v)) => write_varint(buf, i64::from(*v) as u64),
            (WireType::Varint, WireValue::Int64(v)) => write_varint(buf, *v as u64),
            (WireType::SignedVarint, WireValue::Int32(v)) => {
                write_varint(buf, zigzag_encode(i64::from(*v)))
            }
            (WireType::SignedVarint, WireValue::Int64(v)) => write_varint(buf, zigzag_encode(*v)),
            (WireType::Fixed32, WireValue::Int32(v)) => buf.put_i32_le(*v),
            (WireType::Fixed64, WireValue::Int32(v)) => buf.put_i64_le(i64::from(*v)),
            (WireType::Fixed64, WireValue::Int64(v)) => buf.put_i64_le(*v),
            (WireType::StartGroup, WireValue::Message(m)) => {
                m.write(buf);
                write_tag(buf, self.number, WireType::EndGroup);
            }
            (WireType::Len, value) => {
                write_varint(buf, self.payload_len() as u64);
                match value {
                    WireValue::String(s) => buf.put_slice(s.as_bytes()),
                    WireValue::Bytes(b) => buf.put_slice(b),
                    WireValue::Message(m) => m.write(buf),
                    WireValue::Int32Array(a) => a.iter().for_each(|v| buf.put_i32_le(*v)),
                    WireValue::Int64Array(a) => self.write_packed_int64(a, buf),
                    WireValue::Int32(..) | WireValue::Int64(..) => {}
                }
            }
            // Combinations rejected by `check` never reach this point.
            _ => {}
        }
    }

    fn write_packed_int64<B: BufMut>(&self, values: &[i64], buf: &mut B)
    {
        for v in values {
            match self.packed_wire_type {
                Some(WireType::Varint) => write_varint(buf, *v as u64),
                Some(WireType::SignedVarint) => write_varint(buf, zigzag_encode(*v)),
                _ => buf.put_i64_le(*v),
            }
        }
    }
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn scalars()
    {
        let object = WireObject::new(vec![
            WireField::varint(1, 150),
            WireField::signed_varint(2, -2),
            WireField::fixed32(3, -1),
            WireField::fixed64(4, 1),
            WireField::new(5, WireType::Varint, WireValue::Int32(-1)),
            WireField::new(6, WireType::Fixed64, WireValue::Int32(-1)),
        ]);

        let expected: &[u8] = &[
            0x08, 0x96, 0x01, // 1: 150
            0x10, 0x03, // 2: sint -2
            0x1d, 0xff, 0xff, 0xff, 0xff, // 3
            0x21, 1, 0, 0, 0, 0, 0, 0, 0, // 4
            0x28, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01, // 5: sign extended
            0x31, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // 6: widened
        ];

        assert_eq!(object.encode(), expected);
        assert_eq!(object.encoded_len(), expected.len());
    }

    #[test]
    fn nested()
    {
        let object = WireObject::new(vec![
            WireField::message(1, WireObject::new(vec![WireField::string(1, "hi")])),
            WireField::group(2, WireObject::new(vec![WireField::varint(1, 1)])),
            WireField::bytes(3, Bytes::from_static(&[0xaa])),
        ]);

        let expected: &[u8] = &[
            0x0a, 0x04, 0x0a, 0x02, b'h', b'i', // 1: { 1: "hi" }
            0x13, 0x08, 0x01, 0x14, // 2: group { 1: 1 }
            0x1a, 0x01, 0xaa, // 3: bytes
        ];

        assert_eq!(object.encode(), expected);
    }

    #[test]
    fn packed()
    {
        let object = WireObject::new(vec![
            WireField::packed_fixed32(1, vec![1, -1]),
            WireField::packed_int64(2, WireType::Varint, vec![1, 150]),
            WireField::packed_int64(3, WireType::SignedVarint, vec![-1, 1]),
            WireField::packed_int64(4, WireType::Fixed64, vec![2]),
        ]);

        let expected: &[u8] = &[
            0x0a, 0x08, 1, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, // 1
            0x12, 0x03, 0x01, 0x96, 0x01, // 2
            0x1a, 0x02, 0x01, 0x02, // 3
            0x22, 0x08, 2, 0, 0, 0, 0, 0, 0, 0, // 4
        ];

        assert_eq!(object.encode(), expected);
    }

    #[test]
    fn encode_to_appends()
    {
        let object = WireObject::new(vec![WireField::varint(1, 1)]);
        let mut buf = vec![0xff];
        object.encode_to(&mut buf);
        assert_eq!(buf, vec![0xff, 0x08, 0x01]);
    }

    #[test]
    fn incompatible()
    {
        let cases = vec![
            (
                WireField::varint(0, 1),
                EncodeError::FieldNumberOutOfRange { number: 0 },
            ),
            (
                WireField::varint(MAX_FIELD_NUMBER + 1, 1),
                EncodeError::FieldNumberOutOfRange {
                    number: MAX_FIELD_NUMBER + 1,
                },
            ),
            (
                WireField::new(1, WireType::Fixed32, WireValue::Int64(1)),
                EncodeError::IncompatibleWireType {
                    field: 1,
                    wire_type: WireType::Fixed32,
                    value: "int64",
                },
            ),
            (
                WireField::new(1, WireType::Varint, WireValue::String("a".to_string())),
                EncodeError::IncompatibleWireType {
                    field: 1,
                    wire_type: WireType::Varint,
                    value: "string",
                },
            ),
            (
                WireField::new(1, WireType::EndGroup, WireValue::Message(WireObject::default())),
                EncodeError::IncompatibleWireType {
                    field: 1,
                    wire_type: WireType::EndGroup,
                    value: "message",
                },
            ),
            (
                WireField::packed_int64(1, WireType::Fixed32, vec![1]),
                EncodeError::IncompatiblePackedWireType {
                    field: 1,
                    packed_wire_type: Some(WireType::Fixed32),
                    value: "int64 array",
                },
            ),
            (
                WireField::new(1, WireType::Len, WireValue::Int32Array(vec![1])),
                EncodeError::IncompatiblePackedWireType {
                    field: 1,
                    packed_wire_type: None,
                    value: "int32 array",
                },
            ),
        ];

        for (field, error) in cases {
            let object = WireObject::new(vec![field]);
            assert!(!object.can_be_encoded());
            assert_eq!(object.try_encode(), Err(error));
        }
    }

    #[test]
    fn nested_errors_propagate()
    {
        let inner = WireObject::new(vec![WireField::varint(-3, 1)]);
        let object = WireObject::new(vec![WireField::message(1, inner)]);
        assert_eq!(
            object.try_encode(),
            Err(EncodeError::FieldNumberOutOfRange { number: -3 })
        );
    }

    #[test]
    fn depth_limit()
    {
        let mut object = WireObject::new(vec![WireField::varint(1, 1)]);
        for _ in 0..MAX_ENCODE_DEPTH {
            object = WireObject::new(vec![WireField::message(1, object)]);
        }
        assert!(object.can_be_encoded());

        let object = WireObject::new(vec![WireField::group(1, object)]);
        assert_eq!(
            object.try_encode(),
            Err(EncodeError::EncodeDepthExceeded {
                limit: MAX_ENCODE_DEPTH
            })
        );
    }

    #[test]
    #[should_panic(expected = "Object cannot be encoded")]
    fn encode_panics()
    {
        WireObject::new(vec![WireField::varint(0, 1)]).encode();
    }
}
