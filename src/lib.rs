//!
//! Protoprobe decodes arbitrary protocol buffer payloads without access to the
//! `.proto` schema and re-encodes the decoded messages byte for byte.
//!
//! Decoding happens in two layers. The wire layer ([`WireObject`]) keeps the raw
//! fields in their original order and resolves length-delimited payloads into
//! strings, bytes, embedded messages or packed arrays using the heuristics in
//! [`DecodeOptions`]. The semantic layer ([`Object`]) reinterprets the raw fields
//! as native values, recognizes well-known nested messages such as GUIDs and
//! groups repeated fields into arrays.
//!
//! ```
//! use protoprobe::{DecodeOptions, Object, Value, WireType};
//!
//! let data = b"\x08\x08\x12\x06/users\x18\x32";
//! let object = Object::decode(data, &DecodeOptions::default()).unwrap();
//!
//! assert_eq!(object.fields()[0].value, Value::Int64(8));
//! assert_eq!(object.fields()[1].value, Value::String(String::from("/users")));
//! assert_eq!(object.fields()[1].wire_type, WireType::Len);
//! assert_eq!(object.get_field(3).unwrap().value, Value::Int64(50));
//!
//! assert!(object.can_be_encoded());
//! assert_eq!(object.encode(), &data[..]);
//! ```
//!
//! Payloads that are not protocol buffer messages fail to decode:
//!
//! ```
//! use protoprobe::{DecodeOptions, Object};
//!
//! assert!(Object::try_decode(b"\xff\xff\xff", &DecodeOptions::default()).is_none());
//! ```
#![warn(missing_docs)]

pub mod decode;
mod encode;
pub mod known;
pub mod options;
pub mod wire;

pub use decode::{Field, Object, Value};
pub use known::{DateTime, DateTimeKind};
pub use options::{DecodeOptions, FixedDecodingMode, StringDecodingMode};
pub use wire::{DecodeError, EncodeError, WireField, WireObject, WireType, WireValue};
