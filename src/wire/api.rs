use super::*;

static EMPTY_OBJECT: WireObject = WireObject { fields: Vec::new() };

impl WireValue
{
    /// Kind of the active variant.
    pub fn kind(&self) -> WireValueKind
    {
        match self {
            WireValue::Int32(..) => WireValueKind::Int32,
            WireValue::Int64(..) => WireValueKind::Int64,
            WireValue::String(..) => WireValueKind::String,
            WireValue::Bytes(..) => WireValueKind::Bytes,
            WireValue::Message(..) => WireValueKind::Message,
            WireValue::Int32Array(..) => WireValueKind::Int32Array,
            WireValue::Int64Array(..) => WireValueKind::Int64Array,
        }
    }

    /// The 32-bit integer value or `0` if the value is of a different kind.
    pub fn int32_value(&self) -> i32
    {
        match self {
            WireValue::Int32(v) => *v,
            _ => 0,
        }
    }

    /// The 64-bit integer value or `0` if the value is of a different kind.
    pub fn int64_value(&self) -> i64
    {
        match self {
            WireValue::Int64(v) => *v,
            _ => 0,
        }
    }

    /// The string value or an empty string if the value is of a different kind.
    pub fn string_value(&self) -> &str
    {
        match self {
            WireValue::String(s) => s.as_str(),
            _ => "",
        }
    }

    /// The bytes value or an empty slice if the value is of a different kind.
    pub fn bytes_value(&self) -> &[u8]
    {
        match self {
            WireValue::Bytes(b) => &b[..],
            _ => &[],
        }
    }

    /// The message value or an empty message if the value is of a different kind.
    pub fn message_value(&self) -> &WireObject
    {
        match self {
            WireValue::Message(m) => m,
            _ => &EMPTY_OBJECT,
        }
    }

    /// The packed 32-bit values or an empty slice if the value is of a different kind.
    pub fn int32_array_value(&self) -> &[i32]
    {
        match self {
            WireValue::Int32Array(a) => &a[..],
            _ => &[],
        }
    }

    /// The packed 64-bit values or an empty slice if the value is of a different kind.
    pub fn int64_array_value(&self) -> &[i64]
    {
        match self {
            WireValue::Int64Array(a) => &a[..],
            _ => &[],
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str
    {
        match self {
            WireValue::Int32(..) => "int32",
            WireValue::Int64(..) => "int64",
            WireValue::String(..) => "string",
            WireValue::Bytes(..) => "bytes",
            WireValue::Message(..) => "message",
            WireValue::Int32Array(..) => "int32 array",
            WireValue::Int64Array(..) => "int64 array",
        }
    }
}

impl WireField
{
    /// Create a new field.
    pub fn new(number: i32, wire_type: WireType, value: WireValue) -> Self
    {
        Self {
            number,
            wire_type,
            value,
            packed_wire_type: None,
        }
    }

    /// Create a varint field.
    pub fn varint(number: i32, value: i64) -> Self
    {
        Self::new(number, WireType::Varint, WireValue::Int64(value))
    }

    /// Create a zigzag encoded varint field.
    pub fn signed_varint(number: i32, value: i64) -> Self
    {
        Self::new(number, WireType::SignedVarint, WireValue::Int64(value))
    }

    /// Create a 32-bit field.
    pub fn fixed32(number: i32, value: i32) -> Self
    {
        Self::new(number, WireType::Fixed32, WireValue::Int32(value))
    }

    /// Create a 64-bit field.
    pub fn fixed64(number: i32, value: i64) -> Self
    {
        Self::new(number, WireType::Fixed64, WireValue::Int64(value))
    }

    /// Create a string field.
    pub fn string(number: i32, value: impl Into<String>) -> Self
    {
        Self::new(number, WireType::Len, WireValue::String(value.into()))
    }

    /// Create a bytes field.
    pub fn bytes(number: i32, value: impl Into<Bytes>) -> Self
    {
        Self::new(number, WireType::Len, WireValue::Bytes(value.into()))
    }

    /// Create an embedded message field.
    pub fn message(number: i32, value: WireObject) -> Self
    {
        Self::new(number, WireType::Len, WireValue::Message(value))
    }

    /// Create a group field.
    pub fn group(number: i32, value: WireObject) -> Self
    {
        Self::new(number, WireType::StartGroup, WireValue::Message(value))
    }

    /// Create a packed array of 32-bit values.
    pub fn packed_fixed32(number: i32, values: Vec<i32>) -> Self
    {
        Self {
            packed_wire_type: Some(WireType::Fixed32),
            ..Self::new(number, WireType::Len, WireValue::Int32Array(values))
        }
    }

    /// Create a packed array of 64-bit values.
    ///
    /// The elements are encoded with `packed_wire_type` which should be one of
    /// [`WireType::Fixed64`], [`WireType::Varint`] or [`WireType::SignedVarint`].
    pub fn packed_int64(number: i32, packed_wire_type: WireType, values: Vec<i64>) -> Self
    {
        Self {
            packed_wire_type: Some(packed_wire_type),
            ..Self::new(number, WireType::Len, WireValue::Int64Array(values))
        }
    }
}

impl WireObject
{
    /// Create a new object from fields.
    pub fn new(fields: Vec<WireField>) -> Self
    {
        Self { fields }
    }

    /// Iterates the fields with the given number.
    pub fn get_fields(&self, number: i32) -> impl Iterator<Item = &WireField>
    {
        self.fields.iter().filter(move |f| f.number == number)
    }
}

impl From<Vec<WireField>> for WireObject
{
    fn from(fields: Vec<WireField>) -> Self
    {
        Self::new(fields)
    }
}
