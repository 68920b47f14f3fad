use super::*;

static EMPTY_OBJECT: Object = Object {
    fields: Vec::new(),
    index: BTreeMap::new(),
};

impl Value
{
    /// The 32-bit integer value or `0` if the value is of a different kind.
    pub fn int32_value(&self) -> i32
    {
        match self {
            Value::Int32(v) => *v,
            _ => 0,
        }
    }

    /// The 64-bit integer value or `0` if the value is of a different kind.
    pub fn int64_value(&self) -> i64
    {
        match self {
            Value::Int64(v) => *v,
            _ => 0,
        }
    }

    /// The 32-bit floating point value or `0.0` if the value is of a different kind.
    pub fn float32_value(&self) -> f32
    {
        match self {
            Value::Float32(v) => *v,
            _ => 0.0,
        }
    }

    /// The 64-bit floating point value or `0.0` if the value is of a different kind.
    pub fn float64_value(&self) -> f64
    {
        match self {
            Value::Float64(v) => *v,
            _ => 0.0,
        }
    }

    /// The string value or an empty string if the value is of a different kind.
    pub fn string_value(&self) -> &str
    {
        match self {
            Value::String(s) => s.as_str(),
            _ => "",
        }
    }

    /// The bytes value or an empty slice if the value is of a different kind.
    pub fn bytes_value(&self) -> &[u8]
    {
        match self {
            Value::Bytes(b) => &b[..],
            _ => &[],
        }
    }

    /// The decimal value or zero if the value is of a different kind.
    pub fn decimal_value(&self) -> Decimal
    {
        match self {
            Value::Decimal(d) => *d,
            _ => Decimal::ZERO,
        }
    }

    /// The date time value or [`DateTime::MIN`] if the value is of a different kind.
    pub fn date_time_value(&self) -> DateTime
    {
        match self {
            Value::DateTime(d) => *d,
            _ => DateTime::MIN,
        }
    }

    /// The time span value or zero if the value is of a different kind.
    pub fn time_span_value(&self) -> Duration
    {
        match self {
            Value::TimeSpan(d) => *d,
            _ => Duration::ZERO,
        }
    }

    /// The GUID value or the nil GUID if the value is of a different kind.
    pub fn guid_value(&self) -> Uuid
    {
        match self {
            Value::Guid(g) => *g,
            _ => Uuid::nil(),
        }
    }

    /// The object value or an empty object if the value is of a different kind.
    pub fn object_value(&self) -> &Object
    {
        match self {
            Value::Object(o) => o,
            _ => &EMPTY_OBJECT,
        }
    }

    /// Checks whether the value holds multiple elements.
    pub fn is_array(&self) -> bool
    {
        matches!(
            self,
            Value::Int32Array(..)
                | Value::Int64Array(..)
                | Value::Float32Array(..)
                | Value::Float64Array(..)
                | Value::DecimalArray(..)
                | Value::ObjectArray(..)
                | Value::StringArray(..)
                | Value::BytesArray(..)
                | Value::GuidArray(..)
                | Value::DateTimeArray(..)
                | Value::TimeSpanArray(..)
        )
    }

    /// Number of elements in an array value, or `1` for single values.
    pub fn len(&self) -> usize
    {
        match self {
            Value::Int32Array(a) => a.len(),
            Value::Int64Array(a) => a.len(),
            Value::Float32Array(a) => a.len(),
            Value::Float64Array(a) => a.len(),
            Value::DecimalArray(a) => a.len(),
            Value::ObjectArray(a) => a.len(),
            Value::StringArray(a) => a.len(),
            Value::BytesArray(a) => a.len(),
            Value::GuidArray(a) => a.len(),
            Value::DateTimeArray(a) => a.len(),
            Value::TimeSpanArray(a) => a.len(),
            _ => 1,
        }
    }

    /// Checks whether the value is an empty array.
    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }
}

impl Field
{
    /// Create a new field.
    pub fn new(number: i32, wire_type: WireType, value: Value) -> Self
    {
        Self {
            number,
            wire_type,
            packed_wire_type: None,
            value,
        }
    }

    /// Create a packed array field.
    pub fn packed(number: i32, packed_wire_type: WireType, value: Value) -> Self
    {
        Self {
            packed_wire_type: Some(packed_wire_type),
            ..Self::new(number, WireType::Len, value)
        }
    }

    /// Splits a non-packed array into one field per element.
    fn split(&self) -> Vec<Field>
    {
        macro_rules! split {
            ($values:expr, $scalar:ident) => {
                $values
                    .iter()
                    .cloned()
                    .map(|v| Field::new(self.number, self.wire_type, Value::$scalar(v)))
                    .collect()
            };
        }

        if self.packed_wire_type.is_some() {
            return vec![self.clone()];
        }

        match &self.value {
            Value::Int32Array(a) => split!(a, Int32),
            Value::Int64Array(a) => split!(a, Int64),
            Value::Float32Array(a) => split!(a, Float32),
            Value::Float64Array(a) => split!(a, Float64),
            Value::DecimalArray(a) => split!(a, Decimal),
            Value::ObjectArray(a) => split!(a, Object),
            Value::StringArray(a) => split!(a, String),
            Value::BytesArray(a) => split!(a, Bytes),
            Value::GuidArray(a) => split!(a, Guid),
            Value::DateTimeArray(a) => split!(a, DateTime),
            Value::TimeSpanArray(a) => split!(a, TimeSpan),
            _ => vec![self.clone()],
        }
    }
}

impl Object
{
    /// Create a new object from fields.
    pub fn new(fields: Vec<Field>) -> Self
    {
        let mut object = Object {
            fields,
            index: BTreeMap::new(),
        };
        object.rebuild_index();
        object
    }

    /// Create an object without fields.
    pub fn empty() -> Self
    {
        Self::default()
    }

    /// Fields in decoding order.
    pub fn fields(&self) -> &[Field]
    {
        &self.fields
    }

    /// Iterates the fields with the given number.
    pub fn get_fields(&self, number: i32) -> impl Iterator<Item = &Field>
    {
        let positions = self.index.get(&number).map(Vec::as_slice).unwrap_or(&[]);
        positions.iter().map(move |idx| &self.fields[*idx])
    }

    /// Gets the first field with the given number.
    pub fn get_field(&self, number: i32) -> Option<&Field>
    {
        self.get_fields(number).next()
    }

    /// Appends a field.
    pub fn push(&mut self, field: Field)
    {
        self.index
            .entry(field.number)
            .or_insert_with(Vec::new)
            .push(self.fields.len());
        self.fields.push(field);
    }

    /// Number of fields.
    pub fn len(&self) -> usize
    {
        self.fields.len()
    }

    /// Checks whether the object has no fields.
    pub fn is_empty(&self) -> bool
    {
        self.fields.is_empty()
    }

    /// Iterates the fields as they appear on the wire.
    ///
    /// Non-packed arrays are split into one field per element. Packed arrays stay whole since
    /// they occupy a single field.
    pub fn normalized_fields(&self) -> impl Iterator<Item = Field> + '_
    {
        self.fields.iter().flat_map(Field::split)
    }

    /// Consumes the object, returning its fields.
    pub fn into_fields(self) -> Vec<Field>
    {
        self.fields
    }

    /// Sorts the fields by field number.
    ///
    /// The sort is stable: fields sharing a number keep their relative order. When `recursive`
    /// is set, nested objects are sorted as well.
    pub fn sort_fields(&mut self, recursive: bool)
    {
        self.fields.sort_by_key(|f| f.number);

        if recursive {
            for field in &mut self.fields {
                match &mut field.value {
                    Value::Object(o) => o.sort_fields(true),
                    Value::ObjectArray(a) => a.iter_mut().for_each(|o| o.sort_fields(true)),
                    _ => {}
                }
            }
        }

        self.rebuild_index();
    }

    fn rebuild_index(&mut self)
    {
        self.index.clear();
        for (idx, field) in self.fields.iter().enumerate() {
            self.index.entry(field.number).or_insert_with(Vec::new).push(idx);
        }
    }
}

impl From<Vec<Field>> for Object
{
    fn from(fields: Vec<Field>) -> Self
    {
        Self::new(fields)
    }
}
