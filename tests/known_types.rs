#[test]
fn guid()
{
    use protoprobe::known::guid;
    use protoprobe::{DecodeOptions, Object, Value, WireField, WireObject, WireType};
    use uuid::Uuid;

    let value = Uuid::parse_str("8f3b2c1a-5d6e-4f70-8192-a3b4c5d6e7f8").unwrap();
    let data = WireObject::new(vec![WireField::message(1, guid::encode(&value))]).encode();

    // Without the codec the GUID stays a message of two 64-bit fields.
    let object = Object::decode(&data, &DecodeOptions::default()).unwrap();
    let inner = object.get_field(1).unwrap().value.object_value();
    assert_eq!(inner.len(), 2);
    assert!(inner.fields().iter().all(|f| f.wire_type == WireType::Fixed64));
    assert_eq!(object.encode(), data);

    let options = DecodeOptions::default().with_guid(true);
    let object = Object::decode(&data, &options).unwrap();
    assert_eq!(object.get_field(1).unwrap().value, Value::Guid(value));
    assert_eq!(object.encode(), data);

    // Version 0 is rejected by the default validator.
    let nil_ish = Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
    let data = WireObject::new(vec![WireField::message(1, guid::encode(&nil_ish))]).encode();
    let object = Object::decode(&data, &options).unwrap();
    assert!(matches!(object.get_field(1).unwrap().value, Value::Object(..)));

    let options = options.with_guid_validator(|_| true);
    let object = Object::decode(&data, &options).unwrap();
    assert_eq!(object.get_field(1).unwrap().value.guid_value(), nil_ish);
}

#[test]
fn guid_array()
{
    use protoprobe::{DecodeOptions, Field, Object, Value, WireType};
    use uuid::Uuid;

    let values = vec![
        Uuid::parse_str("8f3b2c1a-5d6e-4f70-8192-a3b4c5d6e7f8").unwrap(),
        Uuid::parse_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap(),
    ];
    let object = Object::new(vec![Field::new(
        3,
        WireType::Len,
        Value::GuidArray(values.clone()),
    )]);

    let data = object.encode();
    let decoded = Object::decode(&data, &DecodeOptions::default().with_guid(true)).unwrap();
    assert_eq!(decoded, object);
    assert_eq!(decoded.encode(), data);
}

#[test]
fn decimal()
{
    use protoprobe::{DecodeOptions, Field, Object, Value, WireType};
    use rust_decimal::Decimal;

    let cases = vec![
        Decimal::new(-12345, 3),
        Decimal::new(1, 28),
        Decimal::new(100, 0),
        Decimal::MAX,
        Decimal::MIN,
    ];

    let options = DecodeOptions::default().with_decimal(true);
    for value in cases {
        let object = Object::new(vec![Field::new(1, WireType::Len, Value::Decimal(value))]);
        let data = object.encode();

        let decoded = Object::decode(&data, &options).unwrap();
        assert_eq!(decoded.get_field(1).unwrap().value.decimal_value(), value);
        assert_eq!(decoded.encode(), data, "{}", value);
    }
}

#[test]
fn date_time()
{
    use protoprobe::{DateTime, DateTimeKind, DecodeOptions, Field, Object, Value, WireType};
    use time::macros::datetime;

    let value = DateTime::unspecified(datetime!(2021-10-23 15:29:53.25));
    let object = Object::new(vec![Field::new(1, WireType::Len, Value::DateTime(value))]);
    let data = object.encode();

    let options = DecodeOptions::default().with_date_time(true);
    let decoded = Object::decode(&data, &options).unwrap();
    assert_eq!(decoded.get_field(1).unwrap().value, Value::DateTime(value));
    assert_eq!(decoded.encode(), data);

    // The default validator only accepts unspecified date times.
    let utc = DateTime::new(datetime!(2021-10-23 15:29:53.25), DateTimeKind::Utc);
    let object = Object::new(vec![Field::new(1, WireType::Len, Value::DateTime(utc))]);
    let data = object.encode();

    let decoded = Object::decode(&data, &options).unwrap();
    assert!(matches!(decoded.get_field(1).unwrap().value, Value::Object(..)));
    assert_eq!(decoded.encode(), data);

    let options = options.with_date_time_validator(|_| true);
    let decoded = Object::decode(&data, &options).unwrap();
    assert_eq!(decoded.get_field(1).unwrap().value.date_time_value(), utc);
}

#[test]
fn date_time_limits()
{
    use protoprobe::{DateTime, DecodeOptions, Field, Object, Value, WireType};

    let options = DecodeOptions::default()
        .with_date_time(true)
        .with_date_time_validator(|_| true);

    for value in &[DateTime::MIN, DateTime::MAX] {
        let object = Object::new(vec![Field::new(1, WireType::Len, Value::DateTime(*value))]);
        let data = object.encode();

        let decoded = Object::decode(&data, &options).unwrap();
        assert_eq!(decoded, object);
        assert_eq!(decoded.encode(), data);
    }
}

#[test]
fn time_span()
{
    use protoprobe::{DecodeOptions, EncodeError, Field, Object, Value, WireType};
    use time::Duration;

    let options = DecodeOptions::default().with_time_span(true);
    for value in &[Duration::minutes(90), Duration::milliseconds(-1500)] {
        let object = Object::new(vec![Field::new(1, WireType::Len, Value::TimeSpan(*value))]);
        let data = object.encode();

        let decoded = Object::decode(&data, &options).unwrap();
        assert_eq!(decoded.get_field(1).unwrap().value.time_span_value(), *value);
        assert_eq!(decoded.encode(), data);
    }

    // Longer than the default validator allows.
    let object = Object::new(vec![Field::new(
        1,
        WireType::Len,
        Value::TimeSpan(Duration::days(61)),
    )]);
    let decoded = Object::decode(&object.encode(), &options).unwrap();
    assert!(matches!(decoded.get_field(1).unwrap().value, Value::Object(..)));

    // Does not fit into 64-bit ticks.
    let object = Object::new(vec![Field::new(
        1,
        WireType::Len,
        Value::TimeSpan(Duration::MAX),
    )]);
    assert!(!object.can_be_encoded());
    assert!(matches!(
        object.try_encode(),
        Err(EncodeError::ValueOutOfRange { .. })
    ));
}
