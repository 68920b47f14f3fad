//! Decimals encoded as `message Decimal { uint64 lo = 1; uint32 hi = 2; uint32 sign_scale = 3; }`.
//!
//! `lo` and `hi` hold the 96-bit mantissa. Bit 0 of `sign_scale` is the sign and bits 1 to 8 the
//! number of decimal places, which must not exceed 28.

use super::is_canonical;
use crate::wire::{WireField, WireObject, WireType, WireValue};
use crate::DecodeOptions;
use rust_decimal::Decimal;
use std::convert::TryFrom;

const MAX_SCALE: u32 = 28;

/// Decodes a decimal candidate.
pub(crate) fn decode(object: &WireObject, options: &DecodeOptions) -> Option<Decimal>
{
    if object.fields.is_empty() || object.fields.len() > 3 {
        return None;
    }

    let mut low = 0u64;
    let mut high = 0u32;
    let mut sign_scale = 0u32;
    for field in &object.fields {
        let value = match (field.wire_type, &field.value) {
            (WireType::Varint, WireValue::Int64(v)) => *v,
            _ => return None,
        };

        match field.number {
            1 => low = value as u64,
            2 => high = u32::try_from(value).ok()?,
            3 => sign_scale = u32::try_from(value).ok()?,
            _ => return None,
        }
    }

    let negative = sign_scale & 0x0001 == 0x0001;
    let scale = (sign_scale & 0x01fe) >> 1;
    if scale > MAX_SCALE {
        return None;
    }

    let value = Decimal::from_parts(low as u32, (low >> 32) as u32, high, negative, scale);
    if !is_canonical(object, &encode(&value), "decimal") {
        return None;
    }

    if !(options.decimal_validator)(&value) {
        tracing::trace!(%value, "decimal rejected by validator");
        return None;
    }

    Some(value)
}

/// Encodes a decimal as its nested message.
///
/// Fields with a zero value are omitted.
pub fn encode(value: &Decimal) -> WireObject
{
    let mantissa = value.mantissa().unsigned_abs();
    let low = mantissa as u64;
    let high = (mantissa >> 64) as u32;
    let sign_scale = (value.scale() << 1) | value.is_sign_negative() as u32;

    let mut fields = vec![];
    if low != 0 {
        fields.push(WireField::varint(1, low as i64));
    }
    if high != 0 {
        fields.push(WireField::varint(2, i64::from(high)));
    }
    if sign_scale != 0 {
        fields.push(WireField::varint(3, i64::from(sign_scale)));
    }
    WireObject::new(fields)
}

#[cfg(test)]
mod test
{
    use super::*;
    use std::str::FromStr;

    fn options() -> DecodeOptions
    {
        DecodeOptions::default().with_decimal(true)
    }

    #[test]
    fn round_trip()
    {
        let cases = [
            "1",
            "-1",
            "3.14159",
            "-0.000001",
            "79228162514264337593543950335",
            "-79228162514264337593543950335",
            "0.0000000000000000000000000001",
            "18446744073709551616",
            "4294967296.5",
        ];

        for case in cases.iter() {
            let value = Decimal::from_str(case).unwrap();
            let encoded = encode(&value);
            let decoded = decode(&encoded, &options()).unwrap();
            assert_eq!(decoded, value, "{}", case);
            assert_eq!(decoded.scale(), value.scale(), "{}", case);
        }
    }

    #[test]
    fn every_scale()
    {
        for scale in 0..=MAX_SCALE {
            let value = Decimal::new(-123_456_789, scale);
            let decoded = decode(&encode(&value), &options()).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(decoded.scale(), scale);
        }
    }

    #[test]
    fn layout()
    {
        let value = Decimal::from_str("-1.5").unwrap();
        assert_eq!(
            encode(&value),
            WireObject::new(vec![WireField::varint(1, 15), WireField::varint(3, 3)])
        );

        let large = Decimal::from_str("18446744073709551617").unwrap();
        assert_eq!(
            encode(&large),
            WireObject::new(vec![WireField::varint(1, 1), WireField::varint(2, 1)])
        );
    }

    #[test]
    fn rejects_large_scale()
    {
        let object = WireObject::new(vec![WireField::varint(1, 1), WireField::varint(3, 29 << 1)]);
        assert_eq!(decode(&object, &options()), None);
    }

    #[test]
    fn rejects_other_shapes()
    {
        let options = options();

        let fixed = WireObject::new(vec![WireField::fixed64(1, 1)]);
        assert_eq!(decode(&fixed, &options), None);

        let wide_high = WireObject::new(vec![WireField::varint(1, 1), WireField::varint(2, 1 << 32)]);
        assert_eq!(decode(&wide_high, &options), None);

        let other_field = WireObject::new(vec![WireField::varint(4, 1)]);
        assert_eq!(decode(&other_field, &options), None);

        let explicit_zero = WireObject::new(vec![WireField::varint(1, 1), WireField::varint(3, 0)]);
        assert_eq!(decode(&explicit_zero, &options), None);

        assert_eq!(decode(&WireObject::default(), &options), None);
    }

    #[test]
    fn validator()
    {
        let options = options().with_decimal_validator(|d| d.scale() > 0);
        assert_eq!(decode(&encode(&Decimal::new(5, 0)), &options), None);
        assert_eq!(
            decode(&encode(&Decimal::new(5, 1)), &options),
            Some(Decimal::new(5, 1))
        );
    }
}
