//! Date times and time spans encoded as scaled ticks.
//!
//! ```text
//! message ScaledTicks {
//!   sint64 value = 1;
//!   TimeSpanScale scale = 2;   // DAYS = 0 .. TICKS = 5, MINMAX = 15
//!   DateTimeKind kind = 3;     // UNSPECIFIED = 0, UTC = 1, LOCAL = 2
//! }
//! ```
//!
//! A tick is 100 nanoseconds. Date times count ticks from the Unix epoch and are limited to the
//! years 1 to 9999; time spans are limited to `i64` ticks. The `MINMAX` scale with a value of
//! `1` or `-1` stands for the largest or smallest representable value.

use super::is_canonical;
use crate::wire::varint::zigzag_decode;
use crate::wire::{WireField, WireObject, WireType, WireValue};
use crate::DecodeOptions;
use std::convert::TryFrom;
use time::macros::datetime;
use time::{Duration, PrimitiveDateTime};

const TICKS_PER_MILLISECOND: i64 = 10_000;
const TICKS_PER_SECOND: i64 = 1_000 * TICKS_PER_MILLISECOND;
const TICKS_PER_MINUTE: i64 = 60 * TICKS_PER_SECOND;
const TICKS_PER_HOUR: i64 = 60 * TICKS_PER_MINUTE;
const TICKS_PER_DAY: i64 = 24 * TICKS_PER_HOUR;
const NANOS_PER_TICK: i64 = 100;

const EPOCH: PrimitiveDateTime = datetime!(1970-01-01 0:00);

// Ticks between 0001-01-01 and the epoch, and between 0001-01-01 and the largest date time.
const EPOCH_TICKS: i64 = 621_355_968_000_000_000;
const MAX_TICKS: i64 = 3_155_378_975_999_999_999;

/// Largest time span.
pub const TIME_SPAN_MAX: Duration = duration_from_ticks(i64::MAX);

/// Smallest time span.
pub const TIME_SPAN_MIN: Duration = duration_from_ticks(i64::MIN);

/// Time zone interpretation of a [`DateTime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeKind
{
    /// Neither local time nor UTC.
    Unspecified,

    /// UTC.
    Utc,

    /// Local time of the encoder.
    Local,
}

/// Date and time with tick precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTime
{
    /// Date and time.
    pub value: PrimitiveDateTime,

    /// Time zone interpretation.
    pub kind: DateTimeKind,
}

impl DateTime
{
    /// Smallest date time, `0001-01-01 00:00:00`.
    pub const MIN: DateTime = DateTime {
        value: datetime!(0001-01-01 0:00),
        kind: DateTimeKind::Unspecified,
    };

    /// Largest date time, `9999-12-31 23:59:59.9999999`.
    pub const MAX: DateTime = DateTime {
        value: datetime!(9999-12-31 23:59:59.9999999),
        kind: DateTimeKind::Unspecified,
    };

    /// Create a new date time.
    pub fn new(value: PrimitiveDateTime, kind: DateTimeKind) -> Self
    {
        Self { value, kind }
    }

    /// Create a date time of unspecified kind.
    pub fn unspecified(value: PrimitiveDateTime) -> Self
    {
        Self::new(value, DateTimeKind::Unspecified)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeScale
{
    Days,
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
    Ticks,
    MinMax,
}

struct ScaledTicks
{
    value: i64,
    scale: TimeScale,
    kind: DateTimeKind,
}

impl TimeScale
{
    fn from_raw(raw: i64) -> Option<Self>
    {
        Some(match raw {
            0 => TimeScale::Days,
            1 => TimeScale::Hours,
            2 => TimeScale::Minutes,
            3 => TimeScale::Seconds,
            4 => TimeScale::Milliseconds,
            5 => TimeScale::Ticks,
            15 => TimeScale::MinMax,
            _ => return None,
        })
    }

    fn raw(self) -> i64
    {
        match self {
            TimeScale::Days => 0,
            TimeScale::Hours => 1,
            TimeScale::Minutes => 2,
            TimeScale::Seconds => 3,
            TimeScale::Milliseconds => 4,
            TimeScale::Ticks => 5,
            TimeScale::MinMax => 15,
        }
    }

    /// Ticks per unit, `None` for the min/max sentinel.
    fn ticks(self) -> Option<i64>
    {
        match self {
            TimeScale::Days => Some(TICKS_PER_DAY),
            TimeScale::Hours => Some(TICKS_PER_HOUR),
            TimeScale::Minutes => Some(TICKS_PER_MINUTE),
            TimeScale::Seconds => Some(TICKS_PER_SECOND),
            TimeScale::Milliseconds => Some(TICKS_PER_MILLISECOND),
            TimeScale::Ticks => Some(1),
            TimeScale::MinMax => None,
        }
    }
}

impl DateTimeKind
{
    fn from_raw(raw: i64) -> Option<Self>
    {
        match raw {
            0 => Some(DateTimeKind::Unspecified),
            1 => Some(DateTimeKind::Utc),
            2 => Some(DateTimeKind::Local),
            _ => None,
        }
    }

    fn raw(self) -> i64
    {
        match self {
            DateTimeKind::Unspecified => 0,
            DateTimeKind::Utc => 1,
            DateTimeKind::Local => 2,
        }
    }
}

impl ScaledTicks
{
    fn read(object: &WireObject) -> Option<Self>
    {
        if object.fields.is_empty() || object.fields.len() > 3 {
            return None;
        }

        let mut value = 0;
        let mut scale = 0;
        let mut kind = 0;
        for field in &object.fields {
            let raw = match (field.wire_type, &field.value) {
                (WireType::Varint, WireValue::Int64(v)) => *v,
                (WireType::SignedVarint, WireValue::Int64(v)) => *v,
                _ => return None,
            };

            match field.number {
                1 if field.wire_type == WireType::SignedVarint => value = raw,
                1 => value = zigzag_decode(raw as u64),
                2 => scale = raw,
                3 => kind = raw,
                _ => return None,
            }
        }

        Some(ScaledTicks {
            value,
            scale: TimeScale::from_raw(scale)?,
            kind: DateTimeKind::from_raw(kind)?,
        })
    }

    fn from_ticks(ticks: i64, kind: DateTimeKind) -> Self
    {
        let (value, scale) = match ticks {
            i64::MAX => (1, TimeScale::MinMax),
            i64::MIN => (-1, TimeScale::MinMax),
            _ => coarsest_scale(ticks),
        };

        ScaledTicks { value, scale, kind }
    }

    fn to_date_time(&self) -> Option<DateTime>
    {
        let unit = match self.scale.ticks() {
            Some(unit) => unit,
            None => {
                return match self.value {
                    1 => Some(DateTime::MAX),
                    -1 => Some(DateTime::MIN),
                    _ => None,
                }
            }
        };

        let offset = i128::from(self.value) * i128::from(unit);
        let absolute = i128::from(EPOCH_TICKS) + offset;
        if absolute < 0 || absolute > i128::from(MAX_TICKS) {
            return None;
        }

        let value = EPOCH.checked_add(duration_from_ticks(offset as i64))?;
        Some(DateTime::new(value, self.kind))
    }

    fn to_time_span(&self) -> Option<Duration>
    {
        match self.scale.ticks() {
            Some(unit) => i64::try_from(i128::from(self.value) * i128::from(unit))
                .ok()
                .map(duration_from_ticks),
            None => match self.value {
                1 => Some(TIME_SPAN_MAX),
                -1 => Some(TIME_SPAN_MIN),
                _ => None,
            },
        }
    }

    fn encode(&self) -> WireObject
    {
        let mut fields = vec![];
        if self.value != 0 {
            fields.push(WireField::signed_varint(1, self.value));
        }
        if self.scale != TimeScale::Days {
            fields.push(WireField::varint(2, self.scale.raw()));
        }
        if self.kind != DateTimeKind::Unspecified {
            fields.push(WireField::varint(3, self.kind.raw()));
        }
        WireObject::new(fields)
    }
}

/// Picks the coarsest unit that divides the ticks evenly.
fn coarsest_scale(ticks: i64) -> (i64, TimeScale)
{
    let scales = [
        TimeScale::Days,
        TimeScale::Hours,
        TimeScale::Minutes,
        TimeScale::Seconds,
        TimeScale::Milliseconds,
    ];

    for scale in scales.iter() {
        if let Some(unit) = scale.ticks() {
            if ticks % unit == 0 {
                return (ticks / unit, *scale);
            }
        }
    }

    (ticks, TimeScale::Ticks)
}

const fn duration_from_ticks(ticks: i64) -> Duration
{
    Duration::new(
        ticks / TICKS_PER_SECOND,
        ((ticks % TICKS_PER_SECOND) * NANOS_PER_TICK) as i32,
    )
}

fn duration_to_ticks(duration: Duration) -> Option<i64>
{
    i64::try_from(duration.whole_nanoseconds() / i128::from(NANOS_PER_TICK)).ok()
}

/// Decodes a date time candidate.
pub(crate) fn decode_date_time(object: &WireObject, options: &DecodeOptions) -> Option<DateTime>
{
    let value = ScaledTicks::read(object)?.to_date_time()?;
    let encoded = encode_date_time(&value)?;
    if !is_canonical(object, &encoded, "date time") {
        return None;
    }

    if !(options.date_time_validator)(&value) {
        tracing::trace!(value = ?value, "date time rejected by validator");
        return None;
    }

    Some(value)
}

/// Decodes a time span candidate.
///
/// Candidates with a kind field are date times and never time spans.
pub(crate) fn decode_time_span(object: &WireObject, options: &DecodeOptions) -> Option<Duration>
{
    if object.fields.iter().any(|f| f.number == 3) {
        return None;
    }

    let value = ScaledTicks::read(object)?.to_time_span()?;
    let encoded = encode_time_span(&value)?;
    if !is_canonical(object, &encoded, "time span") {
        return None;
    }

    if !(options.time_span_validator)(&value) {
        tracing::trace!(value = ?value, "time span rejected by validator");
        return None;
    }

    Some(value)
}

/// Encodes a date time as its nested message.
///
/// Returns `None` if the value is outside the range of [`DateTime::MIN`] and [`DateTime::MAX`].
/// Precision below a tick is truncated.
pub fn encode_date_time(value: &DateTime) -> Option<WireObject>
{
    if value.value == DateTime::MIN.value {
        return Some(ScaledTicks::from_ticks(i64::MIN, DateTimeKind::Unspecified).encode());
    }

    if value.value == DateTime::MAX.value {
        return Some(ScaledTicks::from_ticks(i64::MAX, DateTimeKind::Unspecified).encode());
    }

    if value.value < DateTime::MIN.value || value.value > DateTime::MAX.value {
        return None;
    }

    let ticks = duration_to_ticks(value.value - EPOCH)?;
    Some(ScaledTicks::from_ticks(ticks, value.kind).encode())
}

/// Encodes a time span as its nested message.
///
/// Returns `None` if the value does not fit into `i64` ticks. Precision below a tick is
/// truncated.
pub fn encode_time_span(value: &Duration) -> Option<WireObject>
{
    let ticks = duration_to_ticks(*value)?;
    Some(ScaledTicks::from_ticks(ticks, DateTimeKind::Unspecified).encode())
}
