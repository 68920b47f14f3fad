//! Decoding options.
//!
//! All heuristics the decoder applies can be tuned through [`DecodeOptions`]. The options are an
//! immutable value: the `with_*` methods return modified copies and the decoder only ever reads
//! them.

use crate::known::{DateTime, DateTimeKind};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

/// Default nesting limit for embedded messages and groups.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Shared predicate accepting or rejecting a decoded candidate.
pub type Validator<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Shared predicate over decoded strings.
pub type StringValidator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Shared predicate over raw length-delimited payloads.
pub type PayloadValidator = Arc<dyn Fn(&[u8]) -> bool + Send + Sync>;

/// Interpretation of a length-delimited (LEN) payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringDecodingMode
{
    /// Embedded message.
    EmbeddedMessage,

    /// UTF-8 string.
    String,

    /// Opaque bytes. Always succeeds.
    Bytes,

    /// Packed varints.
    PackedVarint,

    /// Packed 32-bit values.
    PackedFixed32,

    /// Packed 64-bit values.
    PackedFixed64,
}

/// Interpretation of the fixed-width wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedDecodingMode
{
    /// Reinterpret the bits as `f32`/`f64`.
    ///
    /// Most encoders use varints for integers, which leaves the fixed-width wire types to
    /// floating point values.
    FloatingPoint,

    /// Keep the bits as `i32`/`i64`.
    Integer,
}

/// Options controlling how payloads are decoded.
#[derive(Clone)]
pub struct DecodeOptions
{
    /// Recognize the `{ fixed64 lo = 1; fixed64 hi = 2; }` message as a GUID.
    pub decode_guid: bool,

    /// Final gate for GUID candidates. Receives the GUID and its version nibble.
    pub guid_validator: Validator<(Uuid, u8)>,

    /// Recognize the `{ sint64 value = 1; scale = 2; kind = 3; }` message as a date time.
    pub decode_date_time: bool,

    /// Final gate for date time candidates.
    pub date_time_validator: Validator<DateTime>,

    /// Recognize the `{ sint64 value = 1; scale = 2; }` message as a time span.
    pub decode_time_span: bool,

    /// Final gate for time span candidates.
    pub time_span_validator: Validator<Duration>,

    /// Recognize the `{ uint64 lo = 1; uint32 hi = 2; uint32 sign_scale = 3; }` message as a
    /// decimal.
    pub decode_decimal: bool,

    /// Final gate for decimal candidates.
    pub decimal_validator: Validator<Decimal>,

    /// Gate for payloads that decoded as valid UTF-8.
    pub string_validator: StringValidator,

    /// Gate for payloads before they are parsed as embedded messages.
    pub embedded_message_validator: PayloadValidator,

    /// Modes tried in order for non-empty LEN payloads. The first mode that succeeds wins and
    /// payloads no mode accepts are kept as bytes.
    pub preferred_string_decoding_modes: Vec<StringDecodingMode>,

    /// Mode used for empty LEN payloads.
    pub empty_string_decoding_mode: StringDecodingMode,

    /// Interpretation of `Fixed32` fields.
    pub fixed32_decoding_mode: FixedDecodingMode,

    /// Interpretation of `Fixed64` fields.
    pub fixed64_decoding_mode: FixedDecodingMode,

    /// Maximum nesting depth of embedded messages and groups.
    pub max_depth: usize,
}

impl Default for DecodeOptions
{
    fn default() -> Self
    {
        DecodeOptions {
            decode_guid: false,
            guid_validator: Arc::new(default_guid_validator),
            decode_date_time: false,
            date_time_validator: Arc::new(default_date_time_validator),
            decode_time_span: false,
            time_span_validator: Arc::new(default_time_span_validator),
            decode_decimal: false,
            decimal_validator: Arc::new(default_decimal_validator),
            string_validator: Arc::new(default_string_validator),
            embedded_message_validator: Arc::new(default_embedded_message_validator),
            preferred_string_decoding_modes: vec![
                StringDecodingMode::EmbeddedMessage,
                StringDecodingMode::String,
                StringDecodingMode::Bytes,
            ],
            empty_string_decoding_mode: StringDecodingMode::Bytes,
            fixed32_decoding_mode: FixedDecodingMode::FloatingPoint,
            fixed64_decoding_mode: FixedDecodingMode::FloatingPoint,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecodeOptions
{
    /// Enable or disable GUID recognition.
    pub fn with_guid(self, enabled: bool) -> Self
    {
        Self {
            decode_guid: enabled,
            ..self
        }
    }

    /// Enable or disable date time recognition.
    pub fn with_date_time(self, enabled: bool) -> Self
    {
        Self {
            decode_date_time: enabled,
            ..self
        }
    }

    /// Enable or disable time span recognition.
    pub fn with_time_span(self, enabled: bool) -> Self
    {
        Self {
            decode_time_span: enabled,
            ..self
        }
    }

    /// Enable or disable decimal recognition.
    pub fn with_decimal(self, enabled: bool) -> Self
    {
        Self {
            decode_decimal: enabled,
            ..self
        }
    }

    /// Enable recognition of every well-known type.
    pub fn with_well_known_types(self) -> Self
    {
        self.with_guid(true)
            .with_date_time(true)
            .with_time_span(true)
            .with_decimal(true)
    }

    /// Replace the GUID validator.
    pub fn with_guid_validator(self, f: impl Fn(&(Uuid, u8)) -> bool + Send + Sync + 'static)
        -> Self
    {
        Self {
            guid_validator: Arc::new(f),
            ..self
        }
    }

    /// Replace the date time validator.
    pub fn with_date_time_validator(self, f: impl Fn(&DateTime) -> bool + Send + Sync + 'static)
        -> Self
    {
        Self {
            date_time_validator: Arc::new(f),
            ..self
        }
    }

    /// Replace the time span validator.
    pub fn with_time_span_validator(self, f: impl Fn(&Duration) -> bool + Send + Sync + 'static)
        -> Self
    {
        Self {
            time_span_validator: Arc::new(f),
            ..self
        }
    }

    /// Replace the decimal validator.
    pub fn with_decimal_validator(self, f: impl Fn(&Decimal) -> bool + Send + Sync + 'static)
        -> Self
    {
        Self {
            decimal_validator: Arc::new(f),
            ..self
        }
    }

    /// Replace the string validator.
    pub fn with_string_validator(self, f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self
    {
        Self {
            string_validator: Arc::new(f),
            ..self
        }
    }

    /// Replace the embedded message validator.
    pub fn with_embedded_message_validator(
        self,
        f: impl Fn(&[u8]) -> bool + Send + Sync + 'static,
    ) -> Self
    {
        Self {
            embedded_message_validator: Arc::new(f),
            ..self
        }
    }

    /// Replace the preferred LEN decoding modes.
    pub fn with_string_decoding_modes(self, modes: Vec<StringDecodingMode>) -> Self
    {
        Self {
            preferred_string_decoding_modes: modes,
            ..self
        }
    }

    /// Replace the decoding mode of empty LEN payloads.
    pub fn with_empty_string_decoding_mode(self, mode: StringDecodingMode) -> Self
    {
        Self {
            empty_string_decoding_mode: mode,
            ..self
        }
    }

    /// Replace the `Fixed32` decoding mode.
    pub fn with_fixed32_decoding_mode(self, mode: FixedDecodingMode) -> Self
    {
        Self {
            fixed32_decoding_mode: mode,
            ..self
        }
    }

    /// Replace the `Fixed64` decoding mode.
    pub fn with_fixed64_decoding_mode(self, mode: FixedDecodingMode) -> Self
    {
        Self {
            fixed64_decoding_mode: mode,
            ..self
        }
    }

    /// Replace the nesting limit.
    pub fn with_max_depth(self, max_depth: usize) -> Self
    {
        Self { max_depth, ..self }
    }
}

impl fmt::Debug for DecodeOptions
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("DecodeOptions")
            .field("decode_guid", &self.decode_guid)
            .field("decode_date_time", &self.decode_date_time)
            .field("decode_time_span", &self.decode_time_span)
            .field("decode_decimal", &self.decode_decimal)
            .field(
                "preferred_string_decoding_modes",
                &self.preferred_string_decoding_modes,
            )
            .field("empty_string_decoding_mode", &self.empty_string_decoding_mode)
            .field("fixed32_decoding_mode", &self.fixed32_decoding_mode)
            .field("fixed64_decoding_mode", &self.fixed64_decoding_mode)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Accepts GUID versions 1 to 5.
pub fn default_guid_validator(candidate: &(Uuid, u8)) -> bool
{
    (1..=5).contains(&candidate.1)
}

/// Accepts unspecified-kind date times from thirty years ago up to twenty years from now.
pub fn default_date_time_validator(value: &DateTime) -> bool
{
    let today = OffsetDateTime::now_utc().date();
    let earliest = add_years(today, -30).midnight();
    let latest = add_years(today, 20).midnight();

    value.kind == DateTimeKind::Unspecified && value.value >= earliest && value.value <= latest
}

/// Accepts time spans up to 60 days.
pub fn default_time_span_validator(value: &Duration) -> bool
{
    *value <= Duration::days(60)
}

/// Accepts every decimal.
pub fn default_decimal_validator(_value: &Decimal) -> bool
{
    true
}

/// Rejects strings containing the control characters 0 to 6.
///
/// These are rare in text but common when binary data happens to be valid UTF-8.
pub fn default_string_validator(value: &str) -> bool
{
    !value.bytes().any(|b| b <= 6)
}

/// Rejects two byte payloads made of ASCII letters and digits.
///
/// Such payloads are far more likely to be short strings than messages.
pub fn default_embedded_message_validator(payload: &[u8]) -> bool
{
    !(payload.len() == 2 && payload.iter().all(|b| b.is_ascii_alphanumeric()))
}

/// Shifts the date by whole years, clamping February 29th to the 28th.
///
/// A target year outside the range supported by [`Date`] leaves the date unchanged.
fn add_years(date: Date, years: i32) -> Date
{
    let year = date.year() + years;
    Date::from_calendar_date(year, date.month(), date.day())
        .or_else(|_| Date::from_calendar_date(year, date.month(), date.day() - 1))
        // Only reachable when `year` itself is out of range.
        .unwrap_or(date)
}
