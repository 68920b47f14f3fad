//! Well-known nested message conventions.
//!
//! Some encoders carry scalar types that protocol buffers lack as small nested messages. The
//! codecs in this module recognize those messages and turn them into semantic values, and
//! reconstruct the exact messages when encoding.
//!
//! A candidate is recognized only if its fields match the expected layout, re-encoding the value
//! reproduces the candidate byte for byte and the validator configured in
//! [`DecodeOptions`] accepts the value. When more than one codec would match, the first one in
//! the order GUID, date time, time span, decimal wins.

use crate::decode::Value;
use crate::wire::WireObject;
use crate::DecodeOptions;

pub mod decimal;
pub mod guid;
pub mod time;

pub use self::time::{DateTime, DateTimeKind, TIME_SPAN_MAX, TIME_SPAN_MIN};

/// Tries the enabled codecs on an embedded message.
pub(crate) fn decode(object: &WireObject, options: &DecodeOptions) -> Option<Value>
{
    if options.decode_guid {
        if let Some(v) = guid::decode(object, options) {
            return Some(Value::Guid(v));
        }
    }

    if options.decode_date_time {
        if let Some(v) = self::time::decode_date_time(object, options) {
            return Some(Value::DateTime(v));
        }
    }

    if options.decode_time_span {
        if let Some(v) = self::time::decode_time_span(object, options) {
            return Some(Value::TimeSpan(v));
        }
    }

    if options.decode_decimal {
        if let Some(v) = decimal::decode(object, options) {
            return Some(Value::Decimal(v));
        }
    }

    None
}

/// Checks that `encoded` serializes to the same bytes as `candidate`.
fn is_canonical(candidate: &WireObject, encoded: &WireObject, codec: &'static str) -> bool
{
    let canonical = match (candidate.try_encode(), encoded.try_encode()) {
        (Ok(original), Ok(reencoded)) => original == reencoded,
        _ => false,
    };

    if !canonical {
        tracing::trace!(codec, "candidate is not in canonical form");
    }

    canonical
}
