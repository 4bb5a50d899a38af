use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use super::{Codec, unclaimed};
use crate::envelope::{DATE_TAG, DATETIME_TAG, Envelope, TIME_TAG};
use crate::error::CodecError;
use crate::value::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.9f";
const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f";
const AWARE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f%:z";

// `%.f` accepts any fractional precision, including none.
const TIME_PARSE: &str = "%H:%M:%S%.f";
const NAIVE_PARSE: &str = "%Y-%m-%dT%H:%M:%S%.f";
const AWARE_PARSE: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";

/// Dates, times and date-times as ISO-8601 text with nanosecond precision.
///
/// Date-times carrying an offset keep it; naive ones stay naive.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemporalCodec;

impl Codec for TemporalCodec {
    fn name(&self) -> &str {
        "temporal"
    }

    fn tags(&self) -> &[&str] {
        &[DATETIME_TAG, DATE_TAG, TIME_TAG]
    }

    fn claims(&self, value: &Value) -> bool {
        matches!(
            value,
            Value::DateTimeTz(_) | Value::DateTime(_) | Value::Date(_) | Value::Time(_)
        )
    }

    fn encode(&self, value: &Value) -> Result<Option<Envelope>, CodecError> {
        // Richest shapes first.
        let (tag, text) = match value {
            Value::DateTimeTz(dt) => (DATETIME_TAG, dt.format(AWARE_FORMAT).to_string()),
            Value::DateTime(dt) => (DATETIME_TAG, dt.format(NAIVE_FORMAT).to_string()),
            Value::Date(d) => (DATE_TAG, d.format(DATE_FORMAT).to_string()),
            Value::Time(t) => (TIME_TAG, t.format(TIME_FORMAT).to_string()),
            _ => return Ok(None),
        };
        Ok(Some(Envelope::new(tag).with("data", text)))
    }

    fn decode(&self, mut envelope: Envelope) -> Result<Value, CodecError> {
        let tag = envelope.tag().to_string();
        let text: String = match tag.as_str() {
            DATETIME_TAG | DATE_TAG | TIME_TAG => envelope.take_as("data")?,
            _ => return Err(unclaimed(self, &envelope)),
        };
        let bad = |e: chrono::ParseError| CodecError::malformed(&tag, format!("`{text}`: {e}"));

        match tag.as_str() {
            DATE_TAG => NaiveDate::parse_from_str(&text, DATE_FORMAT)
                .map(Value::Date)
                .map_err(bad),
            TIME_TAG => NaiveTime::parse_from_str(&text, TIME_PARSE)
                .map(Value::Time)
                .map_err(bad),
            _ => match DateTime::parse_from_str(&text, AWARE_PARSE) {
                Ok(dt) => Ok(Value::DateTimeTz(dt)),
                Err(_) => NaiveDateTime::parse_from_str(&text, NAIVE_PARSE)
                    .map(Value::DateTime)
                    .map_err(bad),
            },
        }
    }
}
