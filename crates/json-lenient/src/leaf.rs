//! Well-known leaf kinds: dates, binary data, URLs and decimals.
//!
//! Each kind asks its deserializer for a newtype struct under a private
//! marker name. [`Decoder`] recognizes the marker and applies the configured
//! strategy; any other deserializer sees an ordinary newtype and the type
//! decodes itself from its usual representation.
//!
//! Use the newtypes directly, or the `with` modules on plain field types:
//!
//! ```
//! use chrono::{DateTime, Utc};
//! use json_lenient::{from_value, leaf, Data};
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize)]
//! struct Upload {
//!     #[serde(with = "leaf::date")]
//!     at: DateTime<Utc>,
//!     payload: Data,
//! }
//!
//! let upload: Upload = from_value(&json!({
//!     "at": "2021-11-03T08:00:00Z",
//!     "payload": [1, "2", 3],
//! }))
//! .unwrap();
//! assert_eq!(upload.at.timestamp(), 1_635_926_400);
//! assert_eq!(upload.payload.0, vec![1, 2, 3]);
//! ```

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::de::value::{BytesDeserializer, I128Deserializer, StringDeserializer};
use serde::de::{self, Deserialize, Deserializer, IntoDeserializer, Visitor};
use tracing::trace;

use crate::coerce;
use crate::decoder::Decoder;
use crate::error::DecodeError;
use crate::options::{DataStrategy, DateStrategy};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// The closed set of leaf kinds with dedicated decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    Date,
    Data,
    Url,
    Decimal,
}

impl LeafKind {
    /// Every kind, in the order they are checked.
    pub const ALL: [LeafKind; 4] = [Self::Date, Self::Data, Self::Url, Self::Decimal];

    pub fn marker(self) -> &'static str {
        match self {
            Self::Date => "$json_lenient::private::Date",
            Self::Data => "$json_lenient::private::Data",
            Self::Url => "$json_lenient::private::Url",
            Self::Decimal => "$json_lenient::private::Decimal",
        }
    }

    pub fn from_marker(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.marker() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Data => "data",
            Self::Url => "url",
            Self::Decimal => "decimal",
        }
    }
}

/// A point in time, decoded through the date strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(pub DateTime<Utc>);

/// Binary data, decoded through the data strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Data(pub Vec<u8>);

/// An absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Url(pub ::url::Url);

/// An exact decimal number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(pub rust_decimal::Decimal);

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        date::deserialize(deserializer).map(Self)
    }
}

impl<'de> Deserialize<'de> for Data {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        data::deserialize(deserializer).map(Self)
    }
}

impl<'de> Deserialize<'de> for Url {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        url::deserialize(deserializer).map(Self)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        decimal::deserialize(deserializer).map(Self)
    }
}

/// `#[serde(with = "json_lenient::leaf::date")]` for `DateTime<Utc>` fields.
pub mod date {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        deserializer.deserialize_newtype_struct(LeafKind::Date.marker(), DateVisitor)
    }
}

/// `#[serde(with = "json_lenient::leaf::data")]` for `Vec<u8>` fields.
pub mod data {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        deserializer.deserialize_newtype_struct(LeafKind::Data.marker(), DataVisitor)
    }
}

/// `#[serde(with = "json_lenient::leaf::url")]` for `url::Url` fields.
pub mod url {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<::url::Url, D::Error> {
        deserializer.deserialize_newtype_struct(LeafKind::Url.marker(), UrlVisitor)
    }
}

/// `#[serde(with = "json_lenient::leaf::decimal")]` for `rust_decimal::Decimal` fields.
pub mod decimal {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<rust_decimal::Decimal, D::Error> {
        deserializer.deserialize_newtype_struct(LeafKind::Decimal.marker(), DecimalVisitor)
    }
}

struct DateVisitor;

impl<'de> Visitor<'de> for DateVisitor {
    type Value = DateTime<Utc>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an RFC 3339 date-time string")
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_str(self)
    }

    fn visit_str<E: de::Error>(self, text: &str) -> Result<Self::Value, E> {
        text.parse::<DateTime<Utc>>()
            .map_err(|err| E::custom(format!("invalid date `{text}`: {err}")))
    }

    fn visit_i128<E: de::Error>(self, nanos: i128) -> Result<Self::Value, E> {
        Ok(from_nanos(nanos))
    }
}

struct DataVisitor;

impl<'de> Visitor<'de> for DataVisitor {
    type Value = Vec<u8>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a byte array")
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_byte_buf(self)
    }

    fn visit_bytes<E: de::Error>(self, bytes: &[u8]) -> Result<Self::Value, E> {
        Ok(bytes.to_vec())
    }

    fn visit_byte_buf<E: de::Error>(self, bytes: Vec<u8>) -> Result<Self::Value, E> {
        Ok(bytes)
    }

    fn visit_str<E: de::Error>(self, text: &str) -> Result<Self::Value, E> {
        Ok(text.as_bytes().to_vec())
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        Ok(bytes)
    }
}

struct UrlVisitor;

impl<'de> Visitor<'de> for UrlVisitor {
    type Value = ::url::Url;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a URL string")
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_str(self)
    }

    fn visit_str<E: de::Error>(self, text: &str) -> Result<Self::Value, E> {
        ::url::Url::parse(text).map_err(|err| E::custom(format!("invalid URL `{text}`: {err}")))
    }
}

struct DecimalVisitor;

impl<'de> Visitor<'de> for DecimalVisitor {
    type Value = rust_decimal::Decimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal number or numeric string")
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> Result<Self::Value, E> {
        Ok(rust_decimal::Decimal::from(n))
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> Result<Self::Value, E> {
        Ok(rust_decimal::Decimal::from(n))
    }

    fn visit_f64<E: de::Error>(self, n: f64) -> Result<Self::Value, E> {
        self.visit_str(&n.to_string())
    }

    fn visit_str<E: de::Error>(self, text: &str) -> Result<Self::Value, E> {
        rust_decimal::Decimal::from_str(text)
            .or_else(|_| rust_decimal::Decimal::from_scientific(text))
            .map_err(|err| E::custom(format!("invalid decimal `{text}`: {err}")))
    }
}

/// Apply the strategy for `kind` and hand the result to `visitor`.
pub(crate) fn visit<'de, V: Visitor<'de>>(
    kind: LeafKind,
    decoder: Decoder<'_>,
    visitor: V,
) -> Result<V::Value, DecodeError> {
    match kind {
        LeafKind::Date => match decode_date(&decoder)? {
            Some(date) => visitor.visit_newtype_struct(I128Deserializer::<DecodeError>::new(to_nanos(&date))),
            None => visitor.visit_newtype_struct(decoder),
        },
        LeafKind::Data => {
            let bytes = decode_data(&decoder)?;
            visitor.visit_newtype_struct(BytesDeserializer::<DecodeError>::new(&bytes))
        }
        LeafKind::Url => {
            let url = decode_url(&decoder)?;
            let text: StringDeserializer<DecodeError> = String::from(url).into_deserializer();
            visitor.visit_newtype_struct(text)
        }
        LeafKind::Decimal => {
            let text: StringDeserializer<DecodeError> =
                coerce::to_decimal(decoder.value()).to_string().into_deserializer();
            visitor.visit_newtype_struct(text)
        }
    }
}

/// The date under `decoder`, or `None` when the date type should decode
/// itself.
fn decode_date(decoder: &Decoder<'_>) -> Result<Option<DateTime<Utc>>, DecodeError> {
    let strategy = &decoder.options().date_strategy;
    trace!(path = %decoder.path(), strategy = strategy.name(), "decoding date");
    match strategy {
        DateStrategy::DeferredToDefault => Ok(None),
        DateStrategy::SecondsSince1970 => Ok(Some(from_seconds(coerce::to_f64(decoder.value())))),
        DateStrategy::MillisecondsSince1970 => {
            Ok(Some(from_seconds(coerce::to_f64(decoder.value()) / 1000.0)))
        }
        DateStrategy::Iso8601 => {
            let text = coerce::to_string(decoder.value());
            DateTime::parse_from_rfc3339(&text)
                .map(|date| Some(date.with_timezone(&Utc)))
                .map_err(|_| decoder.data_corrupted("Expected date string to be ISO8601-formatted."))
        }
        DateStrategy::Formatted(format) => {
            let text = coerce::to_string(decoder.value());
            format
                .parse(&text)
                .map(Some)
                .ok_or_else(|| decoder.data_corrupted("Date string does not match format expected by formatter."))
        }
        DateStrategy::Custom(decode) => decode(decoder).map(Some),
    }
}

pub(crate) fn decode_data(decoder: &Decoder<'_>) -> Result<Vec<u8>, DecodeError> {
    let strategy = &decoder.options().data_strategy;
    trace!(path = %decoder.path(), strategy = strategy.name(), "decoding data");
    match strategy {
        DataStrategy::DeferredToDefault => decoder.decode::<Vec<u8>>(),
        DataStrategy::Base64 => {
            let text = coerce::to_string(decoder.value());
            STANDARD
                .decode(text.as_bytes())
                .map_err(|_| decoder.data_corrupted("Encountered Data is not valid Base64."))
        }
        DataStrategy::Custom(decode) => decode(decoder),
    }
}

fn decode_url(decoder: &Decoder<'_>) -> Result<::url::Url, DecodeError> {
    let text = coerce::to_string(decoder.value());
    ::url::Url::parse(&text).map_err(|_| decoder.data_corrupted("Invalid URL string."))
}

/// Seconds since the epoch, saturating at the representable range.
fn from_seconds(seconds: f64) -> DateTime<Utc> {
    if seconds.is_nan() {
        return DateTime::<Utc>::UNIX_EPOCH;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
    DateTime::<Utc>::from_timestamp(whole as i64, nanos).unwrap_or(if seconds > 0.0 {
        DateTime::<Utc>::MAX_UTC
    } else {
        DateTime::<Utc>::MIN_UTC
    })
}

fn to_nanos(date: &DateTime<Utc>) -> i128 {
    i128::from(date.timestamp()) * NANOS_PER_SECOND + i128::from(date.timestamp_subsec_nanos())
}

fn from_nanos(nanos: i128) -> DateTime<Utc> {
    let seconds = nanos.div_euclid(NANOS_PER_SECOND);
    let subsec = nanos.rem_euclid(NANOS_PER_SECOND) as u32;
    i64::try_from(seconds)
        .ok()
        .and_then(|seconds| DateTime::<Utc>::from_timestamp(seconds, subsec))
        .unwrap_or(if nanos > 0 {
            DateTime::<Utc>::MAX_UTC
        } else {
            DateTime::<Utc>::MIN_UTC
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_marker_lookup() {
        for kind in LeafKind::ALL {
            assert_eq!(LeafKind::from_marker(kind.marker()), Some(kind));
        }
        assert_eq!(LeafKind::from_marker("Date"), None);
    }

    #[test]
    fn test_from_seconds_fraction_and_saturation() {
        assert_eq!(from_seconds(0.0), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(
            from_seconds(-1.5),
            Utc.timestamp_opt(-2, 500_000_000).unwrap()
        );
        assert_eq!(from_seconds(f64::NAN), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(from_seconds(f64::INFINITY), DateTime::<Utc>::MAX_UTC);
        assert_eq!(from_seconds(f64::NEG_INFINITY), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_nanos_round_trip_at_extremes() {
        for date in [DateTime::<Utc>::MAX_UTC, DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::UNIX_EPOCH] {
            assert_eq!(from_nanos(to_nanos(&date)), date);
        }
    }

    #[test]
    fn test_leaves_decode_from_plain_serde_json() {
        let date: Date = serde_json::from_str("\"2021-11-03T08:00:00Z\"").unwrap();
        assert_eq!(date.0, Utc.with_ymd_and_hms(2021, 11, 3, 8, 0, 0).unwrap());
        let data: Data = serde_json::from_str("[1, 2, 255]").unwrap();
        assert_eq!(data.0, vec![1, 2, 255]);
        let url: Url = serde_json::from_str("\"https://example.com/a\"").unwrap();
        assert_eq!(url.0.path(), "/a");
        let decimal: Decimal = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(decimal.0.to_string(), "12.50");
    }
}
