//! Decoding configuration and the strategies it selects.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::decoder::Decoder;
use crate::error::DecodeError;
use crate::path::DecodePath;

/// Decodes a date from the current decoder.
pub type DateFn = Arc<dyn Fn(&Decoder<'_>) -> Result<DateTime<Utc>, DecodeError> + Send + Sync>;

/// Decodes binary data from the current decoder.
pub type DataFn = Arc<dyn Fn(&Decoder<'_>) -> Result<Vec<u8>, DecodeError> + Send + Sync>;

/// Maps the path of an object key (container path plus the raw key) to the
/// key the target type will look up.
pub type KeyFn = Arc<dyn Fn(&DecodePath) -> String + Send + Sync>;

/// A date pattern in chrono's strftime syntax.
///
/// Built once per configuration and shared by every decode that uses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
}

impl DateFormat {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Parse `text` with this pattern.
    ///
    /// Patterns carrying an offset are honoured; patterns without one are
    /// read as UTC, and date-only patterns land at midnight.
    pub fn parse(&self, text: &str) -> Option<DateTime<Utc>> {
        if let Ok(date) = DateTime::parse_from_str(text, &self.pattern) {
            return Some(date.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, &self.pattern) {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(text, &self.pattern)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

/// How date leaves are decoded.
#[derive(Clone, Default)]
pub enum DateStrategy {
    /// Let the date type deserialize itself from the coerced string.
    #[default]
    DeferredToDefault,
    /// Seconds since the Unix epoch, read with float coercion.
    SecondsSince1970,
    /// Milliseconds since the Unix epoch, read with float coercion.
    MillisecondsSince1970,
    /// An RFC 3339 date-time string.
    Iso8601,
    /// A string matching the given pattern.
    Formatted(DateFormat),
    Custom(DateFn),
}

impl DateStrategy {
    pub fn formatted(pattern: impl Into<String>) -> Self {
        Self::Formatted(DateFormat::new(pattern))
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Decoder<'_>) -> Result<DateTime<Utc>, DecodeError> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::DeferredToDefault => "deferred_to_default",
            Self::SecondsSince1970 => "seconds_since_1970",
            Self::MillisecondsSince1970 => "milliseconds_since_1970",
            Self::Iso8601 => "iso8601",
            Self::Formatted(_) => "formatted",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for DateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Formatted(format) => f.debug_tuple("Formatted").field(format).finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// How binary data leaves are decoded.
#[derive(Clone, Default)]
pub enum DataStrategy {
    /// An array of byte values, each read with integer coercion.
    #[default]
    DeferredToDefault,
    /// A standard-alphabet base64 string.
    Base64,
    Custom(DataFn),
}

impl DataStrategy {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Decoder<'_>) -> Result<Vec<u8>, DecodeError> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::DeferredToDefault => "deferred_to_default",
            Self::Base64 => "base64",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for DataStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Spellings of non-conforming floats.
///
/// Carried in the configuration for custom strategies to consult; float
/// coercion recognizes its own tokens regardless of this setting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NonConformingFloatStrategy {
    #[default]
    Throw,
    ConvertFromString {
        positive_infinity: String,
        negative_infinity: String,
        nan: String,
    },
}

/// How object keys are rewritten before field lookup.
#[derive(Clone, Default)]
pub enum KeyStrategy {
    #[default]
    UseDefaultKeys,
    /// `snake_case` keys become `camelCase`.
    ConvertFromSnakeCase,
    Custom(KeyFn),
}

impl KeyStrategy {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&DecodePath) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::UseDefaultKeys => "use_default_keys",
            Self::ConvertFromSnakeCase => "convert_from_snake_case",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What happens when a non-optional target meets a null (or absent) node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NonOptionalStrategy {
    /// Fail with a value-not-found error.
    Throw,
    /// Fill the target from the null node through the coercion rules.
    #[default]
    Automatically,
}

/// Caller-supplied context, readable from any decoder during a decode.
#[derive(Clone, Default)]
pub struct UserInfo {
    entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl UserInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Arc::new(value));
    }

    /// The value stored under `key`, if present and of type `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.entries.get(key)?.downcast_ref::<T>()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// A complete decoding configuration.
///
/// A decode call clones the options once up front; every container spawned
/// by that call reads the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub date_strategy: DateStrategy,
    pub data_strategy: DataStrategy,
    pub non_conforming_float_strategy: NonConformingFloatStrategy,
    pub key_strategy: KeyStrategy,
    pub non_optional_strategy: NonOptionalStrategy,
    pub user_info: UserInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_format_with_offset() {
        let format = DateFormat::new("%Y-%m-%d %H:%M:%S %z");
        let date = format.parse("2021-11-03 10:00:00 +0200").unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2021, 11, 3, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_date_format_naive_and_date_only() {
        let format = DateFormat::new("%Y/%m/%d %H:%M");
        assert_eq!(
            format.parse("2021/11/03 10:30"),
            Some(Utc.with_ymd_and_hms(2021, 11, 3, 10, 30, 0).unwrap())
        );
        let format = DateFormat::new("%d.%m.%Y");
        assert_eq!(
            format.parse("03.11.2021"),
            Some(Utc.with_ymd_and_hms(2021, 11, 3, 0, 0, 0).unwrap())
        );
        assert_eq!(format.parse("2021-11-03"), None);
    }

    #[test]
    fn test_user_info_is_typed() {
        let mut info = UserInfo::new();
        info.insert("tenant", String::from("acme"));
        info.insert("version", 3u32);
        assert_eq!(info.get::<String>("tenant").map(String::as_str), Some("acme"));
        assert_eq!(info.get::<u32>("version"), Some(&3));
        assert_eq!(info.get::<i64>("version"), None);
        assert!(!info.contains_key("missing"));
    }

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(matches!(options.date_strategy, DateStrategy::DeferredToDefault));
        assert!(matches!(options.key_strategy, KeyStrategy::UseDefaultKeys));
        assert_eq!(options.non_optional_strategy, NonOptionalStrategy::Automatically);
        assert!(options.user_info.is_empty());
    }
}
