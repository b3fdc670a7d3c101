//! Enums that fall back to a designated case instead of failing.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{DeserializeOwned, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::decoder::Decoder;
use crate::options::Options;

/// An enum backed by raw values, with one case standing in for anything
/// unrecognized.
///
/// Implement it and route `Deserialize` through [`decode_default_case`],
/// usually with [`default_case_deserialize!`](crate::default_case_deserialize):
///
/// ```
/// use json_lenient::{default_case_deserialize, from_value, DefaultCase};
/// use serde_json::json;
///
/// #[derive(Debug, PartialEq)]
/// enum Status {
///     Active,
///     Archived,
///     Unknown,
/// }
///
/// impl DefaultCase for Status {
///     type Raw = String;
///
///     fn default_case() -> Self {
///         Status::Unknown
///     }
///
///     fn from_raw(raw: String) -> Option<Self> {
///         match raw.as_str() {
///             "active" => Some(Status::Active),
///             "archived" => Some(Status::Archived),
///             _ => None,
///         }
///     }
/// }
///
/// default_case_deserialize!(Status);
///
/// let statuses: Vec<Status> = from_value(&json!(["active", "deleted", {}])).unwrap();
/// assert_eq!(statuses, [Status::Active, Status::Unknown, Status::Unknown]);
/// ```
pub trait DefaultCase: Sized {
    /// The raw representation the cases are keyed by.
    type Raw: DeserializeOwned;

    fn default_case() -> Self;

    /// The case for `raw`, if any.
    fn from_raw(raw: Self::Raw) -> Option<Self>;
}

/// Newtype name through which [`decode_default_case`] asks for the raw value.
pub(crate) const DEFAULT_CASE_MARKER: &str = "$json_lenient::private::DefaultCase";

/// Decode `T` from its raw value, using [`DefaultCase::default_case`] when
/// the raw value cannot be read or matches no case.
///
/// Under this crate's decoder the raw value is read with the options of the
/// running decode call. Any other deserializer has its node captured whole
/// and the raw value read from that with default options, so a failed read
/// never leaves it half consumed.
pub fn decode_default_case<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: DefaultCase,
    D: Deserializer<'de>,
{
    deserializer.deserialize_newtype_struct(DEFAULT_CASE_MARKER, DefaultCaseVisitor(PhantomData))
}

struct DefaultCaseVisitor<T>(PhantomData<T>);

impl<'de, T: DefaultCase> Visitor<'de> for DefaultCaseVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(type_name::<T>())
    }

    /// [`Decoder`] answers the marker here, handing over itself.
    fn visit_some<D: Deserializer<'de>>(self, decoder: D) -> Result<T, D::Error> {
        Ok(case_or_default(T::Raw::deserialize(decoder).ok()))
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, deserializer: D) -> Result<T, D::Error> {
        let node = Value::deserialize(deserializer)?;
        let options = Options::default();
        let raw = Decoder::new(&node, &options).decode::<T::Raw>().ok();
        Ok(case_or_default(raw))
    }
}

fn case_or_default<T: DefaultCase>(raw: Option<T::Raw>) -> T {
    raw.and_then(T::from_raw).unwrap_or_else(|| {
        debug!(target_type = type_name::<T>(), "no matching case, using default");
        T::default_case()
    })
}

/// Implement `Deserialize` for one or more [`DefaultCase`] types.
#[macro_export]
macro_rules! default_case_deserialize {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl<'de> $crate::__private::serde::Deserialize<'de> for $ty {
                fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
                where
                    D: $crate::__private::serde::Deserializer<'de>,
                {
                    $crate::decode_default_case(deserializer)
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    enum Level {
        Low,
        High,
        Unset,
    }

    impl DefaultCase for Level {
        type Raw = i32;

        fn default_case() -> Self {
            Level::Unset
        }

        fn from_raw(raw: i32) -> Option<Self> {
            match raw {
                1 => Some(Level::Low),
                2 => Some(Level::High),
                _ => None,
            }
        }
    }

    crate::default_case_deserialize!(Level);

    #[test]
    fn test_integer_raw_values_coerce() {
        let levels: Vec<Level> = crate::from_value(&json!([1, "2", 7, null, "x"])).unwrap();
        assert_eq!(levels, [Level::Low, Level::High, Level::Unset, Level::Unset, Level::Unset]);
    }

    #[derive(Debug, PartialEq)]
    enum Mode {
        Off,
        On,
        Unset,
    }

    impl DefaultCase for Mode {
        type Raw = i32;

        fn default_case() -> Self {
            Mode::Unset
        }

        fn from_raw(raw: i32) -> Option<Self> {
            match raw {
                0 => Some(Mode::Off),
                1 => Some(Mode::On),
                _ => None,
            }
        }
    }

    crate::default_case_deserialize!(Mode);

    #[derive(Debug, Deserialize)]
    struct Switch {
        mode: Mode,
    }

    #[test]
    fn test_raw_value_follows_call_options() {
        let doc = json!({"mode": null});
        let lenient: Switch = crate::from_value(&doc).unwrap();
        assert_eq!(lenient.mode, Mode::Off);

        let strict: Switch = crate::LenientDecoder::new()
            .non_optional_strategy(crate::NonOptionalStrategy::Throw)
            .decode_value(&doc)
            .unwrap();
        assert_eq!(strict.mode, Mode::Unset);
    }

    #[test]
    fn test_fallback_through_plain_serde_json() {
        let levels: Vec<Level> = serde_json::from_str(r#"[2, {"a": 1}, 1]"#).unwrap();
        assert_eq!(levels, [Level::High, Level::Unset, Level::Low]);
    }
}
