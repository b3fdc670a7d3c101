use std::any::{type_name, Any};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::decoder::Decoder;
use crate::error::DecodeError;
use crate::options::{
    DataStrategy, DateStrategy, KeyStrategy, NonConformingFloatStrategy, NonOptionalStrategy,
    Options,
};

/// A configured decoder.
///
/// Configuration is only read when a decode starts; each call works on its
/// own snapshot, so one `LenientDecoder` can serve many threads.
///
/// # Example
///
/// ```
/// use json_lenient::{KeyStrategy, LenientDecoder, NonOptionalStrategy};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Account {
///     user_id: u64,
///     display_name: String,
/// }
///
/// let decoder = LenientDecoder::new()
///     .key_strategy(KeyStrategy::ConvertFromSnakeCase)
///     .non_optional_strategy(NonOptionalStrategy::Automatically);
/// let account: Account = decoder.decode_str(r#"{"user_id": "42"}"#).unwrap();
/// assert_eq!(account.user_id, 42);
/// assert_eq!(account.display_name, "");
/// ```
#[derive(Debug, Clone, Default)]
pub struct LenientDecoder {
    options: Options,
}

impl LenientDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn date_strategy(mut self, strategy: DateStrategy) -> Self {
        self.options.date_strategy = strategy;
        self
    }

    pub fn data_strategy(mut self, strategy: DataStrategy) -> Self {
        self.options.data_strategy = strategy;
        self
    }

    pub fn non_conforming_float_strategy(mut self, strategy: NonConformingFloatStrategy) -> Self {
        self.options.non_conforming_float_strategy = strategy;
        self
    }

    pub fn key_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.options.key_strategy = strategy;
        self
    }

    pub fn non_optional_strategy(mut self, strategy: NonOptionalStrategy) -> Self {
        self.options.non_optional_strategy = strategy;
        self
    }

    /// Add an entry to the user info every decoder can read.
    pub fn user_info<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.options.user_info.insert(key, value);
        self
    }

    /// Decode `T` from a value tree.
    pub fn decode_value<T: DeserializeOwned>(&self, value: &Value) -> Result<T, DecodeError> {
        let options = self.options.clone();
        debug!(
            target_type = type_name::<T>(),
            date_strategy = options.date_strategy.name(),
            data_strategy = options.data_strategy.name(),
            key_strategy = options.key_strategy.name(),
            non_optional = ?options.non_optional_strategy,
            "decoding"
        );
        Decoder::new(value, &options).decode()
    }

    /// Parse JSON text and decode `T` from it.
    pub fn decode_str<T: DeserializeOwned>(&self, text: &str) -> Result<T, DecodeError> {
        let value: Value = serde_json::from_str(text)?;
        self.decode_value(&value)
    }

    /// Parse JSON bytes and decode `T` from them.
    pub fn decode_slice<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        let value: Value = serde_json::from_slice(bytes)?;
        self.decode_value(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_syntax_error() {
        let err = LenientDecoder::new().decode_str::<i32>("{not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert!(err.path().is_root());
    }

    #[test]
    fn test_scalar_top_level() {
        let decoder = LenientDecoder::new();
        assert_eq!(decoder.decode_str::<i32>("\"12\"").unwrap(), 12);
        assert_eq!(decoder.decode_slice::<bool>(b"\"yes\"").unwrap(), true);
    }

    #[test]
    fn test_builder_sets_options() {
        let decoder = LenientDecoder::new()
            .key_strategy(KeyStrategy::ConvertFromSnakeCase)
            .non_optional_strategy(NonOptionalStrategy::Throw)
            .user_info("scale", 10i64);
        assert!(matches!(decoder.options().key_strategy, KeyStrategy::ConvertFromSnakeCase));
        assert_eq!(decoder.options().non_optional_strategy, NonOptionalStrategy::Throw);
        assert_eq!(decoder.options().user_info.get::<i64>("scale"), Some(&10));
    }
}
