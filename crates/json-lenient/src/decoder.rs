//! The single-value container and the `serde::Deserializer` driving every
//! descent.
//!
//! A [`Decoder`] is one node of the value tree together with its path and
//! the frozen options of the current decode call. Target types pull from it
//! through serde. Structs and maps read through a [`KeyedContainer`] and
//! sequences through an [`UnkeyedContainer`].

use serde::de::value::{StrDeserializer, U32Deserializer};
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, Deserializer, EnumAccess, IntoDeserializer,
    VariantAccess, Visitor,
};
use serde_json::Value;

use crate::aliases;
use crate::coerce::{self, kind_name};
use crate::default_case::DEFAULT_CASE_MARKER;
use crate::error::DecodeError;
use crate::keyed::{FieldAccess, KeyedContainer};
use crate::keys::KeyTable;
use crate::leaf::{self, LeafKind};
use crate::options::{NonOptionalStrategy, Options, UserInfo};
use crate::path::DecodePath;
use crate::unkeyed::UnkeyedContainer;

/// Stand-in for absent fields.
pub(crate) static NULL: Value = Value::Null;

/// A view of one node of the value tree.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    value: &'a Value,
    path: DecodePath,
    options: &'a Options,
}

impl<'a> Decoder<'a> {
    /// A root decoder for `value`.
    pub fn new(value: &'a Value, options: &'a Options) -> Self {
        Self::at(value, DecodePath::root(), options)
    }

    pub(crate) fn at(value: &'a Value, path: DecodePath, options: &'a Options) -> Self {
        Self {
            value,
            path,
            options,
        }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn path(&self) -> &DecodePath {
        &self.path
    }

    pub fn options(&self) -> &'a Options {
        self.options
    }

    pub fn user_info(&self) -> &'a UserInfo {
        &self.options.user_info
    }

    /// Whether the node is null.
    pub fn decode_nil(&self) -> bool {
        self.value.is_null()
    }

    /// Decode the node as `T`.
    ///
    /// A failed attempt that taught the decoder a new field alias is retried.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        loop {
            let learned = aliases::generation();
            match T::deserialize(self.clone()) {
                Err(_) if aliases::generation() != learned => continue,
                result => return result.map_err(|err| err.or_at(&self.path)),
            }
        }
    }

    /// A keyed view of the node.
    ///
    /// Null and, unless the non-optional strategy is `Throw`, any other
    /// non-object node give an empty container.
    pub fn keyed(&self) -> Result<KeyedContainer<'a>, DecodeError> {
        let table = match self.value {
            Value::Object(map) => KeyTable::build(map, &self.options.key_strategy, &self.path),
            Value::Null => KeyTable::empty(),
            other if self.is_strict() => {
                return Err(DecodeError::type_mismatch(&self.path, "object", kind_name(other)));
            }
            _ => KeyTable::empty(),
        };
        Ok(KeyedContainer::new(table, self.path.clone(), self.options))
    }

    /// An unkeyed view of the node, with the same shape rules as [`Decoder::keyed`].
    pub fn unkeyed(&self) -> Result<UnkeyedContainer<'a>, DecodeError> {
        let items: &'a [Value] = match self.value {
            Value::Array(items) => items,
            Value::Null => &[],
            other if self.is_strict() => {
                return Err(DecodeError::type_mismatch(&self.path, "array", kind_name(other)));
            }
            _ => &[],
        };
        Ok(UnkeyedContainer::new(items, self.path.clone(), self.options))
    }

    /// A data-corrupted error at this decoder's path, for custom strategies.
    pub fn data_corrupted(&self, message: impl Into<String>) -> DecodeError {
        DecodeError::data_corrupted(&self.path, message)
    }

    fn is_strict(&self) -> bool {
        self.options.non_optional_strategy == NonOptionalStrategy::Throw
    }

    fn check_null(&self, expected: &str) -> Result<(), DecodeError> {
        if self.value.is_null() && self.is_strict() {
            return Err(DecodeError::value_not_found(
                &self.path,
                format!("expected {expected} but found null"),
            ));
        }
        Ok(())
    }

    fn located<T>(&self, result: Result<T, DecodeError>) -> Result<T, DecodeError> {
        result.map_err(|err| err.or_at(&self.path))
    }
}

macro_rules! deserialize_coerced {
    ($($method:ident => $visit:ident($coerce:path, $expected:literal);)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
                self.check_null($expected)?;
                let value = $coerce(self.value);
                self.located(visitor.$visit(value))
            }
        )*
    };
}

impl<'de, 'a> Deserializer<'de> for Decoder<'a> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        let value = self.value;
        let result = match value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    visitor.visit_u64(u)
                } else if let Some(i) = n.as_i64() {
                    visitor.visit_i64(i)
                } else {
                    visitor.visit_f64(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => visitor.visit_str(s),
            Value::Array(_) => return self.deserialize_seq(visitor),
            Value::Object(_) => return self.deserialize_map(visitor),
        };
        self.located(result)
    }

    deserialize_coerced! {
        deserialize_bool => visit_bool(coerce::to_bool, "bool");
        deserialize_i8 => visit_i8(coerce::to_i8, "i8");
        deserialize_i16 => visit_i16(coerce::to_i16, "i16");
        deserialize_i32 => visit_i32(coerce::to_i32, "i32");
        deserialize_i64 => visit_i64(coerce::to_i64, "i64");
        deserialize_i128 => visit_i128(coerce::to_i128, "i128");
        deserialize_u8 => visit_u8(coerce::to_u8, "u8");
        deserialize_u16 => visit_u16(coerce::to_u16, "u16");
        deserialize_u32 => visit_u32(coerce::to_u32, "u32");
        deserialize_u64 => visit_u64(coerce::to_u64, "u64");
        deserialize_u128 => visit_u128(coerce::to_u128, "u128");
        deserialize_f32 => visit_f32(coerce::to_f32, "f32");
        deserialize_f64 => visit_f64(coerce::to_f64, "f64");
        deserialize_char => visit_char(coerce::to_char, "char");
        deserialize_str => visit_string(coerce::to_string, "string");
        deserialize_string => visit_string(coerce::to_string, "string");
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.check_null("data")?;
        let bytes = leaf::decode_data(&self)?;
        self.located(visitor.visit_byte_buf(bytes))
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        if self.value.is_null() {
            return self.located(visitor.visit_none());
        }
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.located(visitor.visit_unit())
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        if name == DEFAULT_CASE_MARKER {
            return visitor.visit_some(self);
        }
        match LeafKind::from_marker(name) {
            Some(kind) => {
                self.check_null(kind.name())?;
                let path = self.path.clone();
                leaf::visit(kind, self, visitor).map_err(|err| err.or_at(&path))
            }
            None => visitor.visit_newtype_struct(self),
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.check_null("array")?;
        let mut container = self.unkeyed()?;
        let result = visitor.visit_seq(&mut container);
        self.located(result)
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.check_null("object")?;
        let container = self.keyed()?;
        let keys = container.all_keys();
        let result = visitor.visit_map(FieldAccess::new(&container, keys));
        self.located(result)
    }

    /// Every declared field is offered to the visitor.
    /// Absent fields come through as null, so `Throw` reports them as
    /// missing values at their own path. Only one name of an aliased field
    /// is offered.
    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.check_null(name)?;
        let container = self.keyed()?;
        let keys = aliases::struct_keys(name, fields, |field| container.contains(field));
        let mut access = FieldAccess::new(&container, keys);
        let result = visitor.visit_map(&mut access);
        if let Err(err) = &result {
            if let (Some(primary), Some(stopped)) = (err.duplicate_of(), access.stopped_at()) {
                aliases::learn(name, fields, stopped, primary, |field| container.contains(field));
            }
        }
        self.located(result)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.check_null(name)?;
        let value = self.value;
        let result = match value {
            Value::String(s) => {
                let variant: StrDeserializer<'_, DecodeError> = s.as_str().into_deserializer();
                visitor.visit_enum(variant)
            }
            Value::Number(_) => {
                let index: U32Deserializer<DecodeError> = coerce::to_u32(value).into_deserializer();
                visitor.visit_enum(index)
            }
            Value::Object(map) if map.len() == 1 => match map.iter().next() {
                Some((key, content)) => visitor.visit_enum(VariantDecoder {
                    key,
                    content: Decoder::at(content, self.path.child(key.as_str()), self.options),
                }),
                None => Err(DecodeError::type_mismatch(&self.path, "an enum variant", "object")),
            },
            other => Err(DecodeError::type_mismatch(
                &self.path,
                "a variant name, index, or single-key object",
                kind_name(other),
            )),
        };
        self.located(result)
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        let result = match self.value {
            Value::Number(n) if n.is_u64() => visitor.visit_u64(n.as_u64().unwrap_or_default()),
            other => visitor.visit_string(coerce::to_string(other)),
        };
        self.located(result)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_unit()
    }
}

/// Externally tagged enum content: `{"Variant": content}`.
struct VariantDecoder<'a> {
    key: &'a str,
    content: Decoder<'a>,
}

impl<'de, 'a> EnumAccess<'de> for VariantDecoder<'a> {
    type Error = DecodeError;
    type Variant = Decoder<'a>;

    fn variant_seed<S: DeserializeSeed<'de>>(
        self,
        seed: S,
    ) -> Result<(S::Value, Decoder<'a>), DecodeError> {
        let key: StrDeserializer<'_, DecodeError> = self.key.into_deserializer();
        let variant = seed.deserialize(key)?;
        Ok((variant, self.content))
    }
}

impl<'de, 'a> VariantAccess<'de> for Decoder<'a> {
    type Error = DecodeError;

    fn unit_variant(self) -> Result<(), DecodeError> {
        Ok(())
    }

    fn newtype_variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<S::Value, DecodeError> {
        let path = self.path.clone();
        seed.deserialize(self).map_err(|err| err.or_at(&path))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, DecodeError> {
        de::Deserializer::deserialize_seq(self, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        de::Deserializer::deserialize_struct(self, "variant", fields, visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_decode_nil() {
        let options = Options::default();
        assert!(Decoder::new(&json!(null), &options).decode_nil());
        assert!(!Decoder::new(&json!("null"), &options).decode_nil());
    }

    #[test]
    fn test_keyed_on_mismatched_shape() {
        let value = json!("text");
        let options = Options::default();
        let container = Decoder::new(&value, &options).keyed().unwrap();
        assert!(container.all_keys().is_empty());

        let strict = Options {
            non_optional_strategy: NonOptionalStrategy::Throw,
            ..Options::default()
        };
        let err = Decoder::new(&value, &strict).unkeyed().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_null_check_only_under_throw() {
        let value = json!(null);
        let options = Options::default();
        assert_eq!(Decoder::new(&value, &options).decode::<u32>().unwrap(), 0);

        let strict = Options {
            non_optional_strategy: NonOptionalStrategy::Throw,
            ..Options::default()
        };
        let err = Decoder::new(&value, &strict).decode::<u32>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueNotFound);
        assert_eq!(Decoder::new(&value, &strict).decode::<Option<u32>>().unwrap(), None);
    }

    #[test]
    fn test_any_keeps_natural_shape() {
        let value = json!({"a": [1, "2", null], "b": {"c": true}});
        let options = Options::default();
        let out: Value = Decoder::new(&value, &options).decode().unwrap();
        assert_eq!(out, value);
    }
}
