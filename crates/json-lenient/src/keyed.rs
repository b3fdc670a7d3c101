//! Keyed containers: field access into one object node.

use serde::de::value::StrDeserializer;
use serde::de::{DeserializeOwned, DeserializeSeed, Error as _, IntoDeserializer, MapAccess};
use serde_json::Value;

use crate::decoder::{Decoder, NULL};
use crate::error::DecodeError;
use crate::keys::KeyTable;
use crate::options::Options;
use crate::path::DecodePath;
use crate::unkeyed::UnkeyedContainer;

/// Field view of an object node, after key transformation.
///
/// Lookups try the transformed key verbatim first and then as a dotted
/// keypath. An absent key decodes exactly like a present `null`.
#[derive(Debug, Clone)]
pub struct KeyedContainer<'a> {
    table: KeyTable<'a>,
    path: DecodePath,
    options: &'a Options,
}

impl<'a> KeyedContainer<'a> {
    pub(crate) fn new(table: KeyTable<'a>, path: DecodePath, options: &'a Options) -> Self {
        Self {
            table,
            path,
            options,
        }
    }

    pub fn path(&self) -> &DecodePath {
        &self.path
    }

    /// Every transformed key of the object, in document order.
    pub fn all_keys(&self) -> Vec<String> {
        self.table.keys()
    }

    /// The transformed keys that are also in `expected`.
    pub fn declared_keys(&self, expected: &[&str]) -> Vec<String> {
        self.table
            .keys()
            .into_iter()
            .filter(|key| expected.contains(&key.as_str()))
            .collect()
    }

    /// Whether `key` resolves, verbatim or as a keypath.
    pub fn contains(&self, key: &str) -> bool {
        self.table.resolve(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Whether the node under `key` is null or absent.
    pub fn decode_nil(&self, key: &str) -> bool {
        self.table.resolve(key).map_or(true, Value::is_null)
    }

    pub fn decode<T: DeserializeOwned>(&self, key: &str) -> Result<T, DecodeError> {
        self.super_decoder(key).decode()
    }

    /// `None` when the key is absent or null, otherwise the decoded value.
    pub fn decode_if_present<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DecodeError> {
        match self.table.resolve(key) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.decode(key).map(Some),
        }
    }

    /// A decoder positioned at `key`, one segment deeper than this container.
    pub fn super_decoder(&self, key: &str) -> Decoder<'a> {
        let value = self.table.resolve(key).unwrap_or(&NULL);
        Decoder::at(value, self.path.child(key), self.options)
    }

    pub fn nested_keyed(&self, key: &str) -> Result<KeyedContainer<'a>, DecodeError> {
        self.super_decoder(key).keyed()
    }

    pub fn nested_unkeyed(&self, key: &str) -> Result<UnkeyedContainer<'a>, DecodeError> {
        self.super_decoder(key).unkeyed()
    }
}

/// Feeds a fixed list of keys and their values to a serde visitor.
pub(crate) struct FieldAccess<'c, 'a> {
    container: &'c KeyedContainer<'a>,
    keys: std::vec::IntoIter<String>,
    current: Option<String>,
    pending: bool,
}

impl<'c, 'a> FieldAccess<'c, 'a> {
    pub(crate) fn new(container: &'c KeyedContainer<'a>, keys: Vec<String>) -> Self {
        Self {
            container,
            keys: keys.into_iter(),
            current: None,
            pending: false,
        }
    }

    /// The last key, if the visitor never asked for its value.
    pub(crate) fn stopped_at(&self) -> Option<&str> {
        if self.pending {
            self.current.as_deref()
        } else {
            None
        }
    }
}

impl<'de, 'c, 'a> MapAccess<'de> for FieldAccess<'c, 'a> {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DecodeError> {
        let Some(key) = self.keys.next() else {
            return Ok(None);
        };
        let field: StrDeserializer<'_, DecodeError> = key.as_str().into_deserializer();
        let out = seed.deserialize(field)?;
        self.current = Some(key);
        self.pending = true;
        Ok(Some(out))
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, DecodeError> {
        let key = match &self.current {
            Some(key) if self.pending => key,
            _ => return Err(DecodeError::custom("value requested before its key")),
        };
        self.pending = false;
        let decoder = self.container.super_decoder(key);
        let path = decoder.path().clone();
        seed.deserialize(decoder).map_err(|err| err.or_at(&path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::options::KeyStrategy;
    use serde_json::json;

    #[test]
    fn test_absent_key_reads_as_null() {
        let doc = json!({"a": 1});
        let options = Options::default();
        let container = Decoder::new(&doc, &options).keyed().unwrap();
        assert!(container.decode_nil("missing"));
        assert_eq!(container.decode::<i32>("missing").unwrap(), 0);
        assert_eq!(container.decode_if_present::<i32>("missing").unwrap(), None);
        assert_eq!(container.decode_if_present::<i32>("a").unwrap(), Some(1));
    }

    #[test]
    fn test_nested_containers_extend_path() {
        let doc = json!({"outer": {"list": [10, 20]}});
        let options = Options::default();
        let root = Decoder::new(&doc, &options).keyed().unwrap();
        let outer = root.nested_keyed("outer").unwrap();
        assert_eq!(outer.path().to_string(), "outer");
        let mut list = outer.nested_unkeyed("list").unwrap();
        assert_eq!(list.path().to_string(), "outer.list");
        assert_eq!(list.decode::<i32>().unwrap(), 10);
    }

    #[test]
    fn test_keys_after_transformation() {
        let doc = json!({"first_name": "a", "age": 3, "zip_code": 1});
        let options = Options {
            key_strategy: KeyStrategy::ConvertFromSnakeCase,
            ..Options::default()
        };
        let container = Decoder::new(&doc, &options).keyed().unwrap();
        assert_eq!(container.all_keys(), vec!["firstName", "age", "zipCode"]);
        assert_eq!(container.declared_keys(&["age", "firstName"]), vec!["firstName", "age"]);
        assert!(container.contains("zipCode"));
        assert!(!container.contains("zip_code"));
    }

    #[test]
    fn test_keypath_lookup() {
        let doc = json!({"a": {"b": {"c": "deep"}}});
        let options = Options::default();
        let container = Decoder::new(&doc, &options).keyed().unwrap();
        assert_eq!(container.decode::<String>("a.b.c").unwrap(), "deep");
        assert_eq!(container.super_decoder("a.b.c").path().to_string(), "a.b.c");
        // A string node gives an empty keyed view unless strict.
        assert!(container.nested_keyed("a.b.c").unwrap().is_empty());
    }

    #[test]
    fn test_strict_nested_shape_mismatch() {
        let doc = json!({"a": "text"});
        let options = Options {
            non_optional_strategy: crate::options::NonOptionalStrategy::Throw,
            ..Options::default()
        };
        let container = Decoder::new(&doc, &options).keyed().unwrap();
        let err = container.nested_unkeyed("a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(err.path().to_string(), "a");
    }
}
