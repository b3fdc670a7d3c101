//! Unkeyed containers: cursor-based access into one array node.

use serde::de::{DeserializeOwned, DeserializeSeed, SeqAccess};
use serde_json::Value;
use tracing::debug;

use crate::decoder::Decoder;
use crate::error::DecodeError;
use crate::keyed::KeyedContainer;
use crate::options::Options;
use crate::path::DecodePath;

/// Sequential view of an array node.
///
/// Every successful read advances the cursor by one. Reading past the end is
/// an out-of-range error.
#[derive(Debug, Clone)]
pub struct UnkeyedContainer<'a> {
    items: &'a [Value],
    cursor: usize,
    path: DecodePath,
    options: &'a Options,
}

impl<'a> UnkeyedContainer<'a> {
    pub(crate) fn new(items: &'a [Value], path: DecodePath, options: &'a Options) -> Self {
        Self {
            items,
            cursor: 0,
            path,
            options,
        }
    }

    pub fn path(&self) -> &DecodePath {
        &self.path
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.items.len()
    }

    pub fn current_index(&self) -> usize {
        self.cursor
    }

    /// A decoder for the element under the cursor; advances the cursor.
    pub fn super_decoder(&mut self) -> Result<Decoder<'a>, DecodeError> {
        let index = self.cursor;
        let item = self.current()?;
        self.cursor += 1;
        Ok(Decoder::at(item, self.path.child(index), self.options))
    }

    pub fn decode<T: DeserializeOwned>(&mut self) -> Result<T, DecodeError> {
        self.super_decoder()?.decode()
    }

    /// Whether the current element is null. The cursor only moves past a null.
    pub fn decode_nil(&mut self) -> Result<bool, DecodeError> {
        let is_null = self.current()?.is_null();
        if is_null {
            self.cursor += 1;
        }
        Ok(is_null)
    }

    pub fn nested_keyed(&mut self) -> Result<KeyedContainer<'a>, DecodeError> {
        self.super_decoder()?.keyed()
    }

    pub fn nested_unkeyed(&mut self) -> Result<UnkeyedContainer<'a>, DecodeError> {
        self.super_decoder()?.unkeyed()
    }

    fn current(&self) -> Result<&'a Value, DecodeError> {
        match self.items.get(self.cursor) {
            Some(item) => Ok(item),
            None => {
                debug!(path = %self.path, index = self.cursor, "read past end of array");
                Err(DecodeError::out_of_range(&self.path, self.cursor, self.items.len()))
            }
        }
    }
}

impl<'de, 'a> SeqAccess<'de> for UnkeyedContainer<'a> {
    type Error = DecodeError;

    fn next_element_seed<S: DeserializeSeed<'de>>(
        &mut self,
        seed: S,
    ) -> Result<Option<S::Value>, DecodeError> {
        if self.is_at_end() {
            return Ok(None);
        }
        let decoder = self.super_decoder()?;
        let path = decoder.path().clone();
        seed.deserialize(decoder)
            .map(Some)
            .map_err(|err| err.or_at(&path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len().saturating_sub(self.cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_cursor_and_out_of_range() {
        let doc = json!([1, "2"]);
        let options = Options::default();
        let mut list = Decoder::new(&doc, &options).unkeyed().unwrap();
        assert_eq!(list.count(), 2);
        assert_eq!(list.decode::<i32>().unwrap(), 1);
        assert_eq!(list.current_index(), 1);
        assert_eq!(list.decode::<i32>().unwrap(), 2);
        assert!(list.is_at_end());

        let err = list.decode::<i32>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        assert!(err.path().is_root());
    }

    #[test]
    fn test_decode_nil_only_advances_over_null() {
        let doc = json!([null, 5]);
        let options = Options::default();
        let mut list = Decoder::new(&doc, &options).unkeyed().unwrap();
        assert!(list.decode_nil().unwrap());
        assert_eq!(list.current_index(), 1);
        assert!(!list.decode_nil().unwrap());
        assert_eq!(list.current_index(), 1);
        assert_eq!(list.decode::<u8>().unwrap(), 5);
        assert_eq!(list.decode_nil().unwrap_err().kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_element_paths() {
        let doc = json!([[0, {"k": 1}]]);
        let options = Options::default();
        let mut outer = Decoder::new(&doc, &options).unkeyed().unwrap();
        let mut inner = outer.nested_unkeyed().unwrap();
        assert_eq!(inner.path().to_string(), "Index 0");
        let _ = inner.super_decoder().unwrap();
        let keyed = inner.nested_keyed().unwrap();
        assert_eq!(keyed.path().to_string(), "Index 0.Index 1");
        assert_eq!(keyed.decode::<i32>("k").unwrap(), 1);
    }

    #[test]
    fn test_null_is_empty() {
        let doc = json!(null);
        let options = Options::default();
        let list = Decoder::new(&doc, &options).unkeyed().unwrap();
        assert_eq!(list.count(), 0);
        assert!(list.is_at_end());
    }
}
