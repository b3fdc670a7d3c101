//! Key transformation: the lookup table a keyed container reads fields from.

use indexmap::IndexMap;
use json_lenient_keypath::resolve_with;
use serde_json::{Map, Value};
use tracing::trace;

use crate::options::KeyStrategy;
use crate::path::{DecodePath, PathSegment};

/// Convert a `snake_case` key to `camelCase`.
///
/// Leading and trailing underscores are kept as they are. A key without
/// interior underscores is returned unchanged, since it may already be camel
/// cased. Otherwise the first word is lower-cased and every following word is
/// capitalized.
///
/// # Example
///
/// ```
/// use json_lenient::convert_from_snake_case;
///
/// assert_eq!(convert_from_snake_case("value_ab"), "valueAb");
/// assert_eq!(convert_from_snake_case("_private_key_"), "_privateKey_");
/// assert_eq!(convert_from_snake_case("alreadyCamel"), "alreadyCamel");
/// assert_eq!(convert_from_snake_case("__"), "__");
/// ```
pub fn convert_from_snake_case(key: &str) -> String {
    let Some(start) = key.find(|c: char| c != '_') else {
        return key.to_string();
    };
    let end = key.trim_end_matches('_').len();
    let (leading, core, trailing) = (&key[..start], &key[start..end], &key[end..]);

    let words: Vec<&str> = core.split('_').filter(|word| !word.is_empty()).collect();
    if words.len() == 1 {
        return key.to_string();
    }

    let mut out = String::with_capacity(key.len());
    out.push_str(leading);
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out.push_str(trailing);
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Field lookup table of one object node.
#[derive(Debug, Clone)]
pub(crate) enum KeyTable<'a> {
    /// The object's own keys.
    Borrowed(&'a Map<String, Value>),
    /// Rewritten keys, in document order; the first of colliding keys wins.
    Transformed(IndexMap<String, &'a Value>),
}

impl<'a> KeyTable<'a> {
    pub(crate) fn empty() -> Self {
        Self::Transformed(IndexMap::new())
    }

    /// Build the table for `map` under `strategy`.
    pub(crate) fn build(map: &'a Map<String, Value>, strategy: &KeyStrategy, path: &DecodePath) -> Self {
        let rewrite: Box<dyn Fn(&str) -> String + '_> = match strategy {
            KeyStrategy::UseDefaultKeys => return Self::Borrowed(map),
            KeyStrategy::ConvertFromSnakeCase => Box::new(convert_from_snake_case),
            KeyStrategy::Custom(convert) => {
                Box::new(move |key: &str| convert(&path.child(PathSegment::Key(key.to_string()))))
            }
        };

        let mut table = IndexMap::with_capacity(map.len());
        for (key, value) in map {
            table.entry(rewrite(key)).or_insert(value);
        }
        trace!(
            path = %path,
            strategy = strategy.name(),
            keys = table.len(),
            "transformed object keys"
        );
        Self::Transformed(table)
    }

    pub(crate) fn get(&self, key: &str) -> Option<&'a Value> {
        match self {
            Self::Borrowed(map) => map.get(key),
            Self::Transformed(table) => table.get(key).copied(),
        }
    }

    /// Verbatim lookup, then keypath resolution through nested objects.
    pub(crate) fn resolve(&self, key: &str) -> Option<&'a Value> {
        if let Some(found) = self.get(key) {
            return Some(found);
        }
        let found = resolve_with(key, |step| self.get(step));
        if found.is_some() {
            trace!(key, "resolved field as keypath");
        }
        found
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        match self {
            Self::Borrowed(map) => map.keys().cloned().collect(),
            Self::Transformed(table) => table.keys().cloned().collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Borrowed(map) => map.len(),
            Self::Transformed(table) => table.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snake_case_matrix() {
        let cases = [
            ("", ""),
            ("_", "_"),
            ("value", "value"),
            ("value_ab", "valueAb"),
            ("VALUE_AB", "valueAb"),
            ("my_URL_value", "myUrlValue"),
            ("a__b", "aB"),
            ("__leading", "__leading"),
            ("__leading_word", "__leadingWord"),
            ("trailing_word__", "trailingWord__"),
            ("_both_sides_", "_bothSides_"),
        ];
        for (input, expected) in cases {
            assert_eq!(convert_from_snake_case(input), expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_build_first_collision_wins() {
        let doc = json!({"user_id": 1, "userId": 2});
        let table = KeyTable::build(
            doc.as_object().unwrap(),
            &KeyStrategy::ConvertFromSnakeCase,
            &DecodePath::root(),
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("userId"), Some(&json!(1)));
    }

    #[test]
    fn test_custom_strategy_sees_full_path() {
        let doc = json!({"Name": "x"});
        let strategy = KeyStrategy::custom(|path: &DecodePath| {
            assert_eq!(path.len(), 2);
            path.last().map(|s| s.string_value().to_lowercase()).unwrap_or_default()
        });
        let table = KeyTable::build(
            doc.as_object().unwrap(),
            &strategy,
            &DecodePath::root().child("user"),
        );
        assert_eq!(table.keys(), vec!["name".to_string()]);
    }

    #[test]
    fn test_resolve_keypath_through_table() {
        let doc = json!({"outer_obj": {"inner_key": 5}});
        let table = KeyTable::build(
            doc.as_object().unwrap(),
            &KeyStrategy::ConvertFromSnakeCase,
            &DecodePath::root(),
        );
        // Only the top level is rewritten.
        assert_eq!(table.resolve("outerObj.inner_key"), Some(&json!(5)));
        assert_eq!(table.resolve("outerObj.innerKey"), None);
    }
}
