//! Dot-separated keypath utilities.
//!
//! A keypath names a value nested inside JSON objects by joining the object
//! keys with `.`, e.g. `"user.address.city"`. Unlike JSON Pointer there is no
//! escaping and no array indexing: every segment is an object key.
//!
//! # Example
//!
//! ```
//! use json_lenient_keypath::{parse_keypath, format_keypath, get};
//!
//! let path = parse_keypath("foo.bar");
//! assert_eq!(path, vec!["foo".to_string(), "bar".to_string()]);
//! assert_eq!(format_keypath(&path), "foo.bar");
//!
//! let doc = serde_json::json!({"foo": {"bar": 42}});
//! assert_eq!(get(&doc, &path), Some(&serde_json::json!(42)));
//! ```

use serde_json::{Map, Value};

pub mod types;
pub use types::{Path, PathStep, SEPARATOR};

/// Parse a keypath string into its segments.
///
/// Empty segments are dropped, so leading, trailing, and doubled separators
/// do not produce empty keys.
///
/// # Example
///
/// ```
/// use json_lenient_keypath::parse_keypath;
///
/// assert_eq!(parse_keypath(""), Vec::<String>::new());
/// assert_eq!(parse_keypath("a"), vec!["a"]);
/// assert_eq!(parse_keypath("a.b.c"), vec!["a", "b", "c"]);
/// assert_eq!(parse_keypath(".a..b."), vec!["a", "b"]);
/// ```
pub fn parse_keypath(keypath: &str) -> Path {
    keypath
        .split(SEPARATOR)
        .filter(|step| !step.is_empty())
        .map(str::to_string)
        .collect()
}

/// Format segments back into a keypath string.
///
/// # Example
///
/// ```
/// use json_lenient_keypath::format_keypath;
///
/// assert_eq!(format_keypath(&[]), "");
/// assert_eq!(format_keypath(&["a".to_string(), "b".to_string()]), "a.b");
/// ```
pub fn format_keypath(path: &[String]) -> String {
    let mut out = String::new();
    for (i, step) in path.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(step);
    }
    out
}

/// Check whether a key would be split into more than one segment.
///
/// # Example
///
/// ```
/// use json_lenient_keypath::is_keypath;
///
/// assert!(is_keypath("a.b"));
/// assert!(!is_keypath("a"));
/// assert!(!is_keypath("a."));
/// ```
pub fn is_keypath(key: &str) -> bool {
    key.split(SEPARATOR).filter(|step| !step.is_empty()).count() > 1
}

/// Get the parent of a keypath, `None` for the root.
pub fn parent(path: &[String]) -> Option<Path> {
    if path.is_empty() {
        return None;
    }
    Some(path[..path.len() - 1].to_vec())
}

/// Get a value by walking nested objects along `path`.
///
/// Returns `None` when a segment is missing or an intermediate value is not
/// an object.
///
/// # Example
///
/// ```
/// use json_lenient_keypath::get;
/// use serde_json::json;
///
/// let doc = json!({"a": {"b": [1, 2]}});
/// assert_eq!(get(&doc, &["a".to_string(), "b".to_string()]), Some(&json!([1, 2])));
/// assert_eq!(get(&doc, &["a".to_string(), "b".to_string(), "0".to_string()]), None);
/// ```
pub fn get<'a>(val: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = val;
    for step in path {
        match current {
            Value::Object(map) => current = map.get(step)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Resolve `key` through a top-level lookup function.
///
/// The key is first tried verbatim. If that misses and the key contains
/// separators, the head segment is looked up with `lookup` and the remaining
/// segments are walked through nested objects with [`get`].
pub fn resolve_with<'a, F>(key: &str, lookup: F) -> Option<&'a Value>
where
    F: Fn(&str) -> Option<&'a Value>,
{
    if let Some(found) = lookup(key) {
        return Some(found);
    }
    let path = parse_keypath(key);
    let (head, rest) = path.split_first()?;
    if rest.is_empty() {
        return None;
    }
    get(lookup(head)?, rest)
}

/// Resolve `key` against an object, verbatim first and then as a keypath.
///
/// # Example
///
/// ```
/// use json_lenient_keypath::resolve;
/// use serde_json::json;
///
/// let doc = json!({"a.b": 1, "a": {"b": 2, "c": 3}});
/// let map = doc.as_object().unwrap();
/// assert_eq!(resolve(map, "a.b"), Some(&json!(1)));
/// assert_eq!(resolve(map, "a.c"), Some(&json!(3)));
/// assert_eq!(resolve(map, "a.d"), None);
/// ```
pub fn resolve<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    resolve_with(key, |step| map.get(step))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_keypath() {
        assert_eq!(parse_keypath(""), Vec::<String>::new());
        assert_eq!(parse_keypath("."), Vec::<String>::new());
        assert_eq!(parse_keypath("foo"), vec!["foo"]);
        assert_eq!(parse_keypath("foo.bar"), vec!["foo", "bar"]);
        assert_eq!(parse_keypath("foo..bar"), vec!["foo", "bar"]);
    }

    #[test]
    fn test_format_keypath() {
        assert_eq!(format_keypath(&[]), "");
        assert_eq!(format_keypath(&["foo".to_string()]), "foo");
        assert_eq!(
            format_keypath(&["foo".to_string(), "bar".to_string()]),
            "foo.bar"
        );
    }

    #[test]
    fn test_parent() {
        let path = vec!["foo".to_string(), "bar".to_string()];
        assert_eq!(parent(&path), Some(vec!["foo".to_string()]));
        assert_eq!(parent(&["foo".to_string()]), Some(Vec::new()));
        assert_eq!(parent(&[]), None);
    }

    #[test]
    fn test_get_root() {
        assert_eq!(get(&json!(123), &[]), Some(&json!(123)));
    }

    #[test]
    fn test_get_nested() {
        let doc = json!({"foo": {"bar": {"baz": "qux"}}});
        assert_eq!(
            get(&doc, &parse_keypath("foo.bar.baz")),
            Some(&json!("qux"))
        );
        assert_eq!(get(&doc, &parse_keypath("foo.missing.baz")), None);
    }

    #[test]
    fn test_get_does_not_index_arrays() {
        let doc = json!({"foo": [1, 2, 3]});
        assert_eq!(get(&doc, &parse_keypath("foo.0")), None);
    }

    #[test]
    fn test_get_explicit_null() {
        let doc = json!({"foo": null});
        assert_eq!(get(&doc, &parse_keypath("foo")), Some(&Value::Null));
    }

    #[test]
    fn test_resolve_prefers_verbatim_key() {
        let doc = json!({"a.b": "verbatim", "a": {"b": "nested"}});
        let map = doc.as_object().unwrap();
        assert_eq!(resolve(map, "a.b"), Some(&json!("verbatim")));
    }

    #[test]
    fn test_resolve_single_segment_miss() {
        let doc = json!({"a": 1});
        let map = doc.as_object().unwrap();
        assert_eq!(resolve(map, "b"), None);
        assert_eq!(resolve(map, "b."), None);
    }
}
