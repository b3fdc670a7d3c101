//! Lenient, schema-driven decoding of JSON value trees.
//!
//! Target types describe themselves through serde's `Deserialize`; the
//! decoder fills in whatever the input can reasonably provide. Numbers may
//! arrive as strings and absent or null fields become zero values; only
//! unconvertible leaves fail.
//!
//! # Example
//!
//! ```
//! use json_lenient::from_value;
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Debug, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Book {
//!     title: String,
//!     price: f64,
//!     is_new: bool,
//!     author: String,
//!     tags: Vec<i32>,
//!     #[serde(rename = "info.isbn")]
//!     isbn: String,
//! }
//!
//! let book: Book = from_value(&json!({
//!     "title": "Dune",
//!     "price": "9.5",
//!     "isNew": 1,
//!     "author": null,
//!     "tags": [1, "2", true],
//!     "info": {"isbn": 9780441013593u64},
//! }))
//! .unwrap();
//!
//! assert_eq!(book.price, 9.5);
//! assert!(book.is_new);
//! assert_eq!(book.author, "");
//! assert_eq!(book.tags, [1, 2, 1]);
//! assert_eq!(book.isbn, "9780441013593");
//! ```
//!
//! Configuration lives in [`Options`], or on a [`LenientDecoder`] through its
//! builder methods.

mod aliases;
pub mod coerce;
mod decoder;
mod default_case;
mod engine;
mod error;
mod keyed;
mod keys;
pub mod leaf;
mod options;
mod path;
mod unkeyed;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use decoder::Decoder;
pub use default_case::{decode_default_case, DefaultCase};
pub use engine::LenientDecoder;
pub use error::{DecodeError, ErrorKind};
pub use keyed::KeyedContainer;
pub use keys::convert_from_snake_case;
pub use leaf::{Data, Date, Decimal, LeafKind, Url};
pub use options::{
    DataFn, DataStrategy, DateFn, DateFormat, DateStrategy, KeyFn, KeyStrategy,
    NonConformingFloatStrategy, NonOptionalStrategy, Options, UserInfo,
};
pub use path::{DecodePath, PathSegment};
pub use unkeyed::UnkeyedContainer;

/// Decode `T` from a value tree with default options.
pub fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, DecodeError> {
    LenientDecoder::new().decode_value(value)
}

/// Decode `T` from JSON text with default options.
pub fn from_str<T: DeserializeOwned>(text: &str) -> Result<T, DecodeError> {
    LenientDecoder::new().decode_str(text)
}

/// Decode `T` from JSON bytes with default options.
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    LenientDecoder::new().decode_slice(bytes)
}

#[doc(hidden)]
pub mod __private {
    pub use serde;
}
