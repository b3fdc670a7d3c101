use std::fmt;

use thiserror::Error;

use crate::path::{DecodePath, ROOT};

/// Category of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A null node where the non-optional strategy is `Throw`.
    ValueNotFound,
    /// A strategy-specific leaf conversion failed (date, base64, URL).
    DataCorrupted,
    /// A declared field is absent and nothing can stand in for it.
    KeyNotFound,
    /// An unkeyed container was read past its last element.
    OutOfRange,
    /// The node shape cannot serve the requested shape.
    TypeMismatch,
    /// A message raised by a target type's own deserialization.
    Custom,
    /// The input text was not valid JSON.
    Syntax,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::ValueNotFound => "value not found",
            Self::DataCorrupted => "data corrupted",
            Self::KeyNotFound => "key not found",
            Self::OutOfRange => "out of range",
            Self::TypeMismatch => "type mismatch",
            Self::Custom => "invalid value",
            Self::Syntax => "syntax error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The single error a decode call can end with.
///
/// Carries the [`DecodePath`] of the node that failed. Errors raised through
/// [`serde::de::Error`] start without a location and pick up the path of the
/// innermost decoder they pass through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {}: {message}", located(.path))]
pub struct DecodeError {
    kind: ErrorKind,
    path: Option<DecodePath>,
    message: String,
    duplicate: Option<&'static str>,
}

fn located(path: &Option<DecodePath>) -> &DecodePath {
    path.as_ref().unwrap_or(&ROOT)
}

impl DecodeError {
    fn new(kind: ErrorKind, path: Option<DecodePath>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
            duplicate: None,
        }
    }

    pub fn value_not_found(path: &DecodePath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueNotFound, Some(path.clone()), message)
    }

    pub fn data_corrupted(path: &DecodePath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataCorrupted, Some(path.clone()), message)
    }

    pub fn out_of_range(path: &DecodePath, index: usize, count: usize) -> Self {
        Self::new(
            ErrorKind::OutOfRange,
            Some(path.clone()),
            format!("index {index} is past the end of an array of {count} elements"),
        )
    }

    pub fn type_mismatch(path: &DecodePath, expected: &str, found: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            Some(path.clone()),
            format!("expected {expected}, found {found}"),
        )
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Where the error happened; the root path when no location was recorded.
    pub fn path(&self) -> &DecodePath {
        located(&self.path)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The field a struct visitor saw twice.
    pub(crate) fn duplicate_of(&self) -> Option<&'static str> {
        self.duplicate
    }

    /// Record `path` as the location unless one is already set.
    pub(crate) fn or_at(mut self, path: &DecodePath) -> Self {
        if self.path.is_none() {
            self.path = Some(path.clone());
        }
        self
    }
}

impl serde::de::Error for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::new(ErrorKind::Custom, None, msg.to_string())
    }

    fn missing_field(field: &'static str) -> Self {
        Self::new(
            ErrorKind::KeyNotFound,
            None,
            format!("no value associated with key `{field}`"),
        )
    }

    fn duplicate_field(field: &'static str) -> Self {
        Self {
            duplicate: Some(field),
            ..Self::new(ErrorKind::Custom, None, format!("duplicate field `{field}`"))
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::Syntax, None, err.to_string())
    }
}
