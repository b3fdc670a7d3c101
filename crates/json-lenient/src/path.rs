//! Decode paths: where in the value tree a decoder currently sits.

use std::fmt;

/// One step of a [`DecodePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// An object field name, as requested by the target type.
    Key(String),
    /// An array position.
    Index(usize),
}

impl PathSegment {
    /// Textual form of the segment. Indices render as `"Index <n>"`.
    pub fn string_value(&self) -> String {
        match self {
            Self::Key(key) => key.clone(),
            Self::Index(index) => format!("Index {index}"),
        }
    }

    /// The array position, if this is an index segment.
    pub fn int_value(&self) -> Option<usize> {
        match self {
            Self::Key(_) => None,
            Self::Index(index) => Some(*index),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "Index {index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Ordered segments from the root of the tree to the current node.
///
/// Each descent builds a new path with [`DecodePath::child`]; a path is never
/// shortened in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DecodePath(Vec<PathSegment>);

/// The path of the root node.
pub(crate) static ROOT: DecodePath = DecodePath(Vec::new());

impl DecodePath {
    /// The empty path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A new path one segment deeper than `self`.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DecodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromIterator<PathSegment> for DecodePath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
