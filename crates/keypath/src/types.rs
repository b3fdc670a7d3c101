//! Type definitions for keypaths.

/// One segment of a keypath, always an object key.
pub type PathStep = String;

/// A parsed keypath.
pub type Path = Vec<PathStep>;

/// Separator between keypath segments.
pub const SEPARATOR: char = '.';
