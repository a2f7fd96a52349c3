//! Source locations attached to predicates.
//!
//! Every predicate remembers where in the grammar source it came from so that
//! diagnostics can point back at the offending construct. Predicates built
//! programmatically carry [`Basis::missing()`].

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text size in bytes (UTF-8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TextSize(u32);

/// Half-open byte range in the grammar source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TextRange {
    start: TextSize,
    end: TextSize,
}

impl TextSize {
    #[must_use]
    pub const fn from(offset: u32) -> Self {
        Self(offset)
    }
}

impl From<TextSize> for usize {
    fn from(size: TextSize) -> Self {
        size.0 as Self
    }
}

impl TextRange {
    #[must_use]
    pub const fn new(start: TextSize, end: TextSize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn start(self) -> TextSize {
        self.start
    }

    #[must_use]
    pub const fn end(self) -> TextSize {
        self.end
    }

    /// Smallest range covering both `self` and `other`.
    #[must_use]
    pub fn cover(self, other: Self) -> Self {
        Self::new(
            TextSize(self.start.0.min(other.start.0)),
            TextSize(self.end.0.max(other.end.0)),
        )
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.0, self.end.0)
    }
}

/// Reference to the grammar source a predicate originated from.
///
/// A basis is either a concrete [`TextRange`] or the "missing" sentinel used
/// for predicates that were synthesized rather than parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Basis {
    range: Option<TextRange>,
}

impl Basis {
    /// The sentinel used when no source location is known.
    #[must_use]
    pub const fn missing() -> Self {
        Self { range: None }
    }

    #[must_use]
    pub const fn at(range: TextRange) -> Self {
        Self { range: Some(range) }
    }

    /// Convenience constructor from raw byte offsets.
    #[must_use]
    pub const fn span(start: u32, end: u32) -> Self {
        Self::at(TextRange::new(TextSize(start), TextSize(end)))
    }

    #[must_use]
    pub const fn range(self) -> Option<TextRange> {
        self.range
    }

    #[must_use]
    pub const fn is_missing(self) -> bool {
        self.range.is_none()
    }

    /// Combine two locations; a missing side yields the other one.
    #[must_use]
    pub fn cover(self, other: Self) -> Self {
        match (self.range, other.range) {
            (Some(a), Some(b)) => Self::at(a.cover(b)),
            (Some(_), None) => self,
            (None, _) => other,
        }
    }
}

impl From<TextRange> for Basis {
    fn from(range: TextRange) -> Self {
        Self::at(range)
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range {
            Some(range) => write!(f, "{range}"),
            None => f.write_str("<unknown location>"),
        }
    }
}
