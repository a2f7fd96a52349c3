//! # Terminal Sets
//!
//! The predicate tree treats terminal sets opaquely: it only needs to build
//! them, union them when two terminal alternatives collapse into one, and
//! print them. [`TerminalSet`] captures that contract.
//!
//! Two implementations are provided:
//!
//! - [`CharSet`]: inclusive character ranges, for token (lexer) rules
//! - [`KindSet`]: a set of token kinds, for parser rules
//!
//! Both can additionally contain the end-of-file marker.

pub mod charset;
pub mod kind_set;

pub use charset::CharSet;
pub use kind_set::KindSet;

use std::fmt::{Debug, Display};

/// A set of matchable input items (characters or tokens).
pub trait TerminalSet: Clone + Debug + Display + PartialEq {
    /// A single member of the set.
    type Item;

    /// The set containing nothing (not even EOF).
    fn empty() -> Self;

    fn single(item: Self::Item) -> Self;

    fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Self::Item>;

    #[must_use]
    fn union(&self, other: &Self) -> Self;

    /// This set with the end-of-file marker removed.
    #[must_use]
    fn without_eof(&self) -> Self;

    /// This set with the end-of-file marker added.
    #[must_use]
    fn with_eof(&self) -> Self;

    fn contains_eof(&self) -> bool;

    fn contains(&self, item: &Self::Item) -> bool;

    fn is_empty(&self) -> bool;
}

/// Terminal sets whose items are ordered and can be given as a range.
pub trait RangeSet: TerminalSet {
    /// All items from `lo` to `hi` inclusive; empty if `lo > hi`.
    fn range(lo: Self::Item, hi: Self::Item) -> Self;
}
