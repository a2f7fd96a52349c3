use crate::terminal::{RangeSet, TerminalSet};
use smallvec::SmallVec;
use std::fmt::{self, Write};

/// Set of characters stored as sorted, non-overlapping inclusive ranges.
///
/// Ranges are kept coalesced, so `['a'..='c']` and `['a'..='b'] ∪ ['c']` have
/// the same representation and compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CharSet {
    /// Character ranges for character class patterns (e.g., `[a-z]`, `[0-9]`).
    ranges: SmallVec<[(char, char); 4]>,
    eof: bool,
}

impl CharSet {
    /// Create a new character set with the given ranges
    #[must_use]
    pub fn new<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = (char, char)>,
    {
        let mut set = Self {
            ranges: ranges.into_iter().filter(|(lo, hi)| lo <= hi).collect(),
            eof: false,
        };
        set.normalize();
        set
    }

    /// Create a character set for digits [0-9]
    #[must_use]
    pub fn digits() -> Self {
        Self::new([('0', '9')])
    }

    /// Create a character set for whitespace characters
    #[must_use]
    pub fn whitespace() -> Self {
        Self::new([(' ', ' '), ('\t', '\t'), ('\r', '\r'), ('\n', '\n')])
    }

    /// Create a character set for ASCII letters
    #[must_use]
    pub fn letters() -> Self {
        Self::new([('a', 'z'), ('A', 'Z')])
    }

    /// Check if a character matches this character set
    #[must_use]
    pub fn matches(&self, c: char) -> bool {
        self.ranges.iter().any(|(start, end)| c >= *start && c <= *end)
    }

    pub fn ranges(&self) -> impl Iterator<Item = (char, char)> + '_ {
        self.ranges.iter().copied()
    }

    fn normalize(&mut self) {
        self.ranges.sort_unstable();
        let mut merged: SmallVec<[(char, char); 4]> = SmallVec::new();
        for (lo, hi) in self.ranges.drain(..) {
            match merged.last_mut() {
                Some((_, last_hi)) if u32::from(lo) <= u32::from(*last_hi).saturating_add(1) => {
                    if hi > *last_hi {
                        *last_hi = hi;
                    }
                }
                _ => merged.push((lo, hi)),
            }
        }
        self.ranges = merged;
    }
}

impl TerminalSet for CharSet {
    type Item = char;

    fn empty() -> Self {
        Self::default()
    }

    fn single(item: char) -> Self {
        Self::new([(item, item)])
    }

    fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        Self::new(items.into_iter().map(|c| (c, c)))
    }

    fn union(&self, other: &Self) -> Self {
        let mut set = Self {
            ranges: self.ranges.iter().chain(&other.ranges).copied().collect(),
            eof: self.eof || other.eof,
        };
        set.normalize();
        set
    }

    fn without_eof(&self) -> Self {
        Self {
            ranges: self.ranges.clone(),
            eof: false,
        }
    }

    fn with_eof(&self) -> Self {
        Self {
            ranges: self.ranges.clone(),
            eof: true,
        }
    }

    fn contains_eof(&self) -> bool {
        self.eof
    }

    fn contains(&self, item: &char) -> bool {
        self.matches(*item)
    }

    fn is_empty(&self) -> bool {
        self.ranges.is_empty() && !self.eof
    }
}

impl RangeSet for CharSet {
    fn range(lo: char, hi: char) -> Self {
        Self::new([(lo, hi)])
    }
}

fn escape_into(out: &mut String, c: char, in_brackets: bool) {
    match c {
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\\' => out.push_str("\\\\"),
        '\'' if !in_brackets => out.push_str("\\'"),
        ']' | '-' if in_brackets => {
            out.push('\\');
            out.push(c);
        }
        c if c.is_control() => {
            let _ = write!(out, "\\u{{{:x}}}", u32::from(c));
        }
        c => out.push(c),
    }
}

impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        match self.ranges.as_slice() {
            [] if self.eof => return f.write_str("EOF"),
            [] => return f.write_str("[]"),
            [(lo, hi)] if lo == hi => {
                out.push('\'');
                escape_into(&mut out, *lo, false);
                out.push('\'');
            }
            ranges => {
                out.push('[');
                for &(lo, hi) in ranges {
                    escape_into(&mut out, lo, true);
                    if hi != lo {
                        if u32::from(hi) > u32::from(lo) + 1 {
                            out.push('-');
                        }
                        escape_into(&mut out, hi, true);
                    }
                }
                out.push(']');
            }
        }
        if self.eof {
            out.push_str("|EOF");
        }
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_coalesces_adjacent_ranges() {
        let ab = CharSet::range('a', 'b');
        let c = CharSet::single('c');
        assert_eq!(ab.union(&c), CharSet::range('a', 'c'));
    }

    #[test]
    fn test_union_keeps_gaps() {
        let set = CharSet::single('a').union(&CharSet::single('x'));
        assert_eq!(set.ranges().count(), 2);
        assert!(set.contains(&'a'));
        assert!(!set.contains(&'b'));
        assert!(set.contains(&'x'));
    }

    #[test]
    fn test_reversed_range_is_empty() {
        assert!(CharSet::range('z', 'a').is_empty());
    }

    #[test]
    fn test_eof_membership() {
        let set = CharSet::digits().with_eof();
        assert!(set.contains_eof());
        assert!(!set.without_eof().contains_eof());
        assert!(!CharSet::empty().with_eof().is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(CharSet::single('a').to_string(), "'a'");
        assert_eq!(CharSet::single('\n').to_string(), "'\\n'");
        assert_eq!(CharSet::range('a', 'c').to_string(), "[a-c]");
        assert_eq!(CharSet::from_items(['a', 'b']).to_string(), "[ab]");
        assert_eq!(CharSet::from_items(['-', '0']).to_string(), "[\\-0]");
        assert_eq!(CharSet::digits().with_eof().to_string(), "[0-9]|EOF");
        assert_eq!(CharSet::empty().to_string(), "[]");
        assert_eq!(CharSet::empty().with_eof().to_string(), "EOF");
    }
}
