use crate::terminal::TerminalSet;
use hashbrown::HashSet;
use std::fmt;
use std::hash::Hash;

/// Set of token kinds, used as the terminal set of parser rules.
#[derive(Clone)]
pub struct KindSet<K> {
    kinds: HashSet<K, ahash::RandomState>,
    eof: bool,
}

impl<K> KindSet<K>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.kinds.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Members in a stable order (sorted by their `Debug` text).
    fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.kinds.iter().map(|k| format!("{k:?}")).collect();
        names.sort_unstable();
        names
    }
}

impl<K: Eq + Hash> PartialEq for KindSet<K> {
    fn eq(&self, other: &Self) -> bool {
        self.eof == other.eof && self.kinds == other.kinds
    }
}

impl<K: Eq + Hash> Eq for KindSet<K> {}

impl<K> fmt::Debug for KindSet<K>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindSet")
            .field("kinds", &self.sorted_names())
            .field("eof", &self.eof)
            .finish()
    }
}

impl<K> fmt::Display for KindSet<K>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.sorted_names();
        if self.eof {
            names.push("EOF".to_string());
        }
        match names.as_slice() {
            [] => f.write_str("()"),
            [only] => f.write_str(only),
            _ => write!(f, "({})", names.join("|")),
        }
    }
}

impl<K> TerminalSet for KindSet<K>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    type Item = K;

    fn empty() -> Self {
        Self {
            kinds: HashSet::with_hasher(ahash::RandomState::new()),
            eof: false,
        }
    }

    fn single(item: K) -> Self {
        Self::from_items([item])
    }

    fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        let mut set = Self::empty();
        set.kinds.extend(items);
        set
    }

    fn union(&self, other: &Self) -> Self {
        let mut set = self.clone();
        set.kinds.extend(other.kinds.iter().cloned());
        set.eof |= other.eof;
        set
    }

    fn without_eof(&self) -> Self {
        let mut set = self.clone();
        set.eof = false;
        set
    }

    fn with_eof(&self) -> Self {
        let mut set = self.clone();
        set.eof = true;
        set
    }

    fn contains_eof(&self) -> bool {
        self.eof
    }

    fn contains(&self, item: &K) -> bool {
        self.kinds.contains(item)
    }

    fn is_empty(&self) -> bool {
        self.kinds.is_empty() && !self.eof
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Ident,
        Number,
        Plus,
    }

    #[test]
    fn test_union_and_equality() {
        let a = KindSet::single(Kind::Ident);
        let b = KindSet::from_items([Kind::Number, Kind::Ident]);
        let u = a.union(&b);
        assert_eq!(u.len(), 2);
        assert_eq!(u, KindSet::from_items([Kind::Number, Kind::Ident]));
        assert!(!u.contains(&Kind::Plus));
    }

    #[test]
    fn test_display_is_sorted() {
        let set = KindSet::from_items([Kind::Plus, Kind::Ident]);
        assert_eq!(set.to_string(), "(Ident|Plus)");
        assert_eq!(KindSet::single(Kind::Number).to_string(), "Number");
        assert_eq!(KindSet::single(Kind::Number).with_eof().to_string(), "(Number|EOF)");
        assert_eq!(KindSet::<Kind>::empty().to_string(), "()");
    }

    #[test]
    fn test_without_eof() {
        let set = KindSet::single(Kind::Plus).with_eof();
        assert!(set.contains_eof());
        assert_eq!(set.without_eof(), KindSet::single(Kind::Plus));
    }
}
