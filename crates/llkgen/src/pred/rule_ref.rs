use crate::grammar::RuleId;
use crate::terminal::TerminalSet;
use compact_str::CompactString;
use smallvec::SmallVec;

/// Call of a named rule.
///
/// Only the rule's id is stored (plus its name, for printing), so rules can
/// refer to each other and to themselves without the trees nesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRef {
    pub rule: RuleId,
    pub name: CompactString,
    /// Call-site arguments, passed through verbatim to generated code.
    pub params: SmallVec<[CompactString; 2]>,
}

impl RuleRef {
    #[must_use]
    pub fn new(rule: RuleId, name: impl Into<CompactString>) -> Self {
        Self {
            rule,
            name: name.into(),
            params: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn with_params<I, P>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<CompactString>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }
}

/// Placeholder standing at the end of a rule; it accumulates the rule's
/// follow set and is never matched itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfRule<S> {
    pub rule: RuleId,
    follow: S,
}

impl<S: TerminalSet> EndOfRule<S> {
    #[must_use]
    pub fn new(rule: RuleId) -> Self {
        Self {
            rule,
            follow: S::empty(),
        }
    }

    #[must_use]
    pub const fn follow(&self) -> &S {
        &self.follow
    }

    /// Add `set` to the follow set; returns true if anything was new.
    pub fn add_follow(&mut self, set: &S) -> bool {
        let grown = self.follow.union(set);
        if grown == self.follow {
            return false;
        }
        self.follow = grown;
        true
    }

    pub fn clear_follow(&mut self) {
        self.follow = S::empty();
    }
}
