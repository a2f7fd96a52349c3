use crate::pred::Pred;
use compact_str::CompactString;
use once_cell::sync::OnceCell;

/// Placeholders that stand for the current lookahead inside a condition.
const LOOKAHEAD_PLACEHOLDERS: [&str; 2] = ["$LI", "$LA"];

/// The condition tested by an [`AndPred`].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition<S> {
    /// User code evaluated at parse time (a semantic predicate).
    Code(CompactString),
    /// A grammar fragment that must (or must not) match at this point
    /// (a syntactic predicate).
    Pred(Box<Pred<S>>),
}

/// Zero-width assertion: succeeds or fails without consuming input.
#[derive(Debug, Clone)]
pub struct AndPred<S> {
    condition: Condition<S>,
    not: bool,
    local: bool,
    uses_lookahead: OnceCell<bool>,
}

impl<S> AndPred<S> {
    #[must_use]
    pub fn new(condition: Condition<S>, not: bool) -> Self {
        Self {
            condition,
            not,
            local: false,
            uses_lookahead: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn code(code: impl Into<CompactString>, not: bool) -> Self {
        Self::new(Condition::Code(code.into()), not)
    }

    #[must_use]
    pub fn pred(pred: Pred<S>, not: bool) -> Self {
        Self::new(Condition::Pred(Box::new(pred)), not)
    }

    /// Mark the assertion as local: later passes must not hoist it into the
    /// prediction logic of calling rules.
    #[must_use]
    pub const fn local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }

    #[must_use]
    pub const fn condition(&self) -> &Condition<S> {
        &self.condition
    }

    pub(crate) fn condition_mut(&mut self) -> &mut Condition<S> {
        self.uses_lookahead = OnceCell::new();
        &mut self.condition
    }

    #[must_use]
    pub const fn is_not(&self) -> bool {
        self.not
    }

    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.local
    }

    #[must_use]
    pub const fn is_syntactic(&self) -> bool {
        matches!(self.condition, Condition::Pred(_))
    }

    /// Whether the condition inspects the current lookahead.
    ///
    /// Code conditions are scanned (once) for the `$LI`/`$LA` placeholders;
    /// a syntactic predicate always does.
    pub fn uses_lookahead(&self) -> bool {
        *self.uses_lookahead.get_or_init(|| match &self.condition {
            Condition::Code(code) => mentions_placeholder(code),
            Condition::Pred(_) => true,
        })
    }
}

fn mentions_placeholder(code: &str) -> bool {
    LOOKAHEAD_PLACEHOLDERS.iter().any(|placeholder| {
        code.match_indices(placeholder).any(|(at, _)| {
            code[at + placeholder.len()..]
                .chars()
                .next()
                .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
        })
    })
}

impl<S: PartialEq> PartialEq for AndPred<S> {
    fn eq(&self, other: &Self) -> bool {
        self.condition == other.condition && self.not == other.not && self.local == other.local
    }
}
