use crate::pred::{Pred, PredKind};
use crate::terminal::TerminalSet;

/// Leaf predicate matching one item of a terminal set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalPred<S> {
    set: S,
}

impl<S> TerminalPred<S> {
    #[must_use]
    pub const fn new(set: S) -> Self {
        Self { set }
    }

    #[must_use]
    pub const fn set(&self) -> &S {
        &self.set
    }

    pub fn set_mut(&mut self) -> &mut S {
        &mut self.set
    }
}

impl<S: TerminalSet> Pred<S> {
    /// True if `self` and `other` are both terminals whose sets can be
    /// unioned without losing user code: their actions must be identical.
    #[must_use]
    pub fn can_merge_terminal(&self, other: &Self) -> bool {
        self.is_terminal()
            && other.is_terminal()
            && self.pre_action == other.pre_action
            && self.post_action == other.post_action
            && self.result_saver == other.result_saver
    }

    /// Union two terminal leaves into a single terminal carrying the shared
    /// actions. Returns `None` if [`can_merge_terminal`](Self::can_merge_terminal)
    /// does not hold.
    #[must_use]
    pub fn merge_terminal(&self, other: &Self) -> Option<Self> {
        if !self.can_merge_terminal(other) {
            return None;
        }
        let (PredKind::Terminal(a), PredKind::Terminal(b)) = (&self.kind, &other.kind) else {
            return None;
        };
        let mut merged = Self::terminal(self.basis.cover(other.basis), a.set.union(&b.set));
        merged.pre_action.clone_from(&self.pre_action);
        merged.post_action.clone_from(&self.post_action);
        merged.result_saver.clone_from(&self.result_saver);
        Some(merged)
    }
}
