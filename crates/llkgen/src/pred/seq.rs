use crate::basis::Basis;
use crate::pred::{Pred, PredKind, merge_actions};

/// Ordered list of predicates matched one after another.
#[derive(Debug, Clone, PartialEq)]
pub struct Seq<S> {
    items: Vec<Pred<S>>,
}

impl<S> Default for Seq<S> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<S> Seq<S> {
    #[must_use]
    pub const fn new(items: Vec<Pred<S>>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[Pred<S>] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> impl Iterator<Item = &mut Pred<S>> {
        self.items.iter_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn into_items(self) -> Vec<Pred<S>> {
        self.items
    }

    /// `a` then `b`.
    ///
    /// Sequence operands are spliced rather than nested. A spliced sequence's
    /// own pre-action moves onto its first element and its post-action onto
    /// its last, so no user code is lost. A result with a single element is
    /// that element.
    #[must_use]
    pub fn join(basis: Basis, a: Pred<S>, b: Pred<S>) -> Pred<S> {
        Self::join_all(basis, [a, b])
    }

    /// Sequence of any number of predicates, flattened like [`Seq::join`].
    #[must_use]
    pub fn join_all<I>(basis: Basis, preds: I) -> Pred<S>
    where
        I: IntoIterator<Item = Pred<S>>,
    {
        let mut items = Vec::new();
        for pred in preds {
            splice(&mut items, pred);
        }
        if items.len() == 1
            && let Some(only) = items.pop()
        {
            return only;
        }
        Pred::new(basis, PredKind::Seq(Self { items }))
    }
}

fn splice<S>(items: &mut Vec<Pred<S>>, pred: Pred<S>) {
    let Pred {
        basis,
        pre_action,
        post_action,
        result_saver,
        analysis,
        kind,
    } = pred;
    match kind {
        PredKind::Seq(seq) if result_saver.is_none() => {
            let mut inner = seq.items;
            if inner.is_empty() {
                if pre_action.is_none() && post_action.is_none() {
                    return;
                }
                items.push(Pred {
                    basis,
                    pre_action,
                    post_action,
                    result_saver,
                    analysis,
                    kind: PredKind::Seq(Seq::default()),
                });
                return;
            }
            if let Some(first) = inner.first_mut() {
                first.pre_action = merge_actions(pre_action, first.pre_action.take());
            }
            if let Some(last) = inner.last_mut() {
                last.post_action = merge_actions(last.post_action.take(), post_action);
            }
            items.append(&mut inner);
        }
        kind => items.push(Pred {
            basis,
            pre_action,
            post_action,
            result_saver,
            analysis,
            kind,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::{CharSet, TerminalSet};

    fn ch(c: char) -> Pred<CharSet> {
        Pred::terminal(Basis::missing(), CharSet::single(c))
    }

    fn items(p: &Pred<CharSet>) -> &[Pred<CharSet>] {
        match &p.kind {
            PredKind::Seq(seq) => seq.items(),
            other => panic!("expected sequence, got {other:?}"),
        }
    }

    #[test]
    fn test_join_flattens_both_sides() {
        let left = Seq::join(Basis::missing(), ch('a'), ch('b'));
        let right = Seq::join(Basis::missing(), ch('c'), ch('d'));
        let joined = Seq::join(Basis::missing(), left, right);
        assert_eq!(items(&joined).len(), 4);
    }

    #[test]
    fn test_join_moves_sequence_actions_to_ends() {
        let inner = Seq::join(Basis::missing(), ch('a'), ch('b').with_post_action("b();"))
            .with_pre_action("start();")
            .with_post_action("end();");
        let joined = Seq::join(Basis::missing(), inner, ch('c'));
        let list = items(&joined);
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].pre_action.as_deref(), Some("start();"));
        assert_eq!(list[1].post_action.as_deref(), Some("b(); end();"));
        assert!(joined.pre_action.is_none());
    }

    #[test]
    fn test_join_with_epsilon_yields_other_operand() {
        let joined = Seq::join(Basis::missing(), Pred::epsilon(Basis::missing()), ch('a'));
        assert!(joined.is_terminal());
    }

    #[test]
    fn test_sequence_with_result_saver_is_not_spliced() {
        let saved = Seq::join(Basis::missing(), ch('a'), ch('b'))
            .with_result_saver(crate::pred::ResultSaver::new(|c| format!("r = {c}")));
        let joined = Seq::join(Basis::missing(), saved, ch('c'));
        assert_eq!(items(&joined).len(), 2);
    }
}
