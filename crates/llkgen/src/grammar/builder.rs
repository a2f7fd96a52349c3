use crate::basis::Basis;
use crate::config::GrammarConfig;
use crate::diagnostics::Diagnostics;
use crate::error::GrammarError;
use crate::grammar::{Grammar, RuleId};
use crate::pred::{
    AndPred, Alternation, BranchMode, Gate, LoopMode, Pred, PredKind, RuleRef, Seq,
};
use crate::terminal::{RangeSet, TerminalSet};
use compact_str::CompactString;

/// An alternation operand together with the role it plays in the join.
///
/// Plain predicates convert into ordinary arms; use
/// [`GrammarBuilder::default_arm`] and [`GrammarBuilder::error_branch`] for
/// the special roles.
#[derive(Debug, Clone, PartialEq)]
pub struct Arm<S> {
    pub pred: Pred<S>,
    pub mode: BranchMode,
}

impl<S> From<Pred<S>> for Arm<S> {
    fn from(pred: Pred<S>) -> Self {
        Self {
            pred,
            mode: BranchMode::None,
        }
    }
}

/// Operator layer for building rules.
///
/// The builder owns the [`Grammar`] under construction and the
/// [`Diagnostics`] that recoverable problems are reported to. Each operator
/// consumes its operands and returns the combined predicate. Nodes are
/// stamped with the basis set by [`at`](Self::at), or, when none is set,
/// with a basis covering their operands.
///
/// # Example
///
/// ```rust
/// use llkgen::grammar::GrammarBuilder;
/// use llkgen::terminal::CharSet;
///
/// let mut b = GrammarBuilder::<CharSet>::new();
/// let digit = b.range('0', '9');
/// let number = b.plus(digit).unwrap();
/// b.rule("Number", number).unwrap();
///
/// let (grammar, diagnostics) = b.finish().unwrap();
/// assert_eq!(grammar.len(), 1);
/// assert!(diagnostics.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct GrammarBuilder<S> {
    grammar: Grammar<S>,
    diagnostics: Diagnostics,
    basis: Basis,
}

impl<S: TerminalSet> Default for GrammarBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TerminalSet> GrammarBuilder<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GrammarConfig::default())
    }

    #[must_use]
    pub fn with_config(config: GrammarConfig) -> Self {
        Self {
            diagnostics: Diagnostics::with_config(&config),
            grammar: Grammar::with_config(config),
            basis: Basis::missing(),
        }
    }

    /// Set the source location stamped onto subsequently built nodes.
    pub fn at(&mut self, basis: Basis) -> &mut Self {
        self.basis = basis;
        self
    }

    #[must_use]
    pub const fn basis(&self) -> Basis {
        self.basis
    }

    fn basis_for(&self, operands: &[&Pred<S>]) -> Basis {
        if !self.basis.is_missing() {
            return self.basis;
        }
        operands
            .iter()
            .fold(Basis::missing(), |acc, p| acc.cover(p.basis))
    }

    pub fn terminal(&self, set: S) -> Pred<S> {
        Pred::terminal(self.basis, set)
    }

    pub fn single(&self, item: S::Item) -> Pred<S> {
        self.terminal(S::single(item))
    }

    pub fn set<I>(&self, items: I) -> Pred<S>
    where
        I: IntoIterator<Item = S::Item>,
    {
        self.terminal(S::from_items(items))
    }

    pub fn range(&self, lo: S::Item, hi: S::Item) -> Pred<S>
    where
        S: RangeSet,
    {
        self.terminal(S::range(lo, hi))
    }

    /// Matches end of input.
    pub fn eof(&self) -> Pred<S> {
        self.terminal(S::empty().with_eof())
    }

    pub fn epsilon(&self) -> Pred<S> {
        Pred::epsilon(self.basis)
    }

    /// Placeholder requesting the generator's default error handling.
    pub fn default_error(&self) -> Pred<S> {
        Pred::default_error_branch().with_basis(self.basis)
    }

    pub fn seq(&self, a: Pred<S>, b: Pred<S>) -> Pred<S> {
        let basis = self.basis_for(&[&a, &b]);
        Seq::join(basis, a, b)
    }

    pub fn seq_all<I>(&self, preds: I) -> Pred<S>
    where
        I: IntoIterator<Item = Pred<S>>,
    {
        let preds: Vec<_> = preds.into_iter().collect();
        let basis = self.basis_for(&preds.iter().collect::<Vec<_>>());
        Seq::join_all(basis, preds)
    }

    /// `a | b`
    pub fn or(&mut self, a: impl Into<Arm<S>>, b: impl Into<Arm<S>>) -> Pred<S> {
        self.alt(a, b, false)
    }

    /// `a / b`: like `|`, but ambiguity between the two sides is expected and
    /// resolved in favour of `a`, so it is not reported.
    pub fn ordered(&mut self, a: impl Into<Arm<S>>, b: impl Into<Arm<S>>) -> Pred<S> {
        self.alt(a, b, true)
    }

    pub fn alt(&mut self, a: impl Into<Arm<S>>, b: impl Into<Arm<S>>, ordered: bool) -> Pred<S> {
        let (a, b) = (a.into(), b.into());
        if a.mode == BranchMode::None
            && b.mode == BranchMode::None
            && let Some(merged) = a.pred.merge_terminal(&b.pred)
        {
            if self.basis.is_missing() {
                return merged;
            }
            return merged.with_basis(self.basis);
        }
        let basis = self.basis_for(&[&a.pred, &b.pred]);
        Alternation::merge(
            basis,
            a.pred,
            b.pred,
            ordered,
            a.mode,
            b.mode,
            &mut self.diagnostics,
        )
    }

    /// Mark `pred` as the default arm of the alternation it joins.
    pub fn default_arm(&self, pred: Pred<S>) -> Arm<S> {
        Arm {
            pred,
            mode: BranchMode::Default,
        }
    }

    /// Mark `pred` as the error branch of the alternation it joins. With
    /// `exit_on_error` set, a loop exits after the error branch runs.
    pub fn error_branch(&self, pred: Pred<S>, exit_on_error: bool) -> Arm<S> {
        let mode = if exit_on_error {
            BranchMode::ErrorExit
        } else {
            BranchMode::ErrorContinue
        };
        Arm { pred, mode }
    }

    fn looped(
        &self,
        mode: LoopMode,
        body: Pred<S>,
        greedy: Option<bool>,
    ) -> Result<Pred<S>, GrammarError> {
        let basis = self.basis_for(&[&body]);
        let alts = Alternation::looped(basis, mode, body, greedy)?;
        Ok(Pred::new(basis, PredKind::Alts(alts)))
    }

    /// `x*`
    ///
    /// # Errors
    ///
    /// [`GrammarError::NestedLoop`] if `body` is itself `y*` or `y?`.
    pub fn star(&self, body: Pred<S>) -> Result<Pred<S>, GrammarError> {
        self.looped(LoopMode::Star, body, None)
    }

    /// `x?`
    ///
    /// # Errors
    ///
    /// [`GrammarError::NestedLoop`] if `body` is itself `y*` or `y?`.
    pub fn opt(&self, body: Pred<S>) -> Result<Pred<S>, GrammarError> {
        self.looped(LoopMode::Opt, body, None)
    }

    /// `x+`, built as `x x*`.
    ///
    /// # Errors
    ///
    /// [`GrammarError::NestedLoop`] if `body` is itself `y*` or `y?`.
    pub fn plus(&self, body: Pred<S>) -> Result<Pred<S>, GrammarError> {
        let rest = self.star(body.clone())?;
        Ok(self.seq(body, rest))
    }

    /// `greedy(x)*` or `nongreedy(x)*`. Marking a loop either way silences
    /// ambiguity reports between its arms and its exit.
    ///
    /// # Errors
    ///
    /// [`GrammarError::NestedLoop`] if `body` is itself `y*` or `y?`.
    pub fn star_greedy(&self, body: Pred<S>, greedy: bool) -> Result<Pred<S>, GrammarError> {
        self.looped(LoopMode::Star, body, Some(greedy))
    }

    /// # Errors
    ///
    /// [`GrammarError::NestedLoop`] if `body` is itself `y*` or `y?`.
    pub fn opt_greedy(&self, body: Pred<S>, greedy: bool) -> Result<Pred<S>, GrammarError> {
        self.looped(LoopMode::Opt, body, Some(greedy))
    }

    /// Make the exit branch the default of a loop. Anything other than a
    /// loop is returned unchanged.
    pub fn default_exit(&mut self, mut pred: Pred<S>) -> Pred<S> {
        let basis = if self.basis.is_missing() { pred.basis } else { self.basis };
        if let Some(alts) = pred.as_alts_mut() {
            alts.set_default_exit(basis, &mut self.diagnostics);
        }
        pred
    }

    /// `predictor => matcher`
    ///
    /// # Errors
    ///
    /// [`GrammarError::NestedGate`] if either side is a gate.
    pub fn gate(&self, predictor: Pred<S>, matcher: Pred<S>) -> Result<Pred<S>, GrammarError> {
        self.make_gate(predictor, matcher, false)
    }

    /// `predictor <=> matcher`
    ///
    /// # Errors
    ///
    /// [`GrammarError::NestedGate`] if either side is a gate.
    pub fn equivalency_gate(
        &self,
        predictor: Pred<S>,
        matcher: Pred<S>,
    ) -> Result<Pred<S>, GrammarError> {
        self.make_gate(predictor, matcher, true)
    }

    fn make_gate(
        &self,
        predictor: Pred<S>,
        matcher: Pred<S>,
        is_equivalency: bool,
    ) -> Result<Pred<S>, GrammarError> {
        let basis = self.basis_for(&[&predictor, &matcher]);
        let gate = Gate::new(basis, predictor, matcher, is_equivalency)?;
        Ok(Pred::new(basis, PredKind::Gate(gate)))
    }

    /// `&{code}`
    pub fn and_code(&self, code: impl Into<CompactString>) -> Pred<S> {
        Pred::new(self.basis, PredKind::AndPred(AndPred::code(code, false)))
    }

    /// `!{code}`
    pub fn not_code(&self, code: impl Into<CompactString>) -> Pred<S> {
        Pred::new(self.basis, PredKind::AndPred(AndPred::code(code, true)))
    }

    /// `&(pred)`
    pub fn and_pred(&self, pred: Pred<S>) -> Pred<S> {
        let basis = self.basis_for(&[&pred]);
        Pred::new(basis, PredKind::AndPred(AndPred::pred(pred, false)))
    }

    /// `!(pred)`
    pub fn not_pred(&self, pred: Pred<S>) -> Pred<S> {
        let basis = self.basis_for(&[&pred]);
        Pred::new(basis, PredKind::AndPred(AndPred::pred(pred, true)))
    }

    /// Mark an assertion built by [`and_code`](Self::and_code) and friends as
    /// local, so later passes keep it in the rule that wrote it. Other
    /// predicates are returned unchanged.
    #[must_use]
    pub fn local(&self, mut pred: Pred<S>) -> Pred<S> {
        pred.kind = match pred.kind {
            PredKind::AndPred(and) => PredKind::AndPred(and.local(true)),
            other => other,
        };
        pred
    }

    pub fn declare(&mut self, name: &str) -> RuleId {
        self.grammar.declare(name)
    }

    /// # Errors
    ///
    /// See [`Grammar::define`].
    pub fn define(&mut self, id: RuleId, body: Pred<S>) -> Result<(), GrammarError> {
        self.grammar.define(id, body)
    }

    /// # Errors
    ///
    /// See [`Grammar::rule`].
    pub fn rule(&mut self, name: &str, body: Pred<S>) -> Result<RuleId, GrammarError> {
        self.grammar.rule(name, body)
    }

    /// A call of rule `id`.
    ///
    /// # Errors
    ///
    /// [`GrammarError::UnknownRule`] if `id` was not declared here.
    pub fn call(&self, id: RuleId) -> Result<Pred<S>, GrammarError> {
        self.grammar.rule_ref(id, self.basis)
    }

    /// A call of rule `id` passing `params` through to the generated code.
    ///
    /// # Errors
    ///
    /// [`GrammarError::UnknownRule`] if `id` was not declared here.
    pub fn call_with<I, P>(&self, id: RuleId, params: I) -> Result<Pred<S>, GrammarError>
    where
        I: IntoIterator<Item = P>,
        P: Into<CompactString>,
    {
        let rule = self.grammar.get(id).ok_or(GrammarError::UnknownRule { id })?;
        let call = RuleRef::new(id, rule.name.clone()).with_params(params);
        Ok(Pred::rule_ref(self.basis, call))
    }

    #[must_use]
    pub const fn grammar(&self) -> &Grammar<S> {
        &self.grammar
    }

    pub fn grammar_mut(&mut self) -> &mut Grammar<S> {
        &mut self.grammar
    }

    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Finish construction, returning the grammar and everything reported
    /// along the way.
    ///
    /// # Errors
    ///
    /// [`GrammarError::UndefinedRule`] if a declared rule has no body.
    pub fn finish(self) -> Result<(Grammar<S>, Diagnostics), GrammarError> {
        Ok((self.grammar.finish()?, self.diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticCode;
    use crate::terminal::CharSet;

    #[test]
    fn test_terminal_alternatives_collapse() {
        let mut b = GrammarBuilder::<CharSet>::new();
        let (x, y) = (b.single('a'), b.single('b'));
        let ab = b.or(x, y);
        assert!(ab.is_terminal());
        assert_eq!(ab.to_string(), "[ab]");
    }

    #[test]
    fn test_terminal_with_action_does_not_collapse() {
        let mut b = GrammarBuilder::<CharSet>::new();
        let x = b.single('a').with_post_action("seen();");
        let y = b.single('b');
        let alts = b.or(x, y);
        assert_eq!(alts.as_alts().map(Alternation::arm_count), Some(2));
    }

    #[test]
    fn test_basis_covers_operands_when_unset() {
        let mut b = GrammarBuilder::<CharSet>::new();
        let x = b.at(Basis::span(0, 3)).single('a');
        let y = b.at(Basis::span(6, 9)).single('b');
        b.at(Basis::missing());
        let s = b.seq(x, y);
        assert_eq!(s.basis, Basis::span(0, 9));
    }

    #[test]
    fn test_plus_is_body_then_star() {
        let b = GrammarBuilder::<CharSet>::new();
        let digits = b.plus(b.range('0', '9')).unwrap();
        assert_eq!(digits.to_string(), "[0-9] [0-9]*");
    }

    #[test]
    fn test_nested_loop_error_propagates() {
        let b = GrammarBuilder::<CharSet>::new();
        let inner = b.opt(b.single('x')).unwrap();
        assert!(matches!(b.star(inner), Err(GrammarError::NestedLoop { .. })));
    }

    #[test]
    fn test_default_and_error_arms() {
        let mut b = GrammarBuilder::<CharSet>::new();
        let first = b.default_arm(b.single('a').with_pre_action("a();"));
        let second = b.single('b');
        let ab = b.or(first, second);
        let again = b.default_arm(b.single('c'));
        let abc = b.or(ab, again);
        let err = b.error_branch(b.default_error(), true);
        let all = b.or(abc, err);

        let alts = all.as_alts().unwrap();
        assert_eq!(alts.default_arm(), Some(0));
        assert!(alts.error_branch().is_some());
        assert_eq!(b.diagnostics().count_code(DiagnosticCode::DuplicateDefaultArm), 1);
    }

    #[test]
    fn test_default_exit() {
        let mut b = GrammarBuilder::<CharSet>::new();
        let star = b.star(b.single('a')).unwrap();
        let star = b.default_exit(star);
        assert_eq!(star.as_alts().and_then(Alternation::default_arm), Some(-1));

        let star = b.default_exit(star);
        assert_eq!(b.diagnostics().len(), 1);
        assert!(star.as_alts().unwrap().has_exit());
    }

    #[test]
    fn test_rules_and_calls() {
        let mut b = GrammarBuilder::<CharSet>::new();
        let expr = b.declare("expr");
        let call = b.call_with(expr, ["0"]).unwrap();
        let open = b.single('(');
        let close = b.single(')');
        let body = b.seq_all([open, call, close]);
        b.define(expr, body).unwrap();
        assert_eq!(
            b.grammar().get(expr).unwrap().pred.as_ref().unwrap().to_string(),
            "'(' expr(0) ')'"
        );
        let (grammar, _) = b.finish().unwrap();
        assert_eq!(grammar.rule_id("expr"), Some(expr));
    }

    #[test]
    fn test_finish_reports_undefined_rules() {
        let mut b = GrammarBuilder::<CharSet>::new();
        b.declare("later");
        assert!(matches!(b.finish(), Err(GrammarError::UndefinedRule { .. })));
    }

    #[test]
    fn test_gates_and_assertions() {
        let b = GrammarBuilder::<CharSet>::new();
        let g = b.gate(b.single('a'), b.single('b')).unwrap();
        assert!(b.equivalency_gate(g.clone(), b.single('c')).is_err());
        assert_eq!(g.to_string(), "'a' => 'b'");
        assert_eq!(b.not_code("at_end()").to_string(), "!{at_end()}");
        assert_eq!(b.and_pred(b.single('x')).to_string(), "&('x')");
    }

    #[test]
    fn test_local_assertions() {
        let b = GrammarBuilder::<CharSet>::new();
        let is_local = |p: &Pred<CharSet>| match &p.kind {
            PredKind::AndPred(and) => and.is_local(),
            _ => false,
        };
        assert!(!is_local(&b.and_code("ok()")));
        for pred in [
            b.and_code("ok()"),
            b.not_code("ok()"),
            b.and_pred(b.single('x')),
            b.not_pred(b.single('x')),
        ] {
            let printed = pred.to_string();
            let local = b.local(pred);
            assert!(is_local(&local), "{printed}");
            assert_eq!(local.to_string(), printed);
        }
        assert_eq!(b.local(b.single('x')), b.single('x'));
    }
}
