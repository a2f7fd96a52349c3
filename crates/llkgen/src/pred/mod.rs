//! # Predicates
//!
//! The grammar tree handed to lookahead analysis and code generation.
//!
//! ## Overview
//!
//! A [`Pred`] is one node of a rule's body. The node-specific payload lives in
//! [`PredKind`], a closed sum type that downstream passes match exhaustively:
//!
//! - [`PredKind::Terminal`]: match one item from a terminal set
//! - [`PredKind::Seq`]: match a list of predicates in order
//! - [`PredKind::Alts`]: branches, optional elements and star loops
//! - [`PredKind::Gate`]: predict with one predicate, match with another
//! - [`PredKind::AndPred`]: zero-width lookahead assertion
//! - [`PredKind::RuleRef`]: call another rule
//! - [`PredKind::EndOfRule`]: follow-set placeholder at the end of a rule
//! - [`PredKind::DefaultErrorBranch`]: marker requesting default error handling
//!
//! Every node also carries its source [`Basis`], optional user actions to run
//! before and after it matches, an optional [`ResultSaver`], and a slot for
//! downstream analysis results.
//!
//! ## Ownership
//!
//! A predicate is used in exactly one position of exactly one tree; the
//! operators take their operands by value. To use the same construct twice,
//! clone it: [`Clone`] produces an independent deep copy (with an empty
//! analysis slot). Rules are never embedded: [`PredKind::RuleRef`] holds a
//! [`RuleId`](crate::grammar::RuleId) into the grammar's rule arena.

pub mod and_pred;
pub mod alts;
pub mod gate;
mod print;
pub mod rule_ref;
pub mod seq;
pub mod terminal;

pub use alts::{Alternation, BranchMode, Division, EXIT_ARM, LoopMode};
pub use and_pred::{AndPred, Condition};
pub use gate::Gate;
pub use rule_ref::{EndOfRule, RuleRef};
pub use seq::Seq;
pub use terminal::TerminalPred;

use crate::basis::Basis;
use crate::grammar::{Grammar, RuleId};
use crate::terminal::TerminalSet;
use compact_str::CompactString;
use hashbrown::HashSet;
use smallvec::SmallVec;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Produces code that stores the matched value, given the matching code.
#[derive(Clone)]
pub struct ResultSaver(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl ResultSaver {
    pub fn new(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[must_use]
    pub fn apply(&self, match_code: &str) -> String {
        (self.0)(match_code)
    }
}

impl PartialEq for ResultSaver {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ResultSaver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResultSaver(..)")
    }
}

/// Opaque storage for a downstream pass's per-node result.
///
/// The slot is not part of a predicate's structure: it is ignored by
/// equality and left empty by cloning.
#[derive(Default)]
pub struct AnalysisSlot(Option<Arc<dyn Any + Send + Sync>>);

impl AnalysisSlot {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl Clone for AnalysisSlot {
    fn clone(&self) -> Self {
        Self(None)
    }
}

impl PartialEq for AnalysisSlot {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl fmt::Debug for AnalysisSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.is_some() {
            "AnalysisSlot(attached)"
        } else {
            "AnalysisSlot(empty)"
        })
    }
}

/// Concatenate two optional code fragments.
#[must_use]
pub fn merge_actions(
    first: Option<CompactString>,
    second: Option<CompactString>,
) -> Option<CompactString> {
    match (first, second) {
        (Some(mut a), Some(b)) => {
            a.push(' ');
            a.push_str(&b);
            Some(a)
        }
        (a, None) => a,
        (None, b) => b,
    }
}

/// One node of a grammar tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Pred<S> {
    pub basis: Basis,
    pub pre_action: Option<CompactString>,
    pub post_action: Option<CompactString>,
    pub result_saver: Option<ResultSaver>,
    analysis: AnalysisSlot,
    pub kind: PredKind<S>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredKind<S> {
    Terminal(TerminalPred<S>),
    Seq(Seq<S>),
    Alts(Alternation<S>),
    Gate(Gate<S>),
    AndPred(AndPred<S>),
    RuleRef(RuleRef),
    EndOfRule(EndOfRule<S>),
    /// Stateless marker meaning "use the default error handling".
    DefaultErrorBranch,
}

impl<S> Pred<S> {
    #[must_use]
    pub fn new(basis: Basis, kind: PredKind<S>) -> Self {
        Self {
            basis,
            pre_action: None,
            post_action: None,
            result_saver: None,
            analysis: AnalysisSlot::default(),
            kind,
        }
    }

    #[must_use]
    pub fn terminal(basis: Basis, set: S) -> Self {
        Self::new(basis, PredKind::Terminal(TerminalPred::new(set)))
    }

    /// The empty sequence, which matches nothing and always succeeds.
    #[must_use]
    pub fn epsilon(basis: Basis) -> Self {
        Self::new(basis, PredKind::Seq(Seq::default()))
    }

    #[must_use]
    pub fn rule_ref(basis: Basis, rule: RuleRef) -> Self {
        Self::new(basis, PredKind::RuleRef(rule))
    }

    #[must_use]
    pub fn default_error_branch() -> Self {
        Self::new(Basis::missing(), PredKind::DefaultErrorBranch)
    }

    #[must_use]
    pub fn with_basis(mut self, basis: Basis) -> Self {
        self.basis = basis;
        self
    }

    #[must_use]
    pub fn with_pre_action(mut self, code: impl Into<CompactString>) -> Self {
        self.pre_action = merge_actions(self.pre_action.take(), Some(code.into()));
        self
    }

    #[must_use]
    pub fn with_post_action(mut self, code: impl Into<CompactString>) -> Self {
        self.post_action = merge_actions(self.post_action.take(), Some(code.into()));
        self
    }

    #[must_use]
    pub fn with_result_saver(mut self, saver: ResultSaver) -> Self {
        self.result_saver = Some(saver);
        self
    }

    /// True if any user code is attached to this node itself.
    #[must_use]
    pub const fn has_actions(&self) -> bool {
        self.pre_action.is_some() || self.post_action.is_some() || self.result_saver.is_some()
    }

    #[must_use]
    pub const fn as_alts(&self) -> Option<&Alternation<S>> {
        match &self.kind {
            PredKind::Alts(alts) => Some(alts),
            _ => None,
        }
    }

    pub fn as_alts_mut(&mut self) -> Option<&mut Alternation<S>> {
        match &mut self.kind {
            PredKind::Alts(alts) => Some(alts),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.kind, PredKind::Terminal(_))
    }

    /// A non-looping alternation with no actions of its own, whose arms can be
    /// spliced directly into another alternation.
    #[must_use]
    pub fn is_plain_alts(&self) -> bool {
        !self.has_actions()
            && matches!(&self.kind, PredKind::Alts(alts) if alts.mode() == LoopMode::None)
    }

    /// Take the alternation out of a plain-alts node, or hand the node back.
    pub(crate) fn into_plain_alts(self) -> Result<Alternation<S>, Self> {
        if !self.is_plain_alts() {
            return Err(self);
        }
        match self.kind {
            PredKind::Alts(alts) => Ok(alts),
            kind => Err(Self {
                basis: self.basis,
                pre_action: self.pre_action,
                post_action: self.post_action,
                result_saver: self.result_saver,
                analysis: self.analysis,
                kind,
            }),
        }
    }

    /// Direct children, in source order.
    #[must_use]
    pub fn children(&self) -> SmallVec<[&Self; 4]> {
        let mut out = SmallVec::new();
        match &self.kind {
            PredKind::Seq(seq) => out.extend(seq.items()),
            PredKind::Alts(alts) => {
                out.extend(alts.arms());
                if let Some(err) = alts.error_branch() {
                    out.push(err);
                }
            }
            PredKind::Gate(gate) => {
                out.push(gate.predictor());
                out.push(gate.matcher());
            }
            PredKind::AndPred(and) => {
                if let Condition::Pred(p) = and.condition() {
                    out.push(p.as_ref());
                }
            }
            PredKind::Terminal(_)
            | PredKind::RuleRef(_)
            | PredKind::EndOfRule(_)
            | PredKind::DefaultErrorBranch => {}
        }
        out
    }

    pub(crate) fn children_mut(&mut self) -> SmallVec<[&mut Self; 4]> {
        let mut out = SmallVec::new();
        match &mut self.kind {
            PredKind::Seq(seq) => out.extend(seq.items_mut()),
            PredKind::Alts(alts) => {
                let (arms, error_branch) = alts.arms_and_error_mut();
                out.extend(arms.iter_mut());
                if let Some(err) = error_branch {
                    out.push(err.as_mut());
                }
            }
            PredKind::Gate(gate) => {
                let (predictor, matcher) = gate.sides_mut();
                out.push(predictor);
                out.push(matcher);
            }
            PredKind::AndPred(and) => {
                if let Condition::Pred(p) = and.condition_mut() {
                    out.push(p.as_mut());
                }
            }
            PredKind::Terminal(_)
            | PredKind::RuleRef(_)
            | PredKind::EndOfRule(_)
            | PredKind::DefaultErrorBranch => {}
        }
        out
    }

    /// Visit this node and all of its descendants in pre-order.
    pub fn walk(&self, f: &mut impl FnMut(&Self)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }

    pub fn attach_analysis<A: Any + Send + Sync>(&mut self, result: A) {
        self.analysis = AnalysisSlot(Some(Arc::new(result)));
    }

    #[must_use]
    pub fn analysis<A: Any + Send + Sync>(&self) -> Option<&A> {
        self.analysis.0.as_deref().and_then(|a| a.downcast_ref::<A>())
    }

    #[must_use]
    pub const fn has_analysis(&self) -> bool {
        !self.analysis.is_empty()
    }
}

impl<S: TerminalSet> Pred<S> {
    /// Drop every analysis result in this subtree, including the ambiguity
    /// memo of each alternation and the follow set of each end-of-rule
    /// marker, so that re-analysis starts clean.
    pub fn discard_analysis(&mut self) {
        self.analysis = AnalysisSlot::default();
        match &mut self.kind {
            PredKind::Alts(alts) => alts.clear_reported(),
            PredKind::EndOfRule(end) => end.clear_follow(),
            _ => {}
        }
        for child in self.children_mut() {
            child.discard_analysis();
        }
    }

    /// True if this predicate can match without consuming input.
    ///
    /// Rule references are resolved through `grammar`. A rule that is already
    /// being evaluated further up the call chain counts as non-nullable, so
    /// recursive rules terminate.
    #[must_use]
    pub fn is_nullable(&self, grammar: &Grammar<S>) -> bool {
        self.nullability(grammar).unwrap_or(false)
    }

    /// Like [`is_nullable`](Self::is_nullable), but `None` for placeholder
    /// nodes ([`EndOfRule`] and the default error branch) whose nullability is
    /// undefined.
    #[must_use]
    pub fn nullability(&self, grammar: &Grammar<S>) -> Option<bool> {
        let mut visiting = HashSet::with_hasher(ahash::RandomState::new());
        self.nullability_impl(grammar, &mut visiting)
    }

    pub(crate) fn nullability_impl(
        &self,
        grammar: &Grammar<S>,
        visiting: &mut HashSet<RuleId, ahash::RandomState>,
    ) -> Option<bool> {
        let nullable = |p: &Self, visiting: &mut HashSet<RuleId, ahash::RandomState>| {
            p.nullability_impl(grammar, visiting).unwrap_or(false)
        };
        match &self.kind {
            PredKind::Terminal(_) => Some(false),
            PredKind::Seq(seq) => Some(seq.items().iter().all(|p| nullable(p, visiting))),
            PredKind::Alts(alts) => Some(
                alts.mode() != LoopMode::None || alts.arms().iter().any(|p| nullable(p, visiting)),
            ),
            PredKind::Gate(gate) => {
                Some(nullable(gate.predictor(), visiting) && nullable(gate.matcher(), visiting))
            }
            PredKind::AndPred(_) => Some(true),
            PredKind::RuleRef(r) => {
                if !visiting.insert(r.rule) {
                    return Some(false);
                }
                let result = grammar
                    .get(r.rule)
                    .and_then(|rule| rule.pred.as_ref())
                    .is_some_and(|body| nullable(body, visiting));
                visiting.remove(&r.rule);
                Some(result)
            }
            PredKind::EndOfRule(_) | PredKind::DefaultErrorBranch => None,
        }
    }
}
