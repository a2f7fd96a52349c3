//! Branches, optional elements and star loops.
//!
//! All three are one node type, [`Alternation`], distinguished by its
//! [`LoopMode`]. Alternation operators applied in any order normalize into a
//! single alternation whose arms are the operands, while a ledger of
//! [`Division`]s remembers which ranges of arms each `|` or `/` joined. The
//! ledger drives two things:
//!
//! - suppressing ambiguity reports between arms the user separated with the
//!   ordered operator `/` ([`Alternation::should_suppress_warning`],
//!   [`Alternation::should_report_ambiguity`])
//! - reconstructing the original grouping when printing

use crate::basis::Basis;
use crate::config::GrammarConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use crate::error::GrammarError;
use crate::pred::{Pred, PredKind};
use crate::terminal::TerminalSet;
use hashbrown::HashSet;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Arm index standing for the exit branch of a loop.
pub const EXIT_ARM: i32 = -1;

const ERROR_BRANCH_LAST: &str = "the error branch should come last to avoid confusion";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum LoopMode {
    /// Plain branch: exactly one arm matches.
    #[default]
    None,
    /// At most one arm matches, or none (`x?`).
    Opt,
    /// Arms repeat until the exit branch is taken (`x*`).
    Star,
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "plain",
            Self::Opt => "optional",
            Self::Star => "star",
        })
    }
}

/// Role of an operand being inserted into an alternation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BranchMode {
    #[default]
    None,
    /// The arm taken when prediction is inconclusive.
    Default,
    /// Error branch that exits the loop after running.
    ErrorExit,
    /// Error branch that continues looping after running.
    ErrorContinue,
}

impl BranchMode {
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::ErrorExit | Self::ErrorContinue)
    }
}

/// Record that arms `[left, mid)` and `[mid, right)` were joined by one
/// alternation operator; `slash` is set for the ordered operator `/`.
///
/// Invariant: `0 <= left <= mid <= right <= arm count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Division {
    pub left: i16,
    pub mid: i16,
    pub right: i16,
    pub slash: bool,
}

impl Division {
    #[must_use]
    pub const fn new(left: i16, mid: i16, right: i16, slash: bool) -> Self {
        Self {
            left,
            mid,
            right,
            slash,
        }
    }

    #[must_use]
    pub const fn shifted(self, by: i16) -> Self {
        Self {
            left: self.left.saturating_add(by),
            mid: self.mid.saturating_add(by),
            right: self.right.saturating_add(by),
            slash: self.slash,
        }
    }

    #[must_use]
    pub const fn contains(self, arm: i32) -> bool {
        arm >= self.left as i32 && arm < self.right as i32
    }

    /// True if `a` and `b` are both inside this division, on opposite sides.
    #[must_use]
    pub const fn separates(self, a: i32, b: i32) -> bool {
        let mid = self.mid as i32;
        self.contains(a) && self.contains(b) && ((a < mid) != (b < mid))
    }
}

fn to_i16(n: usize) -> i16 {
    i16::try_from(n).unwrap_or(i16::MAX)
}

fn to_arm(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

type ArmSet = HashSet<i32, ahash::RandomState>;

/// A branch, optional element or loop.
pub struct Alternation<S> {
    mode: LoopMode,
    greedy: Option<bool>,
    arms: Vec<Pred<S>>,
    default_arm: Option<i32>,
    error_branch: Option<Box<Pred<S>>>,
    exit_on_error: bool,
    divisions: Vec<Division>,
    /// Arm sets already reported as ambiguous.
    reported: Vec<ArmSet>,
}

impl<S> Alternation<S> {
    #[must_use]
    pub const fn new(mode: LoopMode, greedy: Option<bool>) -> Self {
        Self {
            mode,
            greedy,
            arms: Vec::new(),
            default_arm: None,
            error_branch: None,
            exit_on_error: false,
            divisions: Vec::new(),
            reported: Vec::new(),
        }
    }

    /// Build a loop (or plain branch) around `body`.
    ///
    /// If `body` is itself a plain alternation without actions, its arms,
    /// divisions, default arm and error branch are adopted directly instead
    /// of nesting.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::NestedLoop`] if `mode` is optional or star and
    /// `body` is an optional or star loop.
    pub fn looped(
        basis: Basis,
        mode: LoopMode,
        body: Pred<S>,
        greedy: Option<bool>,
    ) -> Result<Self, GrammarError> {
        if mode != LoopMode::None
            && let PredKind::Alts(inner) = &body.kind
            && inner.mode != LoopMode::None
        {
            return Err(GrammarError::nested_loop(basis, mode, inner.mode));
        }

        let mut alts = Self::new(mode, greedy);
        match body.into_plain_alts() {
            Ok(inner) => {
                alts.arms = inner.arms;
                alts.default_arm = inner.default_arm;
                alts.error_branch = inner.error_branch;
                alts.exit_on_error = inner.exit_on_error;
                alts.divisions = inner.divisions;
            }
            Err(body) => alts.arms.push(body),
        }
        Ok(alts)
    }

    /// Combine `a` and `b` with `|` (or `/` when `ordered`).
    ///
    /// If `a` is a plain alternation (and is not itself being marked as a
    /// default or error arm), `b` is inserted into it; otherwise, if `b`
    /// qualifies, `a` is prepended to `b`; otherwise a new alternation is
    /// created with `a` as its first arm.
    pub fn merge(
        basis: Basis,
        a: Pred<S>,
        b: Pred<S>,
        ordered: bool,
        a_mode: BranchMode,
        b_mode: BranchMode,
        sink: &mut dyn DiagnosticSink,
    ) -> Pred<S> {
        let a = if a_mode == BranchMode::None {
            match a.into_plain_alts() {
                Ok(mut alts) => {
                    alts.insert(ordered, true, b, b_mode, sink);
                    return Pred::new(basis, PredKind::Alts(alts));
                }
                Err(a) => a,
            }
        } else {
            a
        };

        let b = if b_mode == BranchMode::None {
            match b.into_plain_alts() {
                Ok(mut alts) => {
                    alts.insert(ordered, false, a, a_mode, sink);
                    return Pred::new(basis, PredKind::Alts(alts));
                }
                Err(b) => b,
            }
        } else {
            b
        };

        let mut alts = Self::new(LoopMode::None, None);
        let mut at = 0;
        alts.insert_single(&mut at, a, a_mode, sink);
        alts.insert(ordered, true, b, b_mode, sink);
        Pred::new(basis, PredKind::Alts(alts))
    }

    /// Insert `other` at the end (`append`) or start of the arm list.
    ///
    /// A plain alternation operand contributes its arms and error branch one
    /// by one, and its divisions are carried over, shifted to the new arm
    /// positions. Any other operand becomes a single arm. Either way a new
    /// division recording this join is appended.
    pub fn insert(
        &mut self,
        ordered: bool,
        append: bool,
        other: Pred<S>,
        other_mode: BranchMode,
        sink: &mut dyn DiagnosticSink,
    ) {
        let boundary = if append { self.arms.len() } else { 0 };
        let mut at = boundary;
        let had_error_branch = self.error_branch.as_ref().map(|e| e.basis);

        let spliced = if other_mode == BranchMode::None {
            other.into_plain_alts()
        } else {
            Err(other)
        };
        match spliced {
            Ok(incoming) => {
                for (i, arm) in incoming.arms.into_iter().enumerate() {
                    let mode = if incoming.default_arm == Some(to_arm(i)) {
                        BranchMode::Default
                    } else {
                        BranchMode::None
                    };
                    self.insert_single(&mut at, arm, mode, sink);
                }
                if let Some(err) = incoming.error_branch {
                    let mode = if incoming.exit_on_error {
                        BranchMode::ErrorExit
                    } else {
                        BranchMode::ErrorContinue
                    };
                    self.insert_single(&mut at, *err, mode, sink);
                }

                if append {
                    let shift = to_i16(boundary);
                    self.divisions
                        .extend(incoming.divisions.into_iter().map(|d| d.shifted(shift)));
                } else {
                    let shift = to_i16(at);
                    let mut divisions = incoming.divisions;
                    divisions.extend(self.divisions.drain(..).map(|d| d.shifted(shift)));
                    self.divisions = divisions;
                }
            }
            Err(other) => {
                self.insert_single(&mut at, other, other_mode, sink);
                if !append {
                    let shift = to_i16(at);
                    for d in &mut self.divisions {
                        *d = d.shifted(shift);
                    }
                }
            }
        }

        if append
            && at > boundary
            && let Some(err_basis) = had_error_branch
        {
            sink.write(Diagnostic::warning(
                DiagnosticCode::ErrorBranchPosition,
                err_basis,
                ERROR_BRANCH_LAST,
            ));
        }

        let mid = if append { boundary } else { at };
        if mid > 0 && mid < self.arms.len() {
            self.divisions.push(Division::new(
                0,
                to_i16(mid),
                to_i16(self.arms.len()),
                ordered,
            ));
        }
    }

    fn insert_single(
        &mut self,
        at: &mut usize,
        arm: Pred<S>,
        mode: BranchMode,
        sink: &mut dyn DiagnosticSink,
    ) {
        if mode.is_error() {
            if self.error_branch.is_some() {
                sink.write(Diagnostic::error(
                    DiagnosticCode::DuplicateErrorBranch,
                    arm.basis,
                    "there is already an error branch",
                ));
                return;
            }
            if *at < self.arms.len() {
                sink.write(Diagnostic::warning(
                    DiagnosticCode::ErrorBranchPosition,
                    arm.basis,
                    ERROR_BRANCH_LAST,
                ));
            }
            self.exit_on_error = mode == BranchMode::ErrorExit;
            self.error_branch = Some(Box::new(arm));
            return;
        }

        if let Some(d) = self.default_arm
            && usize::try_from(d).is_ok_and(|d| d >= *at)
        {
            self.default_arm = Some(d + 1);
        }
        if mode == BranchMode::Default {
            if self.default_arm.is_some() {
                sink.write(Diagnostic::error(
                    DiagnosticCode::DuplicateDefaultArm,
                    arm.basis,
                    "there is already a default branch",
                ));
            } else {
                self.default_arm = Some(to_arm(*at));
            }
        }
        self.arms.insert(*at, arm);
        *at += 1;
    }

    /// Make the exit branch the default. Only loops have an exit branch, so
    /// this returns false (and changes nothing) for a plain alternation.
    pub fn set_default_exit(&mut self, basis: Basis, sink: &mut dyn DiagnosticSink) -> bool {
        if self.mode == LoopMode::None {
            return false;
        }
        if self.default_arm.is_some() {
            sink.write(Diagnostic::error(
                DiagnosticCode::DuplicateDefaultArm,
                basis,
                "there is already a default branch",
            ));
            return false;
        }
        self.default_arm = Some(EXIT_ARM);
        true
    }

    /// True if ambiguity between `arm_a` and `arm_b` is intentional: the user
    /// put them on opposite sides of a `/`, or the caller lists both in
    /// `extra_mask` (bit `i` stands for arm `i`).
    #[must_use]
    pub fn should_suppress_warning(&self, arm_a: i32, arm_b: i32, extra_mask: u64) -> bool {
        let in_mask = |arm: i32| {
            u32::try_from(arm)
                .ok()
                .and_then(|bit| 1_u64.checked_shl(bit))
                .is_some_and(|bit| extra_mask & bit != 0)
        };
        if in_mask(arm_a) && in_mask(arm_b) {
            return true;
        }
        self.divisions
            .iter()
            .any(|d| d.slash && d.separates(arm_a, arm_b))
    }

    /// Decide whether a set of mutually ambiguous arms (with [`EXIT_ARM`] for
    /// the exit branch) should be reported.
    ///
    /// The exit branch is dropped when the loop was explicitly marked greedy
    /// or non-greedy, or when `suppress_exit` is set. Any arm whose ambiguity
    /// with every other listed arm is suppressed is dropped too. The remainder
    /// is reported unless it is empty or adds no arm beyond a set reported
    /// earlier on this alternation; reported sets are remembered.
    pub fn should_report_ambiguity(
        &mut self,
        arms: &[i32],
        extra_mask: u64,
        suppress_exit: bool,
    ) -> bool {
        let mut listed: SmallVec<[i32; 8]> = SmallVec::new();
        for &arm in arms {
            if !listed.contains(&arm) {
                listed.push(arm);
            }
        }
        let exit_suppressed =
            listed.contains(&EXIT_ARM) && (self.greedy.is_some() || suppress_exit);

        let residual: ArmSet = listed
            .iter()
            .copied()
            .filter(|&arm| !(arm == EXIT_ARM && exit_suppressed))
            .filter(|&arm| {
                !listed.iter().filter(|&&other| other != arm).all(|&other| {
                    (other == EXIT_ARM && exit_suppressed)
                        || self.should_suppress_warning(arm, other, extra_mask)
                })
            })
            .collect();

        if residual.is_empty() || self.reported.iter().any(|prev| residual.is_subset(prev)) {
            return false;
        }
        self.reported.push(residual);
        true
    }

    #[must_use]
    pub const fn mode(&self) -> LoopMode {
        self.mode
    }

    #[must_use]
    pub const fn is_looping(&self) -> bool {
        !matches!(self.mode, LoopMode::None)
    }

    /// Loops can always leave through the exit branch.
    #[must_use]
    pub const fn has_exit(&self) -> bool {
        self.is_looping()
    }

    #[must_use]
    pub const fn greedy(&self) -> Option<bool> {
        self.greedy
    }

    pub fn set_greedy(&mut self, greedy: Option<bool>) {
        self.greedy = greedy;
    }

    #[must_use]
    pub fn arms(&self) -> &[Pred<S>] {
        &self.arms
    }

    #[must_use]
    pub fn arm(&self, index: i32) -> Option<&Pred<S>> {
        usize::try_from(index).ok().and_then(|i| self.arms.get(i))
    }

    #[must_use]
    pub fn arm_count(&self) -> usize {
        self.arms.len()
    }

    /// Index of the default arm; [`EXIT_ARM`] if the exit branch is the default.
    #[must_use]
    pub const fn default_arm(&self) -> Option<i32> {
        self.default_arm
    }

    #[must_use]
    pub fn error_branch(&self) -> Option<&Pred<S>> {
        self.error_branch.as_deref()
    }

    #[must_use]
    pub const fn exit_on_error(&self) -> bool {
        self.exit_on_error
    }

    #[must_use]
    pub fn divisions(&self) -> &[Division] {
        &self.divisions
    }

    pub(crate) fn arms_and_error_mut(
        &mut self,
    ) -> (&mut Vec<Pred<S>>, Option<&mut Box<Pred<S>>>) {
        (&mut self.arms, self.error_branch.as_mut())
    }

    pub(crate) fn clear_reported(&mut self) {
        self.reported.clear();
    }
}

impl<S: TerminalSet> Alternation<S> {
    /// Human-readable name of an arm for diagnostics: `exit` for
    /// [`EXIT_ARM`], otherwise the 1-based index followed by a short
    /// description of the arm when it fits the default length budget.
    /// [`Grammar::alt_name`](crate::grammar::Grammar::alt_name) applies the
    /// grammar's configured budget instead.
    #[must_use]
    pub fn alt_name(&self, arm: i32) -> String {
        self.alt_name_with(arm, GrammarConfig::default().alt_name_max_len)
    }

    #[must_use]
    pub fn alt_name_with(&self, arm: i32, max_len: usize) -> String {
        if arm == EXIT_ARM {
            return "exit".to_string();
        }
        let number = i64::from(arm) + 1;
        match self.arm(arm) {
            Some(pred) => {
                let desc = pred.to_string();
                if desc.chars().count() <= max_len {
                    format!("{number}:{desc}")
                } else {
                    number.to_string()
                }
            }
            None => number.to_string(),
        }
    }
}

impl<S: Clone> Clone for Alternation<S> {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            greedy: self.greedy,
            arms: self.arms.clone(),
            default_arm: self.default_arm,
            error_branch: self.error_branch.clone(),
            exit_on_error: self.exit_on_error,
            divisions: self.divisions.clone(),
            reported: Vec::new(),
        }
    }
}

impl<S: PartialEq> PartialEq for Alternation<S> {
    fn eq(&self, other: &Self) -> bool {
        self.mode == other.mode
            && self.greedy == other.greedy
            && self.arms == other.arms
            && self.default_arm == other.default_arm
            && self.error_branch == other.error_branch
            && self.exit_on_error == other.exit_on_error
            && self.divisions == other.divisions
    }
}

impl<S: fmt::Debug> fmt::Debug for Alternation<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alternation")
            .field("mode", &self.mode)
            .field("greedy", &self.greedy)
            .field("arms", &self.arms)
            .field("default_arm", &self.default_arm)
            .field("error_branch", &self.error_branch)
            .field("exit_on_error", &self.exit_on_error)
            .field("divisions", &self.divisions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::grammar::RuleId;
    use crate::pred::RuleRef;
    use crate::terminal::CharSet;

    fn call(n: u32, name: &str) -> Pred<CharSet> {
        Pred::rule_ref(Basis::missing(), RuleRef::new(RuleId::new(n), name))
    }

    fn or(a: Pred<CharSet>, b: Pred<CharSet>, sink: &mut Diagnostics) -> Pred<CharSet> {
        Alternation::merge(Basis::missing(), a, b, false, BranchMode::None, BranchMode::None, sink)
    }

    fn slash(a: Pred<CharSet>, b: Pred<CharSet>, sink: &mut Diagnostics) -> Pred<CharSet> {
        Alternation::merge(Basis::missing(), a, b, true, BranchMode::None, BranchMode::None, sink)
    }

    fn star_of(body: Pred<CharSet>, greedy: Option<bool>) -> Alternation<CharSet> {
        Alternation::looped(Basis::missing(), LoopMode::Star, body, greedy).unwrap()
    }

    fn alts(p: &Pred<CharSet>) -> &Alternation<CharSet> {
        p.as_alts().expect("alternation")
    }

    fn assert_divisions_valid(a: &Alternation<CharSet>) {
        let n = i16::try_from(a.arm_count()).unwrap();
        for d in a.divisions() {
            assert!(0 <= d.left && d.left <= d.mid && d.mid <= d.right && d.right <= n, "{d:?}");
        }
    }

    #[test]
    fn test_division_separates() {
        let d = Division::new(0, 2, 4, true);
        assert!(d.separates(1, 2));
        assert!(d.separates(3, 0));
        assert!(!d.separates(0, 1));
        assert!(!d.separates(1, 4));
        assert!(!d.separates(EXIT_ARM, 2));
    }

    #[test]
    fn test_left_and_right_association_flatten() {
        let mut sink = Diagnostics::new();
        let ab = or(call(0, "a"), call(1, "b"), &mut sink);
        let left = or(ab, call(2, "c"), &mut sink);
        assert_eq!(alts(&left).arm_count(), 3);

        let bc = or(call(1, "b"), call(2, "c"), &mut sink);
        let right = or(call(0, "a"), bc, &mut sink);
        assert_eq!(alts(&right).arm_count(), 3);
        assert_eq!(alts(&right).arms()[0], call(0, "a"));
        assert_divisions_valid(alts(&right));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_prepend_shifts_existing_divisions() {
        let mut sink = Diagnostics::new();
        let bc = slash(call(1, "b"), call(2, "c"), &mut sink);
        let all = or(call(0, "a"), bc, &mut sink);
        let a = alts(&all);
        assert_eq!(
            a.divisions(),
            &[Division::new(1, 2, 3, true), Division::new(0, 1, 3, false)]
        );
        assert!(a.should_suppress_warning(1, 2, 0));
        assert!(!a.should_suppress_warning(0, 1, 0));
    }

    #[test]
    fn test_grouped_ordered_alternation() {
        let mut sink = Diagnostics::new();
        let ab = or(call(0, "a"), call(1, "b"), &mut sink);
        let cd = or(call(2, "c"), call(3, "d"), &mut sink);
        let all = slash(ab, cd, &mut sink);
        let a = alts(&all);
        assert_eq!(a.arm_count(), 4);
        assert_divisions_valid(a);

        assert!(!a.should_suppress_warning(0, 1, 0));
        assert!(!a.should_suppress_warning(2, 3, 0));
        assert!(a.should_suppress_warning(0, 2, 0));
        assert!(a.should_suppress_warning(3, 1, 0));
    }

    #[test]
    fn test_extra_mask_suppresses() {
        let mut sink = Diagnostics::new();
        let all = or(or(call(0, "a"), call(1, "b"), &mut sink), call(2, "c"), &mut sink);
        let a = alts(&all);
        assert!(!a.should_suppress_warning(0, 2, 0));
        assert!(a.should_suppress_warning(0, 2, 0b101));
        assert!(!a.should_suppress_warning(0, 1, 0b101));
        assert!(!a.should_suppress_warning(0, 70, u64::MAX));
    }

    #[test]
    fn test_second_default_arm_is_reported_once() {
        let mut sink = Diagnostics::new();
        let first = Alternation::merge(
            Basis::missing(),
            call(0, "a"),
            call(1, "b"),
            false,
            BranchMode::Default,
            BranchMode::None,
            &mut sink,
        );
        let both = Alternation::merge(
            Basis::missing(),
            first,
            call(2, "c"),
            false,
            BranchMode::None,
            BranchMode::Default,
            &mut sink,
        );
        assert_eq!(sink.count_code(DiagnosticCode::DuplicateDefaultArm), 1);
        assert_eq!(sink.len(), 1);
        assert_eq!(alts(&both).default_arm(), Some(0));
        assert_eq!(alts(&both).arm_count(), 3);
    }

    #[test]
    fn test_default_arm_index_shifts_on_prepend() {
        let mut sink = Diagnostics::new();
        let bc = Alternation::merge(
            Basis::missing(),
            call(1, "b"),
            call(2, "c"),
            false,
            BranchMode::None,
            BranchMode::Default,
            &mut sink,
        );
        assert_eq!(alts(&bc).default_arm(), Some(1));
        let all = or(call(0, "a"), bc, &mut sink);
        assert_eq!(alts(&all).default_arm(), Some(2));
    }

    #[test]
    fn test_error_branch_bookkeeping() {
        let mut sink = Diagnostics::new();
        let with_error = Alternation::merge(
            Basis::missing(),
            call(0, "a"),
            call(1, "recover").with_basis(Basis::span(5, 12)),
            false,
            BranchMode::None,
            BranchMode::ErrorExit,
            &mut sink,
        );
        let a = alts(&with_error);
        assert_eq!(a.arm_count(), 1);
        assert!(a.exit_on_error());
        assert!(sink.is_empty());

        let more = or(with_error, call(2, "b"), &mut sink);
        assert_eq!(sink.count_code(DiagnosticCode::ErrorBranchPosition), 1);
        assert_eq!(sink.iter().next().unwrap().basis, Basis::span(5, 12));

        let dup = Alternation::merge(
            Basis::missing(),
            more,
            call(3, "again"),
            false,
            BranchMode::None,
            BranchMode::ErrorContinue,
            &mut sink,
        );
        assert_eq!(sink.count_code(DiagnosticCode::DuplicateErrorBranch), 1);
        let a = alts(&dup);
        assert_eq!(a.error_branch(), Some(&call(1, "recover").with_basis(Basis::span(5, 12))));
        assert!(a.exit_on_error());
        assert_eq!(a.arm_count(), 2);
    }

    #[test]
    fn test_looped_adopts_plain_body() {
        let mut sink = Diagnostics::new();
        let body = slash(call(0, "a"), call(1, "b"), &mut sink);
        let star = Alternation::looped(Basis::missing(), LoopMode::Star, body, Some(true)).unwrap();
        assert_eq!(star.arm_count(), 2);
        assert_eq!(star.divisions(), &[Division::new(0, 1, 2, true)]);
        assert_eq!(star.greedy(), Some(true));
        assert!(star.has_exit());
    }

    #[test]
    fn test_looped_keeps_body_with_actions_as_one_arm() {
        let mut sink = Diagnostics::new();
        let body = or(call(0, "a"), call(1, "b"), &mut sink).with_pre_action("enter();");
        let star = Alternation::looped(Basis::missing(), LoopMode::Star, body, None).unwrap();
        assert_eq!(star.arm_count(), 1);
        assert!(star.divisions().is_empty());
    }

    #[test]
    fn test_nested_loop_is_rejected() {
        let inner = star_of(call(0, "a"), None);
        let inner = Pred::new(Basis::missing(), PredKind::Alts(inner));
        let err =
            Alternation::looped(Basis::span(0, 4), LoopMode::Opt, inner.clone(), None).unwrap_err();
        assert_eq!(
            err,
            GrammarError::nested_loop(Basis::span(0, 4), LoopMode::Opt, LoopMode::Star)
        );

        // A plain wrapper around a loop is fine.
        let wrapped = Alternation::looped(Basis::missing(), LoopMode::None, inner, None).unwrap();
        assert_eq!(wrapped.arm_count(), 1);
    }

    #[test]
    fn test_ambiguity_memo() {
        let mut sink = Diagnostics::new();
        let all = or(
            or(call(0, "a"), call(1, "b"), &mut sink),
            or(call(2, "c"), call(3, "d"), &mut sink),
            &mut sink,
        );
        let mut a = all.as_alts().unwrap().clone();
        assert!(a.should_report_ambiguity(&[1, 2], 0, false));
        assert!(!a.should_report_ambiguity(&[1, 2], 0, false));
        assert!(!a.should_report_ambiguity(&[2, 1], 0, false));
        assert!(a.should_report_ambiguity(&[1, 2, 3], 0, false));
        assert!(!a.should_report_ambiguity(&[3, 1], 0, false));
    }

    #[test]
    fn test_ambiguity_across_slash_is_not_reported() {
        let mut sink = Diagnostics::new();
        let all = slash(
            or(call(0, "a"), call(1, "b"), &mut sink),
            call(2, "c"),
            &mut sink,
        );
        let mut a = all.as_alts().unwrap().clone();
        assert!(!a.should_report_ambiguity(&[0, 2], 0, false));
        assert!(!a.should_report_ambiguity(&[1, 2], 0, false));
        // Arm 2 is intentional against both others; 0 and 1 still clash.
        assert!(a.should_report_ambiguity(&[0, 1, 2], 0, false));
    }

    #[test]
    fn test_ambiguity_with_exit() {
        let mut sink = Diagnostics::new();
        let body = or(call(0, "a"), call(1, "b"), &mut sink);
        let mut plain = star_of(body.clone(), None);
        assert!(plain.should_report_ambiguity(&[EXIT_ARM, 1], 0, false));

        let mut greedy = star_of(body.clone(), Some(true));
        assert!(!greedy.should_report_ambiguity(&[EXIT_ARM, 1], 0, false));
        assert!(greedy.should_report_ambiguity(&[EXIT_ARM, 0, 1], 0, false));

        let mut suppressed = star_of(body, None);
        assert!(!suppressed.should_report_ambiguity(&[EXIT_ARM, 0], 0, true));
    }

    #[test]
    fn test_single_arm_is_never_reported() {
        let mut sink = Diagnostics::new();
        let all = or(call(0, "a"), call(1, "b"), &mut sink);
        let mut a = all.as_alts().unwrap().clone();
        assert!(!a.should_report_ambiguity(&[1], 0, false));
        assert!(!a.should_report_ambiguity(&[], 0, false));
    }

    #[test]
    fn test_set_default_exit() {
        let mut sink = Diagnostics::new();
        let mut star = star_of(call(0, "a"), None);
        assert!(star.set_default_exit(Basis::missing(), &mut sink));
        assert_eq!(star.default_arm(), Some(EXIT_ARM));
        assert!(!star.set_default_exit(Basis::missing(), &mut sink));
        assert_eq!(sink.count_code(DiagnosticCode::DuplicateDefaultArm), 1);

        let mut plain = Alternation::<CharSet>::new(LoopMode::None, None);
        assert!(!plain.set_default_exit(Basis::missing(), &mut sink));
    }

    #[test]
    fn test_alt_name() {
        let mut sink = Diagnostics::new();
        let all = or(call(0, "Number"), call(1, "AVeryLongRuleNameThatDoesNotFit"), &mut sink);
        let a = alts(&all);
        assert_eq!(a.alt_name(EXIT_ARM), "exit");
        assert_eq!(a.alt_name(0), "1:Number");
        assert_eq!(a.alt_name_with(1, 10), "2");
        assert_eq!(a.alt_name(7), "8");
    }

    #[test]
    fn test_clone_forgets_reported_sets() {
        let mut sink = Diagnostics::new();
        let all = or(call(0, "a"), call(1, "b"), &mut sink);
        let mut a = all.as_alts().unwrap().clone();
        assert!(a.should_report_ambiguity(&[0, 1], 0, false));
        let mut copy = a.clone();
        assert_eq!(copy, a);
        assert!(copy.should_report_ambiguity(&[0, 1], 0, false));
    }
}
