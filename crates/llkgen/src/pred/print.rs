//! Grammar-like rendering of predicate trees, for diagnostics and debugging.
//!
//! Alternations are printed with the grouping the user wrote: a side of a `/`
//! that was itself built with `|` is parenthesized, which is the only case
//! where the flattened arm list would otherwise read differently.

use crate::pred::{Alternation, Condition, EXIT_ARM, LoopMode, Pred, PredKind};
use crate::terminal::TerminalSet;
use smallvec::SmallVec;
use std::fmt::{self, Write};

impl<S: TerminalSet> fmt::Display for Pred<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let has_code = self.pre_action.is_some() || self.post_action.is_some();
        if let Some(pre) = &self.pre_action {
            write!(f, "{{{pre}}} ")?;
        }
        if has_code && needs_group(self) {
            f.write_char('(')?;
            write_kind(self, f)?;
            f.write_char(')')?;
        } else {
            write_kind(self, f)?;
        }
        if let Some(post) = &self.post_action {
            write!(f, " {{{post}}}")?;
        }
        Ok(())
    }
}

/// True if the printed node contains top-level operators that would bind
/// looser than its surroundings.
fn needs_group<S>(pred: &Pred<S>) -> bool {
    match &pred.kind {
        PredKind::Seq(seq) => seq.len() > 1,
        PredKind::Alts(alts) => {
            !alts.is_looping() && (alts.arm_count() > 1 || alts.error_branch().is_some())
        }
        PredKind::Gate(_) => true,
        _ => false,
    }
}

/// True for nodes that print as a single token, so a loop around them
/// needs no parentheses.
fn is_atomic<S>(pred: &Pred<S>) -> bool {
    if pred.pre_action.is_some() || pred.post_action.is_some() {
        return false;
    }
    matches!(
        pred.kind,
        PredKind::Terminal(_)
            | PredKind::RuleRef(_)
            | PredKind::AndPred(_)
            | PredKind::EndOfRule(_)
            | PredKind::DefaultErrorBranch
    )
}

fn write_kind<S: TerminalSet>(pred: &Pred<S>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &pred.kind {
        PredKind::Terminal(t) => write!(f, "{}", t.set()),
        PredKind::Seq(seq) => {
            if seq.is_empty() {
                return f.write_str("()");
            }
            for (i, item) in seq.items().iter().enumerate() {
                if i > 0 {
                    f.write_char(' ')?;
                }
                write_grouped(item, f)?;
            }
            Ok(())
        }
        PredKind::Alts(alts) => write_alts(alts, f),
        PredKind::Gate(gate) => {
            let op = if gate.is_equivalency() { "<=>" } else { "=>" };
            write_grouped(gate.predictor(), f)?;
            write!(f, " {op} ")?;
            write_grouped(gate.matcher(), f)
        }
        PredKind::AndPred(and) => {
            f.write_char(if and.is_not() { '!' } else { '&' })?;
            match and.condition() {
                Condition::Code(code) => write!(f, "{{{code}}}"),
                Condition::Pred(p) => write!(f, "({p})"),
            }
        }
        PredKind::RuleRef(r) => {
            f.write_str(&r.name)?;
            if !r.params.is_empty() {
                f.write_char('(')?;
                for (i, param) in r.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(param)?;
                }
                f.write_char(')')?;
            }
            Ok(())
        }
        PredKind::EndOfRule(_) => f.write_str("<end>"),
        PredKind::DefaultErrorBranch => f.write_str("default_error"),
    }
}

/// Print `pred`, parenthesized if it would otherwise merge into its
/// neighbours.
fn write_grouped<S: TerminalSet>(pred: &Pred<S>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let has_code = pred.pre_action.is_some() || pred.post_action.is_some();
    if !has_code && needs_group(pred) {
        write!(f, "({pred})")
    } else {
        write!(f, "{pred}")
    }
}

fn write_alts<S: TerminalSet>(alts: &Alternation<S>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if !alts.is_looping() {
        return write_arms(alts, f);
    }

    let suffix = if alts.mode() == LoopMode::Star { '*' } else { '?' };
    let open = match alts.greedy() {
        Some(true) => "greedy(",
        Some(false) => "nongreedy(",
        None => "(",
    };
    if let [only] = alts.arms()
        && alts.greedy().is_none()
        && alts.error_branch().is_none()
        && alts.default_arm().is_none()
        && is_atomic(only)
    {
        return write!(f, "{only}{suffix}");
    }
    f.write_str(open)?;
    write_arms(alts, f)?;
    write!(f, "){suffix}")
}

fn write_arms<S: TerminalSet>(alts: &Alternation<S>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let count = alts.arm_count();
    let mut opens = vec![0_usize; count];
    let mut closes = vec![0_usize; count];
    let mut grouped: SmallVec<[(i16, i16); 8]> = SmallVec::new();

    let divisions = alts.divisions();
    for (i, parent) in divisions.iter().enumerate() {
        if !parent.slash {
            continue;
        }
        for (lo, hi) in [(parent.left, parent.mid), (parent.mid, parent.right)] {
            if hi - lo < 2 || grouped.contains(&(lo, hi)) {
                continue;
            }
            let same_range = |d: &&crate::pred::Division| d.left == lo && d.right == hi;
            let child = divisions[..i]
                .iter()
                .rev()
                .find(same_range)
                .or_else(|| divisions[i + 1..].iter().find(same_range));
            if let Some(child) = child
                && !child.slash
                && let (Ok(lo), Ok(hi)) = (usize::try_from(lo), usize::try_from(hi))
                && hi <= count
            {
                opens[lo] += 1;
                closes[hi - 1] += 1;
                grouped.push((child.left, child.right));
            }
        }
    }

    for (i, arm) in alts.arms().iter().enumerate() {
        if i > 0 {
            let slash = divisions
                .iter()
                .any(|d| d.slash && usize::try_from(d.mid).is_ok_and(|mid| mid == i));
            f.write_str(if slash { " / " } else { " | " })?;
        }
        for _ in 0..opens[i] {
            f.write_char('(')?;
        }
        if alts.default_arm().is_some_and(|d| usize::try_from(d).is_ok_and(|d| d == i)) {
            f.write_str("default ")?;
        }
        if matches!(&arm.kind, PredKind::Alts(inner) if !inner.is_looping())
            || matches!(arm.kind, PredKind::Gate(_))
        {
            write!(f, "({arm})")?;
        } else {
            write!(f, "{arm}")?;
        }
        for _ in 0..closes[i] {
            f.write_char(')')?;
        }
    }

    if alts.default_arm() == Some(EXIT_ARM) {
        f.write_str(if count > 0 { " | default exit" } else { "default exit" })?;
    }
    if let Some(err) = alts.error_branch() {
        if count > 0 {
            f.write_str(" | ")?;
        }
        let keyword = if alts.exit_on_error() { "error" } else { "error_continue" };
        write!(f, "{keyword} {err}")?;
    }
    Ok(())
}
