//! # Error Types
//!
//! Fatal structural errors raised while constructing a grammar.
//!
//! These indicate that the sequence of construction calls itself is malformed
//! (for example a star loop placed directly inside an optional) and that no
//! meaningful tree can be produced for that subtree. Recoverable problems such
//! as a duplicated default arm are not errors; they are reported through the
//! [`DiagnosticSink`](crate::diagnostics::DiagnosticSink) instead and
//! construction continues.
//!
//! When the `diagnostics` feature is enabled, [`GrammarError`] integrates with
//! [`miette`] for rich error reporting.

use crate::basis::Basis;
use crate::grammar::RuleId;
use crate::pred::LoopMode;
use compact_str::CompactString;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarError {
    #[error("{inner} loop cannot be nested directly inside {outer} loop (at {basis})")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(grammar::nested_loop),
            help("wrap the inner loop in a sequence or merge the two loops into one")
        )
    )]
    NestedLoop {
        basis: Basis,
        outer: LoopMode,
        inner: LoopMode,
    },

    #[error("gates cannot be nested (at {basis})")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::nested_gate)))]
    NestedGate { basis: Basis },

    #[error("rule `{name}` is already defined")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::duplicate_rule)))]
    DuplicateRule { name: CompactString },

    #[error("rule `{name}` was declared but never defined")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::undefined_rule)))]
    UndefinedRule { name: CompactString },

    #[error("no rule with id {id}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::unknown_rule)))]
    UnknownRule { id: RuleId },
}

impl GrammarError {
    #[must_use]
    pub const fn nested_loop(basis: Basis, outer: LoopMode, inner: LoopMode) -> Self {
        Self::NestedLoop {
            basis,
            outer,
            inner,
        }
    }

    #[must_use]
    pub const fn nested_gate(basis: Basis) -> Self {
        Self::NestedGate { basis }
    }

    /// Source location of the construct that failed, if the error has one.
    #[must_use]
    pub const fn basis(&self) -> Option<Basis> {
        match self {
            Self::NestedLoop { basis, .. } | Self::NestedGate { basis } => Some(*basis),
            Self::DuplicateRule { .. } | Self::UndefinedRule { .. } | Self::UnknownRule { .. } => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_loop_message() {
        let err = GrammarError::nested_loop(Basis::span(0, 3), LoopMode::Opt, LoopMode::Star);
        assert_eq!(
            err.to_string(),
            "star loop cannot be nested directly inside optional loop (at 0..3)"
        );
        assert_eq!(err.basis(), Some(Basis::span(0, 3)));
    }

    #[test]
    fn test_rule_errors_have_no_basis() {
        let err = GrammarError::DuplicateRule { name: "Expr".into() };
        assert_eq!(err.to_string(), "rule `Expr` is already defined");
        assert!(err.basis().is_none());
    }
}
