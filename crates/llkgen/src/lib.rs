//! # llkgen
//!
//! Grammar predicate trees for an LL(k) parser generator, and the operator
//! layer that builds them.
//!
//! ## Overview
//!
//! A rule body is a tree of [`Pred`] nodes: terminals, sequences,
//! alternations (including optional elements and star loops), gates,
//! zero-width assertions, and calls of other rules. The interesting part is
//! how alternations are assembled:
//!
//! - `a | b | c` always flattens into one alternation with three arms,
//!   whichever way the operators associate
//! - two terminal alternatives collapse into a single terminal set
//! - every join is recorded as a [`Division`], so ambiguity between arms the
//!   user separated with the ordered operator `/` is suppressed, and the
//!   original grouping can be printed back
//! - duplicate default arms and misplaced error branches are reported to a
//!   [`DiagnosticSink`] without aborting construction
//!
//! Lookahead analysis and code generation are downstream consumers; they
//! query alternations through [`Alternation::should_report_ambiguity`] and
//! friends, and may attach per-node results with [`Pred::attach_analysis`].
//!
//! ## Quick Start
//!
//! ```rust
//! use llkgen::{GrammarBuilder, terminal::CharSet};
//!
//! let mut b = GrammarBuilder::<CharSet>::new();
//! let int = b.declare("Int");
//! let float = b.declare("Float");
//! let (i, f) = (b.call(int).unwrap(), b.call(float).unwrap());
//! let number = b.ordered(f, i);
//! let id = b.rule("Number", number).unwrap();
//!
//! let body = b.grammar().get(id).unwrap().pred.as_ref().unwrap();
//! assert_eq!(body.to_string(), "Float / Int");
//! assert!(body.as_alts().unwrap().should_suppress_warning(0, 1, 0));
//! ```
//!
//! ## Feature Flags
//!
//! - `diagnostics`: [`miette`](https://docs.rs/miette) integration for
//!   [`GrammarError`]
//! - `serialize`: serde support for locations, divisions and
//!   [`GrammarConfig`]

pub mod basis;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod grammar;
pub mod pred;
pub mod terminal;
pub mod testing;

pub use basis::{Basis, TextRange, TextSize};
pub use config::GrammarConfig;
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Diagnostics, Severity};
pub use error::GrammarError;
pub use grammar::{Grammar, GrammarBuilder, Rule, RuleId};
pub use pred::{
    Alternation, AndPred, BranchMode, Condition, Division, EXIT_ARM, Gate, LoopMode, Pred,
    PredKind, ResultSaver, RuleRef, Seq,
};
pub use terminal::{CharSet, KindSet, RangeSet, TerminalSet};
