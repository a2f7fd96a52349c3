//! # Testing Utilities
//!
//! Helpers shared by the property tests, benchmarks and fuzz target.
//!
//! [`run_script`] drives a [`GrammarBuilder`](crate::grammar::GrammarBuilder)
//! with a stack-machine program of [`ScriptOp`]s, so arbitrary byte strings
//! (from a fuzzer) or generated op lists (from `proptest`) become sequences
//! of operator calls.

pub mod script;

pub use script::*;
