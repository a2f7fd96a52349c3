//! # Builder Scripts
//!
//! A tiny stack language over the builder operators. Each op pops its
//! operands from the stack and pushes the result; ops with too few operands
//! are skipped, so every byte string is a valid program.
//!
//! ```rust
//! use llkgen::testing::{ScriptConfig, ScriptOp, run_script};
//!
//! let ops = [ScriptOp::Char('a'), ScriptOp::Call(0), ScriptOp::Or, ScriptOp::Star];
//! let outcome = run_script(&ops, &ScriptConfig::default());
//! assert_eq!(outcome.stack.len(), 1);
//! assert_eq!(outcome.stack[0].to_string(), "('a' | r0)*");
//! ```

use crate::diagnostics::Diagnostics;
use crate::error::GrammarError;
use crate::grammar::{GrammarBuilder, RuleId};
use crate::pred::Pred;
use crate::terminal::CharSet;

/// One builder operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptOp {
    /// Push a single-character terminal.
    Char(char),
    /// Push a call of rule `n` (modulo the number of rules).
    Call(u8),
    Seq,
    Or,
    Ordered,
    /// Pop `b`, `a`; push `a | default b`.
    OrDefault,
    /// Pop `b`, `a`; push `a | error b`.
    OrError,
    Star,
    Opt,
    Plus,
    /// Duplicate the top of the stack.
    Dup,
}

impl ScriptOp {
    const CHARS: &'static [u8] = b"abcdxyz0";

    /// Decode one byte; every byte maps to some op.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        match byte % 16 {
            0..=3 => {
                let index = usize::from(byte / 16) % Self::CHARS.len();
                Self::Char(char::from(Self::CHARS[index]))
            }
            4 | 5 => Self::Call(byte / 16),
            6 => Self::Seq,
            7 | 8 => Self::Or,
            9 | 10 => Self::Ordered,
            11 => Self::OrDefault,
            12 => Self::OrError,
            13 => Self::Star,
            14 => match byte / 16 % 3 {
                0 => Self::Opt,
                1 => Self::Plus,
                _ => Self::Dup,
            },
            _ => Self::Ordered,
        }
    }

    #[must_use]
    pub fn decode(bytes: &[u8]) -> Vec<Self> {
        bytes.iter().copied().map(Self::from_byte).collect()
    }
}

#[derive(Debug, Clone)]
pub struct ScriptConfig {
    /// Number of rules `r0`, `r1`, ... declared before the script runs.
    pub rule_count: u8,
    /// Ops beyond this many are ignored.
    pub max_ops: usize,
    /// The stack never grows past this depth; pushes beyond it are skipped.
    pub max_stack: usize,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            rule_count: 4,
            max_ops: 4096,
            max_stack: 64,
        }
    }
}

#[derive(Debug)]
pub struct ScriptOutcome {
    /// Whatever the script left on the stack, bottom first.
    pub stack: Vec<Pred<CharSet>>,
    /// Structural errors raised by operators (the operands are dropped).
    pub errors: Vec<GrammarError>,
    pub diagnostics: Diagnostics,
}

/// Run `ops` against a fresh builder.
#[must_use]
pub fn run_script(ops: &[ScriptOp], config: &ScriptConfig) -> ScriptOutcome {
    let mut builder = GrammarBuilder::<CharSet>::new();
    let rules: Vec<RuleId> = (0..config.rule_count.max(1))
        .map(|i| builder.declare(&format!("r{i}")))
        .collect();

    let mut stack: Vec<Pred<CharSet>> = Vec::new();
    let mut errors = Vec::new();

    for &op in ops.iter().take(config.max_ops) {
        match op {
            ScriptOp::Char(c) => {
                if stack.len() < config.max_stack {
                    stack.push(builder.single(c));
                }
            }
            ScriptOp::Call(n) => {
                let id = rules[usize::from(n) % rules.len()];
                if stack.len() < config.max_stack {
                    match builder.call(id) {
                        Ok(call) => stack.push(call),
                        Err(err) => errors.push(err),
                    }
                }
            }
            ScriptOp::Dup => {
                if stack.len() < config.max_stack
                    && let Some(top) = stack.last().cloned()
                {
                    stack.push(top);
                }
            }
            ScriptOp::Star | ScriptOp::Opt | ScriptOp::Plus => {
                let Some(body) = stack.pop() else { continue };
                let result = match op {
                    ScriptOp::Star => builder.star(body),
                    ScriptOp::Opt => builder.opt(body),
                    _ => builder.plus(body),
                };
                match result {
                    Ok(pred) => stack.push(pred),
                    Err(err) => errors.push(err),
                }
            }
            ScriptOp::Seq
            | ScriptOp::Or
            | ScriptOp::Ordered
            | ScriptOp::OrDefault
            | ScriptOp::OrError => {
                if stack.len() < 2 {
                    continue;
                }
                let (Some(b), Some(a)) = (stack.pop(), stack.pop()) else {
                    continue;
                };
                let joined = match op {
                    ScriptOp::Seq => builder.seq(a, b),
                    ScriptOp::Or => builder.or(a, b),
                    ScriptOp::Ordered => builder.ordered(a, b),
                    ScriptOp::OrDefault => {
                        let b = builder.default_arm(b);
                        builder.or(a, b)
                    }
                    _ => {
                        let b = builder.error_branch(b, true);
                        builder.or(a, b)
                    }
                };
                stack.push(joined);
            }
        }
    }

    let diagnostics = builder.diagnostics().clone();
    ScriptOutcome {
        stack,
        errors,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticCode;

    #[test]
    fn test_every_byte_decodes() {
        let ops = ScriptOp::decode(&(0..=255).collect::<Vec<u8>>());
        assert_eq!(ops.len(), 256);
        assert!(ops.contains(&ScriptOp::Plus));
        assert!(ops.contains(&ScriptOp::Dup));
    }

    #[test]
    fn test_underflow_is_skipped() {
        let ops = [ScriptOp::Or, ScriptOp::Star, ScriptOp::Seq];
        let outcome = run_script(&ops, &ScriptConfig::default());
        assert!(outcome.stack.is_empty());
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_nested_loop_is_collected() {
        let ops = [ScriptOp::Char('a'), ScriptOp::Opt, ScriptOp::Star];
        let outcome = run_script(&ops, &ScriptConfig::default());
        assert!(outcome.stack.is_empty());
        assert!(matches!(outcome.errors[..], [GrammarError::NestedLoop { .. }]));
    }

    #[test]
    fn test_duplicate_default_is_diagnosed() {
        let ops = [
            ScriptOp::Call(0),
            ScriptOp::Call(1),
            ScriptOp::OrDefault,
            ScriptOp::Call(2),
            ScriptOp::OrDefault,
        ];
        let outcome = run_script(&ops, &ScriptConfig::default());
        assert_eq!(outcome.stack[0].as_alts().unwrap().arm_count(), 3);
        assert_eq!(outcome.diagnostics.count_code(DiagnosticCode::DuplicateDefaultArm), 1);
    }
}
