//! # Diagnostics
//!
//! Advisory messages produced while merging alternatives.
//!
//! Unlike [`GrammarError`](crate::error::GrammarError), a diagnostic never
//! stops construction: the merge keeps the first default arm or error branch
//! it saw, reports the conflict, and yields a best-effort tree. Callers decide
//! where messages go by implementing [`DiagnosticSink`]; [`Diagnostics`] is the
//! in-memory collector used by [`GrammarBuilder`](crate::grammar::GrammarBuilder).

use crate::basis::{Basis, TextRange};
use crate::config::GrammarConfig;
use compact_str::CompactString;
use smallvec::SmallVec;
use std::fmt::{self, Write};

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Note => "note",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Stable identifier for each kind of diagnostic the merge can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// A second arm was marked `default`; the first one is kept.
    DuplicateDefaultArm,
    /// A second error branch was supplied; the first one is kept.
    DuplicateErrorBranch,
    /// The error branch is followed by further arms.
    ErrorBranchPosition,
}

impl DiagnosticCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateDefaultArm => "alts::duplicate_default",
            Self::DuplicateErrorBranch => "alts::duplicate_error_branch",
            Self::ErrorBranchPosition => "alts::error_branch_position",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub basis: Basis,
    pub message: CompactString,
}

impl Diagnostic {
    #[must_use]
    pub fn new(
        severity: Severity,
        code: DiagnosticCode,
        basis: Basis,
        message: impl Into<CompactString>,
    ) -> Self {
        Self {
            severity,
            code,
            basis,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(code: DiagnosticCode, basis: Basis, message: impl Into<CompactString>) -> Self {
        Self::new(Severity::Error, code, basis, message)
    }

    #[must_use]
    pub fn warning(code: DiagnosticCode, basis: Basis, message: impl Into<CompactString>) -> Self {
        Self::new(Severity::Warning, code, basis, message)
    }

    /// Render the message followed by the grammar source around its location.
    #[must_use]
    pub fn format_with_context(&self, source: &str, context_chars: usize) -> String {
        let mut result = String::new();
        let _ = write!(result, "{self}");

        if let Some(range) = self.basis.range()
            && let Some((before, marked, after)) = extract_context(source, range, context_chars)
        {
            result.push_str("\n\nContext:\n");
            let _ = write!(result, "  ...{before}[{marked}]{after}...");
        }

        result
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code.as_str(), self.message)?;
        if let Some(range) = self.basis.range() {
            write!(f, " (at {range})")?;
        }
        Ok(())
    }
}

/// Extract context around a location in the grammar source.
///
/// Returns (before, marked, after) with up to `context_chars` bytes on either
/// side, or `None` if the range lies outside `source` or does not fall on
/// character boundaries.
pub fn extract_context(
    source: &str,
    range: TextRange,
    context_chars: usize,
) -> Option<(String, String, String)> {
    let start = usize::from(range.start());
    let end = usize::from(range.end());
    if start > end || end > source.len() {
        return None;
    }

    let mut context_start = start.saturating_sub(context_chars);
    while !source.is_char_boundary(context_start) {
        context_start -= 1;
    }
    let mut context_end = end.saturating_add(context_chars).min(source.len());
    while !source.is_char_boundary(context_end) {
        context_end += 1;
    }

    let before = source.get(context_start..start)?;
    let marked = source.get(start..end)?;
    let after = source.get(end..context_end)?;
    Some((before.to_string(), marked.to_string(), after.to_string()))
}

/// Destination for advisory diagnostics.
pub trait DiagnosticSink {
    fn write(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn write(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// In-memory diagnostic collector.
///
/// Diagnostics whose code has been silenced (see [`Diagnostics::silence`]) are
/// dropped on arrival.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    silenced: SmallVec<[DiagnosticCode; 2]>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector honouring the advisory switches in `config`.
    #[must_use]
    pub fn with_config(config: &GrammarConfig) -> Self {
        let mut diagnostics = Self::new();
        if !config.warn_error_branch_position {
            diagnostics.silence(DiagnosticCode::ErrorBranchPosition);
        }
        diagnostics
    }

    pub fn silence(&mut self, code: DiagnosticCode) {
        if !self.silenced.contains(&code) {
            self.silenced.push(code);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
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
    pub fn count(&self, severity: Severity) -> usize {
        self.items.iter().filter(|d| d.severity == severity).count()
    }

    #[must_use]
    pub fn count_code(&self, code: DiagnosticCode) -> usize {
        self.items.iter().filter(|d| d.code == code).count()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl DiagnosticSink for Diagnostics {
    fn write(&mut self, diagnostic: Diagnostic) {
        if !self.silenced.contains(&diagnostic.code) {
            self.items.push(diagnostic);
        }
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
