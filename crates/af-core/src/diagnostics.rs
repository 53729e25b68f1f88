//! Diagnostics sink.
//!
//! Synthesis never aborts the surrounding pipeline: every problem is reported
//! here and attached to the position of the request that triggered it.

use crate::types::SourcePos;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Synthesis for the field or structure was aborted
    Error,
    /// Non-fatal; synthesis for the field was skipped
    Warning,
}

/// A single reported problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub pos: Option<SourcePos>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            pos: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            pos: None,
        }
    }

    #[must_use]
    pub fn at(mut self, pos: Option<SourcePos>) -> Self {
        self.pos = pos;
        self
    }

    /// Format for display.
    #[must_use]
    pub fn format(&self) -> String {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
        };
        let pos = self.pos.map_or(String::new(), |p| format!(":{}", p));
        format!("[{}]{} {}", severity, pos, self.message)
    }
}

/// Receiver of warnings and errors raised during synthesis.
pub trait Diagnostics {
    fn add_warning(&mut self, pos: Option<SourcePos>, message: String);

    fn add_error(&mut self, pos: Option<SourcePos>, message: String);
}

/// Collecting diagnostics sink.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Warning)
    }

    #[must_use]
    pub fn errors_count(&self) -> usize {
        self.errors().count()
    }

    #[must_use]
    pub fn warnings_count(&self) -> usize {
        self.warnings().count()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Format as report.
    #[must_use]
    pub fn format_report(&self) -> String {
        let mut report = String::new();

        for diagnostic in &self.entries {
            report.push_str(&diagnostic.format());
            report.push('\n');
        }

        report.push_str(&format!(
            "Summary: {} errors, {} warnings\n",
            self.errors_count(),
            self.warnings_count()
        ));

        report
    }
}

impl Diagnostics for DiagnosticLog {
    fn add_warning(&mut self, pos: Option<SourcePos>, message: String) {
        debug_assert!(!message.is_empty(), "Warning message must not be empty");
        self.entries.push(Diagnostic::warning(message).at(pos));
    }

    fn add_error(&mut self, pos: Option<SourcePos>, message: String) {
        debug_assert!(!message.is_empty(), "Error message must not be empty");
        self.entries.push(Diagnostic::error(message).at(pos));
    }
}
