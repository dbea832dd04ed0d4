//! Diagnostic module - the per-compilation diagnostic sink.
//!
//! Compile-time problems are never propagated as `Err` values; every phase
//! reports into a shared [`Handler`] and carries on. A fresh handler is
//! created for each compilation, which is what clears the previous run's
//! diagnostics.

use crate::Span;
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity level.
///
/// # Examples
///
/// ```
/// use vextc_util::Severity;
///
/// assert_eq!(format!("{}", Severity::Error), "error");
/// assert_eq!(format!("{}", Severity::Hint), "hint");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// A problem that prevents emission and execution.
    Error,
    /// A suspicious construct; compilation still succeeds.
    Warning,
    /// Additional information about a construct.
    Info,
    /// A low-priority suggestion.
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "information"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

/// A diagnostic message with severity and a 1-based source range.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,
    /// Main diagnostic message.
    pub message: String,
    /// Start line (1-based; 0 for position-less runtime errors).
    pub start_line: u32,
    /// Start column (1-based).
    pub start_col: u32,
    /// End line (inclusive).
    pub end_line: u32,
    /// End column (inclusive).
    pub end_col: u32,
}

impl Diagnostic {
    /// Create a diagnostic covering a single-line span.
    pub fn new(severity: Severity, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity,
            message: message.into(),
            start_line: span.line,
            start_col: span.start_col,
            end_line: span.line,
            end_col: span.end_col,
        }
    }

    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Error, message, span)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Warning, message, span)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({}:{})",
            self.severity, self.message, self.start_line, self.start_col
        )
    }
}

/// Sink for collecting diagnostics during one compilation.
///
/// The handler is shared by reference between the lexer, parser and
/// analyzer, so the collection lives behind a `RefCell`.
///
/// # Examples
///
/// ```
/// use vextc_util::{Handler, Span};
///
/// let handler = Handler::new();
/// handler.error("unexpected token", Span::point(1, 4));
/// assert!(handler.has_errors());
/// assert_eq!(handler.error_count(), 1);
/// ```
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Create a new empty handler.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Report an error at the given span.
    pub fn error(&self, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::error(message, span));
    }

    /// Report a warning at the given span.
    pub fn warning(&self, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::warning(message, span));
    }

    /// Report an informational diagnostic at the given span.
    pub fn info(&self, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::new(Severity::Info, message, span));
    }

    /// Report a hint at the given span.
    pub fn hint(&self, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::new(Severity::Hint, message, span));
    }

    /// Emit a pre-built diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Check if any errors have been reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Number of error-severity diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Number of warning-severity diagnostics.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Snapshot of all collected diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Consume the handler, returning the collected diagnostics.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_inner()
    }
}
