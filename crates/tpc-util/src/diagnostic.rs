//! Diagnostic module - error and warning reporting infrastructure.
//!
//! Phases report into a shared [`Handler`] instead of returning errors:
//! lexing, parsing and analysis all continue after a problem so one run
//! surfaces as many diagnostics as possible. The driver checks
//! [`Handler::has_errors`] between phases and never runs a later phase on
//! a broken artifact.
//!
//! # Example
//!
//! ```
//! use tpc_util::{Handler, Span, Stage};
//!
//! let handler = Handler::new();
//! handler.error(Stage::Parse, "expected ';'", Span::DUMMY);
//!
//! assert!(handler.has_errors());
//! assert_eq!(handler.error_count(), 1);
//! ```

use std::cell::RefCell;
use std::fmt;

use crate::span::Span;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that prevents compilation.
    Error,
    /// A warning that doesn't prevent compilation.
    Warning,
    /// Additional information about a diagnostic.
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// The pipeline phase a diagnostic originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Lexical analysis.
    Lex,
    /// Parsing.
    Parse,
    /// Semantic analysis.
    Semantic,
    /// Unit loading.
    Unit,
    /// Driver and toolchain.
    Driver,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Lex => write!(f, "lex"),
            Stage::Parse => write!(f, "parse"),
            Stage::Semantic => write!(f, "semantic"),
            Stage::Unit => write!(f, "unit"),
            Stage::Driver => write!(f, "driver"),
        }
    }
}

/// A diagnostic message with severity, stage and location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Diagnostic severity level.
    pub level: Level,
    /// Originating pipeline stage.
    pub stage: Stage,
    /// Main diagnostic message.
    pub message: String,
    /// Source location.
    pub span: Span,
    /// Additional notes for context.
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(level: Level, stage: Stage, message: impl Into<String>, span: Span) -> Self {
        Self {
            level,
            stage,
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    /// Create an error diagnostic.
    pub fn error(stage: Stage, message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, stage, message, span)
    }

    /// Create a warning diagnostic.
    pub fn warning(stage: Stage, message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Warning, stage, message, span)
    }

    /// Add a note to the diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span == Span::DUMMY {
            write!(f, "{} {}: {}", self.stage, self.level, self.message)
        } else {
            write!(
                f,
                "{} {}: {} at {}:{}",
                self.stage, self.level, self.message, self.span.line, self.span.column
            )
        }
    }
}

/// Handler for collecting and reporting diagnostics.
///
/// Uses interior mutability so that phases holding only a shared borrow
/// can still report problems.
pub struct Handler {
    /// Collected diagnostics.
    diagnostics: RefCell<Vec<Diagnostic>>,
    /// Whether to panic on errors (for tests that expect none).
    panic_on_error: bool,
}

impl Handler {
    /// Create a new handler.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            panic_on_error: false,
        }
    }

    /// Create a handler that panics on errors (for testing).
    pub fn new_panicking() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            panic_on_error: true,
        }
    }

    /// Report an error.
    pub fn error(&self, stage: Stage, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::error(stage, message, span));
    }

    /// Report a warning.
    pub fn warning(&self, stage: Stage, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::warning(stage, message, span));
    }

    /// Emit a pre-built diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        if self.panic_on_error && diagnostic.level == Level::Error {
            panic!("diagnostic error: {}", diagnostic.message);
        }
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Check if any errors have been reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Get the number of warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Warning)
            .count()
    }

    /// Get a copy of all diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Clear all diagnostics.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_display() {
        assert_eq!(format!("{}", Level::Error), "error");
        assert_eq!(format!("{}", Level::Warning), "warning");
        assert_eq!(format!("{}", Level::Note), "note");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(format!("{}", Stage::Lex), "lex");
        assert_eq!(format!("{}", Stage::Semantic), "semantic");
    }

    #[test]
    fn test_diagnostic_display_with_span() {
        let diag = Diagnostic::error(Stage::Parse, "expected ';'", Span::new(4, 5, 2, 7));
        assert_eq!(diag.to_string(), "parse error: expected ';' at 2:7");
    }

    #[test]
    fn test_diagnostic_display_dummy_span() {
        let diag = Diagnostic::error(Stage::Driver, "no input file", Span::DUMMY);
        assert_eq!(diag.to_string(), "driver error: no input file");
    }

    #[test]
    fn test_handler_collects() {
        let handler = Handler::new();
        assert!(!handler.has_errors());
        handler.error(Stage::Lex, "unexpected character '~'", Span::DUMMY);
        handler.warning(Stage::Semantic, "unused variable", Span::DUMMY);
        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 1);
        assert_eq!(handler.warning_count(), 1);
        assert_eq!(handler.diagnostics().len(), 2);
    }

    #[test]
    fn test_handler_clear() {
        let handler = Handler::new();
        handler.error(Stage::Parse, "oops", Span::DUMMY);
        handler.clear();
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_handler_panicking() {
        let handler = Handler::new_panicking();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            handler.error(Stage::Parse, "boom", Span::DUMMY);
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_diagnostic_with_note() {
        let diag = Diagnostic::error(Stage::Semantic, "type mismatch", Span::DUMMY)
            .with_note("expected integer");
        assert_eq!(diag.notes, vec!["expected integer"]);
    }
}
