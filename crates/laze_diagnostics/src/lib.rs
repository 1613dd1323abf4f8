//! laze_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Recoverable problems found by the analysis passes are never raised; they
//! are realized as [`Diagnostic`] values, either embedded into the IR as error
//! nodes or accumulated in a [`DiagnosticCollection`] for the driver.

use laze_core::text::TextSpan;
use std::fmt;

/// Diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticCategory {
    Error,
    Warning,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Error => write!(f, "error"),
            DiagnosticCategory::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message template with a code and category.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    /// The diagnostic code (e.g., 1001).
    pub code: u32,
    /// The category of this diagnostic.
    pub category: DiagnosticCategory,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The top-level definition this diagnostic was reported for, if known.
    pub origin: Option<String>,
    /// The source span of the offending node, if the IR carried one.
    pub span: Option<TextSpan>,
    /// The message text with all placeholders substituted.
    pub message_text: String,
    /// The diagnostic code.
    pub code: u32,
    pub category: DiagnosticCategory,
}

impl Diagnostic {
    /// Create a new diagnostic without location info.
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            origin: None,
            span: None,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
        }
    }

    /// Create a new diagnostic pointing at a source span.
    pub fn with_span(span: Option<TextSpan>, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            span,
            ..Self::new(message, args)
        }
    }

    /// Attribute this diagnostic to a top-level definition.
    pub fn in_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Whether this is an error diagnostic.
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref origin) = self.origin {
            write!(f, "{}", origin)?;
            if let Some(span) = self.span {
                write!(f, "({})", span.start)?;
            }
            write!(f, ": ")?;
        }
        write!(f, "{} LZ{}: {}", self.category, self.code, self.message_text)
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// A collection of diagnostics accumulated during analysis.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.category == DiagnosticCategory::Warning)
            .count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Sort diagnostics by origin, then position, then code.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            let a_pos = a.span.map(|s| s.start).unwrap_or(0);
            let b_pos = b.span.map(|s| s.start).unwrap_or(0);
            a.origin
                .cmp(&b.origin)
                .then(a_pos.cmp(&b_pos))
                .then(a.code.cmp(&b.code))
        });
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Warning, message: $msg }
        };
    }

    // ========================================================================
    // Scope analysis (1000-1099)
    // ========================================================================
    pub const VARIABLE_0_IS_BEING_REDEFINED: DiagnosticMessage = diag!(1001, Error, "Variable '{0}' is being redefined.");
    pub const ARGUMENT_0_IS_BEING_REDEFINED: DiagnosticMessage = diag!(1002, Error, "Argument '{0}' is being redefined.");
    pub const PATTERN_VARIABLE_0_IS_BEING_REDEFINED: DiagnosticMessage = diag!(1003, Error, "Pattern variable '{0}' is bound more than once in the same branch.");

    pub const ARGUMENT_0_SHADOWS_AN_OUTER_DEFINITION: DiagnosticMessage = diag!(1050, Warning, "The argument '{0}' shadows a variable of the same name in an enclosing scope.");
    pub const BINDING_0_SHADOWS_AN_OUTER_DEFINITION: DiagnosticMessage = diag!(1051, Warning, "The binding '{0}' shadows a variable of the same name in an enclosing scope.");
    pub const PATTERN_VARIABLE_0_SHADOWS_AN_OUTER_DEFINITION: DiagnosticMessage = diag!(1052, Warning, "The pattern variable '{0}' shadows a variable of the same name in an enclosing scope.");

    // ========================================================================
    // Driver (9000-9099)
    // ========================================================================
    pub const INTERNAL_ERROR_WHILE_ANALYZING_0_1: DiagnosticMessage = diag!(9001, Error, "Internal error while analyzing '{0}': {1}");
    pub const DEFINITION_0_WAS_ALREADY_ANALYZED: DiagnosticMessage = diag!(9002, Error, "Definition '{0}' was already analyzed.");
}
