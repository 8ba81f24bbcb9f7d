//! Error taxonomy, diagnostics, and the insertion-ordered error reporter.
//!
//! Two error types live here for two different audiences: [`Error`] is the
//! library-internal error raised by resource-limit violations (recursion
//! depth, token count) and is what [`crate::config::RecursionGuard`] returns.
//! [`ParseError`] is the richer, numerically-coded diagnostic type the
//! tokenizer/state machine/parser use for lexical, syntax, semantic, and
//! internal errors, collected by an [`ErrorReporter`].

use crate::position::Position;
use crate::token::Token;

/// Core library error type for resource-limit violations.
///
/// User-defined parsers should define their own error types and implement
/// `From<Error>` to convert these into their domain-specific errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("stream not fully consumed: {remaining} tokens remaining")]
    StreamNotConsumed { remaining: usize },

    #[error("recursion limit exceeded: depth {depth} > limit {limit}")]
    RecursionLimitExceeded { depth: usize, limit: usize },

    #[error("token limit exceeded: consumed {consumed} > limit {limit}")]
    TokenLimitExceeded { consumed: usize, limit: usize },
}

/// A numerically-coded error identity, grouped into taxonomy ranges:
/// lexical (100-199), syntax (200-299), semantic (300-399), internal
/// (900-999).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    // Lexical (100-199)
    pub const UNKNOWN_CHARACTER: ErrorCode = ErrorCode(100);
    pub const INVALID_ESCAPE_SEQUENCE: ErrorCode = ErrorCode(101);
    pub const UNTERMINATED_STRING: ErrorCode = ErrorCode(102);
    pub const INVALID_NUMBER_FORMAT: ErrorCode = ErrorCode(103);

    // Syntax (200-299)
    pub const UNEXPECTED_TOKEN: ErrorCode = ErrorCode(200);
    pub const UNEXPECTED_END_OF_INPUT: ErrorCode = ErrorCode(201);
    pub const MISSING_TOKEN: ErrorCode = ErrorCode(202);
    pub const INVALID_SYNTAX: ErrorCode = ErrorCode(203);

    // Semantic (300-399) — reserved, raised only by user actions.
    pub const DUPLICATE_IDENTIFIER: ErrorCode = ErrorCode(300);
    pub const UNDECLARED_IDENTIFIER: ErrorCode = ErrorCode(301);
    pub const TYPE_MISMATCH: ErrorCode = ErrorCode(302);

    // Internal (900-999)
    pub const INTERNAL_ERROR: ErrorCode = ErrorCode(900);
    pub const STATE_MACHINE_ERROR: ErrorCode = ErrorCode(901);
    pub const MEMORY_ERROR: ErrorCode = ErrorCode(902);
    pub const TOO_MANY_ERRORS: ErrorCode = ErrorCode(903);

    /// The default severity for this code's taxonomy range.
    pub fn default_severity(self) -> Severity {
        match self.0 {
            100..=199 => Severity::Error,
            200..=299 => Severity::Error,
            300..=399 => Severity::Warning,
            900..=999 => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

/// Error severity. Fatal errors propagate out of `parse` immediately;
/// warnings never block `throw_if_errors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

/// A single diagnostic: code, severity, position, message, and optional
/// context for recovery/display.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub code: ErrorCode,
    pub severity: Severity,
    pub position: Position,
    pub message: String,
    pub token: Option<Token<'static>>,
    pub expected: Vec<u32>,
    pub state: Option<(u32, String)>,
    pub hint: Option<String>,
}

impl ParseError {
    pub fn new(code: ErrorCode, position: Position, message: impl Into<String>) -> Self {
        Self {
            severity: code.default_severity(),
            code,
            position,
            message: message.into(),
            token: None,
            expected: Vec::new(),
            state: None,
            hint: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_token(mut self, token: Token<'static>) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_expected(mut self, expected: Vec<u32>) -> Self {
        self.expected = expected;
        self
    }

    pub fn with_state(mut self, id: u32, name: impl Into<String>) -> Self {
        self.state = Some((id, name.into()));
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {:?}: {}",
            self.position, self.severity, self.message
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

/// Raised by [`ErrorReporter::throw_if_errors`] when any non-warning
/// diagnostic has been recorded, and by [`ErrorReporter::report`] once
/// `max_errors` is exceeded.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParserError {
    #[error("{count} error(s) reported during parsing")]
    HasErrors { count: usize },

    #[error("too many errors: {count} exceeds the configured limit of {limit}")]
    TooManyErrors { count: usize, limit: usize },
}

/// Collects diagnostics in insertion order, without deduplication (per the
/// design notes: rendering is a pure function of the collected errors and
/// the original source — dedup is the renderer's business, not the
/// reporter's).
#[derive(Debug, Default)]
pub struct ErrorReporter {
    entries: Vec<ParseError>,
    max_errors: usize,
}

impl ErrorReporter {
    pub fn new(max_errors: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_errors,
        }
    }

    /// Records a diagnostic in insertion order. Returns `Err` once the
    /// number of non-warning diagnostics recorded exceeds `max_errors`.
    pub fn report(&mut self, error: ParseError) -> Result<(), ParserError> {
        self.entries.push(error);
        let count = self.errors().count();
        if count > self.max_errors {
            return Err(ParserError::TooManyErrors {
                count,
                limit: self.max_errors,
            });
        }
        Ok(())
    }

    /// All recorded diagnostics, in insertion order.
    pub fn all(&self) -> &[ParseError] {
        &self.entries
    }

    /// Non-warning diagnostics, in insertion order.
    pub fn errors(&self) -> impl Iterator<Item = &ParseError> {
        self.entries.iter().filter(|e| !e.is_warning())
    }

    /// Warning diagnostics, in insertion order.
    pub fn warnings(&self) -> impl Iterator<Item = &ParseError> {
        self.entries.iter().filter(|e| e.is_warning())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Raises a generic [`ParserError`] iff any non-warning diagnostic
    /// remains.
    pub fn throw_if_errors(&self) -> Result<(), ParserError> {
        let count = self.errors().count();
        if count > 0 {
            Err(ParserError::HasErrors { count })
        } else {
            Ok(())
        }
    }

    /// Renders every recorded diagnostic to `sink`, one per line, as
    /// `line:column: severity: message`, with an optional single-line source
    /// snippet and caret when `source` is supplied. A pure function of the
    /// collected errors and the source text — no color, no terminal
    /// assumptions.
    pub fn print_errors(&self, sink: &mut dyn std::fmt::Write, source: Option<&str>) -> std::fmt::Result {
        for entry in &self.entries {
            writeln!(
                sink,
                "{}: {}: {}",
                entry.position,
                severity_label(entry.severity),
                entry.message
            )?;
            if let Some(src) = source {
                if let Some(line) = src.lines().nth((entry.position.line - 1) as usize) {
                    writeln!(sink, "    {}", line)?;
                    let caret_offset = entry.position.column.saturating_sub(1) as usize;
                    writeln!(sink, "    {}^", " ".repeat(caret_offset))?;
                }
            }
        }
        Ok(())
    }
}

fn severity_label(s: Severity) -> &'static str {
    match s {
        Severity::Warning => "warning",
        Severity::Error => "error",
        Severity::Fatal => "fatal",
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
