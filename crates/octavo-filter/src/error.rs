//! Error types for filter parsing and evaluation.

use octavo_diagnostics::Diagnostic;
use std::fmt;

/// Result type alias for filter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from parsing or evaluating a filter expression.
///
/// All of these are recoverable at the listing level: the consistency pass
/// reports them as warnings and falls back to selecting cited entries.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The source text is not a well-formed expression.
    Parse { message: String },

    /// A filter must consist of exactly one top-level expression.
    MultipleStatements { count: usize },

    /// Comparison chains (`a < b < c`) parse but do not evaluate.
    ChainedComparison { count: usize },

    /// An operator was applied to operand types it does not accept.
    TypeMismatch {
        operation: String,
        left: &'static str,
        right: &'static str,
    },

    /// A set literal element evaluated to something other than a string.
    SetElement { found: &'static str },

    /// The right operand of `%` is not a valid regular expression.
    InvalidRegex { pattern: String, message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse { message } => {
                write!(f, "syntax error: {message}")
            }
            Error::MultipleStatements { count } => {
                write!(
                    f,
                    "filter must be a single expression, found {count} statements"
                )
            }
            Error::ChainedComparison { count } => {
                write!(
                    f,
                    "comparison chains are not supported, found {count} comparators"
                )
            }
            Error::TypeMismatch {
                operation,
                left,
                right,
            } => {
                write!(
                    f,
                    "operator '{operation}' not supported between {left} and {right}"
                )
            }
            Error::SetElement { found } => {
                write!(f, "set elements must be strings, found {found}")
            }
            Error::InvalidRegex { pattern, message } => {
                write!(f, "invalid regular expression '{pattern}': {message}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Convert to a diagnostic carrying the filter subsystem error code.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            Error::Parse { .. } => "O-1-1",
            Error::MultipleStatements { .. } => "O-1-2",
            Error::ChainedComparison { .. } => "O-1-3",
            Error::TypeMismatch { .. } => "O-1-4",
            Error::SetElement { .. } => "O-1-5",
            Error::InvalidRegex { .. } => "O-1-6",
        };
        Diagnostic::error(self.to_string()).with_code(code)
    }
}
