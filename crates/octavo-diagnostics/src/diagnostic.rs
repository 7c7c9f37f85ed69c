//! Core diagnostic types: severities, corpus locations, and messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity of a reported diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// A fatal problem; the surrounding operation cannot complete.
    Error,
    /// A recoverable problem worth surfacing to the user.
    Warning,
    /// Informational message.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A position in the corpus: a document id plus a 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub document: String,
    pub line: usize,
}

impl Location {
    pub fn new(document: impl Into<String>, line: usize) -> Self {
        Location {
            document: document.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.document, self.line)
    }
}

/// A single diagnostic message.
///
/// Codes follow the `O-<subsystem>-<n>` scheme so messages stay searchable
/// across releases. The location is optional because some conditions (label
/// collisions, unresolved keys) are corpus-wide rather than tied to one
/// source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            code: None,
            message: message.into(),
            location: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Info, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }
        if let Some(location) = &self.location {
            write!(f, " at {}", location)?;
        }
        write!(f, ": {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let diag = Diagnostic::warning("duplicate citation for key x")
            .with_code("O-3-2")
            .at(Location::new("intro", 12));
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.code.as_deref(), Some("O-3-2"));
        assert_eq!(diag.location, Some(Location::new("intro", 12)));
    }

    #[test]
    fn test_display_full() {
        let diag = Diagnostic::warning("duplicate citation for key x")
            .with_code("O-3-2")
            .at(Location::new("intro", 12));
        assert_eq!(
            diag.to_string(),
            "warning [O-3-2] at intro:12: duplicate citation for key x"
        );
    }

    #[test]
    fn test_display_bare() {
        let diag = Diagnostic::error("missing bibliography sources");
        assert_eq!(diag.to_string(), "error: missing bibliography sources");
    }

    #[test]
    fn test_location_display() {
        assert_eq!(Location::new("chapter1", 3).to_string(), "chapter1:3");
    }
}
