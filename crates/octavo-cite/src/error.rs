//! Error types for registry, resolution, and cross-reference operations.

use crate::registry::Phase;
use octavo_diagnostics::Diagnostic;
use std::fmt;
use std::path::PathBuf;

/// Result type alias for octavo-cite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors.
///
/// Everything here indicates a configuration or orchestration problem that
/// aborts the build; recoverable per-listing conditions go through the
/// diagnostics sink instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An operation was invoked in the wrong registry phase.
    Phase {
        operation: &'static str,
        phase: Phase,
    },

    /// A listing or configuration named a label style that is not registered.
    UnknownStyle { name: String },

    /// The configuration lists no bibliography sources.
    NoBibSources,

    /// A listing's bibliography source was never loaded into the database.
    MissingBibFile { path: PathBuf },

    /// A merge would contribute a document the target registry already holds.
    MergeOverlap { document: String },

    /// A merge participant holds materialized citations.
    MergeWithCitations,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Phase { operation, phase } => {
                write!(
                    f,
                    "'{operation}' is not allowed while the registry is in the {phase} phase"
                )
            }
            Error::UnknownStyle { name } => {
                write!(f, "unknown label style '{name}'")
            }
            Error::NoBibSources => {
                write!(f, "no bibliography sources configured")
            }
            Error::MissingBibFile { path } => {
                write!(f, "bibliography file {} is not loaded", path.display())
            }
            Error::MergeOverlap { document } => {
                write!(
                    f,
                    "cannot merge partial registry: document '{document}' is already registered"
                )
            }
            Error::MergeWithCitations => {
                write!(f, "cannot merge registries holding materialized citations")
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Convert to a diagnostic carrying the citation subsystem error code.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            Error::Phase { .. } => "O-3-1",
            Error::UnknownStyle { .. } => "O-3-2",
            Error::NoBibSources => "O-3-3",
            Error::MissingBibFile { .. } => "O-3-4",
            Error::MergeOverlap { .. } => "O-3-5",
            Error::MergeWithCitations => "O-3-6",
        };
        Diagnostic::error(self.to_string()).with_code(code)
    }
}

// Warning codes for the recoverable conditions reported through the sink.
pub(crate) const CODE_DUPLICATE_KEY: &str = "O-3-7";
pub(crate) const CODE_DUPLICATE_LABEL: &str = "O-3-8";
pub(crate) const CODE_KEY_NOT_FOUND: &str = "O-3-9";
