//! Error types for bibliography loading.

use octavo_diagnostics::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for octavo-bibdata operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read bibliography file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse bibliography file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Convert to a diagnostic carrying the bibliography subsystem error code.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            Error::Io { .. } => "O-2-1",
            Error::Parse { .. } => "O-2-2",
        };
        Diagnostic::error(self.to_string()).with_code(code)
    }
}
