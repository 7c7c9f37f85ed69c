//! Reporting sinks for diagnostics.

use crate::diagnostic::{Diagnostic, Severity};
use std::sync::Mutex;

/// Receives diagnostics from engine operations.
///
/// Sinks are shared across parallel document processing, so reporting takes
/// `&self` and implementations must be thread-safe.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the active `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        let code = diagnostic.code.as_deref().unwrap_or("-");
        let location = diagnostic
            .location
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        match diagnostic.severity {
            Severity::Error => tracing::error!(code, location, "{}", diagnostic.message),
            Severity::Warning => tracing::warn!(code, location, "{}", diagnostic.message),
            Severity::Info => tracing::info!(code, location, "{}", diagnostic.message),
        }
    }
}

/// Collects diagnostics in memory, for tests and report tooling.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// Snapshot of everything reported so far, in report order.
    pub fn reported(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Reported diagnostics with [`Severity::Warning`].
    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.reported()
            .into_iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.reported().is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: Diagnostic) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_collects_in_order() {
        let sink = MemorySink::new();
        sink.report(Diagnostic::warning("first"));
        sink.report(Diagnostic::error("second"));

        let reported = sink.reported();
        assert_eq!(reported.len(), 2);
        assert_eq!(reported[0].message, "first");
        assert_eq!(reported[1].message, "second");
        assert_eq!(sink.warnings().len(), 1);
    }

    #[test]
    fn test_memory_sink_through_trait_object() {
        let sink = MemorySink::new();
        let as_sink: &dyn DiagnosticSink = &sink;
        as_sink.report(Diagnostic::info("via trait"));
        assert_eq!(sink.reported().len(), 1);
    }
}
