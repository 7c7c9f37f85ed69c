//! Diagnostics for the octavo citation engine.
//!
//! Recoverable conditions (duplicate citation keys, label collisions, filter
//! expression fallbacks, unresolved keys) are reported through a
//! [`DiagnosticSink`] rather than returned as errors, so one corpus pass can
//! surface every problem it finds. Fatal conditions use each crate's `Error`
//! type and convert to [`Diagnostic`]s for display.

pub mod diagnostic;
pub mod sink;

pub use diagnostic::{Diagnostic, Location, Severity};
pub use sink::{DiagnosticSink, MemorySink, TracingSink};
