//! Filter expression language for bibliography listings.
//!
//! Listings select entries from loaded bibliography files with a small
//! Python-flavored expression language:
//!
//! ```text
//! type == "article" and author % "Smith" and not docname in {"draft"}
//! ```
//!
//! Parse once with [`parse_filter`], then evaluate the resulting [`Program`]
//! against a per-entry [`EvalContext`] with [`evaluate`]. Identifiers read
//! entry metadata (`type`, `key`, `author`, or any field name) or the
//! citation context (`cited`, `docname`, `docnames`). The result coerces to
//! a selection decision via [`Value::truthy`].
//!
//! Evaluation never panics; anything malformed surfaces as an [`Error`]
//! that callers typically downgrade to a warning plus a fallback selection.

pub mod ast;
pub mod error;
pub mod eval;
pub mod parser;

pub use ast::{BinaryOp, CompareOp, Expr, LogicalOp, Program};
pub use error::{Error, Result};
pub use eval::{EvalContext, Value, evaluate};
pub use parser::parse_filter;
