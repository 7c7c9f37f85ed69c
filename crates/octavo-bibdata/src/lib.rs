//! Bibliography data for the octavo citation engine.
//!
//! Entries are opaque records produced by an external bibliography parser and
//! consumed here in a JSON interchange form (an ordered array of entries).
//! [`BibDatabase`] caches parsed files keyed by path and skips re-parsing
//! when a file's content fingerprint is unchanged, which is what makes
//! repeated corpus resolutions cheap across incremental builds.

pub mod database;
pub mod entry;
pub mod error;
pub mod file;

pub use database::BibDatabase;
pub use entry::{BibEntry, surname};
pub use error::{Error, Result};
pub use file::{BibFile, content_fingerprint};
