//! Cross-document citation consistency engine.
//!
//! This crate keeps citation state for a multi-document corpus and renders
//! citations consistently no matter which document first encounters a
//! reference:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         octavo-cite                                 │
//! │  Listings + CitationRefs ──resolve──▶ Citations ──xref──▶ Inlines   │
//! └──────────────┬──────────────────────────────┬───────────────────────┘
//!                │                              │
//!                ▼                              ▼
//! ┌──────────────────────────┐   ┌──────────────────────────────────────┐
//! │      octavo-filter       │   │           octavo-bibdata             │
//! │  (entry selection DSL)   │   │  (opaque entries, fingerprint cache) │
//! └──────────────────────────┘   └──────────────────────────────────────┘
//! ```
//!
//! Lifecycle: documents register [`Listing`]s and citation references into a
//! [`CitationRegistry`] (possibly in per-document partial registries merged
//! afterwards); [`resolve_citations`] then runs exactly once over the whole
//! corpus, selecting entries per listing, ordering them by citation
//! occurrence, labelling them through a pluggable [`LabelStyle`], and
//! materializing [`Citation`] records with corpus-unique anchors. Rendering
//! calls [`resolve_reference`] any number of times against the resolved
//! state. A changed document is invalidated and the whole pass re-runs,
//! because labels and duplicate detection are corpus-wide.

pub mod config;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod style;
pub mod types;
pub mod xref;

pub use config::CiteConfig;
pub use error::{Error, Result};
pub use registry::{CitationRegistry, Phase};
pub use resolver::resolve_citations;
pub use style::{LabelStyle, StyleRegistry};
pub use types::{Citation, CitationRef, ListKind, Listing, ListingId, RefId};
pub use xref::{
    CitationAnchorBuilder, HyperlinkBuilder, Inline, ReferenceBuilder, render_inlines,
    resolve_reference,
};
