//! Registry record types: listings, citation references, resolved citations.

use octavo_filter::Program;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identifier of a registered listing, `"{document}:listing-{n}"`.
///
/// The document id is part of the identifier, so ids stay unique across
/// merged partial registries: no two partials may contribute the same
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListingId(String);

impl ListingId {
    pub(crate) fn new(document: &str, ordinal: usize) -> Self {
        ListingId(format!("{document}:listing-{ordinal}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a registered citation reference, `"{document}:ref-{n}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RefId(String);

impl RefId {
    pub(crate) fn new(document: &str, ordinal: usize) -> Self {
        RefId(format!("{document}:ref-{ordinal}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a listing renders its entries.
///
/// Only [`ListKind::CitationList`] entries receive anchors; the other kinds
/// render as plain list items and are invisible to cross-references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    CitationList,
    EnumeratedList,
    BulletedList,
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListKind::CitationList => write!(f, "citation_list"),
            ListKind::EnumeratedList => write!(f, "enumerated_list"),
            ListKind::BulletedList => write!(f, "bulleted_list"),
        }
    }
}

/// One occurrence of a bibliography directive.
///
/// Listings are registered while a document is processed and purged when the
/// document is invalidated. The filter program is parsed once at directive
/// time; evaluation errors are recovered during resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Owning document id.
    pub document: String,
    /// 1-based line of the directive in the document.
    pub line: usize,
    /// Bibliography files this listing draws from, in order.
    pub bib_sources: Vec<PathBuf>,
    /// Name of the label style used to sort and label entries.
    pub style: String,
    pub list_kind: ListKind,
    /// Sequence type for enumerated lists ("arabic", "loweralpha", ...).
    pub enum_kind: String,
    /// Sequence start for enumerated lists.
    pub enum_start: usize,
    /// Prefix prepended to every computed label.
    pub label_prefix: String,
    /// Prefix prepended to every entry key.
    pub key_prefix: String,
    /// Entry selection filter.
    pub filter: Program,
}

/// One occurrence of a citation usage, naming one or more (prefixed) keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRef {
    pub ref_id: RefId,
    /// Owning document id.
    pub document: String,
    /// 1-based line of the citation in the document.
    pub line: usize,
    /// Cited keys, including any key prefix.
    pub keys: Vec<String>,
}

/// A resolved, corpus-global citation record.
///
/// Produced only by the consistency pass; the whole set is rebuilt whenever
/// any document changes, because labels and duplicate detection are
/// corpus-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Anchor token for cross-references, or `None` when the entry is not
    /// linkable (non-citation listing, or a duplicated key).
    pub citation_id: Option<String>,
    /// The listing that produced this citation.
    pub listing_id: ListingId,
    /// Key prefix plus entry key.
    pub full_key: String,
    /// Label prefix plus computed label.
    pub label: String,
    /// The entry's raw key, without prefix.
    pub entry_key: String,
    /// The computed label, without prefix.
    pub entry_label: String,
}
