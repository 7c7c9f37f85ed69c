//! The corpus-scoped citation registry.

use crate::error::{Error, Result};
use crate::style::StyleRegistry;
use crate::types::{Citation, CitationRef, Listing, ListingId, RefId};
use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Registry lifecycle phase.
///
/// Registration and merging happen while [`Phase::Registering`];
/// cross-references read only a [`Phase::Resolved`] registry. Invalidating a
/// document re-opens the registry, since any change forces a full corpus
/// re-pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Registering,
    Resolved,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Registering => write!(f, "registering"),
            Phase::Resolved => write!(f, "resolved"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct DocumentCounters {
    listings: usize,
    refs: usize,
}

/// Holds every listing and citation reference in the corpus, plus the
/// citations materialized by the consistency pass.
///
/// The registry is a plain value: per-document registration can run on
/// worker threads against isolated partial registries, which the
/// orchestrator then folds into one with [`CitationRegistry::merge`]. There
/// is no interior mutability, so readers can never observe a half-merged
/// state.
#[derive(Clone)]
pub struct CitationRegistry {
    styles: Arc<StyleRegistry>,
    phase: Phase,
    listings: LinkedHashMap<ListingId, Listing>,
    citation_refs: Vec<CitationRef>,
    citations: Vec<Citation>,
    counters: HashMap<String, DocumentCounters>,
}

impl CitationRegistry {
    pub fn new(styles: Arc<StyleRegistry>) -> Self {
        CitationRegistry {
            styles,
            phase: Phase::Registering,
            listings: LinkedHashMap::new(),
            citation_refs: Vec::new(),
            citations: Vec::new(),
            counters: HashMap::new(),
        }
    }

    /// A registry over the built-in label styles.
    pub fn with_builtin_styles() -> Self {
        CitationRegistry::new(Arc::new(StyleRegistry::builtin()))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn styles(&self) -> &Arc<StyleRegistry> {
        &self.styles
    }

    pub(crate) fn ensure_phase(&self, expected: Phase, operation: &'static str) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(Error::Phase {
                operation,
                phase: self.phase,
            })
        }
    }

    /// Register one bibliography listing.
    ///
    /// The style name is validated here, at setup time, so a typo fails the
    /// build before any resolution work happens.
    pub fn register_listing(&mut self, listing: Listing) -> Result<ListingId> {
        self.ensure_phase(Phase::Registering, "register_listing")?;
        if !self.styles.contains(&listing.style) {
            return Err(Error::UnknownStyle {
                name: listing.style.clone(),
            });
        }
        let counters = self.counters.entry(listing.document.clone()).or_default();
        counters.listings += 1;
        let id = ListingId::new(&listing.document, counters.listings);
        tracing::debug!(listing = %id, style = %listing.style, "registered listing");
        self.listings.insert(id.clone(), listing);
        Ok(id)
    }

    /// Register one citation occurrence.
    pub fn register_citation_ref(
        &mut self,
        document: &str,
        line: usize,
        keys: Vec<String>,
    ) -> Result<RefId> {
        self.ensure_phase(Phase::Registering, "register_citation_ref")?;
        let counters = self.counters.entry(document.to_string()).or_default();
        counters.refs += 1;
        let id = RefId::new(document, counters.refs);
        self.citation_refs.push(CitationRef {
            ref_id: id.clone(),
            document: document.to_string(),
            line,
            keys,
        });
        Ok(id)
    }

    /// Purge everything a document contributed.
    ///
    /// Removes the document's listings and citation references, cascades
    /// removal of citations owned by the removed listings, and re-opens the
    /// registry for registration.
    pub fn invalidate_document(&mut self, document: &str) {
        let removed: Vec<ListingId> = self
            .listings
            .iter()
            .filter(|(_, listing)| listing.document == document)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &removed {
            self.listings.remove(id);
        }
        self.citations
            .retain(|citation| !removed.contains(&citation.listing_id));
        self.citation_refs.retain(|r| r.document != document);
        self.counters.remove(document);
        self.phase = Phase::Registering;
        tracing::debug!(document, listings = removed.len(), "invalidated document");
    }

    /// Fold a partial registry into this one.
    ///
    /// Only records whose document is in `allowed_documents` are taken.
    /// Neither side may hold materialized citations, and the partial may not
    /// contribute a document this registry already holds: partials are
    /// per-document and the orchestrator must not hand the same document to
    /// two of them. All checks run before any mutation.
    pub fn merge(&mut self, other: CitationRegistry, allowed_documents: &[String]) -> Result<()> {
        self.ensure_phase(Phase::Registering, "merge")?;
        other.ensure_phase(Phase::Registering, "merge")?;
        if !self.citations.is_empty() || !other.citations.is_empty() {
            return Err(Error::MergeWithCitations);
        }
        let incoming: BTreeSet<String> = other
            .listings
            .values()
            .map(|listing| listing.document.clone())
            .chain(other.citation_refs.iter().map(|r| r.document.clone()))
            .filter(|document| allowed_documents.contains(document))
            .collect();
        for document in &incoming {
            if self.has_document(document) {
                return Err(Error::MergeOverlap {
                    document: document.clone(),
                });
            }
        }

        for (document, counters) in &other.counters {
            if incoming.contains(document) {
                self.counters.insert(document.clone(), *counters);
            }
        }
        for (id, listing) in other.listings {
            if allowed_documents.contains(&listing.document) {
                self.listings.insert(id, listing);
            }
        }
        for citation_ref in other.citation_refs {
            if allowed_documents.contains(&citation_ref.document) {
                self.citation_refs.push(citation_ref);
            }
        }
        Ok(())
    }

    fn has_document(&self, document: &str) -> bool {
        self.listings
            .values()
            .any(|listing| listing.document == document)
            || self.citation_refs.iter().any(|r| r.document == document)
    }

    /// Listings in registration order.
    pub fn listings(&self) -> impl Iterator<Item = (&ListingId, &Listing)> {
        self.listings.iter()
    }

    pub fn listing(&self, id: &ListingId) -> Option<&Listing> {
        self.listings.get(id)
    }

    pub fn citation_refs(&self) -> &[CitationRef] {
        &self.citation_refs
    }

    /// Citations materialized by the consistency pass, in listing order.
    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    /// Documents whose citation references name `full_key`.
    pub fn cited_in(&self, full_key: &str) -> BTreeSet<String> {
        self.citation_refs
            .iter()
            .filter(|r| r.keys.iter().any(|key| key == full_key))
            .map(|r| r.document.clone())
            .collect()
    }

    /// Replace the citation set and close the registry. Only the consistency
    /// pass calls this.
    pub(crate) fn install_citations(&mut self, citations: Vec<Citation>) {
        self.citations = citations;
        self.phase = Phase::Resolved;
    }
}

impl fmt::Debug for CitationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CitationRegistry")
            .field("phase", &self.phase)
            .field("listings", &self.listings.len())
            .field("citation_refs", &self.citation_refs.len())
            .field("citations", &self.citations.len())
            .finish()
    }
}
