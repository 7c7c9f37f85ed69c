//! The whole-corpus consistency pass.
//!
//! Runs exactly once after every document has registered its listings and
//! citation references, and before any cross-reference resolution. For each
//! listing it selects entries with the filter expression, orders them by
//! citation occurrence across the corpus, hands them to the listing's label
//! style, and materializes [`Citation`] records with corpus-unique anchors.

use crate::error::{CODE_DUPLICATE_KEY, CODE_DUPLICATE_LABEL, Error, Result};
use crate::registry::{CitationRegistry, Phase};
use crate::types::{Citation, ListKind, Listing};
use octavo_bibdata::{BibDatabase, BibEntry};
use octavo_diagnostics::{Diagnostic, DiagnosticSink, Location, Severity};
use octavo_filter::{EvalContext, evaluate};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Resolve every listing in the registry into citations.
///
/// `reading_order` is the corpus linearization: document ids in root-first
/// depth order, produced by the build system and treated as authoritative.
/// Documents missing from it order after all linearized documents.
///
/// On success the registry transitions to [`Phase::Resolved`]; calling this
/// on an already-resolved registry is a phase error. Recoverable conditions
/// (filter fallbacks, duplicate keys, label collisions) are reported through
/// `sink`, never returned.
pub fn resolve_citations(
    registry: &mut CitationRegistry,
    bibdata: &BibDatabase,
    reading_order: &[String],
    sink: &dyn DiagnosticSink,
) -> Result<()> {
    registry.ensure_phase(Phase::Registering, "resolve_citations")?;

    let cited_keys = cited_keys_in_reading_order(registry, reading_order);
    let mut citations = Vec::new();
    let mut used_keys: HashSet<String> = HashSet::new();
    let mut used_labels: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut used_ids: HashSet<String> = HashSet::new();

    for (listing_id, listing) in registry.listings() {
        let selected = select_entries(registry, bibdata, listing, sink)?;
        let ordered = order_by_citation(selected, &cited_keys);
        let style = registry.styles().get(&listing.style)?;
        let sorted = style.sort(ordered);
        let labels = style.format_labels(&sorted);
        tracing::debug!(
            listing = %listing_id,
            entries = sorted.len(),
            style = %listing.style,
            "resolved listing"
        );

        for (entry_label, (full_key, entry)) in labels.into_iter().zip(sorted) {
            let citation_id = if listing.list_kind != ListKind::CitationList {
                // plain list item, no anchor and no duplicate warning
                None
            } else if used_keys.contains(&full_key) {
                sink.report(
                    Diagnostic::warning(format!("duplicate citation for key {full_key}"))
                        .with_code(CODE_DUPLICATE_KEY)
                        .at(Location::new(&listing.document, listing.line)),
                );
                None
            } else {
                Some(allocate_anchor(&full_key, &mut used_ids))
            };
            let label = format!("{}{}", listing.label_prefix, entry_label);
            used_keys.insert(full_key.clone());
            used_labels
                .entry(label.clone())
                .or_default()
                .insert(full_key.clone());
            citations.push(Citation {
                citation_id,
                listing_id: listing_id.clone(),
                full_key,
                label,
                entry_key: entry.key.clone(),
                entry_label,
            });
        }
    }

    for (label, keys) in &used_labels {
        if keys.len() > 1 {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            sink.report(
                Diagnostic::warning(format!(
                    "duplicate label {label} for keys {}",
                    keys.join(",")
                ))
                .with_code(CODE_DUPLICATE_LABEL),
            );
        }
    }

    registry.install_citations(citations);
    Ok(())
}

/// Every cited key, ordered by the corpus reading order of the citing
/// document and by occurrence order within a document. Keys may repeat.
fn cited_keys_in_reading_order(
    registry: &CitationRegistry,
    reading_order: &[String],
) -> Vec<String> {
    let position: HashMap<&str, usize> = reading_order
        .iter()
        .enumerate()
        .map(|(index, document)| (document.as_str(), index))
        .collect();
    let mut refs: Vec<_> = registry.citation_refs().iter().collect();
    // stable: unknown documents keep registration order after the known ones
    refs.sort_by_key(|r| {
        position
            .get(r.document.as_str())
            .copied()
            .unwrap_or(usize::MAX)
    });
    refs.iter()
        .flat_map(|r| r.keys.iter().cloned())
        .collect()
}

/// Candidate entries in file-then-in-file order, filtered by the listing's
/// expression.
///
/// A failing expression falls back, per entry, to selecting the entry iff it
/// is cited anywhere; the first failure is reported as a warning at the
/// listing's location.
fn select_entries<'e>(
    registry: &CitationRegistry,
    bibdata: &'e BibDatabase,
    listing: &Listing,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<(String, &'e BibEntry)>> {
    let mut selected = Vec::new();
    let mut reported_fallback = false;
    for path in &listing.bib_sources {
        let file = bibdata.file(path).ok_or_else(|| Error::MissingBibFile {
            path: path.clone(),
        })?;
        for entry in file.entries() {
            let full_key = format!("{}{}", listing.key_prefix, entry.key);
            let cited_in = registry.cited_in(&full_key);
            let context = EvalContext {
                entry,
                document: &listing.document,
                cited_in: &cited_in,
            };
            let keep = match evaluate(&listing.filter, &context) {
                Ok(value) => value.truthy(),
                Err(err) => {
                    if !reported_fallback {
                        let mut diagnostic = err.to_diagnostic();
                        diagnostic.severity = Severity::Warning;
                        diagnostic.message =
                            format!("{}; selecting cited entries instead", diagnostic.message);
                        sink.report(
                            diagnostic.at(Location::new(&listing.document, listing.line)),
                        );
                        reported_fallback = true;
                    }
                    !cited_in.is_empty()
                }
            };
            if keep {
                selected.push((full_key, entry));
            }
        }
    }
    Ok(selected)
}

/// Re-order filtered entries: cited keys first, in corpus citation order,
/// then the uncited remainder in bibliography-file order.
fn order_by_citation<'e>(
    mut remaining: Vec<(String, &'e BibEntry)>,
    cited_keys: &[String],
) -> Vec<(String, &'e BibEntry)> {
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut seen: HashSet<&str> = HashSet::new();
    for key in cited_keys {
        if !seen.insert(key.as_str()) {
            continue;
        }
        let mut index = 0;
        while index < remaining.len() {
            if remaining[index].0 == *key {
                ordered.push(remaining.remove(index));
            } else {
                index += 1;
            }
        }
    }
    ordered.extend(remaining);
    ordered
}

/// Allocate a corpus-unique anchor token for a citation key.
///
/// Colliding slugs are disambiguated with an increasing numeric suffix.
fn allocate_anchor(full_key: &str, used_ids: &mut HashSet<String>) -> String {
    let base = slug::slugify(format!("citation-{full_key}"));
    let anchor = if used_ids.contains(&base) {
        let mut n = 1;
        while used_ids.contains(&format!("{base}{n}")) {
            n += 1;
        }
        format!("{base}{n}")
    } else {
        base
    };
    used_ids.insert(anchor.clone());
    anchor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_by_citation_groups_and_appends_uncited() {
        let a = BibEntry::new("article", "a");
        let b = BibEntry::new("article", "b");
        let d = BibEntry::new("article", "d");
        let entries = vec![
            ("a".to_string(), &a),
            ("b".to_string(), &b),
            ("d".to_string(), &d),
        ];
        let cited = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        let ordered = order_by_citation(entries, &cited);
        let keys: Vec<&str> = ordered.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["b", "a", "d"]);
    }

    #[test]
    fn test_allocate_anchor_slugs_and_disambiguates() {
        let mut used = HashSet::new();
        assert_eq!(allocate_anchor("Smith 2009", &mut used), "citation-smith-2009");
        assert_eq!(allocate_anchor("smith.2009", &mut used), "citation-smith-20091");
        assert_eq!(allocate_anchor("smith,2009", &mut used), "citation-smith-20092");
    }
}
