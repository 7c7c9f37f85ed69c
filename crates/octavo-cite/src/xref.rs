//! Cross-reference resolution: citation keys to rendered inline nodes.

use crate::error::{CODE_KEY_NOT_FOUND, Result};
use crate::registry::{CitationRegistry, Phase};
use crate::types::{Citation, ListKind};
use octavo_diagnostics::{Diagnostic, DiagnosticSink};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed inline vocabulary cross-references render into.
///
/// Rendering to a concrete output format is the caller's job; the `Display`
/// impl gives a plain-text form for reports and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Inline {
    Text(String),
    /// A resolved hyperlink to a citation anchor in some document.
    Reference {
        document: String,
        anchor: String,
        content: String,
    },
    /// A format-native citation anchor, for backends that carry citations
    /// through their own reference machinery.
    CitationAnchor {
        document: String,
        anchor: String,
        content: String,
    },
}

impl Inline {
    /// The visible text, without link markup.
    pub fn plain_text(&self) -> &str {
        match self {
            Inline::Text(text) => text,
            Inline::Reference { content, .. } => content,
            Inline::CitationAnchor { content, .. } => content,
        }
    }
}

impl fmt::Display for Inline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inline::Text(text) => write!(f, "{text}"),
            Inline::Reference {
                document,
                anchor,
                content,
            } => write!(f, "[{content}]({document}#{anchor})"),
            Inline::CitationAnchor { anchor, content, .. } => {
                write!(f, "{content}<{anchor}>")
            }
        }
    }
}

/// Concatenated `Display` form of a rendered element.
pub fn render_inlines(inlines: &[Inline]) -> String {
    inlines.iter().map(ToString::to_string).collect()
}

/// What the output backend can do with a resolved citation.
///
/// The capability flag is the single rendering-format-sensitive branch in
/// the engine: anchor-style backends receive [`Inline::CitationAnchor`]
/// nodes directly, everything else goes through the node factory.
pub trait ReferenceBuilder {
    fn emits_citation_anchors(&self) -> bool;

    fn make_reference_node(&self, target_document: &str, anchor: &str, content: &str) -> Inline;
}

/// Builder for backends that link citations as ordinary hyperlinks.
#[derive(Debug, Default, Clone, Copy)]
pub struct HyperlinkBuilder;

impl ReferenceBuilder for HyperlinkBuilder {
    fn emits_citation_anchors(&self) -> bool {
        false
    }

    fn make_reference_node(&self, target_document: &str, anchor: &str, content: &str) -> Inline {
        Inline::Reference {
            document: target_document.to_string(),
            anchor: anchor.to_string(),
            content: content.to_string(),
        }
    }
}

/// Builder for backends with native citation anchors.
#[derive(Debug, Default, Clone, Copy)]
pub struct CitationAnchorBuilder;

impl ReferenceBuilder for CitationAnchorBuilder {
    fn emits_citation_anchors(&self) -> bool {
        true
    }

    fn make_reference_node(&self, target_document: &str, anchor: &str, content: &str) -> Inline {
        Inline::Reference {
            document: target_document.to_string(),
            anchor: anchor.to_string(),
            content: content.to_string(),
        }
    }
}

/// Render a citation reference target into an inline element.
///
/// `target` holds comma-separated citation keys. Each key resolves against
/// the materialized citations of citation-kind listings: resolved keys
/// become reference nodes (anchor = citation id, text = label), unresolved
/// keys stay as bare text with a warning. The whole element is wrapped in
/// brackets. Read-only and idempotent; requires a resolved registry.
pub fn resolve_reference(
    registry: &CitationRegistry,
    builder: &dyn ReferenceBuilder,
    from_document: &str,
    target: &str,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<Inline>> {
    registry.ensure_phase(Phase::Resolved, "resolve_reference")?;

    let keys: Vec<&str> = target.split(',').map(str::trim).collect();
    let mut inlines = vec![Inline::Text("[".to_string())];
    for (index, key) in keys.iter().enumerate() {
        if index > 0 {
            inlines.push(Inline::Text(", ".to_string()));
        }
        match find_citation(registry, key) {
            Some(citation) => match &citation.citation_id {
                Some(anchor) => {
                    let node = if builder.emits_citation_anchors() {
                        Inline::CitationAnchor {
                            document: from_document.to_string(),
                            anchor: anchor.clone(),
                            content: citation.label.clone(),
                        }
                    } else {
                        let target_document = registry
                            .listing(&citation.listing_id)
                            .map(|listing| listing.document.as_str())
                            .unwrap_or(from_document);
                        builder.make_reference_node(target_document, anchor, &citation.label)
                    };
                    inlines.push(node);
                }
                // an anchorless duplicate: keep the label, already warned
                // during the consistency pass
                None => inlines.push(Inline::Text(citation.label.clone())),
            },
            None => {
                sink.report(
                    Diagnostic::warning(format!("could not find citation key {key}"))
                        .with_code(CODE_KEY_NOT_FOUND),
                );
                inlines.push(Inline::Text((*key).to_string()));
            }
        }
    }
    inlines.push(Inline::Text("]".to_string()));
    Ok(inlines)
}

/// The citation a key resolves to: citation-kind listings only, preferring
/// the first anchored occurrence.
fn find_citation<'r>(registry: &'r CitationRegistry, key: &str) -> Option<&'r Citation> {
    let mut anchorless = None;
    for citation in registry.citations() {
        if citation.full_key != key {
            continue;
        }
        let is_citation_list = registry
            .listing(&citation.listing_id)
            .is_some_and(|listing| listing.list_kind == ListKind::CitationList);
        if !is_citation_list {
            continue;
        }
        if citation.citation_id.is_some() {
            return Some(citation);
        }
        anchorless.get_or_insert(citation);
    }
    anchorless
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_display() {
        let reference = Inline::Reference {
            document: "refs".to_string(),
            anchor: "citation-smith2009".to_string(),
            content: "Smi09".to_string(),
        };
        assert_eq!(reference.to_string(), "[Smi09](refs#citation-smith2009)");
        assert_eq!(reference.plain_text(), "Smi09");

        let anchor = Inline::CitationAnchor {
            document: "ch1".to_string(),
            anchor: "citation-smith2009".to_string(),
            content: "Smi09".to_string(),
        };
        assert_eq!(anchor.to_string(), "Smi09<citation-smith2009>");
    }

    #[test]
    fn test_render_inlines_concatenates() {
        let inlines = [
            Inline::Text("[".to_string()),
            Inline::Text("key".to_string()),
            Inline::Text("]".to_string()),
        ];
        assert_eq!(render_inlines(&inlines), "[key]");
    }

    #[test]
    fn test_unresolved_registry_is_a_phase_error() {
        let registry = CitationRegistry::with_builtin_styles();
        let sink = octavo_diagnostics::MemorySink::new();
        let err =
            resolve_reference(&registry, &HyperlinkBuilder, "intro", "x", &sink).unwrap_err();
        assert!(matches!(err, crate::error::Error::Phase { .. }));
    }
}
