//! Engine configuration.

use crate::error::{Error, Result};
use crate::style::StyleRegistry;
use crate::types::{ListKind, Listing};
use octavo_filter::Program;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Corpus-wide citation settings.
///
/// Validated up front: a missing bibliography-source list or an unknown
/// default style aborts the build before any document is processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiteConfig {
    /// Bibliography files, in order.
    pub bib_sources: Vec<PathBuf>,
    /// Style used by listings that do not name their own.
    pub default_style: String,
}

impl CiteConfig {
    pub fn new(bib_sources: Vec<PathBuf>, default_style: impl Into<String>) -> Self {
        CiteConfig {
            bib_sources,
            default_style: default_style.into(),
        }
    }

    /// Setup-time validation against the available styles.
    pub fn check(&self, styles: &StyleRegistry) -> Result<()> {
        if self.bib_sources.is_empty() {
            return Err(Error::NoBibSources);
        }
        if !styles.contains(&self.default_style) {
            return Err(Error::UnknownStyle {
                name: self.default_style.clone(),
            });
        }
        Ok(())
    }

    /// A listing pre-filled with the configured sources, the default style,
    /// and the default selection of entries cited somewhere in the corpus.
    pub fn listing(&self, document: impl Into<String>, line: usize) -> Listing {
        Listing {
            document: document.into(),
            line,
            bib_sources: self.bib_sources.clone(),
            style: self.default_style.clone(),
            list_kind: ListKind::CitationList,
            enum_kind: "arabic".to_string(),
            enum_start: 1,
            label_prefix: String::new(),
            key_prefix: String::new(),
            filter: Program::cited(),
        }
    }
}
