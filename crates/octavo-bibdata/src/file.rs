//! A loaded bibliography file: content fingerprint plus ordered entries.

use crate::entry::BibEntry;
use crate::error::{Error, Result};
use hashlink::LinkedHashMap;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Fingerprint of raw file content, used to skip re-parsing unchanged files.
pub fn content_fingerprint(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("sha256:{:x}", digest)
}

/// One bibliography file's parsed contents.
///
/// Entry order is file order; the consistency pass depends on it when
/// ordering uncited entries.
#[derive(Debug, Clone)]
pub struct BibFile {
    path: PathBuf,
    fingerprint: String,
    entries: LinkedHashMap<String, BibEntry>,
}

impl BibFile {
    /// Parse file content in interchange form (a JSON array of entries).
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<BibFile> {
        let path = path.into();
        let parsed: Vec<BibEntry> = serde_json::from_str(content).map_err(|source| Error::Parse {
            path: path.clone(),
            source,
        })?;
        let fingerprint = content_fingerprint(content);
        Ok(BibFile::build(path, fingerprint, parsed))
    }

    /// Wrap entries an external parser already produced.
    pub fn from_entries(path: impl Into<PathBuf>, entries: Vec<BibEntry>) -> BibFile {
        let canonical = serde_json::to_string(&entries).unwrap_or_default();
        BibFile::build(path.into(), content_fingerprint(&canonical), entries)
    }

    fn build(path: PathBuf, fingerprint: String, parsed: Vec<BibEntry>) -> BibFile {
        let mut entries = LinkedHashMap::new();
        for entry in parsed {
            if entries.contains_key(&entry.key) {
                tracing::warn!(
                    key = %entry.key,
                    path = %path.display(),
                    "duplicate entry key in bibliography file, keeping the first"
                );
                continue;
            }
            entries.insert(entry.key.clone(), entry);
        }
        BibFile {
            path,
            fingerprint,
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Entries in file order.
    pub fn entries(&self) -> impl Iterator<Item = &BibEntry> {
        self.entries.values()
    }

    pub fn get(&self, key: &str) -> Option<&BibEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ENTRIES: &str = r#"[
        { "type": "article", "key": "b", "fields": { "year": "2001" } },
        { "type": "article", "key": "a", "fields": { "year": "2002" } }
    ]"#;

    #[test]
    fn test_parse_preserves_file_order() {
        let file = BibFile::parse("refs.json", TWO_ENTRIES).unwrap();
        let keys: Vec<&str> = file.entries().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(file.get("a").and_then(|e| e.field("year")), Some("2002"));
    }

    #[test]
    fn test_parse_rejects_malformed_content() {
        let err = BibFile::parse("refs.json", "not json").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_duplicate_keys_keep_first() {
        let content = r#"[
            { "type": "article", "key": "dup", "fields": { "year": "1999" } },
            { "type": "book", "key": "dup", "fields": { "year": "2000" } }
        ]"#;
        let file = BibFile::parse("refs.json", content).unwrap();
        assert_eq!(file.len(), 1);
        assert_eq!(file.get("dup").map(|e| e.entry_type.as_str()), Some("article"));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let one = BibFile::parse("refs.json", TWO_ENTRIES).unwrap();
        let two = BibFile::parse("refs.json", TWO_ENTRIES).unwrap();
        let other = BibFile::parse("refs.json", "[]").unwrap();
        assert_eq!(one.fingerprint(), two.fingerprint());
        assert_ne!(one.fingerprint(), other.fingerprint());
        assert!(one.fingerprint().starts_with("sha256:"));
    }
}
