//! Path-keyed bibliography cache.

use crate::error::{Error, Result};
use crate::file::{BibFile, content_fingerprint};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// All loaded bibliography files, keyed by path.
///
/// `load_file` re-reads a file on every call but skips the parse when the
/// content fingerprint matches the cached copy, so callers can reload the
/// whole source list on every build and unchanged files cost one hash.
#[derive(Debug, Default)]
pub struct BibDatabase {
    files: HashMap<PathBuf, BibFile>,
}

impl BibDatabase {
    pub fn new() -> Self {
        BibDatabase::default()
    }

    /// Load or refresh one bibliography file from disk.
    pub fn load_file(&mut self, path: &Path) -> Result<&BibFile> {
        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let fingerprint = content_fingerprint(&content);
        let unchanged = self
            .files
            .get(path)
            .is_some_and(|file| file.fingerprint() == fingerprint);
        if unchanged {
            tracing::debug!(
                path = %path.display(),
                "bibliography file unchanged, keeping cached entries"
            );
        } else {
            let file = BibFile::parse(path, &content)?;
            tracing::debug!(
                path = %path.display(),
                entries = file.len(),
                "parsed bibliography file"
            );
            self.files.insert(path.to_path_buf(), file);
        }
        Ok(&self.files[path])
    }

    /// Load or refresh every listed file.
    pub fn load_all(&mut self, paths: &[PathBuf]) -> Result<()> {
        for path in paths {
            self.load_file(path)?;
        }
        Ok(())
    }

    /// Insert a file parsed elsewhere.
    pub fn insert_file(&mut self, file: BibFile) {
        self.files.insert(file.path().to_path_buf(), file);
    }

    pub fn file(&self, path: &Path) -> Option<&BibFile> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::BibEntry;

    #[test]
    fn test_insert_and_lookup_preparsed_file() {
        let mut db = BibDatabase::new();
        let file = BibFile::from_entries(
            "memory.json",
            vec![BibEntry::new("article", "k1"), BibEntry::new("book", "k2")],
        );
        db.insert_file(file);

        let found = db.file(Path::new("memory.json")).unwrap();
        assert_eq!(found.len(), 2);
        assert!(db.file(Path::new("other.json")).is_none());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut db = BibDatabase::new();
        let err = db
            .load_file(Path::new("/nonexistent/octavo-refs.json"))
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
