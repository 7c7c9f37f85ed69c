//! The opaque bibliography entry record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One bibliography entry in interchange form.
///
/// Entries come out of an external bibliography parser; the engine never
/// interprets fields beyond string lookups, so everything stays text. Ordered
/// maps keep serialized output stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibEntry {
    /// The entry's type tag ("article", "book", ...).
    #[serde(rename = "type")]
    pub entry_type: String,
    /// The entry's key, unique within its file.
    pub key: String,
    /// Field name -> field text.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Role name ("author", "editor") -> ordered display names.
    #[serde(default)]
    pub persons: BTreeMap<String, Vec<String>>,
}

impl BibEntry {
    pub fn new(entry_type: impl Into<String>, key: impl Into<String>) -> Self {
        BibEntry {
            entry_type: entry_type.into(),
            key: key.into(),
            fields: BTreeMap::new(),
            persons: BTreeMap::new(),
        }
    }

    /// Set a field, builder style.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Append a person name under a role, builder style.
    pub fn with_person(mut self, role: impl Into<String>, name: impl Into<String>) -> Self {
        self.persons.entry(role.into()).or_default().push(name.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Person names under a role, empty when the role is absent.
    pub fn persons(&self, role: &str) -> &[String] {
        self.persons.get(role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names under a role joined with `" and "`, or `None` when the role is
    /// absent.
    pub fn joined_names(&self, role: &str) -> Option<String> {
        self.persons.get(role).map(|names| names.join(" and "))
    }
}

/// Best-effort surname of an opaque display name: the part before the first
/// comma when present ("Knuth, Donald E."), otherwise the last
/// whitespace-separated token ("Donald E. Knuth").
pub fn surname(name: &str) -> &str {
    if let Some((last, _)) = name.split_once(',') {
        last.trim()
    } else {
        name.split_whitespace().next_back().unwrap_or(name)
    }
}
