//! Pluggable label styles: sorting and label formatting for listings.

use crate::error::{Error, Result};
use octavo_bibdata::{BibEntry, surname};
use std::collections::HashMap;
use std::sync::Arc;

/// Sorts a listing's entries and computes their labels.
///
/// `sort` may impose a stable secondary order on top of the resolver's
/// citation-then-file order; `format_labels` returns one label per entry,
/// positionally aligned with the sorted list. Both are pure functions of
/// their input.
pub trait LabelStyle: Send + Sync {
    /// The name this style is registered under.
    fn name(&self) -> &'static str;

    fn sort<'e>(&self, entries: Vec<(String, &'e BibEntry)>) -> Vec<(String, &'e BibEntry)>;

    fn format_labels(&self, entries: &[(String, &BibEntry)]) -> Vec<String>;
}

/// Label styles selectable by name.
///
/// An unknown name is a fatal configuration error, raised when a listing or
/// configuration is set up rather than during resolution.
#[derive(Clone)]
pub struct StyleRegistry {
    styles: HashMap<String, Arc<dyn LabelStyle>>,
}

impl StyleRegistry {
    /// A registry with no styles; callers register their own.
    pub fn empty() -> Self {
        StyleRegistry {
            styles: HashMap::new(),
        }
    }

    /// The built-in styles: `alpha`, `plain`, `unsrt`, `unsrtalpha`.
    pub fn builtin() -> Self {
        let mut registry = StyleRegistry::empty();
        registry.register(Arc::new(AlphaStyle));
        registry.register(Arc::new(PlainStyle));
        registry.register(Arc::new(UnsrtStyle));
        registry.register(Arc::new(UnsrtAlphaStyle));
        registry
    }

    pub fn register(&mut self, style: Arc<dyn LabelStyle>) {
        self.styles.insert(style.name().to_string(), style);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn LabelStyle>> {
        self.styles
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownStyle {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.styles.contains_key(name)
    }

    /// Registered style names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.styles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        StyleRegistry::builtin()
    }
}

impl std::fmt::Debug for dyn LabelStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelStyle")
            .field("name", &self.name())
            .finish()
    }
}

impl std::fmt::Debug for StyleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleRegistry")
            .field("styles", &self.names())
            .finish()
    }
}

/// Author names, falling back to editors when there are no authors.
fn primary_names(entry: &BibEntry) -> &[String] {
    let authors = entry.persons("author");
    if authors.is_empty() {
        entry.persons("editor")
    } else {
        authors
    }
}

/// Sort key shared by the sorting styles: surnames, then year, then title.
fn author_year_title_key(entry: &BibEntry) -> (String, String, String) {
    let surnames = primary_names(entry)
        .iter()
        .map(|name| surname(name).to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    (
        surnames,
        entry.field("year").unwrap_or_default().to_string(),
        entry.field("title").unwrap_or_default().to_lowercase(),
    )
}

/// Stable sort by (author surnames, year, title). The resolver's incoming
/// order is the tiebreaker.
fn sort_by_author_year_title<'e>(
    mut entries: Vec<(String, &'e BibEntry)>,
) -> Vec<(String, &'e BibEntry)> {
    entries.sort_by_cached_key(|(_, entry)| author_year_title_key(entry));
    entries
}

/// Alpha-style base label: an author abbreviation plus a two-digit year.
fn alpha_base(entry: &BibEntry) -> String {
    let names = primary_names(entry);
    let stem: String = if names.is_empty() {
        entry.key.chars().take(3).collect()
    } else if names.len() == 1 {
        surname(&names[0]).chars().take(3).collect()
    } else {
        let initials: String = names
            .iter()
            .take(if names.len() > 4 { 3 } else { 4 })
            .filter_map(|name| surname(name).chars().next())
            .collect();
        if names.len() > 4 {
            format!("{initials}+")
        } else {
            initials
        }
    };
    let year = entry.field("year").unwrap_or_default();
    let year_chars: Vec<char> = year.chars().collect();
    let year_suffix: String = year_chars[year_chars.len().saturating_sub(2)..]
        .iter()
        .collect();
    format!("{stem}{year_suffix}")
}

/// Alpha labels with `a`, `b`, ... suffixes applied to every member of a
/// colliding group.
fn alpha_labels(entries: &[(String, &BibEntry)]) -> Vec<String> {
    let bases: Vec<String> = entries.iter().map(|(_, entry)| alpha_base(entry)).collect();
    let mut totals: HashMap<&str, usize> = HashMap::new();
    for base in &bases {
        *totals.entry(base.as_str()).or_insert(0) += 1;
    }
    let mut assigned: HashMap<&str, usize> = HashMap::new();
    bases
        .iter()
        .map(|base| {
            if totals[base.as_str()] > 1 {
                let n = assigned.entry(base.as_str()).or_insert(0);
                let suffix = (b'a' + (*n % 26) as u8) as char;
                *n += 1;
                format!("{base}{suffix}")
            } else {
                base.clone()
            }
        })
        .collect()
}

/// Positional numeric labels.
fn numeric_labels(count: usize) -> Vec<String> {
    (1..=count).map(|n| n.to_string()).collect()
}

/// Author-year abbreviation labels over an author/year/title sort.
pub struct AlphaStyle;

impl LabelStyle for AlphaStyle {
    fn name(&self) -> &'static str {
        "alpha"
    }

    fn sort<'e>(&self, entries: Vec<(String, &'e BibEntry)>) -> Vec<(String, &'e BibEntry)> {
        sort_by_author_year_title(entries)
    }

    fn format_labels(&self, entries: &[(String, &BibEntry)]) -> Vec<String> {
        alpha_labels(entries)
    }
}

/// Numeric labels over an author/year/title sort.
pub struct PlainStyle;

impl LabelStyle for PlainStyle {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn sort<'e>(&self, entries: Vec<(String, &'e BibEntry)>) -> Vec<(String, &'e BibEntry)> {
        sort_by_author_year_title(entries)
    }

    fn format_labels(&self, entries: &[(String, &BibEntry)]) -> Vec<String> {
        numeric_labels(entries.len())
    }
}

/// Numeric labels in the resolver's citation-then-file order.
pub struct UnsrtStyle;

impl LabelStyle for UnsrtStyle {
    fn name(&self) -> &'static str {
        "unsrt"
    }

    fn sort<'e>(&self, entries: Vec<(String, &'e BibEntry)>) -> Vec<(String, &'e BibEntry)> {
        entries
    }

    fn format_labels(&self, entries: &[(String, &BibEntry)]) -> Vec<String> {
        numeric_labels(entries.len())
    }
}

/// Alpha labels in the resolver's citation-then-file order.
pub struct UnsrtAlphaStyle;

impl LabelStyle for UnsrtAlphaStyle {
    fn name(&self) -> &'static str {
        "unsrtalpha"
    }

    fn sort<'e>(&self, entries: Vec<(String, &'e BibEntry)>) -> Vec<(String, &'e BibEntry)> {
        entries
    }

    fn format_labels(&self, entries: &[(String, &BibEntry)]) -> Vec<String> {
        alpha_labels(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smith() -> BibEntry {
        BibEntry::new("article", "smith2009")
            .with_field("year", "2009")
            .with_field("title", "A Study")
            .with_person("author", "John Smith")
    }

    fn keyed<'e>(entries: &'e [BibEntry]) -> Vec<(String, &'e BibEntry)> {
        entries.iter().map(|e| (e.key.clone(), e)).collect()
    }

    #[test]
    fn test_registry_lookup() {
        let registry = StyleRegistry::builtin();
        assert!(registry.contains("alpha"));
        assert_eq!(registry.get("unsrt").unwrap().name(), "unsrt");
        assert_eq!(
            registry.get("fancy").unwrap_err(),
            Error::UnknownStyle {
                name: "fancy".to_string()
            }
        );
        assert_eq!(registry.names(), ["alpha", "plain", "unsrt", "unsrtalpha"]);
    }

    #[test]
    fn test_alpha_single_author() {
        assert_eq!(alpha_base(&smith()), "Smi09");
    }

    #[test]
    fn test_alpha_multiple_authors_use_initials() {
        let entry = BibEntry::new("article", "sd2010")
            .with_field("year", "2010")
            .with_person("author", "John Smith")
            .with_person("author", "Jane Doe");
        assert_eq!(alpha_base(&entry), "SD10");
    }

    #[test]
    fn test_alpha_many_authors_truncate_with_plus() {
        let mut entry = BibEntry::new("article", "many1999").with_field("year", "1999");
        for name in ["A One", "B Two", "C Three", "D Four", "E Five"] {
            entry = entry.with_person("author", name);
        }
        assert_eq!(alpha_base(&entry), "OTT+99");
    }

    #[test]
    fn test_alpha_no_names_uses_key() {
        let entry = BibEntry::new("misc", "anon2000").with_field("year", "2000");
        assert_eq!(alpha_base(&entry), "ano00");
    }

    #[test]
    fn test_alpha_editor_fallback() {
        let entry = BibEntry::new("book", "coll2005")
            .with_field("year", "2005")
            .with_person("editor", "Pat Lee");
        assert_eq!(alpha_base(&entry), "Lee05");
    }

    #[test]
    fn test_alpha_collision_suffixes_whole_group() {
        let entries = [
            smith(),
            BibEntry::new("article", "smith2009b")
                .with_field("year", "2009")
                .with_person("author", "Ann Smith"),
            BibEntry::new("book", "jones2010")
                .with_field("year", "2010")
                .with_person("author", "Mary Jones"),
        ];
        let labels = alpha_labels(&keyed(&entries));
        assert_eq!(labels, ["Smi09a", "Smi09b", "Jon10"]);
    }

    #[test]
    fn test_plain_sorts_and_numbers() {
        let entries = [
            BibEntry::new("book", "z")
                .with_field("year", "2001")
                .with_person("author", "Zed Zulu"),
            BibEntry::new("book", "a")
                .with_field("year", "2001")
                .with_person("author", "Ann Alpha"),
        ];
        let style = PlainStyle;
        let sorted = style.sort(keyed(&entries));
        let keys: Vec<&str> = sorted.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["a", "z"]);
        assert_eq!(style.format_labels(&sorted), ["1", "2"]);
    }

    #[test]
    fn test_sort_is_stable_on_equal_keys() {
        let entries = [
            smith(),
            BibEntry::new("article", "smith2009-second")
                .with_field("year", "2009")
                .with_field("title", "A Study")
                .with_person("author", "John Smith"),
        ];
        let sorted = sort_by_author_year_title(keyed(&entries));
        let keys: Vec<&str> = sorted.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["smith2009", "smith2009-second"]);
    }

    #[test]
    fn test_unsrt_preserves_order() {
        let entries = [
            BibEntry::new("book", "z").with_person("author", "Zed Zulu"),
            BibEntry::new("book", "a").with_person("author", "Ann Alpha"),
        ];
        let style = UnsrtStyle;
        let sorted = style.sort(keyed(&entries));
        let keys: Vec<&str> = sorted.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["z", "a"]);
        assert_eq!(style.format_labels(&sorted), ["1", "2"]);
    }
}
