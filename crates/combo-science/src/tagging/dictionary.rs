use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, ScienceError};

/// One curated keyword: a canonical spelling, the catalogue page it links
/// to, an optional tag, and the other spellings that mean the same thing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DictionaryEntry {
    pub canonical: String,
    pub url: String,
    /// `None` renders a link without creating a tag.
    pub tag: Option<String>,
    pub variants: Vec<String>,
}

impl DictionaryEntry {
    pub fn new(canonical: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            canonical: canonical.into(),
            url: url.into(),
            tag: None,
            variants: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variants = variants.into_iter().map(Into::into).collect();
        self
    }

    /// The canonical term followed by its variants.
    pub fn surface_forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical.as_str()).chain(self.variants.iter().map(String::as_str))
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(alias = "catalog_url")]
    url: String,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    variants: Vec<String>,
}

/// Top-level JSON object in file order, repeated keys included.
struct RawEntries(Vec<(String, RawEntry)>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from canonical terms to dictionary entries")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((canonical, entry)) = map.next_entry()? {
                    entries.push((canonical, entry));
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Read-only keyword dictionary, validated so that every surface string
/// resolves to exactly one canonical term.
#[derive(Debug, Clone, Default)]
pub struct KeywordDictionary {
    entries: BTreeMap<String, DictionaryEntry>,
    surfaces: BTreeMap<String, String>,
}

impl KeywordDictionary {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ScienceError::DictionaryIo {
            path: path.to_path_buf(),
            source,
        })?;
        let dictionary = Self::from_json_str(&content)?;
        tracing::info!(
            path = %path.display(),
            entries = dictionary.len(),
            surfaces = dictionary.surfaces.len(),
            "loaded keyword dictionary"
        );
        Ok(dictionary)
    }

    /// Parse `{ "<canonical>": { "url": ..., "tag": ..., "variants": [...] } }`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let RawEntries(raw) = serde_json::from_str(json)?;
        Self::from_entries(raw.into_iter().map(|(canonical, entry)| DictionaryEntry {
            canonical,
            url: entry.url,
            tag: entry.tag,
            variants: entry.variants,
        }))
    }

    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = DictionaryEntry>,
    {
        let mut dictionary = Self::default();
        for entry in entries {
            dictionary.insert(entry)?;
        }
        Ok(dictionary)
    }

    fn insert(&mut self, mut entry: DictionaryEntry) -> Result<()> {
        let canonical = entry.canonical.trim().to_string();
        if canonical.is_empty() || entry.url.trim().is_empty() {
            return Err(ScienceError::EmptyTerm(canonical));
        }
        if entry.tag.as_deref().is_some_and(|t| t.trim().is_empty()) {
            entry.tag = None;
        }

        let mut variants: Vec<String> = Vec::with_capacity(entry.variants.len());
        for variant in entry.variants.drain(..) {
            let variant = variant.trim().to_string();
            if variant.is_empty() {
                return Err(ScienceError::EmptyTerm(canonical));
            }
            if variant != canonical && !variants.contains(&variant) {
                variants.push(variant);
            }
        }

        for surface in std::iter::once(&canonical).chain(variants.iter()) {
            match self.surfaces.entry(surface.clone()) {
                Entry::Occupied(existing) => {
                    return Err(ScienceError::DuplicateVariant {
                        variant: surface.clone(),
                        first: existing.get().clone(),
                        second: canonical.clone(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(canonical.clone());
                }
            }
        }

        entry.canonical = canonical.clone();
        entry.variants = variants;
        self.entries.insert(canonical, entry);
        Ok(())
    }

    pub fn get(&self, canonical: &str) -> Option<&DictionaryEntry> {
        self.entries.get(canonical)
    }

    /// The canonical term a surface string belongs to.
    pub fn canonical_for(&self, surface: &str) -> Option<&str> {
        self.surfaces.get(surface).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in canonical-term order.
    pub fn iter(&self) -> impl Iterator<Item = &DictionaryEntry> {
        self.entries.values()
    }

    /// `(surface, canonical)` for every canonical term and variant.
    pub fn surface_forms(&self) -> impl Iterator<Item = (&str, &str)> {
        self.surfaces.iter().map(|(s, c)| (s.as_str(), c.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "Schur functions": {
            "url": "https://example.org/schur",
            "tag": "schur-functions",
            "variants": ["Schur function", "Schur polynomials", "Schur functions"]
        },
        "Macdonald polynomials": {
            "catalog_url": "https://example.org/macdonald",
            "tag": null,
            "variants": []
        },
        "polynomials": { "url": "https://example.org/poly" }
    }"#;

    #[test]
    fn test_from_json_str() {
        let dict = KeywordDictionary::from_json_str(SAMPLE).unwrap();
        assert_eq!(dict.len(), 3);

        let schur = dict.get("Schur functions").unwrap();
        assert_eq!(schur.tag.as_deref(), Some("schur-functions"));
        assert_eq!(schur.variants, vec!["Schur function", "Schur polynomials"]);

        let macdonald = dict.get("Macdonald polynomials").unwrap();
        assert_eq!(macdonald.url, "https://example.org/macdonald");
        assert_eq!(macdonald.tag, None);

        assert_eq!(dict.canonical_for("Schur polynomials"), Some("Schur functions"));
        assert_eq!(dict.surface_forms().count(), 5);
    }

    #[test]
    fn test_duplicate_variant_across_entries() {
        let json = r#"{
            "Schur functions": { "url": "u1", "variants": ["Schur polynomials"] },
            "Schur polynomials": { "url": "u2" }
        }"#;
        let err = KeywordDictionary::from_json_str(json).unwrap_err();
        match err {
            ScienceError::DuplicateVariant { variant, first, second } => {
                assert_eq!(variant, "Schur polynomials");
                assert_eq!(first, "Schur functions");
                assert_eq!(second, "Schur polynomials");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_repeated_canonical_key_rejected() {
        let json = r#"{
            "Schur functions": { "url": "https://a.example/schur", "tag": "schur" },
            "Schur functions": { "url": "https://b.example/other", "tag": "other" }
        }"#;
        match KeywordDictionary::from_json_str(json).unwrap_err() {
            ScienceError::DuplicateVariant { variant, first, second } => {
                assert_eq!(variant, "Schur functions");
                assert_eq!(first, "Schur functions");
                assert_eq!(second, "Schur functions");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_variants_are_trimmed() {
        let dict = KeywordDictionary::from_entries([DictionaryEntry::new("Schur functions", "u")
            .with_variants([" Schur function ", "Schur function", " Schur functions"])])
        .unwrap();
        assert_eq!(dict.get("Schur functions").unwrap().variants, vec!["Schur function"]);
        assert_eq!(dict.canonical_for("Schur function"), Some("Schur functions"));
        assert_eq!(dict.canonical_for(" Schur function "), None);
    }

    #[test]
    fn test_shared_variant_between_entries() {
        let result = KeywordDictionary::from_entries([
            DictionaryEntry::new("parking functions", "u1").with_variants(["parking function"]),
            DictionaryEntry::new("prime parking functions", "u2").with_variants(["parking function"]),
        ]);
        assert!(matches!(result, Err(ScienceError::DuplicateVariant { .. })));
    }

    #[test]
    fn test_empty_terms_rejected() {
        assert!(matches!(
            KeywordDictionary::from_entries([DictionaryEntry::new(" ", "u")]),
            Err(ScienceError::EmptyTerm(_))
        ));
        assert!(matches!(
            KeywordDictionary::from_entries([DictionaryEntry::new("tableaux", "")]),
            Err(ScienceError::EmptyTerm(_))
        ));
        assert!(matches!(
            KeywordDictionary::from_entries([DictionaryEntry::new("tableaux", "u").with_variants([""])]),
            Err(ScienceError::EmptyTerm(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        let err = KeywordDictionary::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, ScienceError::DictionaryFormat(_)));
        assert!(err.is_dictionary_error());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let dict = KeywordDictionary::load(file.path()).unwrap();
        assert!(!dict.is_empty());
        let names: Vec<_> = dict.iter().map(|e| e.canonical.as_str()).collect();
        assert_eq!(names, vec!["Macdonald polynomials", "Schur functions", "polynomials"]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = KeywordDictionary::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ScienceError::DictionaryIo { .. }));
    }
}
