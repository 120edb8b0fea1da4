use combo_core::TagType;
use serde::Serialize;

use super::msc::extract_msc_codes;

/// The corpus-defining category, which every paper carries.
pub const DEFAULT_EXCLUDED_CATEGORY: &str = "math.CO";

/// Tags recomputed from a paper's metadata on every ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivedTags {
    pub arxiv: Vec<String>,
    pub msc: Vec<String>,
}

impl DerivedTags {
    pub fn len(&self) -> usize {
        self.arxiv.len() + self.msc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arxiv.is_empty() && self.msc.is_empty()
    }

    pub fn to_pairs(&self) -> Vec<(String, TagType)> {
        self.arxiv
            .iter()
            .map(|name| (name.clone(), TagType::Arxiv))
            .chain(self.msc.iter().map(|code| (code.clone(), TagType::Msc)))
            .collect()
    }
}

/// Derive `arxiv` tags from `categories` (minus `math.CO`) and `msc` tags
/// from the comment.
pub fn derive_tags(categories: &[String], comment: Option<&str>) -> DerivedTags {
    derive_tags_excluding(categories, comment, &[DEFAULT_EXCLUDED_CATEGORY])
}

pub fn derive_tags_excluding<S: AsRef<str>>(
    categories: &[String],
    comment: Option<&str>,
    excluded: &[S],
) -> DerivedTags {
    let mut arxiv: Vec<String> = categories
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty() && !excluded.iter().any(|e| e.as_ref() == *c))
        .map(String::from)
        .collect();
    arxiv.sort();
    arxiv.dedup();

    DerivedTags {
        arxiv,
        msc: comment.map(extract_msc_codes).unwrap_or_default(),
    }
}
