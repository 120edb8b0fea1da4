use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A paper as stored in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: i64,
    pub arxiv_id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    pub primary_category: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Paper {
    /// The arXiv id with any trailing `vN` version suffix removed.
    pub fn versionless_id(&self) -> &str {
        strip_version(&self.arxiv_id)
    }

    pub fn is_published(&self) -> bool {
        self.doi.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// Ingestion payload, as produced by the external metadata fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPaper {
    pub arxiv_id: String,
    pub title: String,
    #[serde(rename = "abstract", alias = "abstract_text", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub published: DateTime<Utc>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub journal_ref: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    pub primary_category: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl NewPaper {
    pub fn new(arxiv_id: impl Into<String>, title: impl Into<String>, published: DateTime<Utc>) -> Self {
        Self {
            arxiv_id: arxiv_id.into(),
            title: title.into(),
            abstract_text: String::new(),
            authors: Vec::new(),
            published,
            updated: None,
            comment: None,
            journal_ref: None,
            doi: None,
            primary_category: "math.CO".to_string(),
            categories: vec!["math.CO".to_string()],
        }
    }
}

/// Strip a trailing `vN` from an arXiv identifier.
pub fn strip_version(arxiv_id: &str) -> &str {
    match arxiv_id.rfind('v') {
        Some(pos)
            if pos > 0
                && pos + 1 < arxiv_id.len()
                && arxiv_id[pos + 1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            &arxiv_id[..pos]
        }
        _ => arxiv_id,
    }
}
