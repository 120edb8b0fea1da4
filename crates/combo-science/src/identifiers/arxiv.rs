use std::fmt;

use crate::error::{Result, ScienceError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// New format: YYMM.NNNN or YYMM.NNNNN (with optional version)
static NEW_FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4}\.\d{4,5})(?:v(\d+))?$").unwrap());

// Old format: category/YYMMNNN
static OLD_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z\-]+(?:\.[A-Z]{2})?)/(\d{7})(?:v(\d+))?$").unwrap()
});

const URL_PREFIXES: [&str; 6] = [
    "https://arxiv.org/abs/",
    "http://arxiv.org/abs/",
    "https://www.arxiv.org/abs/",
    "https://arxiv.org/pdf/",
    "http://arxiv.org/pdf/",
    "https://www.arxiv.org/pdf/",
];

/// A parsed arXiv identifier. `id` never carries the version suffix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArxivId {
    pub id: String,
    pub version: Option<u32>,
    pub category: Option<String>,
}

impl ArxivId {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let mut stripped = input;
        for prefix in URL_PREFIXES {
            if let Some(rest) = stripped.strip_prefix(prefix) {
                stripped = rest.trim_end_matches('/').trim_end_matches(".pdf");
                break;
            }
        }
        if let Some(rest) = stripped
            .strip_prefix("arXiv:")
            .or_else(|| stripped.strip_prefix("arxiv:"))
        {
            stripped = rest.trim_start();
        }

        if let Some(caps) = NEW_FORMAT.captures(stripped) {
            return Ok(Self {
                id: caps[1].to_string(),
                version: caps.get(2).and_then(|v| v.as_str().parse().ok()),
                category: None,
            });
        }

        if let Some(caps) = OLD_FORMAT.captures(stripped) {
            return Ok(Self {
                id: format!("{}/{}", &caps[1], &caps[2]),
                version: caps.get(3).and_then(|v| v.as_str().parse().ok()),
                category: Some(caps[1].to_string()),
            });
        }

        Err(ScienceError::InvalidArxivId(input.to_string()))
    }

    /// The id with its version suffix, when one was given.
    pub fn versioned(&self) -> String {
        match self.version {
            Some(v) => format!("{}v{v}", self.id),
            None => self.id.clone(),
        }
    }

    pub fn abs_url(&self) -> String {
        format!("https://arxiv.org/abs/{}", self.id)
    }

    pub fn pdf_url(&self) -> String {
        format!("https://arxiv.org/pdf/{}", self.id)
    }
}

impl fmt::Display for ArxivId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.versioned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_format_bare() {
        let id = ArxivId::parse("2301.04567").unwrap();
        assert_eq!(id.id, "2301.04567");
        assert_eq!(id.version, None);
        assert_eq!(id.abs_url(), "https://arxiv.org/abs/2301.04567");
    }

    #[test]
    fn new_format_with_version() {
        let id = ArxivId::parse("2301.04567v2").unwrap();
        assert_eq!(id.id, "2301.04567");
        assert_eq!(id.version, Some(2));
        assert_eq!(id.to_string(), "2301.04567v2");
    }

    #[test]
    fn old_format_with_category() {
        let id = ArxivId::parse("math.CO/0601001").unwrap();
        assert_eq!(id.id, "math.CO/0601001");
        assert_eq!(id.category.as_deref(), Some("math.CO"));
    }

    #[test]
    fn prefixes_and_urls() {
        assert_eq!(ArxivId::parse("arXiv:2301.04567v5").unwrap().version, Some(5));
        assert_eq!(ArxivId::parse("arxiv: 2301.04567").unwrap().id, "2301.04567");
        assert_eq!(ArxivId::parse("https://arxiv.org/abs/2301.04567").unwrap().id, "2301.04567");
        assert_eq!(ArxivId::parse("https://arxiv.org/pdf/2301.04567v1.pdf").unwrap().versioned(), "2301.04567v1");
    }

    #[test]
    fn rejects_non_ids() {
        assert!(ArxivId::parse("12345").is_err());
        assert!(ArxivId::parse("not-arxiv").is_err());
        assert!(ArxivId::parse("123.456").is_err());
        assert!(ArxivId::parse("10.1000/xyz").is_err());
    }
}
