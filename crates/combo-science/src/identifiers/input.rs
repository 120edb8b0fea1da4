use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{Result, ScienceError};
use crate::identifiers::{arxiv::ArxivId, doi::Doi};

static ARXIV_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)arxiv\.org/(?:abs|pdf)/(\d{4}\.\d{4,5}(?:v\d+)?)").unwrap()
});

/// What a user pasted into a "generate BibTeX" box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BibInput {
    Arxiv(ArxivId),
    Doi(Doi),
}

impl BibInput {
    /// arXiv URLs and ids win over DOIs; anything else is rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ScienceError::UnrecognizedInput(String::new()));
        }

        if input.to_ascii_lowercase().contains("arxiv.org") {
            if let Some(id) = ARXIV_URL
                .captures(input)
                .and_then(|caps| ArxivId::parse(&caps[1]).ok())
            {
                return Ok(Self::Arxiv(id));
            }
        } else if let Ok(id) = ArxivId::parse(input) {
            return Ok(Self::Arxiv(id));
        }

        Doi::parse(input)
            .map(Self::Doi)
            .map_err(|_| ScienceError::UnrecognizedInput(input.to_string()))
    }
}
