use std::fmt;

use crate::error::{Result, ScienceError};
use serde::{Deserialize, Serialize};

const PREFIXES: [&str; 6] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
    "DOI:",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Doi {
    pub normalized: String,
}

impl Doi {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let stripped = PREFIXES
            .iter()
            .find_map(|p| input.strip_prefix(p))
            .map_or(input, str::trim_start);

        // Must start with "10.", contain "/", and have a non-empty suffix
        let invalid = || ScienceError::InvalidDoi(input.to_string());
        let (registrant, suffix) = stripped.split_once('/').ok_or_else(invalid)?;
        if !registrant.starts_with("10.") || registrant.len() < 4 || suffix.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            normalized: stripped.to_lowercase(),
        })
    }

    pub fn url(&self) -> String {
        format!("https://doi.org/{}", self.normalized)
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}
