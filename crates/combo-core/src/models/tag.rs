use serde::{Deserialize, Serialize};

/// Where a tag comes from.
///
/// `Arxiv` and `Msc` tags are derived from paper metadata and are rebuilt
/// every time a paper is ingested. `Personal` and `Other` tags are only
/// ever added or removed explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    Msc,
    Arxiv,
    Personal,
    Other,
}

impl TagType {
    pub const ALL: [TagType; 4] = [Self::Msc, Self::Arxiv, Self::Personal, Self::Other];

    /// Tag types recomputed from `categories` / `comment` on ingestion.
    pub const DERIVED: [TagType; 2] = [Self::Arxiv, Self::Msc];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Msc => "msc",
            Self::Arxiv => "arxiv",
            Self::Personal => "personal",
            Self::Other => "other",
        }
    }

    pub fn is_derived(self) -> bool {
        Self::DERIVED.contains(&self)
    }
}

impl std::fmt::Display for TagType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TagType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "msc" => Ok(Self::Msc),
            "arxiv" => Ok(Self::Arxiv),
            "personal" => Ok(Self::Personal),
            "other" => Ok(Self::Other),
            _ => Err(format!("Invalid TagType: {s}")),
        }
    }
}

/// A tag, identified by `(name, tag_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub tag_type: TagType,
}

/// A tag together with the number of papers carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub tag_type: TagType,
    pub paper_count: u32,
}
