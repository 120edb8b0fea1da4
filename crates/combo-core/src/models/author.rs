use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl Author {
    /// URL path segment for the author page, falling back to the raw name
    /// for rows whose slug has not been backfilled yet.
    pub fn url_key(&self) -> &str {
        self.slug.as_deref().unwrap_or(&self.name)
    }
}
