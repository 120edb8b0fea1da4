use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root application configuration, loaded from `~/.config/combo/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub core: CoreConfig,
    pub tagging: TaggingConfig,
    pub listing: ListingConfig,
    pub keywords: KeywordsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub data_dir: String,
    pub database_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    /// Hand-curated keyword dictionary (JSON). Keyword linking is disabled
    /// when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary_path: Option<String>,
    /// arXiv categories that never become tags.
    pub excluded_categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub per_page: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordsConfig {
    pub min_count: usize,
    pub max_ngram: usize,
    pub output: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            tagging: TaggingConfig::default(),
            listing: ListingConfig::default(),
            keywords: KeywordsConfig::default(),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("combo");

        Self {
            data_dir: data_dir.to_string_lossy().to_string(),
            database_file: "combo.db".to_string(),
        }
    }
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            dictionary_path: None,
            excluded_categories: vec!["math.CO".to_string()],
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { per_page: 20 }
    }
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            min_count: 5,
            max_ngram: 4,
            output: "keywords.csv".to_string(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/combo/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("COMBO_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("combo")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if the file doesn't
    /// exist, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// `COMBO_DATABASE` replaces the database path, `COMBO_DICTIONARY` the
    /// keyword dictionary path.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(db) = std::env::var("COMBO_DATABASE") {
            self.set_database_path(PathBuf::from(db));
        }
        if let Ok(dict) = std::env::var("COMBO_DICTIONARY") {
            self.tagging.dictionary_path = Some(dict);
        }
    }

    // ─── Derived paths ─────────────────────────────────────

    /// Path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        let file = PathBuf::from(&self.core.database_file);
        if file.is_absolute() {
            file
        } else {
            PathBuf::from(&self.core.data_dir).join(file)
        }
    }

    pub fn set_database_path(&mut self, path: PathBuf) {
        self.core.database_file = path.to_string_lossy().to_string();
    }

    pub fn dictionary_path(&self) -> Option<PathBuf> {
        self.tagging.dictionary_path.as_ref().map(PathBuf::from)
    }
}
