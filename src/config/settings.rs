//! Configuration settings for eateum-rag.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub recommend: RecommendSettings,
    pub server: ServerSettings,
    pub ingest: IngestSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.eateum-rag".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use. Queries and indexed documents must share it.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// OpenAI-compatible API base URL. Falls back to `OPENAI_API_BASE`.
    pub api_base: Option<String>,
    /// HTTP timeout for embedding requests.
    pub timeout_seconds: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            api_base: None,
            timeout_seconds: 60,
        }
    }
}

/// Vector store backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    #[default]
    Sqlite,
    Memory,
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: VectorStoreProvider,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::Sqlite,
            sqlite_path: "~/.eateum-rag/recipes.db".to_string(),
        }
    }
}

/// How repeated ingredients in a single query contribute to a candidate's match count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Each distinct ingredient counts once.
    #[default]
    Distinct,
    /// Every occurrence counts, so repeating an ingredient inflates the score.
    CountEach,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicatePolicy::Distinct => write!(f, "distinct"),
            DuplicatePolicy::CountEach => write!(f, "count_each"),
        }
    }
}

/// Recommendation pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendSettings {
    /// Number of candidates pulled from the vector index before re-ranking.
    pub overfetch_size: usize,
    /// Number of recipe ids returned to the caller.
    pub top_n: usize,
    /// Upper bound on a single similarity search.
    pub retrieval_timeout_seconds: u64,
    /// Minimum cosine similarity for a candidate to enter the pool.
    pub min_score: f32,
    /// Recipe ids returned when the request carries no ingredients.
    pub fallback_ids: Vec<i64>,
    /// Counting rule for repeated query ingredients.
    pub duplicate_policy: DuplicatePolicy,
    /// Search text template; `{{ingredients}}` is replaced by the joined ingredient list.
    pub query_template: String,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            overfetch_size: 20,
            top_n: 5,
            retrieval_timeout_seconds: 15,
            min_score: 0.0,
            fallback_ids: Vec::new(),
            duplicate_policy: DuplicatePolicy::Distinct,
            query_template: "{{ingredients}}을(를) 사용한 맛있는 요리 레시피를 추천해줘.".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Index building settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Append cooking steps to the embedded document text.
    pub include_steps: bool,
    /// Category used when a row has none.
    pub default_category: String,
    /// Rows embedded per API request.
    pub batch_size: usize,
    /// Embedding requests in flight at once.
    pub max_concurrent_batches: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            include_steps: false,
            default_category: "기타".to_string(),
            batch_size: 100,
            max_concurrent_batches: 2,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Settings::default())
        }
    }

    /// Parse settings from TOML text; missing sections and keys take defaults.
    pub fn from_toml(content: &str) -> crate::error::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::RagError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eateum-rag")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }
}
