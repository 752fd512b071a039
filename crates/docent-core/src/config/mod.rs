//! Configuration system for docent.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{DocentError, DocentResult};
use crate::retrieval::{RetrievalConfig, RetrievalMode};
use crate::traits::{
    EmbedderConfig, EmbedderProvider, RerankerConfig, RerankerProvider, VectorStoreConfig,
    VectorStoreProvider,
};

/// Retrieval section: engine settings plus the legacy reranker switches
/// that older configuration files keep next to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Engine configuration.
    #[serde(flatten)]
    pub engine: RetrievalConfig,
    /// Legacy switch for the reranker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_reranker: Option<bool>,
    /// Legacy reranker model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reranker_model: Option<String>,
}

/// Reranker section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RerankerSettings {
    /// Whether to attach a cross-encoder at all.
    #[serde(default)]
    pub enabled: bool,
    /// Provider configuration.
    #[serde(flatten)]
    pub config: RerankerConfig,
}

/// Chunking section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters. `0` disables splitting.
    pub chunk_size: usize,
    /// Characters shared by consecutive windows.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 200,
        }
    }
}

/// Conversation memory section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Path to the conversation database.
    pub db_path: PathBuf,
    /// Turns returned by default when loading a conversation.
    pub history_limit: usize,
    /// JSON-lines file answer feedback is appended to.
    pub feedback_path: PathBuf,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        let docent_dir = dirs::home_dir()
            .map(|h| h.join(".docent"))
            .unwrap_or_else(|| PathBuf::from(".docent"));

        Self {
            db_path: docent_dir.join("memory.db"),
            history_limit: 10,
            feedback_path: docent_dir.join("feedback.jsonl"),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocentConfig {
    /// Retrieval engine configuration.
    pub retrieval: RetrievalSettings,
    /// Cross-encoder configuration.
    pub reranker: RerankerSettings,
    /// Embedder configuration.
    pub embedder: EmbedderConfig,
    /// Vector store configuration.
    pub vector_store: VectorStoreConfig,
    /// Chunking configuration.
    pub chunking: ChunkingConfig,
    /// Conversation memory configuration.
    pub memory: MemoryConfig,
}

impl DocentConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> DocentResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let mut config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| DocentError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| DocentError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| DocentError::Configuration(e.to_string()))?,
            _ => {
                return Err(DocentError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };
        config.apply_legacy_keys();
        Ok(config)
    }

    /// Load configuration from defaults plus environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `DOCENT_*` environment variables.
    ///
    /// Unparsable values are ignored.
    pub fn apply_env(&mut self) {
        let retrieval = &mut self.retrieval.engine;
        if let Some(mode) = env_parse::<RetrievalMode>("DOCENT_RETRIEVAL_MODE") {
            retrieval.mode = mode;
        }
        if let Some(top_k) = env_parse("DOCENT_TOP_K") {
            retrieval.top_k = top_k;
        }
        if let Some(dense_k) = env_parse("DOCENT_DENSE_K") {
            retrieval.dense_k = Some(dense_k);
        }
        if let Some(lexical_k) = env_parse("DOCENT_LEXICAL_K") {
            retrieval.lexical_k = Some(lexical_k);
        }
        if let Some(weight) = env_parse("DOCENT_DENSE_WEIGHT") {
            retrieval.dense_weight = weight;
        }
        if let Some(min) = env_parse("DOCENT_MIN_RELEVANCE") {
            retrieval.min_relevance = min;
        }

        // Reranker configuration
        if let Some(enabled) = env_parse("DOCENT_RERANKER_ENABLED") {
            self.reranker.enabled = enabled;
        }
        if let Some(provider) = env_parse::<RerankerProvider>("DOCENT_RERANKER_PROVIDER") {
            self.reranker.config.provider = provider;
        }
        if let Ok(model) = std::env::var("DOCENT_RERANKER_MODEL") {
            self.reranker.config.model = model;
        }
        if let Ok(url) = std::env::var("DOCENT_RERANKER_URL") {
            self.reranker.config.base_url = Some(url);
        }
        if let Ok(key) = std::env::var("COHERE_API_KEY") {
            self.reranker.config.api_key.get_or_insert(key);
        }

        // Embedder configuration
        if let Some(provider) = env_parse::<EmbedderProvider>("DOCENT_EMBEDDER_PROVIDER") {
            self.embedder.provider = provider;
        }
        if let Ok(model) = std::env::var("DOCENT_EMBEDDER_MODEL") {
            self.embedder.model = model;
        }
        if let Some(dims) = env_parse("DOCENT_EMBEDDING_DIMS") {
            self.embedder.embedding_dims = dims;
        }
        if let Ok(url) = std::env::var("DOCENT_EMBEDDER_URL") {
            self.embedder.base_url = Some(url);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.embedder.api_key.get_or_insert(key);
        }

        // Vector store configuration
        if let Some(provider) = env_parse::<VectorStoreProvider>("DOCENT_VECTOR_STORE_PROVIDER") {
            self.vector_store.provider = provider;
        }
        if let Ok(url) = std::env::var("DOCENT_VECTOR_STORE_URL") {
            self.vector_store.url = Some(url);
        }
        if let Ok(name) = std::env::var("DOCENT_COLLECTION") {
            self.vector_store.collection_name = name;
        }

        // Chunking configuration
        if let Some(size) = env_parse("DOCENT_CHUNK_SIZE") {
            self.chunking.chunk_size = size;
        }
        if let Some(overlap) = env_parse("DOCENT_CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = overlap;
        }

        // Memory database path
        if let Ok(path) = std::env::var("DOCENT_MEMORY_DB_PATH") {
            self.memory.db_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("DOCENT_FEEDBACK_PATH") {
            self.memory.feedback_path = PathBuf::from(path);
        }
    }

    /// Fold `retrieval.use_reranker` and `retrieval.reranker_model` into the
    /// reranker section.
    pub fn apply_legacy_keys(&mut self) {
        if let Some(enabled) = self.retrieval.use_reranker.take() {
            self.reranker.enabled = self.reranker.enabled || enabled;
        }
        if let Some(model) = self.retrieval.reranker_model.take() {
            self.reranker.config.model = model;
        }
    }

    /// Validate the sections that have invariants.
    pub fn validate(&self) -> DocentResult<()> {
        self.retrieval.engine.validate()
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> DocentConfigBuilder {
        DocentConfigBuilder::default()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Builder for DocentConfig.
#[derive(Default)]
pub struct DocentConfigBuilder {
    config: DocentConfig,
}

impl DocentConfigBuilder {
    /// Set retrieval configuration.
    pub fn retrieval(mut self, config: RetrievalConfig) -> Self {
        self.config.retrieval.engine = config;
        self
    }

    /// Enable the reranker with the given configuration.
    pub fn reranker(mut self, config: RerankerConfig) -> Self {
        self.config.reranker = RerankerSettings {
            enabled: true,
            config,
        };
        self
    }

    /// Set embedder configuration.
    pub fn embedder(mut self, config: EmbedderConfig) -> Self {
        self.config.embedder = config;
        self
    }

    /// Set vector store configuration.
    pub fn vector_store(mut self, config: VectorStoreConfig) -> Self {
        self.config.vector_store = config;
        self
    }

    /// Set chunking configuration.
    pub fn chunking(mut self, config: ChunkingConfig) -> Self {
        self.config.chunking = config;
        self
    }

    /// Set conversation database path.
    pub fn memory_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.memory.db_path = path.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> DocentConfig {
        self.config
    }
}
