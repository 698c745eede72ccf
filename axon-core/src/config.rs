use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration for the entire agent.
///
/// Covers the LLM backend, the retrieval subsystem, and where persisted state
/// lives on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub system: SystemConfig,
    pub llm: LlmConfig,
    pub system_prompt: String,
    pub rag: RagConfig,
    pub storage: StorageConfig,
}

/// System-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Logging level filter (e.g. "info", "debug")
    pub log_level: String,
    /// Root directory for all persisted data
    pub data_dir: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

/// Configuration for the LLM backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "mistral".to_string(),
            base_url: "http://localhost:11434".to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            timeout_secs: 60,
        }
    }
}

/// Which retrieval engine a session runs on.
///
/// Exactly one engine is active per session. The keyword engine has no model
/// dependency and is the default; the vector engine requires the embedding
/// backend to be available at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Keyword,
    Vector,
}

impl Default for EngineKind {
    fn default() -> Self {
        Self::Keyword
    }
}

/// Configuration for the retrieval subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default)]
    pub engine: EngineKind,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dim: 768,
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

/// Vector database storage mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum StorageMode {
    /// Embedded storage - runs in-process with zero setup (default)
    Embedded { path: String },
    /// gRPC storage - connect to external vector database server
    Grpc { url: String },
}

impl Default for StorageMode {
    fn default() -> Self {
        Self::Embedded {
            path: "./data/vector_store".to_string(),
        }
    }
}

/// Storage configuration for all retrieval persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the keyword engine's JSON index
    pub keyword_path: String,
    /// Vector database storage mode
    #[serde(default)]
    pub storage_mode: StorageMode,
    /// Vector database configuration (collection name, etc.)
    #[serde(default)]
    pub vector_db: VectorDbConfig,
    /// Number of results to return from retrieval queries
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            keyword_path: "./data/keyword_rag".to_string(),
            storage_mode: StorageMode::default(),
            vector_db: VectorDbConfig::default(),
            top_k: default_top_k(),
        }
    }
}

/// Vector database configuration (collection/index name, etc.).
///
/// Provider-agnostic configuration that works with any vector DB backend
/// (LanceDB, Qdrant, etc.).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDbConfig {
    /// Collection/table name for storing vectors
    pub collection_name: String,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            collection_name: "documents".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            system: SystemConfig::default(),
            llm: LlmConfig::default(),
            system_prompt: "You are a helpful AI assistant. Answer questions accurately and \
                            concisely, using any provided document context."
                .to_string(),
            rag: RagConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from `config.yaml` if it exists, otherwise use defaults.
    pub fn load_or_default() -> Self {
        Self::load("config.yaml").unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rag_config_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.engine, EngineKind::Keyword);
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.embedding_dim, 768);
    }

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.keyword_path, "./data/keyword_rag");
        assert_eq!(config.vector_db.collection_name, "documents");
        assert_eq!(config.top_k, 5);
    }

    #[test]
    fn test_engine_kind_parses_lowercase() {
        let yaml = r#"
engine: vector
embedding_model: nomic-embed-text
embedding_dim: 768
chunk_size: 500
chunk_overlap: 50
"#;
        let config: RagConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.engine, EngineKind::Vector);
    }

    #[test]
    fn test_full_config_round_trip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.llm.model, config.llm.model);
        assert_eq!(parsed.rag.chunk_size, config.rag.chunk_size);
        assert_eq!(parsed.storage.top_k, config.storage.top_k);
    }
}
