use crate::error::{IndexError, Result};
use crate::types::CollectionKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Ollama,
    FastEmbed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,
    #[serde(default = "default_embedding_url")]
    pub url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dimension")]
    pub dimension: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Qdrant,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default)]
    pub qdrant_api_key: Option<String>,
    #[serde(default)]
    pub recreate_index: bool,
    #[serde(default)]
    pub collections: CollectionNames,
}

/// Collection name per [`CollectionKind`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionNames {
    #[serde(default = "default_db_schema_collection")]
    pub db_schema: String,
    #[serde(default = "default_table_description_collection")]
    pub table_description: String,
    #[serde(default = "default_historical_question_collection")]
    pub historical_question: String,
    #[serde(default = "default_sql_pairs_collection")]
    pub sql_pairs: String,
    #[serde(default = "default_instructions_collection")]
    pub instructions: String,
    #[serde(default = "default_project_meta_collection")]
    pub project_meta: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    #[serde(default = "default_column_batch_size")]
    pub column_batch_size: usize,
    #[serde(default)]
    pub sql_pairs_path: Option<PathBuf>,
    #[serde(default = "default_watch_debounce_ms")]
    pub watch_debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_embedding_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_dimension() -> u64 {
    768
}

fn default_batch_size() -> usize {
    32
}

fn default_concurrency() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".to_string()
}

fn default_db_schema_collection() -> String {
    "db_schema".to_string()
}

fn default_table_description_collection() -> String {
    "table_descriptions".to_string()
}

fn default_historical_question_collection() -> String {
    "view_questions".to_string()
}

fn default_sql_pairs_collection() -> String {
    "sql_pairs".to_string()
}

fn default_instructions_collection() -> String {
    "instructions".to_string()
}

fn default_project_meta_collection() -> String {
    "project_meta".to_string()
}

fn default_column_batch_size() -> usize {
    50
}

fn default_watch_debounce_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "mdl-indexer".to_string()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            url: default_embedding_url(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            qdrant_url: default_qdrant_url(),
            qdrant_api_key: None,
            recreate_index: false,
            collections: CollectionNames::default(),
        }
    }
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            db_schema: default_db_schema_collection(),
            table_description: default_table_description_collection(),
            historical_question: default_historical_question_collection(),
            sql_pairs: default_sql_pairs_collection(),
            instructions: default_instructions_collection(),
            project_meta: default_project_meta_collection(),
        }
    }
}

impl CollectionNames {
    pub fn name_for(&self, kind: CollectionKind) -> &str {
        match kind {
            CollectionKind::DbSchema => &self.db_schema,
            CollectionKind::TableDescription => &self.table_description,
            CollectionKind::HistoricalQuestion => &self.historical_question,
            CollectionKind::SqlPairs => &self.sql_pairs,
            CollectionKind::Instructions => &self.instructions,
            CollectionKind::ProjectMeta => &self.project_meta,
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            column_batch_size: default_column_batch_size(),
            sql_pairs_path: None,
            watch_debounce_ms: default_watch_debounce_ms(),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            otlp_endpoint: None,
            service_name: default_service_name(),
        }
    }
}

impl SystemConfig {
    /// Load and validate a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: SystemConfig = toml::from_str(&content)
            .map_err(|e| IndexError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`SystemConfig::from_file`], but falls back to defaults when the file is absent
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::warn!("Config file {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            return Err(IndexError::Config("embedding.dimension must be greater than 0".into()));
        }
        if self.embedding.batch_size == 0 {
            return Err(IndexError::Config("embedding.batch_size must be greater than 0".into()));
        }
        if self.embedding.concurrency == 0 {
            return Err(IndexError::Config("embedding.concurrency must be greater than 0".into()));
        }
        if self.indexing.column_batch_size == 0 {
            return Err(IndexError::Config(
                "indexing.column_batch_size must be greater than 0".into(),
            ));
        }

        let mut seen = HashSet::new();
        for kind in CollectionKind::iter() {
            let name = self.storage.collections.name_for(kind);
            if name.trim().is_empty() {
                return Err(IndexError::Config(format!("collection name for {} is empty", kind)));
            }
            if !seen.insert(name) {
                return Err(IndexError::Config(format!("collection name '{}' is used twice", name)));
            }
        }
        Ok(())
    }
}
