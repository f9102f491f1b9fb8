use mdl_index_common::config::*;
use mdl_index_common::{CollectionKind, IndexError};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_load_from_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("test_config.toml");

    let config_content = r#"
[embedding]
provider = "fastembed"
model = "all-minilm"
dimension = 384
batch_size = 16

[storage]
backend = "memory"
qdrant_url = "http://qdrant:6334"
recreate_index = true

[storage.collections]
db_schema = "acme_schema"

[indexing]
column_batch_size = 25
sql_pairs_path = "/etc/indexer/sql_pairs.json"

[tracing]
level = "debug"
"#;

    fs::write(&config_path, config_content).unwrap();

    let config = SystemConfig::from_file(&config_path).unwrap();

    assert_eq!(config.embedding.provider, EmbeddingProvider::FastEmbed);
    assert_eq!(config.embedding.dimension, 384);
    assert_eq!(config.embedding.batch_size, 16);
    assert_eq!(config.embedding.concurrency, 4);
    assert_eq!(config.storage.backend, StoreBackend::Memory);
    assert!(config.storage.recreate_index);
    assert_eq!(config.storage.collections.name_for(CollectionKind::DbSchema), "acme_schema");
    assert_eq!(
        config.storage.collections.name_for(CollectionKind::TableDescription),
        "table_descriptions"
    );
    assert_eq!(config.indexing.column_batch_size, 25);
    assert_eq!(
        config.indexing.sql_pairs_path.as_deref(),
        Some(std::path::Path::new("/etc/indexer/sql_pairs.json"))
    );
    assert_eq!(config.tracing.level, "debug");
    assert!(config.tracing.otlp_endpoint.is_none());
}

#[test]
fn test_empty_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("empty.toml");
    fs::write(&config_path, "").unwrap();

    let config = SystemConfig::from_file(&config_path).unwrap();

    assert_eq!(config.embedding.provider, EmbeddingProvider::Ollama);
    assert_eq!(config.embedding.url, "http://localhost:11434");
    assert_eq!(config.storage.backend, StoreBackend::Qdrant);
    assert_eq!(config.storage.qdrant_url, "http://localhost:6334");
    assert_eq!(config.indexing.watch_debounce_ms, 500);
}

#[test]
fn test_config_validation_invalid_column_batch_size() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("invalid_config.toml");

    let config_content = r#"
[indexing]
column_batch_size = 0
"#;

    fs::write(&config_path, config_content).unwrap();

    let result = SystemConfig::from_file(&config_path);
    assert!(matches!(result, Err(IndexError::Config(_))));
}

#[test]
fn test_config_validation_zero_dimension() {
    let mut config = SystemConfig::default();
    config.embedding.dimension = 0;
    assert!(matches!(config.validate(), Err(IndexError::Config(_))));
}

#[test]
fn test_unknown_backend_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("bad_backend.toml");
    fs::write(&config_path, "[storage]\nbackend = \"postgres\"\n").unwrap();

    let result = SystemConfig::from_file(&config_path);
    assert!(matches!(result, Err(IndexError::Config(_))));
}

#[test]
fn test_missing_file_errors_but_load_or_default_does_not() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    assert!(matches!(SystemConfig::from_file(&missing), Err(IndexError::Io(_))));

    let config = SystemConfig::load_or_default(&missing).unwrap();
    assert_eq!(config.indexing.column_batch_size, 50);
}
