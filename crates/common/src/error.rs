use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid MDL: {0}")]
    InvalidMdl(String),

    #[error("Invalid JSON path: {0}")]
    InvalidPath(String),

    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Document already exists: {0}")]
    DuplicateDocument(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl IndexError {
    pub fn unknown_variant(kind: &'static str, value: impl Into<String>) -> Self {
        IndexError::UnknownVariant {
            kind,
            value: value.into(),
        }
    }
}

/// Convert anyhow errors to IndexError
impl From<anyhow::Error> for IndexError {
    fn from(err: anyhow::Error) -> Self {
        IndexError::Unknown(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
