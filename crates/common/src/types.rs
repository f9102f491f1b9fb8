use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use strum_macros::{Display, EnumIter};
use uuid::Uuid;

/// Meta key used to scope documents to a single project.
pub const PROJECT_ID_KEY: &str = "project_id";

/// Unit of text handed to the embedder and the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub meta: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Document {
    pub fn new(content: impl Into<String>, meta: Map<String, Value>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), content, meta)
    }

    pub fn with_id(id: impl Into<String>, content: impl Into<String>, meta: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            meta,
            embedding: None,
        }
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(Value::as_str)
    }

    pub fn project_id(&self) -> Option<&str> {
        self.meta_str(PROJECT_ID_KEY)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Document({}, {} chars)", self.id, self.content.len())
    }
}

/// One document store per kind of indexed content
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CollectionKind {
    DbSchema,
    TableDescription,
    HistoricalQuestion,
    SqlPairs,
    Instructions,
    ProjectMeta,
}

impl CollectionKind {
    /// Kinds rebuilt every time an MDL is indexed.
    pub fn mdl_derived() -> [CollectionKind; 4] {
        [
            CollectionKind::DbSchema,
            CollectionKind::TableDescription,
            CollectionKind::HistoricalQuestion,
            CollectionKind::ProjectMeta,
        ]
    }

    /// Whether documents of this kind carry an embedding.
    pub fn is_embedded(&self) -> bool {
        !matches!(self, CollectionKind::ProjectMeta)
    }
}

/// `meta.type` discriminator for schema documents
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "TABLE_SCHEMA")]
    #[strum(serialize = "TABLE_SCHEMA")]
    TableSchema,
    #[serde(rename = "TABLE_DESCRIPTION")]
    #[strum(serialize = "TABLE_DESCRIPTION")]
    TableDescription,
}
