use super::base_meta;
use crate::mdl::Mdl;
use mdl_index_common::Document;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

/// A question together with the SQL that answers it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlPair {
    pub id: String,
    pub question: String,
    pub sql: String,
}

#[derive(Debug, Deserialize)]
struct BoilerplatePair {
    question: String,
    sql: String,
}

impl SqlPair {
    pub fn new(id: impl Into<String>, question: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            sql: sql.into(),
        }
    }

    /// Stable id for a pair shipped with a boilerplate, so re-indexing the same project
    /// overwrites it. Projects sharing a boilerplate get distinct ids.
    fn boilerplate_id(project_id: Option<&str>, boilerplate: &str, question: &str) -> String {
        let key = format!("{}:{}:{}", project_id.unwrap_or_default(), boilerplate, question);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SqlPairsChunker;

impl SqlPairsChunker {
    pub fn chunk(&self, pairs: &[SqlPair], project_id: Option<&str>) -> Vec<Document> {
        pairs
            .iter()
            .map(|pair| {
                let mut meta = base_meta(project_id);
                meta.insert("sql_pair_id".to_string(), json!(pair.id));
                meta.insert("sql".to_string(), json!(pair.sql));
                Document::with_id(pair.id.clone(), pair.question.clone(), meta)
            })
            .collect()
    }
}

/// Pairs bundled for the boilerplates the MDL's models declare.
///
/// The file maps a boilerplate name to a list of `{question, sql}` objects. A missing or
/// unreadable file is logged and treated as empty. Pair ids are scoped to `project_id`.
pub async fn load_boilerplate_pairs(path: Option<&Path>, mdl: &Mdl, project_id: Option<&str>) -> Vec<SqlPair> {
    let boilerplates = mdl.boilerplates();
    if boilerplates.is_empty() {
        return Vec::new();
    }
    let Some(path) = path else {
        debug!("No SQL pairs file configured");
        return Vec::new();
    };

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("SQL pairs file not found: {}", path.display());
            return Vec::new();
        }
        Err(e) => {
            warn!("Failed to read SQL pairs file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut by_boilerplate: HashMap<String, Vec<BoilerplatePair>> = match serde_json::from_str(&content) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Failed to parse SQL pairs file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut pairs = Vec::new();
    for boilerplate in boilerplates {
        let Some(entries) = by_boilerplate.remove(&boilerplate) else {
            debug!("No SQL pairs for boilerplate {}", boilerplate);
            continue;
        };
        pairs.extend(entries.into_iter().map(|entry| {
            SqlPair::new(
                SqlPair::boilerplate_id(project_id, &boilerplate, &entry.question),
                entry.question,
                entry.sql,
            )
        }));
    }
    pairs
}
