use crate::json_path::parse_json_path;
use crate::payload::set_value_by_key;
use crate::store::{DocumentStore, DuplicatePolicy, MetadataFilter};
use async_trait::async_trait;
use mdl_index_common::{Document, IndexError, Result};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local document store, used for tests and the `memory` backend
pub struct InMemoryDocumentStore {
    name: String,
    documents: RwLock<BTreeMap<String, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    /// Snapshot of the stored documents matching `filter`, ordered by id.
    pub async fn documents(&self, filter: Option<&MetadataFilter>) -> Vec<Document> {
        self.documents
            .read()
            .await
            .values()
            .filter(|doc| filter.map_or(true, |f| f.matches(&doc.meta)))
            .cloned()
            .collect()
    }

    pub async fn get(&self, id: &str) -> Option<Document> {
        self.documents.read().await.get(id).cloned()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write_documents(&self, documents: Vec<Document>, policy: DuplicatePolicy) -> Result<usize> {
        let mut stored = self.documents.write().await;

        if policy == DuplicatePolicy::Fail {
            let mut seen = HashSet::new();
            if let Some(duplicate) = documents
                .iter()
                .find(|doc| stored.contains_key(&doc.id) || !seen.insert(doc.id.as_str()))
            {
                return Err(IndexError::DuplicateDocument(duplicate.id.clone()));
            }
        }

        let mut written = HashSet::new();
        for document in documents {
            if policy == DuplicatePolicy::Skip && stored.contains_key(&document.id) {
                debug!("Skipping existing document {} in {}", document.id, self.name);
                continue;
            }
            written.insert(document.id.clone());
            stored.insert(document.id.clone(), document);
        }
        Ok(written.len())
    }

    async fn delete_documents(&self, filter: Option<&MetadataFilter>) -> Result<()> {
        let mut stored = self.documents.write().await;
        match filter {
            Some(filter) => stored.retain(|_, doc| !filter.matches(&doc.meta)),
            None => stored.clear(),
        }
        Ok(())
    }

    async fn count_documents(&self, filter: Option<&MetadataFilter>) -> Result<usize> {
        let stored = self.documents.read().await;
        Ok(match filter {
            Some(filter) => stored.values().filter(|doc| filter.matches(&doc.meta)).count(),
            None => stored.len(),
        })
    }

    async fn set_payload(
        &self,
        filter: &MetadataFilter,
        value: Map<String, Value>,
        key: Option<&str>,
    ) -> Result<()> {
        let path = match key {
            Some(key) => parse_json_path(key)?,
            None => Vec::new(),
        };

        let mut stored = self.documents.write().await;
        for doc in stored.values_mut().filter(|doc| filter.matches(&doc.meta)) {
            set_value_by_key(&mut doc.meta, &path, &value);
        }
        Ok(())
    }
}
