use crate::store::{Condition, DocumentStore, DuplicatePolicy, MetadataFilter};
use async_trait::async_trait;
use mdl_index_common::{Document, IndexError, Result};
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{
    Condition as QdrantCondition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder,
    Distance, Filter, GetPointsBuilder, PointId, PointStruct, SetPayloadPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt::Display;
use tracing::{debug, info};
use uuid::Uuid;

const META_FIELD: &str = "meta";

/// One Qdrant collection holding documents as `{content, meta}` payloads
pub struct QdrantDocumentStore {
    client: Qdrant,
    collection: String,
    dimension: u64,
}

/// Qdrant only accepts UUID or integer ids; other document ids map to a stable UUID v5.
fn point_id(document_id: &str) -> String {
    match Uuid::parse_str(document_id) {
        Ok(uuid) => uuid.to_string(),
        Err(_) => Uuid::new_v5(&Uuid::NAMESPACE_OID, document_id.as_bytes()).to_string(),
    }
}

fn store_err(context: &str, err: impl Display) -> IndexError {
    IndexError::VectorStore(format!("{}: {}", context, err))
}

impl QdrantDocumentStore {
    /// Connect and make sure the collection exists. `recreate_index` drops it first.
    pub async fn connect(
        url: &str,
        api_key: Option<&str>,
        collection: &str,
        dimension: u64,
        recreate_index: bool,
    ) -> Result<Self> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key.to_string());
        }
        let client = builder
            .build()
            .map_err(|e| store_err("Failed to connect to Qdrant", e))?;

        let store = Self {
            client,
            collection: collection.to_string(),
            dimension,
        };
        store.ensure_collection(recreate_index).await?;
        Ok(store)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    async fn ensure_collection(&self, recreate_index: bool) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| store_err("Failed to check collection", e))?;

        if exists && recreate_index {
            info!("Recreating collection: {}", self.collection);
            self.client
                .delete_collection(&self.collection)
                .await
                .map_err(|e| store_err("Failed to delete collection", e))?;
        }

        if !exists || recreate_index {
            info!("Creating collection: {}", self.collection);
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection)
                        .vectors_config(VectorParamsBuilder::new(self.dimension, Distance::Cosine)),
                )
                .await
                .map_err(|e| store_err("Failed to create collection", e))?;
        }
        Ok(())
    }

    fn to_point(&self, document: Document) -> Result<PointStruct> {
        let vector = match document.embedding {
            Some(embedding) => {
                if embedding.len() as u64 != self.dimension {
                    return Err(IndexError::VectorStore(format!(
                        "document {} has a {}-dimensional embedding, collection {} expects {}",
                        document.id,
                        embedding.len(),
                        self.collection,
                        self.dimension
                    )));
                }
                embedding
            }
            None => vec![0.0; self.dimension as usize],
        };

        let payload = Payload::try_from(json!({
            "id": document.id,
            "content": document.content,
            META_FIELD: Value::Object(document.meta),
        }))
        .map_err(|e| store_err("Invalid payload", e))?;

        Ok(PointStruct::new(point_id(&document.id), vector, payload))
    }

    async fn existing_ids(&self, ids: &[String]) -> Result<HashSet<String>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let point_ids: Vec<PointId> = ids.iter().map(|id| PointId::from(point_id(id))).collect();
        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(&self.collection, point_ids)
                    .with_payload(false)
                    .with_vectors(false),
            )
            .await
            .map_err(|e| store_err("Failed to look up points", e))?;

        let found: HashSet<String> = response
            .result
            .into_iter()
            .filter_map(|point| point.id.and_then(point_id_to_string))
            .collect();
        Ok(ids
            .iter()
            .filter(|id| found.contains(&point_id(id)))
            .cloned()
            .collect())
    }
}

fn point_id_to_string(id: PointId) -> Option<String> {
    match id.point_id_options? {
        PointIdOptions::Uuid(uuid) => Some(uuid),
        PointIdOptions::Num(num) => Some(num.to_string()),
    }
}

fn to_qdrant_filter(filter: &MetadataFilter) -> Filter {
    let conditions: Vec<QdrantCondition> = filter
        .conditions
        .iter()
        .map(|condition| match condition {
            Condition::Equals(field, value) => {
                QdrantCondition::matches(format!("{}.{}", META_FIELD, field), value.clone())
            }
            Condition::AnyOf(field, values) => {
                QdrantCondition::matches(format!("{}.{}", META_FIELD, field), values.clone())
            }
        })
        .collect();
    Filter::must(conditions)
}

#[async_trait]
impl DocumentStore for QdrantDocumentStore {
    fn name(&self) -> &str {
        &self.collection
    }

    async fn health_check(&self) -> Result<()> {
        self.client
            .health_check()
            .await
            .map_err(|e| store_err("Qdrant health check failed", e))?;
        Ok(())
    }

    async fn write_documents(&self, documents: Vec<Document>, policy: DuplicatePolicy) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let documents = match policy {
            DuplicatePolicy::Overwrite => documents,
            DuplicatePolicy::Skip | DuplicatePolicy::Fail => {
                let ids: Vec<String> = documents.iter().map(|doc| doc.id.clone()).collect();
                let existing = self.existing_ids(&ids).await?;
                if policy == DuplicatePolicy::Fail {
                    let mut seen = HashSet::new();
                    if let Some(id) = ids.iter().find(|id| existing.contains(*id) || !seen.insert(id.as_str())) {
                        return Err(IndexError::DuplicateDocument(id.clone()));
                    }
                }
                let mut kept = HashSet::new();
                documents
                    .into_iter()
                    .filter(|doc| !existing.contains(&doc.id) && kept.insert(doc.id.clone()))
                    .collect()
            }
        };

        // repeated ids in one batch collapse into a single point
        let count = documents.iter().map(|doc| doc.id.as_str()).collect::<HashSet<_>>().len();
        if count == 0 {
            return Ok(0);
        }
        let points = documents
            .into_iter()
            .map(|doc| self.to_point(doc))
            .collect::<Result<Vec<_>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| store_err("Failed to upsert points", e))?;

        debug!("Wrote {} documents to {}", count, self.collection);
        Ok(count)
    }

    async fn delete_documents(&self, filter: Option<&MetadataFilter>) -> Result<()> {
        let filter = filter.map(to_qdrant_filter).unwrap_or_default();
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(filter)
                    .wait(true),
            )
            .await
            .map_err(|e| store_err("Failed to delete points", e))?;
        Ok(())
    }

    async fn count_documents(&self, filter: Option<&MetadataFilter>) -> Result<usize> {
        let mut request = CountPointsBuilder::new(&self.collection).exact(true);
        if let Some(filter) = filter {
            request = request.filter(to_qdrant_filter(filter));
        }
        let response = self
            .client
            .count(request)
            .await
            .map_err(|e| store_err("Failed to count points", e))?;
        Ok(response.result.map_or(0, |r| r.count as usize))
    }

    async fn set_payload(
        &self,
        filter: &MetadataFilter,
        value: Map<String, Value>,
        key: Option<&str>,
    ) -> Result<()> {
        let key = match key {
            Some(key) => format!("{}.{}", META_FIELD, key),
            None => META_FIELD.to_string(),
        };
        let payload = Payload::try_from(Value::Object(value))
            .map_err(|e| store_err("Invalid payload", e))?;

        self.client
            .set_payload(
                SetPayloadPointsBuilder::new(&self.collection, payload)
                    .points_selector(to_qdrant_filter(filter))
                    .key(key)
                    .wait(true),
            )
            .await
            .map_err(|e| store_err("Failed to set payload", e))?;
        Ok(())
    }
}
