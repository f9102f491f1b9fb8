use crate::chunker::{
    load_boilerplate_pairs, DdlChunker, HistoricalQuestionChunker, Instruction, InstructionsChunker, MdlChunker,
    ProjectMetaChunker, SqlPair, SqlPairsChunker, TableDescriptionChunker,
};
use crate::cleaner::DocumentCleaner;
use crate::embedder::{embedder_from_config, DocumentEmbedder};
use crate::mdl::validate_mdl;
use crate::writer::AsyncDocumentWriter;
use derive_builder::Builder;
use futures::future::try_join_all;
use mdl_index_common::{CollectionKind, Document, IndexError, Result, StoreBackend, SystemConfig};
use mdl_index_storage::{DocumentStore, DuplicatePolicy, InMemoryDocumentStore, MetadataFilter, QdrantDocumentStore};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Builder)]
pub struct IndexingOptions {
    /// Columns per `TABLE_COLUMNS` chunk
    #[builder(default = "50")]
    pub column_batch_size: usize,
    #[builder(default)]
    pub duplicate_policy: DuplicatePolicy,
    /// JSON file of boilerplate SQL pairs
    #[builder(default, setter(into, strip_option))]
    pub sql_pairs_path: Option<PathBuf>,
}

impl Default for IndexingOptions {
    fn default() -> Self {
        Self {
            column_batch_size: 50,
            duplicate_policy: DuplicatePolicy::default(),
            sql_pairs_path: None,
        }
    }
}

/// Documents written per collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexingReport {
    pub documents: BTreeMap<CollectionKind, usize>,
}

impl IndexingReport {
    pub fn count(&self, kind: CollectionKind) -> usize {
        self.documents.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.documents.values().sum()
    }
}

impl fmt::Display for IndexingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .documents
            .iter()
            .map(|(kind, count)| format!("{}={}", kind, count))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Chunks, embeds and stores everything derived from an MDL and its SQL knowledge
pub struct IndexingPipeline {
    stores: BTreeMap<CollectionKind, Arc<dyn DocumentStore>>,
    embedder: DocumentEmbedder,
    options: IndexingOptions,
}

impl IndexingPipeline {
    /// Every [`CollectionKind`] needs a store.
    pub fn new(
        stores: BTreeMap<CollectionKind, Arc<dyn DocumentStore>>,
        embedder: DocumentEmbedder,
        options: IndexingOptions,
    ) -> Result<Self> {
        if let Some(missing) = CollectionKind::iter().find(|kind| !stores.contains_key(kind)) {
            return Err(IndexError::Config(format!("no document store for {}", missing)));
        }
        Ok(Self {
            stores,
            embedder,
            options,
        })
    }

    /// Build stores and embedder from configuration. Each kind gets its own collection.
    pub async fn from_config(config: &SystemConfig) -> Result<Self> {
        let embedder = embedder_from_config(&config.embedding).await?;
        let storage = &config.storage;

        let mut stores: BTreeMap<CollectionKind, Arc<dyn DocumentStore>> = BTreeMap::new();
        for kind in CollectionKind::iter() {
            let name = storage.collections.name_for(kind);
            let store: Arc<dyn DocumentStore> = match storage.backend {
                StoreBackend::Memory => Arc::new(InMemoryDocumentStore::new(name)),
                StoreBackend::Qdrant => Arc::new(
                    QdrantDocumentStore::connect(
                        &storage.qdrant_url,
                        storage.qdrant_api_key.as_deref(),
                        name,
                        config.embedding.dimension,
                        storage.recreate_index,
                    )
                    .await?,
                ),
            };
            debug!("Store for {}: {}", kind, name);
            stores.insert(kind, store);
        }

        let options = IndexingOptions {
            column_batch_size: config.indexing.column_batch_size,
            duplicate_policy: DuplicatePolicy::Overwrite,
            sql_pairs_path: config.indexing.sql_pairs_path.clone(),
        };
        let embedder = DocumentEmbedder::new(embedder, config.embedding.batch_size, config.embedding.concurrency);
        Self::new(stores, embedder, options)
    }

    pub fn options(&self) -> &IndexingOptions {
        &self.options
    }

    pub fn stores(&self) -> impl Iterator<Item = (CollectionKind, &Arc<dyn DocumentStore>)> {
        self.stores.iter().map(|(kind, store)| (*kind, store))
    }

    fn store(&self, kind: CollectionKind) -> Result<Arc<dyn DocumentStore>> {
        self.stores
            .get(&kind)
            .cloned()
            .ok_or_else(|| IndexError::Config(format!("no document store for {}", kind)))
    }

    fn cleaner(&self, kinds: &[CollectionKind]) -> Result<DocumentCleaner> {
        let stores = kinds.iter().map(|kind| self.store(*kind)).collect::<Result<Vec<_>>>()?;
        Ok(DocumentCleaner::new(stores))
    }

    async fn write(&self, kind: CollectionKind, documents: Vec<Document>) -> Result<(CollectionKind, usize)> {
        let writer = AsyncDocumentWriter::new(self.store(kind)?, self.options.duplicate_policy);
        let report = writer.run(documents).await?;
        Ok((kind, report.documents_written))
    }

    /// Replace every MDL-derived document of the project with chunks of `raw`.
    pub async fn index_mdl(&self, raw: &str, project_id: Option<&str>) -> Result<IndexingReport> {
        let mdl = validate_mdl(raw)?;
        info!(
            "Indexing MDL: {} models, {} views, {} relationships, {} metrics",
            mdl.models.len(),
            mdl.views.len(),
            mdl.relationships.len(),
            mdl.metrics.len()
        );

        self.cleaner(&CollectionKind::mdl_derived())?.run(project_id).await?;

        let chunkers: Vec<Box<dyn MdlChunker>> = vec![
            Box::new(DdlChunker::new(self.options.column_batch_size)),
            Box::new(TableDescriptionChunker),
            Box::new(HistoricalQuestionChunker),
            Box::new(ProjectMetaChunker),
        ];

        let mut batches = Vec::with_capacity(chunkers.len());
        for chunker in &chunkers {
            let kind = chunker.kind();
            let documents = chunker.chunk(&mdl, project_id);
            debug!("{} chunks for {}", documents.len(), kind);
            let documents = if kind.is_embedded() {
                self.embedder.embed_documents(documents).await?
            } else {
                documents
            };
            batches.push((kind, documents));
        }

        let written = try_join_all(batches.into_iter().map(|(kind, documents)| self.write(kind, documents))).await?;
        let report = IndexingReport {
            documents: written.into_iter().collect(),
        };
        info!("Indexed MDL: {}", report);
        Ok(report)
    }

    /// Index the boilerplate pairs matching the MDL plus `external_pairs`, replacing the
    /// project's previous pairs.
    pub async fn index_sql_pairs(
        &self,
        raw_mdl: &str,
        external_pairs: Vec<SqlPair>,
        project_id: Option<&str>,
    ) -> Result<usize> {
        let mdl = validate_mdl(raw_mdl)?;
        let mut pairs = load_boilerplate_pairs(self.options.sql_pairs_path.as_deref(), &mdl, project_id).await;
        pairs.extend(external_pairs);
        info!("Indexing {} SQL pairs", pairs.len());

        self.cleaner(&[CollectionKind::SqlPairs])?.run(project_id).await?;

        let documents = SqlPairsChunker.chunk(&pairs, project_id);
        let documents = self.embedder.embed_documents(documents).await?;
        let (_, written) = self.write(CollectionKind::SqlPairs, documents).await?;
        Ok(written)
    }

    pub async fn delete_sql_pairs(&self, ids: &[String], project_id: Option<&str>) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        info!("Deleting {} SQL pairs", ids.len());
        let filter = MetadataFilter::for_project(project_id).any_of("sql_pair_id", ids.iter().cloned());
        self.cleaner(&[CollectionKind::SqlPairs])?.run_with_filter(&filter).await
    }

    /// Re-index instructions; earlier documents of the same instruction ids are removed first.
    pub async fn index_instructions(&self, instructions: &[Instruction], project_id: Option<&str>) -> Result<usize> {
        let ids: Vec<String> = instructions.iter().map(|i| i.id.clone()).collect();
        self.delete_instructions(&ids, project_id).await?;

        let documents = InstructionsChunker.chunk(instructions, project_id);
        info!("Indexing {} instructions as {} documents", instructions.len(), documents.len());
        let documents = self.embedder.embed_documents(documents).await?;
        let (_, written) = self.write(CollectionKind::Instructions, documents).await?;
        Ok(written)
    }

    pub async fn delete_instructions(&self, ids: &[String], project_id: Option<&str>) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let filter = MetadataFilter::for_project(project_id).any_of("instruction_id", ids.iter().cloned());
        self.cleaner(&[CollectionKind::Instructions])?.run_with_filter(&filter).await
    }

    /// Remove the project's documents from every store, or everything without a project.
    pub async fn clean(&self, project_id: Option<&str>) -> Result<()> {
        let kinds: Vec<CollectionKind> = self.stores.keys().copied().collect();
        self.cleaner(&kinds)?.run(project_id).await
    }
}
