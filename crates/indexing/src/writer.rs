use mdl_index_common::{Document, Result};
use mdl_index_storage::{DocumentStore, DuplicatePolicy};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub documents_written: usize,
}

/// Writes documents to one store under a fixed duplicate policy
#[derive(Clone)]
pub struct AsyncDocumentWriter {
    store: Arc<dyn DocumentStore>,
    policy: DuplicatePolicy,
}

impl AsyncDocumentWriter {
    pub fn new(store: Arc<dyn DocumentStore>, policy: DuplicatePolicy) -> Self {
        Self { store, policy }
    }

    pub async fn run(&self, documents: Vec<Document>) -> Result<WriteReport> {
        if documents.is_empty() {
            return Ok(WriteReport::default());
        }
        let count = documents.len();
        let documents_written = self.store.write_documents(documents, self.policy).await?;
        debug!(
            "Wrote {}/{} documents to {} ({})",
            documents_written,
            count,
            self.store.name(),
            self.policy
        );
        Ok(WriteReport { documents_written })
    }
}
