use futures::future::try_join_all;
use mdl_index_common::Result;
use mdl_index_storage::{DocumentStore, MetadataFilter};
use std::sync::Arc;
use tracing::info;

/// Deletes documents from a set of stores at once
#[derive(Clone)]
pub struct DocumentCleaner {
    stores: Vec<Arc<dyn DocumentStore>>,
}

impl DocumentCleaner {
    pub fn new(stores: Vec<Arc<dyn DocumentStore>>) -> Self {
        Self { stores }
    }

    /// Remove the project's documents, or everything when `project_id` is `None`.
    pub async fn run(&self, project_id: Option<&str>) -> Result<()> {
        match project_id {
            Some(id) => info!("Cleaning {} stores for project {}", self.stores.len(), id),
            None => info!("Cleaning {} stores", self.stores.len()),
        }
        let filter = MetadataFilter::for_project(project_id);
        self.run_with_filter(&filter).await
    }

    pub async fn run_with_filter(&self, filter: &MetadataFilter) -> Result<()> {
        let filter = (!filter.is_empty()).then_some(filter);
        try_join_all(self.stores.iter().map(|store| store.delete_documents(filter))).await?;
        Ok(())
    }
}
