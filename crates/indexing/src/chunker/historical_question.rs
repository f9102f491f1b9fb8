use super::{base_meta, MdlChunker};
use crate::mdl::Mdl;
use mdl_index_common::{CollectionKind, Document};
use serde_json::json;

/// Turns views saved from an answered question into question documents, so similar
/// questions can be matched to an existing view.
#[derive(Debug, Clone, Default)]
pub struct HistoricalQuestionChunker;

impl MdlChunker for HistoricalQuestionChunker {
    fn kind(&self) -> CollectionKind {
        CollectionKind::HistoricalQuestion
    }

    fn chunk(&self, mdl: &Mdl, project_id: Option<&str>) -> Vec<Document> {
        mdl.views
            .iter()
            .filter_map(|view| {
                let question = view.properties.question()?;
                let mut meta = base_meta(project_id);
                meta.insert("summary".to_string(), json!(view.properties.summary().unwrap_or_default()));
                meta.insert("statement".to_string(), json!(view.statement));
                meta.insert("viewId".to_string(), json!(view.properties.view_id().unwrap_or_default()));
                Some(Document::new(question, meta))
            })
            .collect()
    }
}
