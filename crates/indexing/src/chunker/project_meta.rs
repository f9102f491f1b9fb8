use super::{base_meta, MdlChunker};
use crate::mdl::Mdl;
use mdl_index_common::{CollectionKind, Document};
use serde_json::json;

/// Single document recording which data source the MDL describes
#[derive(Debug, Clone, Default)]
pub struct ProjectMetaChunker;

impl MdlChunker for ProjectMetaChunker {
    fn kind(&self) -> CollectionKind {
        CollectionKind::ProjectMeta
    }

    fn chunk(&self, mdl: &Mdl, project_id: Option<&str>) -> Vec<Document> {
        let mut meta = base_meta(project_id);
        meta.insert(
            "data_source".to_string(),
            json!(mdl.data_source.as_deref().unwrap_or_default()),
        );
        vec![Document::new("", meta)]
    }
}
