use super::{base_meta, MdlChunker};
use crate::mdl::{Column, Mdl, Properties};
use mdl_index_common::{CollectionKind, Document, DocumentType};
use serde_json::json;

/// One short description chunk per model, metric and view
#[derive(Debug, Clone, Default)]
pub struct TableDescriptionChunker;

impl TableDescriptionChunker {
    fn document(
        &self,
        name: &str,
        mdl_type: &str,
        properties: &Properties,
        columns: String,
        project_id: Option<&str>,
    ) -> Document {
        let chunk = json!({
            "name": name,
            "mdl_type": mdl_type,
            "description": properties.description().unwrap_or_default(),
            "columns": columns,
        });

        let mut meta = base_meta(project_id);
        meta.insert("type".to_string(), json!(DocumentType::TableDescription));
        meta.insert("name".to_string(), json!(name));
        Document::new(chunk.to_string(), meta)
    }
}

fn column_names<'a>(columns: impl Iterator<Item = &'a Column>) -> String {
    columns
        .filter(|c| c.relationship.is_none())
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl MdlChunker for TableDescriptionChunker {
    fn kind(&self) -> CollectionKind {
        CollectionKind::TableDescription
    }

    fn chunk(&self, mdl: &Mdl, project_id: Option<&str>) -> Vec<Document> {
        let models = mdl.models.iter().map(|model| {
            self.document(
                &model.name,
                "MODEL",
                &model.properties,
                column_names(model.columns.iter()),
                project_id,
            )
        });
        let metrics = mdl.metrics.iter().map(|metric| {
            self.document(
                &metric.name,
                "METRIC",
                &metric.properties,
                column_names(metric.dimension.iter().chain(metric.measure.iter())),
                project_id,
            )
        });
        let views = mdl.views.iter().map(|view| {
            self.document(&view.name, "VIEW", &view.properties, String::new(), project_id)
        });

        models.chain(metrics).chain(views).collect()
    }
}
