//! MDL and SQL-knowledge chunkers. Every chunker is a pure function from its input to
//! [`Document`]s; embedding and storage happen elsewhere.

pub mod db_schema;
pub mod historical_question;
pub mod instructions;
pub mod project_meta;
pub mod sql_pairs;
pub mod table_description;

pub use db_schema::DdlChunker;
pub use historical_question::HistoricalQuestionChunker;
pub use instructions::{Instruction, InstructionsChunker};
pub use project_meta::ProjectMetaChunker;
pub use sql_pairs::{load_boilerplate_pairs, SqlPair, SqlPairsChunker};
pub use table_description::TableDescriptionChunker;

use crate::mdl::{Mdl, Properties};
use mdl_index_common::{CollectionKind, Document, PROJECT_ID_KEY};
use serde_json::{json, Map, Value};

/// Chunker whose input is a whole MDL document
pub trait MdlChunker: Send + Sync {
    fn kind(&self) -> CollectionKind;

    fn chunk(&self, mdl: &Mdl, project_id: Option<&str>) -> Vec<Document>;
}

/// Fresh meta map, scoped to `project_id` when one is given.
pub(crate) fn base_meta(project_id: Option<&str>) -> Map<String, Value> {
    let mut meta = Map::new();
    if let Some(id) = project_id {
        meta.insert(PROJECT_ID_KEY.to_string(), json!(id));
    }
    meta
}

/// `-- {"alias": .., "description": ..}` line built from display name and description.
pub(crate) fn properties_comment(properties: &Properties) -> String {
    let mut fields = Map::new();
    if let Some(alias) = properties.display_name() {
        fields.insert("alias".to_string(), json!(alias));
    }
    if let Some(description) = properties.description() {
        fields.insert("description".to_string(), json!(description));
    }
    if fields.is_empty() {
        String::new()
    } else {
        format!("-- {}\n  ", Value::Object(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_comment() {
        let props: Properties =
            serde_json::from_value(json!({"displayName": "Orders", "description": "All \"orders\""})).unwrap();
        assert_eq!(
            properties_comment(&props),
            "-- {\"alias\":\"Orders\",\"description\":\"All \\\"orders\\\"\"}\n  "
        );
        assert_eq!(properties_comment(&Properties::default()), "");
    }

    #[test]
    fn test_base_meta() {
        assert!(base_meta(None).is_empty());
        assert_eq!(base_meta(Some("p1"))[PROJECT_ID_KEY], json!("p1"));
    }
}
