use super::{base_meta, properties_comment, MdlChunker};
use crate::mdl::{Column, JoinType, Mdl, Metric, Model, Relationship, View};
use mdl_index_common::{CollectionKind, Document, DocumentType};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Splits an MDL into DDL-like chunks: one `TABLE` chunk per model followed by
/// `TABLE_COLUMNS` chunks of at most `column_batch_size` entries, plus one chunk per
/// metric and view.
#[derive(Debug, Clone)]
pub struct DdlChunker {
    column_batch_size: usize,
}

impl Default for DdlChunker {
    fn default() -> Self {
        Self::new(50)
    }
}

impl DdlChunker {
    pub fn new(column_batch_size: usize) -> Self {
        Self {
            column_batch_size: column_batch_size.max(1),
        }
    }

    fn document(&self, name: &str, chunk: Value, project_id: Option<&str>) -> Document {
        let mut meta = base_meta(project_id);
        meta.insert("type".to_string(), json!(DocumentType::TableSchema));
        meta.insert("name".to_string(), json!(name));
        Document::new(chunk.to_string(), meta)
    }

    fn model_chunks(&self, mdl: &Mdl, model: &Model) -> Vec<Value> {
        let mut chunks = vec![json!({
            "type": "TABLE",
            "comment": properties_comment(&model.properties),
            "name": model.name,
        })];

        let primary_key = model.primary_key.as_deref();
        let mut entries: Vec<Value> = model
            .columns
            .iter()
            .filter(|column| column.relationship.is_none())
            .map(|column| column_entry(column, primary_key))
            .collect();

        entries.extend(
            mdl.relationships
                .iter()
                .filter(|rel| rel.models.iter().any(|m| *m == model.name))
                .filter_map(|rel| foreign_key_entry(rel, &model.name)),
        );

        for batch in entries.chunks(self.column_batch_size) {
            chunks.push(json!({
                "type": "TABLE_COLUMNS",
                "columns": batch,
            }));
        }
        chunks
    }

    fn metric_chunk(&self, metric: &Metric) -> Value {
        let columns: Vec<Value> = metric
            .dimension
            .iter()
            .chain(metric.measure.iter())
            .map(|column| column_entry(column, None))
            .collect();

        json!({
            "type": "METRIC",
            "comment": properties_comment(&metric.properties),
            "name": metric.name,
            "columns": columns,
            "base_object": metric.base_object,
        })
    }

    fn view_chunk(&self, view: &View) -> Value {
        json!({
            "type": "VIEW",
            "comment": properties_comment(&view.properties),
            "name": view.name,
            "statement": view.statement,
        })
    }
}

impl MdlChunker for DdlChunker {
    fn kind(&self) -> CollectionKind {
        CollectionKind::DbSchema
    }

    fn chunk(&self, mdl: &Mdl, project_id: Option<&str>) -> Vec<Document> {
        let mut documents = Vec::new();

        for model in &mdl.models {
            for chunk in self.model_chunks(mdl, model) {
                documents.push(self.document(&model.name, chunk, project_id));
            }
        }
        for metric in &mdl.metrics {
            documents.push(self.document(&metric.name, self.metric_chunk(metric), project_id));
        }
        for view in &mdl.views {
            documents.push(self.document(&view.name, self.view_chunk(view), project_id));
        }

        debug!("DDL chunker produced {} documents", documents.len());
        documents
    }
}

fn column_entry(column: &Column, primary_key: Option<&str>) -> Value {
    let mut comment = properties_comment(&column.properties);
    if column.is_calculated {
        comment.push_str("-- This column is a Calculated Field\n  ");
        if let Some(expression) = &column.expression {
            comment.push_str(&format!("-- column expression: {}\n  ", expression));
        }
    }

    json!({
        "type": "COLUMN",
        "comment": comment,
        "name": column.name,
        "data_type": column.data_type,
        "is_primary_key": primary_key == Some(column.name.as_str()),
        "not_null": column.not_null,
    })
}

/// `table.column` on either side of an equality condition.
fn parse_condition(condition: &str) -> Option<((&str, &str), (&str, &str))> {
    let (left, right) = condition.split_once('=')?;
    Some((parse_qualified_column(left)?, parse_qualified_column(right)?))
}

fn parse_qualified_column(s: &str) -> Option<(&str, &str)> {
    let (table, column) = s.trim().rsplit_once('.')?;
    let (table, column) = (table.trim(), column.trim());
    (!table.is_empty() && !column.is_empty()).then_some((table, column))
}

/// `FOREIGN_KEY` entry for `table_name`, if that table owns the key of `relationship`.
fn foreign_key_entry(relationship: &Relationship, table_name: &str) -> Option<Value> {
    let [first, second] = relationship.models.as_slice() else {
        warn!(
            "Relationship {} does not join exactly two models, skipping",
            relationship.name
        );
        return None;
    };

    let Some((left, right)) = parse_condition(&relationship.condition) else {
        warn!(
            "Relationship {} has malformed condition '{}', skipping",
            relationship.name, relationship.condition
        );
        return None;
    };

    // column of `first` and column of `second`, whatever order the condition uses
    let (first_column, second_column) = if left.0 == first && right.0 == second {
        (left.1, right.1)
    } else if left.0 == second && right.0 == first {
        (right.1, left.1)
    } else {
        warn!(
            "Relationship {} condition '{}' does not reference {} and {}, skipping",
            relationship.name, relationship.condition, first, second
        );
        return None;
    };

    let (owner, fk_column, referenced_table, referenced_column) = match relationship.join_type {
        JoinType::ManyToOne | JoinType::OneToOne => (first, first_column, second, second_column),
        JoinType::OneToMany => (second, second_column, first, first_column),
        JoinType::ManyToMany => return None,
    };
    if owner != table_name {
        return None;
    }

    let comment = format!(
        "-- {}\n  ",
        json!({
            "condition": relationship.condition,
            "joinType": relationship.join_type.to_string(),
        })
    );

    Some(json!({
        "type": "FOREIGN_KEY",
        "comment": comment,
        "constraint": format!(
            "FOREIGN KEY ({}) REFERENCES {}({})",
            fk_column, referenced_table, referenced_column
        ),
        "tables": relationship.models,
    }))
}
