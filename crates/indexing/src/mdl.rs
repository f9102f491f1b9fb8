//! Model Definition Language document: models, views, relationships and metrics of a
//! database, as consumed by the chunkers.

use mdl_index_common::{IndexError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mdl {
    #[serde(default)]
    pub catalog: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub models: Vec<Model>,
    #[serde(default)]
    pub views: Vec<View>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub name: String,
    #[serde(default)]
    pub table_reference: Option<TableReference>,
    #[serde(default)]
    pub ref_sql: Option<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub primary_key: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    #[serde(default)]
    pub catalog: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    pub table: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub is_calculated: bool,
    #[serde(default)]
    pub expression: Option<String>,
    /// Name of the relationship this column navigates, if it is a relationship column.
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinType {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinType::OneToOne => "ONE_TO_ONE",
            JoinType::OneToMany => "ONE_TO_MANY",
            JoinType::ManyToOne => "MANY_TO_ONE",
            JoinType::ManyToMany => "MANY_TO_MANY",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub name: String,
    pub models: Vec<String>,
    pub join_type: JoinType,
    pub condition: String,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub name: String,
    #[serde(default)]
    pub base_object: String,
    #[serde(default)]
    pub dimension: Vec<Column>,
    #[serde(default)]
    pub measure: Vec<Column>,
    #[serde(default)]
    pub time_grain: Vec<TimeGrain>,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeGrain {
    pub name: String,
    #[serde(default)]
    pub ref_column: String,
    #[serde(default)]
    pub date_parts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub name: String,
    #[serde(default)]
    pub statement: String,
    #[serde(default)]
    pub properties: Properties,
}

/// Free-form `properties` object attached to most MDL entities
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Properties(pub Map<String, Value>);

/// `null` reads as empty properties.
impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Option::<Map<String, Value>>::deserialize(deserializer)?;
        Ok(Properties(map.unwrap_or_default()))
    }
}

impl Properties {
    /// Non-empty string property
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn display_name(&self) -> Option<&str> {
        self.get_str("displayName")
    }

    pub fn description(&self) -> Option<&str> {
        self.get_str("description")
    }

    pub fn question(&self) -> Option<&str> {
        self.get_str("question")
    }

    pub fn summary(&self) -> Option<&str> {
        self.get_str("summary")
    }

    /// Saved view id; numeric ids are rendered as strings.
    pub fn view_id(&self) -> Option<String> {
        match self.0.get("viewId")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn boilerplate(&self) -> Option<&str> {
        self.get_str("boilerplate")
    }
}

const LIST_KEYS: [&str; 4] = ["models", "views", "relationships", "metrics"];

/// Parse an MDL string. Missing or `null` top-level lists become empty.
pub fn validate_mdl(raw: &str) -> Result<Mdl> {
    let mut value: Value = serde_json::from_str(raw)
        .map_err(|e| IndexError::InvalidMdl(format!("not valid JSON: {}", e)))?;

    let Value::Object(map) = &mut value else {
        return Err(IndexError::InvalidMdl("top level must be a JSON object".into()));
    };
    for key in LIST_KEYS {
        if map.get(key).map_or(true, Value::is_null) {
            map.insert(key.to_string(), Value::Array(Vec::new()));
        }
    }

    serde_json::from_value(value).map_err(|e| IndexError::InvalidMdl(e.to_string()))
}

impl Mdl {
    pub fn find_model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Lower-cased boilerplate names declared on models, deduplicated in order.
    pub fn boilerplates(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for model in &self.models {
            if let Some(name) = model.properties.boilerplate() {
                let name = name.to_lowercase();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(validate_mdl("{not json"), Err(IndexError::InvalidMdl(_))));
        assert!(matches!(validate_mdl("[]"), Err(IndexError::InvalidMdl(_))));
    }

    #[test]
    fn test_missing_and_null_lists_default_to_empty() {
        let mdl = validate_mdl(r#"{"catalog": "c", "views": null}"#).unwrap();
        assert_eq!(mdl.catalog.as_deref(), Some("c"));
        assert!(mdl.models.is_empty());
        assert!(mdl.views.is_empty());
        assert!(mdl.relationships.is_empty());
        assert!(mdl.metrics.is_empty());
    }

    #[test]
    fn test_full_model_parses() {
        let mdl = validate_mdl(
            r#"{
                "dataSource": "postgres",
                "models": [{
                    "name": "orders",
                    "tableReference": {"schema": "public", "table": "orders"},
                    "primaryKey": "id",
                    "columns": [
                        {"name": "id", "type": "integer", "notNull": true},
                        {"name": "total", "type": "double", "isCalculated": true, "expression": "sum(price)"}
                    ],
                    "properties": {"displayName": "Orders", "boilerplate": "Ecommerce"}
                }],
                "relationships": [{
                    "name": "orders_customer", "models": ["orders", "customers"],
                    "joinType": "MANY_TO_ONE", "condition": "orders.customer_id = customers.id"
                }]
            }"#,
        )
        .unwrap();

        let orders = mdl.find_model("orders").unwrap();
        assert_eq!(orders.columns.len(), 2);
        assert_eq!(orders.columns[0].data_type, "integer");
        assert!(orders.columns[1].is_calculated);
        assert_eq!(orders.properties.display_name(), Some("Orders"));
        assert_eq!(mdl.relationships[0].join_type, JoinType::ManyToOne);
        assert_eq!(mdl.data_source.as_deref(), Some("postgres"));
        assert_eq!(mdl.boilerplates(), vec!["ecommerce".to_string()]);
    }

    #[test]
    fn test_unknown_join_type_is_a_value_error() {
        let result = validate_mdl(
            r#"{"relationships": [{"name": "r", "models": ["a", "b"], "joinType": "SIDEWAYS", "condition": "a.x = b.y"}]}"#,
        );
        assert!(matches!(result, Err(IndexError::InvalidMdl(_))));
    }

    #[test]
    fn test_empty_string_properties_are_absent() {
        let props: Properties = serde_json::from_str(r#"{"description": "", "displayName": 3}"#).unwrap();
        assert_eq!(props.description(), None);
        assert_eq!(props.display_name(), None);
    }

    #[test]
    fn test_null_properties_read_as_empty() {
        let mdl = validate_mdl(
            r#"{
                "models": [{
                    "name": "orders",
                    "columns": [{"name": "id", "type": "integer", "properties": null}],
                    "properties": null
                }],
                "views": [{"name": "v", "statement": "SELECT 1", "properties": null}]
            }"#,
        )
        .unwrap();

        let orders = mdl.find_model("orders").unwrap();
        assert_eq!(orders.properties, Properties::default());
        assert_eq!(orders.columns[0].properties, Properties::default());
        assert_eq!(mdl.views[0].properties, Properties::default());
    }

    #[test]
    fn test_view_id_accepts_strings_and_numbers() {
        let props: Properties = serde_json::from_str(r#"{"viewId": 12}"#).unwrap();
        assert_eq!(props.view_id().as_deref(), Some("12"));
        let props: Properties = serde_json::from_str(r#"{"viewId": "abc"}"#).unwrap();
        assert_eq!(props.view_id().as_deref(), Some("abc"));
        let props: Properties = serde_json::from_str(r#"{"viewId": ""}"#).unwrap();
        assert_eq!(props.view_id(), None);
    }
}
