use async_trait::async_trait;
use mdl_index_common::{Document, IndexError, Result, PROJECT_ID_KEY};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// What to do when a written document id already exists in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    #[default]
    Overwrite,
    Skip,
    Fail,
}

impl FromStr for DuplicatePolicy {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "overwrite" => Ok(DuplicatePolicy::Overwrite),
            "skip" => Ok(DuplicatePolicy::Skip),
            "fail" => Ok(DuplicatePolicy::Fail),
            _ => Err(IndexError::unknown_variant("duplicate policy", s)),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DuplicatePolicy::Overwrite => "overwrite",
            DuplicatePolicy::Skip => "skip",
            DuplicatePolicy::Fail => "fail",
        };
        f.write_str(name)
    }
}

/// Single predicate on a document's `meta`
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(String, String),
    AnyOf(String, Vec<String>),
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Equals(field, _) | Condition::AnyOf(field, _) => field,
        }
    }

    pub fn matches(&self, meta: &Map<String, Value>) -> bool {
        let Some(actual) = meta.get(self.field()).and_then(value_as_string) else {
            return false;
        };
        match self {
            Condition::Equals(_, expected) => actual == *expected,
            Condition::AnyOf(_, candidates) => candidates.iter().any(|c| *c == actual),
        }
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Conjunction of [`Condition`]s. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    pub conditions: Vec<Condition>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(Condition::Equals(field.into(), value.into()));
        self
    }

    pub fn any_of<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions.push(Condition::AnyOf(
            field.into(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Filter scoped to `project_id`; empty when no project is given.
    pub fn for_project(project_id: Option<&str>) -> Self {
        match project_id {
            Some(id) => Self::new().equals(PROJECT_ID_KEY, id),
            None => Self::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, meta: &Map<String, Value>) -> bool {
        self.conditions.iter().all(|c| c.matches(meta))
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &str;

    /// Fails when the backing service is unreachable.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    /// Returns how many documents were actually written.
    async fn write_documents(&self, documents: Vec<Document>, policy: DuplicatePolicy) -> Result<usize>;

    /// `None` deletes every document in the store.
    async fn delete_documents(&self, filter: Option<&MetadataFilter>) -> Result<()>;

    async fn count_documents(&self, filter: Option<&MetadataFilter>) -> Result<usize>;

    /// Merge `value` into the `meta` of every matching document, at the JSON path `key`
    /// (the root of `meta` when `None`).
    async fn set_payload(
        &self,
        filter: &MetadataFilter,
        value: Map<String, Value>,
        key: Option<&str>,
    ) -> Result<()>;
}
