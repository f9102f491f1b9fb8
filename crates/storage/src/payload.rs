//! Writes a value into a document payload at a [`JsonPathItem`] path.
//!
//! Containers the path needs are created on the way down. A node whose type does not match
//! the next path segment is overwritten with an empty container of the right kind.

use crate::json_path::JsonPathItem;
use serde_json::{Map, Value};

/// Set `value` at `path` inside `payload`.
///
/// At the end of the path an existing object is merged with `value`; anything else is
/// replaced by it. Indexes one past the end of a list append a new element, indexes further
/// out are ignored, and a wildcard index applies the rest of the path to every element.
pub fn set_value_by_key(payload: &mut Map<String, Value>, path: &[JsonPathItem], value: &Map<String, Value>) {
    match path.split_first() {
        None => merge_into_map(payload, value),
        Some((JsonPathItem::Key(key), rest)) => {
            let child = payload.entry(key.clone()).or_insert(Value::Null);
            set_at(child, rest, value);
        }
        Some((item, _)) => {
            tracing::debug!("Ignoring payload path starting with {}, the root is an object", item);
        }
    }
}

fn set_at(node: &mut Value, path: &[JsonPathItem], value: &Map<String, Value>) {
    let Some((item, rest)) = path.split_first() else {
        match node {
            Value::Object(existing) => merge_into_map(existing, value),
            other => *other = Value::Object(value.clone()),
        }
        return;
    };

    match item {
        JsonPathItem::Key(key) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                let child = map.entry(key.clone()).or_insert(Value::Null);
                set_at(child, rest, value);
            }
        }
        JsonPathItem::Index(index) => {
            if !node.is_array() {
                *node = Value::Array(Vec::new());
            }
            if let Value::Array(items) = node {
                if *index == items.len() {
                    items.push(Value::Null);
                }
                if let Some(child) = items.get_mut(*index) {
                    set_at(child, rest, value);
                }
            }
        }
        JsonPathItem::WildcardIndex => {
            if !node.is_array() {
                *node = Value::Array(Vec::new());
            }
            if let Value::Array(items) = node {
                for child in items.iter_mut() {
                    set_at(child, rest, value);
                }
            }
        }
    }
}

fn merge_into_map(target: &mut Map<String, Value>, value: &Map<String, Value>) {
    for (k, v) in value {
        target.insert(k.clone(), v.clone());
    }
}
