//! Renders fetched records through a selection tree.
//!
//! Records are JSON objects keyed by attribute name, relationship name and
//! the primary-key token. Only what the selection node includes is
//! written out; everything else in the record is dropped.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use trellis_api::{ID_TOKEN, SchemaGraph};
use trellis_query::{MapBy, SelectionNode};

/// Key used when a `mapBy` value is null or absent.
pub const NULL_KEY: &str = "null";

enum Slot<'a> {
    Attribute,
    Relationship(&'a SelectionNode),
}

/// Encodes one record. A null or non-object record encodes as `null`.
pub fn encode_object(schema: &dyn SchemaGraph, node: &SelectionNode, record: &Value) -> Value {
    let Some(fields) = record.as_object() else {
        return Value::Null;
    };

    let mut out = Map::new();
    if node.id_included() {
        let token = schema
            .entity(node.entity())
            .map(|entity| entity.primary_key_token())
            .unwrap_or(ID_TOKEN);
        out.insert(token.to_string(), field(fields, token));
    }

    let mut slots = BTreeMap::new();
    for name in node.attributes() {
        slots.insert(name.as_str(), Slot::Attribute);
    }
    for (name, child) in node.relationships() {
        slots.insert(name.as_str(), Slot::Relationship(child));
    }

    for (name, slot) in slots {
        let value = match slot {
            Slot::Attribute => field(fields, name),
            Slot::Relationship(child) if child.is_to_many() => {
                let related = fields.get(name).and_then(Value::as_array);
                let related = related.map(Vec::as_slice).unwrap_or_default();
                match child.map_by() {
                    Some(map_by) => encode_grouped(schema, child, map_by, related),
                    None => encode_list(schema, child, related),
                }
            }
            Slot::Relationship(child) => {
                encode_object(schema, child, fields.get(name).unwrap_or(&Value::Null))
            }
        };
        out.insert(name.to_string(), value);
    }

    Value::Object(out)
}

/// Encodes a list of records with the same node.
pub fn encode_list(schema: &dyn SchemaGraph, node: &SelectionNode, records: &[Value]) -> Value {
    Value::Array(
        records
            .iter()
            .map(|record| encode_object(schema, node, record))
            .collect(),
    )
}

/// Groups related records by their `mapBy` value. Keys keep first-seen
/// order and each group keeps record order.
pub fn encode_grouped(
    schema: &dyn SchemaGraph,
    node: &SelectionNode,
    map_by: &MapBy,
    records: &[Value],
) -> Value {
    let mut groups: IndexMap<String, Vec<Value>> = IndexMap::new();
    for record in records {
        groups
            .entry(group_key(map_by, record))
            .or_default()
            .push(encode_object(schema, node, record));
    }

    Value::Object(
        groups
            .into_iter()
            .map(|(key, values)| (key, Value::Array(values)))
            .collect(),
    )
}

/// Walks the `mapBy` segments through the raw record.
pub fn group_key(map_by: &MapBy, record: &Value) -> String {
    let mut current = record;
    for segment in map_by.segments() {
        match current.get(segment) {
            Some(next) => current = next,
            None => return NULL_KEY.to_string(),
        }
    }
    match current {
        Value::Null => NULL_KEY.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn field(fields: &Map<String, Value>, name: &str) -> Value {
    fields.get(name).cloned().unwrap_or(Value::Null)
}
