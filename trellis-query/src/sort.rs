//! Sort phase: appends orderings to a node.
//!
//! Accepts a bare path with an optional `ASC`/`DESC` direction, or a JSON
//! array of `{"property": ..., "direction": ...}` objects. Orderings are
//! deduplicated on their canonical path and the first one wins.

use crate::compiler::Context;
use crate::error::{Error, Result};
use crate::selection::{Ordering, SelectionNode, SortDirection};
use serde_json::{Map, Value};
use tracing::info;

/// Applies a raw sort parameter with an optional direction.
///
/// A `direction` only applies to the bare-path form.
pub fn apply(
    ctx: &Context<'_>,
    node: &mut SelectionNode,
    raw: &str,
    direction: Option<&str>,
) -> Result<()> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| Error::MalformedSort(format!("Bad sort spec: {raw} ({e})")))?;
        return apply_value(ctx, node, &value);
    }
    add_ordering(ctx, node, raw, direction)
}

/// Applies an already-parsed structured sort.
pub fn apply_value(ctx: &Context<'_>, node: &mut SelectionNode, value: &Value) -> Result<()> {
    match value {
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(object) => apply_object(ctx, node, object)?,
                    other => {
                        return Err(Error::MalformedSort(format!(
                            "Bad sort spec, expected an object: {other}"
                        )));
                    }
                }
            }
            Ok(())
        }
        Value::Object(object) => apply_object(ctx, node, object),
        Value::String(path) => add_ordering(ctx, node, path, None),
        other => Err(Error::MalformedSort(format!("Bad sort spec: {other}"))),
    }
}

fn apply_object(
    ctx: &Context<'_>,
    node: &mut SelectionNode,
    object: &Map<String, Value>,
) -> Result<()> {
    let property = match object.get("property") {
        Some(Value::String(property)) => property,
        Some(Value::Null) => {
            info!("ignoring NULL sort property");
            return Ok(());
        }
        Some(other) => {
            return Err(Error::MalformedSort(format!(
                "Bad sort spec, non-string 'property': {other}"
            )));
        }
        None => {
            return Err(Error::MalformedSort(
                "Bad sort spec, 'property' is missing".to_string(),
            ));
        }
    };
    // Non-string directions are validated by their JSON text, after the
    // duplicate check.
    let direction = match object.get("direction") {
        None => None,
        Some(Value::String(direction)) => Some(direction.clone()),
        Some(other) => Some(other.to_string()),
    };
    add_ordering(ctx, node, property, direction.as_deref())
}

/// Resolves `property` and appends it unless an ordering on the same
/// canonical path exists. The duplicate check runs before the direction is
/// validated.
pub fn add_ordering(
    ctx: &Context<'_>,
    node: &mut SelectionNode,
    property: &str,
    direction: Option<&str>,
) -> Result<()> {
    let path = ctx.cache.resolve(ctx.schema, node.entity(), property)?;
    if node.has_ordering(path.canonical()) {
        return Ok(());
    }
    let direction = match direction {
        Some(token) => SortDirection::parse(token)?,
        None => SortDirection::Ascending,
    };
    node.add_ordering(Ordering::new(path.canonical(), direction));
    Ok(())
}
