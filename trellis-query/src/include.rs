//! Include phase: grows the selection tree from include directives.
//!
//! A directive is a bare dotted path, a JSON include object, or a JSON
//! array mixing both:
//!
//! ```text
//! e3s.name
//! {"path": "e3s", "mapBy": "name", "sort": "name", "cayenneExp": "name like 'a%'"}
//! ["e5", {"path": "e3s", "sort": [{"property": "name", "direction": "DESC"}]}]
//! ```

use crate::compiler::Context;
use crate::error::{Error, Result};
use crate::path::{PathExpression, PathTarget};
use crate::selection::{MapBy, SelectionNode};
use crate::{filter, sort};
use serde_json::{Map, Value};
use tracing::debug;

/// Applies one raw include parameter to `node`.
pub fn apply(ctx: &Context<'_>, node: &mut SelectionNode, raw: &str) -> Result<()> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| Error::MalformedInclude(format!("Bad include spec: {raw} ({e})")))?;
        return apply_value(ctx, node, &value);
    }
    include_path(ctx, node, raw).map(|_| ())
}

/// Applies an already-parsed include value.
pub fn apply_value(ctx: &Context<'_>, node: &mut SelectionNode, value: &Value) -> Result<()> {
    match value {
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(path) => {
                        include_path(ctx, node, path)?;
                    }
                    Value::Object(object) => include_object(ctx, node, object)?,
                    other => {
                        return Err(Error::MalformedInclude(format!(
                            "Bad include spec, unexpected array element: {other}"
                        )));
                    }
                }
            }
            Ok(())
        }
        Value::Object(object) => include_object(ctx, node, object),
        Value::String(path) => include_path(ctx, node, path).map(|_| ()),
        other => Err(Error::MalformedInclude(format!(
            "Bad include spec: {other}"
        ))),
    }
}

/// Includes a dotted path and returns the node it ends on.
pub fn include_path<'n>(
    ctx: &Context<'_>,
    node: &'n mut SelectionNode,
    raw: &str,
) -> Result<&'n mut SelectionNode> {
    let path = ctx.cache.resolve(ctx.schema, node.entity(), raw)?;
    if path.is_storage() {
        return Err(Error::InvalidPath(format!(
            "Storage path can't be included: {raw}"
        )));
    }
    Ok(graft(node, &path))
}

/// Creates the nodes along `path` and marks its terminal.
fn graft<'n>(node: &'n mut SelectionNode, path: &PathExpression) -> &'n mut SelectionNode {
    let mut current = node;
    for hop in path.hops() {
        current = current.include_relationship(&hop.name, &hop.entity, hop.to_many);
    }
    match path.target() {
        PathTarget::Attribute { name, .. } => {
            current.include_attribute(name.as_str());
        }
        PathTarget::PrimaryKey { .. } => current.include_id(),
        PathTarget::Relationship | PathTarget::Storage => {}
    }
    current
}

fn include_object(
    ctx: &Context<'_>,
    node: &mut SelectionNode,
    object: &Map<String, Value>,
) -> Result<()> {
    let raw = match object.get("path") {
        Some(Value::String(raw)) => raw,
        Some(_) => {
            return Err(Error::MalformedInclude(
                "Bad include spec, non-string 'path' in include object".to_string(),
            ));
        }
        None => {
            return Err(Error::MalformedInclude(
                "Bad include spec, no 'path' in include object".to_string(),
            ));
        }
    };

    let path = ctx.cache.resolve(ctx.schema, node.entity(), raw)?;
    let Some(hop) = path.terminal_hop() else {
        return Err(Error::MalformedInclude(format!(
            "Bad include spec, non-relationship 'path' in include object: {raw}"
        )));
    };
    let (target, to_many) = (hop.entity.clone(), hop.to_many);
    let child = graft(node, &path);

    match object.get("mapBy") {
        None | Some(Value::Null) => {}
        Some(Value::String(map_by)) if to_many => {
            let resolved = ctx.cache.resolve(ctx.schema, &target, map_by)?;
            child.set_map_by(MapBy::new(resolved.object_path()));
        }
        Some(Value::String(map_by)) => {
            debug!(
                path = raw.as_str(),
                map_by = map_by.as_str(),
                "ignoring mapBy on to-one relationship"
            );
        }
        Some(_) => {
            return Err(Error::MalformedInclude(format!(
                "Bad include spec, non-string 'mapBy' in include object: {raw}"
            )));
        }
    }

    if let Some(spec) = object.get("sort") {
        match spec {
            Value::Null => {}
            Value::String(simple) => sort::apply(ctx, child, simple, None)?,
            other => sort::apply_value(ctx, child, other)?,
        }
    }

    if let Some(spec) = object.get("cayenneExp").or_else(|| object.get("filter")) {
        filter::apply_value(ctx, child, spec)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::LiteralParser;
    use crate::path::PathCache;
    use trellis_api::{Attribute, AttributeType, Cardinality, EntityDef, Relationship, Schema};

    fn schema() -> Schema {
        Schema::builder()
            .entity_def(
                EntityDef::new("E2")
                    .attribute(Attribute::new("name", AttributeType::Text))
                    .relationship(Relationship::new("e3s", "E3", Cardinality::ToMany)),
            )
            .entity_def(
                EntityDef::new("E3")
                    .attribute(Attribute::new("name", AttributeType::Text))
                    .relationship(Relationship::new("e2", "E2", Cardinality::ToOne)),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn bare_path_creates_nodes() {
        let schema = schema();
        let cache = PathCache::new(100);
        let ctx = Context::new(&schema, &cache, LiteralParser::default());
        let mut root = SelectionNode::new("E2");

        apply(&ctx, &mut root, "e3s.e2.name").unwrap();
        apply(&ctx, &mut root, "e3s").unwrap();

        let e3 = root.child("e3s").unwrap();
        assert!(e3.attributes().is_empty());
        assert!(e3.child("e2").unwrap().has_attribute("name"));
    }

    #[test]
    fn object_without_path_is_malformed() {
        let schema = schema();
        let cache = PathCache::new(100);
        let ctx = Context::new(&schema, &cache, LiteralParser::default());
        let mut root = SelectionNode::new("E2");

        let err = apply(&ctx, &mut root, r#"{"mapBy": "name"}"#).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedInclude);
        let err = apply(&ctx, &mut root, "[1]").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedInclude);
        let err = apply(&ctx, &mut root, "[\"e3s\"").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedInclude);
    }
}
