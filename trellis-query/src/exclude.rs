//! Exclude phase: removes attributes and id flags from included nodes.
//!
//! Each segment is probed against the schema of the node it applies to,
//! walking down nodes that the include phase created. A relationship that
//! was never included cannot be excluded from, so such excludes are
//! no-ops. Excluding a bare relationship leaves its node in place; only
//! attribute and primary-key excludes take effect.

use crate::compiler::Context;
use crate::error::{Error, Result};
use crate::path::{PATH_SEPARATOR, check_path_length};
use crate::selection::SelectionNode;
use serde_json::Value;
use tracing::debug;
use trellis_api::Property;

/// Applies one raw exclude parameter: a dotted path or a JSON array of them.
pub fn apply(ctx: &Context<'_>, node: &mut SelectionNode, raw: &str) -> Result<()> {
    if raw.trim_start().starts_with('[') {
        let paths: Vec<Value> = serde_json::from_str(raw)
            .map_err(|e| Error::InvalidExclude(format!("Bad exclude spec: {raw} ({e})")))?;
        for path in &paths {
            match path {
                Value::String(path) => exclude_path(ctx, node, path)?,
                other => {
                    return Err(Error::InvalidExclude(format!(
                        "Bad exclude spec, expected a string: {other}"
                    )));
                }
            }
        }
        return Ok(());
    }
    exclude_path(ctx, node, raw)
}

/// Excludes a single dotted path.
pub fn exclude_path(ctx: &Context<'_>, node: &mut SelectionNode, raw: &str) -> Result<()> {
    check_path_length(raw, ctx.cache.max_path_length())?;
    if raw.starts_with(PATH_SEPARATOR) || raw.ends_with(PATH_SEPARATOR) {
        return Err(Error::InvalidExclude(format!(
            "Exclude starts or ends with a dot: {raw}"
        )));
    }

    let mut current = node;
    let mut rest = raw;
    loop {
        let (head, tail) = match rest.split_once(PATH_SEPARATOR) {
            Some((head, tail)) => (head, Some(tail)),
            None => (rest, None),
        };
        let entity = ctx.schema.entity(current.entity()).ok_or_else(|| {
            Error::InvalidExclude(format!("Unknown entity '{}'", current.entity()))
        })?;

        match entity.property(head) {
            Property::Attribute(attribute) => {
                if tail.is_some() {
                    return Err(invalid(raw, entity.name()));
                }
                current.exclude_attribute(&attribute.name);
                return Ok(());
            }
            Property::PrimaryKey(_) => {
                if tail.is_some() {
                    return Err(invalid(raw, entity.name()));
                }
                current.set_id_included(false);
                return Ok(());
            }
            Property::Relationship(relationship) => {
                let Some(child) = current.child_mut(&relationship.name) else {
                    debug!(path = raw, "exclude of a relationship that was never included");
                    return Ok(());
                };
                match tail {
                    Some(tail) => {
                        current = child;
                        rest = tail;
                    }
                    None => {
                        debug!(path = raw, "bare relationship exclude leaves the relationship");
                        return Ok(());
                    }
                }
            }
            Property::Unresolved => return Err(invalid(raw, entity.name())),
        }
    }
}

fn invalid(raw: &str, entity: &str) -> Error {
    Error::InvalidExclude(format!("Invalid exclude path '{raw}' for '{entity}'"))
}
