//! Path resolution and the shared path cache.
//!
//! A path is a dotted chain of segments resolved against an entity. Every
//! segment except the last must name a relationship; the last one may be
//! an attribute, a relationship or the primary-key token. Paths prefixed
//! with `db:` are storage paths and are taken verbatim.

use crate::error::{Error, Result};
use crate::lexer::{DB_PREFIX, OBJ_PREFIX};
use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;
use trellis_api::{AttributeType, Property, SchemaGraph};

pub const PATH_SEPARATOR: char = '.';

/// One relationship traversed by a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub name: String,
    /// Entity the relationship points at.
    pub entity: String,
    pub to_many: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathTarget {
    Attribute {
        name: String,
        value_type: AttributeType,
    },
    /// The last hop is the relationship itself.
    Relationship,
    PrimaryKey {
        column: String,
    },
    /// `db:` path, not validated against the schema.
    Storage,
}

/// A fully resolved path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathExpression {
    raw: String,
    canonical: String,
    hops: Vec<Hop>,
    target: PathTarget,
}

impl PathExpression {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The raw path without an `obj:` prefix.
    pub fn object_path(&self) -> &str {
        self.raw.strip_prefix(OBJ_PREFIX).unwrap_or(&self.raw)
    }

    /// Key used for orderings and filter references. Primary-key paths
    /// are rewritten to their `db:` column form.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Relationships traversed, in order.
    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn target(&self) -> &PathTarget {
        &self.target
    }

    pub fn is_storage(&self) -> bool {
        matches!(self.target, PathTarget::Storage)
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self.target, PathTarget::Relationship)
    }

    /// The relationship a relationship path ends on.
    pub fn terminal_hop(&self) -> Option<&Hop> {
        match self.target {
            PathTarget::Relationship => self.hops.last(),
            _ => None,
        }
    }
}

/// Fails with `PathTooLong` when `raw` exceeds `max` characters.
pub fn check_path_length(raw: &str, max: usize) -> Result<()> {
    // byte length bounds the char count, so short paths skip the count
    if raw.len() <= max {
        return Ok(());
    }
    let length = raw.chars().count();
    if length > max {
        return Err(Error::PathTooLong(format!(
            "Include/exclude path too long: {length} characters (max {max})"
        )));
    }
    Ok(())
}

/// Resolves `raw` against `entity` without caching.
pub fn resolve_path(schema: &dyn SchemaGraph, entity: &str, raw: &str) -> Result<PathExpression> {
    let invalid = || Error::InvalidPath(format!("Invalid path '{raw}' for '{entity}'"));

    if let Some(column) = raw.strip_prefix(DB_PREFIX) {
        if column.is_empty() {
            return Err(invalid());
        }
        return Ok(PathExpression {
            raw: raw.to_string(),
            canonical: raw.to_string(),
            hops: Vec::new(),
            target: PathTarget::Storage,
        });
    }
    let object_path = raw.strip_prefix(OBJ_PREFIX).unwrap_or(raw);

    let mut current = schema.entity(entity).ok_or_else(invalid)?;
    let mut hops = Vec::new();
    let mut target = None;

    for segment in object_path.split(PATH_SEPARATOR) {
        if segment.is_empty() || target.is_some() {
            return Err(invalid());
        }
        match current.property(segment) {
            Property::Attribute(attribute) => {
                target = Some(PathTarget::Attribute {
                    name: attribute.name.clone(),
                    value_type: attribute.value_type,
                });
            }
            Property::PrimaryKey(pk) => {
                target = Some(PathTarget::PrimaryKey {
                    column: pk.column.clone(),
                });
            }
            Property::Relationship(relationship) => {
                current = schema.entity(&relationship.target).ok_or_else(invalid)?;
                hops.push(Hop {
                    name: relationship.name.clone(),
                    entity: relationship.target.clone(),
                    to_many: relationship.is_to_many(),
                });
            }
            Property::Unresolved => return Err(invalid()),
        }
    }

    let target = target.unwrap_or(PathTarget::Relationship);
    let canonical = match &target {
        PathTarget::PrimaryKey { column } => {
            let mut canonical = String::from(DB_PREFIX);
            for hop in &hops {
                canonical.push_str(&hop.name);
                canonical.push(PATH_SEPARATOR);
            }
            canonical.push_str(column);
            canonical
        }
        _ => object_path.to_string(),
    };

    Ok(PathExpression {
        raw: raw.to_string(),
        canonical,
        hops,
        target,
    })
}

/// Number of cache shards (power of two for fast modulo).
pub const NUM_SHARDS: usize = 16;

const _: () = assert!(
    NUM_SHARDS.is_power_of_two(),
    "NUM_SHARDS must be a power of two"
);

const SHARD_MASK: u64 = (NUM_SHARDS - 1) as u64;

type Shard = RwLock<HashMap<String, HashMap<String, Arc<PathExpression>>>>;

/// Memoizes resolved paths per `(entity, raw path)`.
///
/// Shared by all requests compiled against one schema version. Entries are
/// immutable and never evicted. Two threads missing on the same key may
/// both resolve it; the first one to publish wins and both get that entry.
/// Failed resolutions are not cached.
pub struct PathCache {
    shards: Box<[Shard]>,
    hasher: RandomState,
    max_path_length: usize,
}

impl PathCache {
    pub fn new(max_path_length: usize) -> Self {
        Self {
            shards: (0..NUM_SHARDS).map(|_| Shard::default()).collect(),
            hasher: RandomState::new(),
            max_path_length,
        }
    }

    pub fn max_path_length(&self) -> usize {
        self.max_path_length
    }

    fn shard(&self, entity: &str, raw: &str) -> &Shard {
        let index = (self.hasher.hash_one((entity, raw)) & SHARD_MASK) as usize;
        &self.shards[index]
    }

    /// Returns the resolved path, computing and publishing it on a miss.
    ///
    /// The length guard runs before the schema is consulted.
    pub fn resolve(
        &self,
        schema: &dyn SchemaGraph,
        entity: &str,
        raw: &str,
    ) -> Result<Arc<PathExpression>> {
        check_path_length(raw, self.max_path_length)?;

        let shard = self.shard(entity, raw);
        {
            let guard = shard.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = guard.get(entity).and_then(|paths| paths.get(raw)) {
                return Ok(Arc::clone(hit));
            }
        }

        debug!(entity, path = raw, "path cache miss");
        let resolved = Arc::new(resolve_path(schema, entity, raw)?);

        let mut guard = shard.write().unwrap_or_else(PoisonError::into_inner);
        let published = guard
            .entry(entity.to_string())
            .or_default()
            .entry(raw.to_string())
            .or_insert(resolved);
        Ok(Arc::clone(published))
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .values()
                    .map(HashMap::len)
                    .sum::<usize>()
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new(crate::options::DEFAULT_MAX_PATH_LENGTH)
    }
}

impl std::fmt::Debug for PathCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathCache")
            .field("entries", &self.len())
            .field("max_path_length", &self.max_path_length)
            .finish()
    }
}
