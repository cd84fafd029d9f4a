//! The selection tree handed to the query-execution and encoding layers.

use crate::ast::Expression;
use crate::error::{Error, Result};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "ASC")]
    Ascending,
    #[serde(rename = "DESC")]
    Descending,
}

impl SortDirection {
    /// Accepts exactly `ASC` or `DESC`.
    pub fn parse(token: &str) -> Result<Self> {
        match token {
            "ASC" => Ok(SortDirection::Ascending),
            "DESC" => Ok(SortDirection::Descending),
            other => Err(Error::InvalidDirection(format!(
                "Direction is invalid: {other}"
            ))),
        }
    }
}

/// One sort criterion. `path` is the canonical path string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ordering {
    pub path: String,
    pub direction: SortDirection,
}

impl Ordering {
    pub fn new(path: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            path: path.into(),
            direction,
        }
    }
}

/// Grouping key for a to-many relationship, as a dotted path relative to
/// the related entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapBy {
    pub path: String,
}

impl MapBy {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }
}

/// One entity position in the output tree.
///
/// Nodes are created by the include phase and mutated in place by the
/// later phases. A tree belongs to exactly one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionNode {
    entity: String,
    to_many: bool,
    id_included: bool,
    /// Set when a request named the primary-key token at this node.
    #[serde(skip)]
    id_explicit: bool,
    attributes: IndexSet<String>,
    relationships: IndexMap<String, SelectionNode>,
    #[serde(serialize_with = "serialize_qualifier")]
    qualifier: Option<Expression>,
    orderings: Vec<Ordering>,
    map_by: Option<MapBy>,
}

fn serialize_qualifier<S: Serializer>(
    qualifier: &Option<Expression>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match qualifier {
        Some(expression) => serializer.collect_str(expression),
        None => serializer.serialize_none(),
    }
}

impl SelectionNode {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            to_many: false,
            id_included: true,
            id_explicit: false,
            attributes: IndexSet::new(),
            relationships: IndexMap::new(),
            qualifier: None,
            orderings: Vec::new(),
            map_by: None,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Whether this node sits under a to-many relationship.
    pub fn is_to_many(&self) -> bool {
        self.to_many
    }

    pub fn id_included(&self) -> bool {
        self.id_included
    }

    pub fn set_id_included(&mut self, included: bool) {
        self.id_included = included;
    }

    /// Includes the primary key as an explicit selection. Such a node
    /// does not receive default attributes.
    pub fn include_id(&mut self) {
        self.id_included = true;
        self.id_explicit = true;
    }

    pub fn is_id_explicit(&self) -> bool {
        self.id_explicit
    }

    /// Whether the request selected anything at this node itself.
    pub fn has_explicit_selection(&self) -> bool {
        self.id_explicit || !self.attributes.is_empty()
    }

    pub fn attributes(&self) -> &IndexSet<String> {
        &self.attributes
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    /// Returns `false` if the attribute was already present.
    pub fn include_attribute(&mut self, name: impl Into<String>) -> bool {
        self.attributes.insert(name.into())
    }

    /// Removing an absent attribute is a no-op. Order of the remaining
    /// attributes is kept.
    pub fn exclude_attribute(&mut self, name: &str) -> bool {
        self.attributes.shift_remove(name)
    }

    pub fn relationships(&self) -> &IndexMap<String, SelectionNode> {
        &self.relationships
    }

    pub fn child(&self, relationship: &str) -> Option<&SelectionNode> {
        self.relationships.get(relationship)
    }

    pub fn child_mut(&mut self, relationship: &str) -> Option<&mut SelectionNode> {
        self.relationships.get_mut(relationship)
    }

    /// Returns the child for `relationship`, creating it on first use.
    pub fn include_relationship(
        &mut self,
        relationship: &str,
        entity: &str,
        to_many: bool,
    ) -> &mut SelectionNode {
        self.relationships
            .entry(relationship.to_string())
            .or_insert_with(|| {
                let mut child = SelectionNode::new(entity);
                child.to_many = to_many;
                child
            })
    }

    pub fn qualifier(&self) -> Option<&Expression> {
        self.qualifier.as_ref()
    }

    /// AND-s `expression` onto the existing qualifier, if any.
    pub fn and_qualifier(&mut self, expression: Expression) {
        self.qualifier = Some(match self.qualifier.take() {
            Some(existing) => existing.and(expression),
            None => expression,
        });
    }

    pub fn orderings(&self) -> &[Ordering] {
        &self.orderings
    }

    pub fn has_ordering(&self, path: &str) -> bool {
        self.orderings.iter().any(|o| o.path == path)
    }

    /// Appends `ordering` unless one with the same path exists. The
    /// existing entry, and its direction, win.
    pub fn add_ordering(&mut self, ordering: Ordering) -> bool {
        if self.has_ordering(&ordering.path) {
            return false;
        }
        self.orderings.push(ordering);
        true
    }

    pub fn map_by(&self) -> Option<&MapBy> {
        self.map_by.as_ref()
    }

    pub fn set_map_by(&mut self, map_by: MapBy) {
        self.map_by = Some(map_by);
    }

    /// Visits this node and all descendants, parents before children.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut SelectionNode)) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            f(node);
            stack.extend(node.relationships.values_mut().rev());
        }
    }
}

/// Batching strategy for related data. Passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefetchSemantics {
    #[default]
    Disjoint,
    Joint,
    DisjointById,
}

/// A compiled request: the root node plus root-only fetch settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionTree {
    pub root: SelectionNode,
    pub fetch_offset: usize,
    /// `None` means unbounded.
    pub fetch_limit: Option<usize>,
    pub prefetch: PrefetchSemantics,
}

impl SelectionTree {
    pub fn new(root: SelectionNode) -> Self {
        Self {
            root,
            fetch_offset: 0,
            fetch_limit: None,
            prefetch: PrefetchSemantics::default(),
        }
    }

    /// Negative `start` clamps to 0; a non-positive `limit` is unbounded.
    pub fn with_pagination(mut self, start: Option<i64>, limit: Option<i64>) -> Self {
        self.fetch_offset = start
            .map(|s| usize::try_from(s.max(0)).unwrap_or(usize::MAX))
            .unwrap_or(0);
        self.fetch_limit = limit
            .filter(|l| *l > 0)
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX));
        self
    }

    pub fn with_prefetch(mut self, prefetch: PrefetchSemantics) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// The slice of `items` selected by offset and limit.
    pub fn page<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.fetch_offset.min(items.len());
        let end = match self.fetch_limit {
            Some(limit) => start.saturating_add(limit).min(items.len()),
            None => items.len(),
        };
        &items[start..end]
    }
}
