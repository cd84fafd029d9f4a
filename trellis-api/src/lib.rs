//! Schema graph boundary for Trellis.
//!
//! The compiler never owns entity metadata. It reads it through the
//! [`SchemaGraph`] trait, which a metadata provider implements once per
//! schema version. [`Schema`] is the in-memory implementation used by the
//! CLI and the test suites.

mod error;
mod schema;

pub use error::SchemaError;
pub use schema::{EntityDef, Schema, SchemaBuilder, SchemaDef};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default client-facing token that denotes an entity's primary key.
pub const ID_TOKEN: &str = "id";

/// Scalar value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Boolean,
    Integer,
    Decimal,
    Text,
    Date,
    Time,
    Timestamp,
}

/// A scalar property of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: AttributeType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// Whether a relationship points at one related object or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    ToOne,
    ToMany,
}

/// A named edge from one entity to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub name: String,
    pub target: String,
    pub cardinality: Cardinality,
}

impl Relationship {
    pub fn new(name: impl Into<String>, target: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality,
        }
    }

    #[inline]
    pub fn is_to_many(&self) -> bool {
        self.cardinality == Cardinality::ToMany
    }
}

/// Primary key description.
///
/// `token` is what clients write in paths; `column` is the physical
/// identifier that storage-path rewrites (`db:`) point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub token: String,
    pub column: String,
}

impl Default for PrimaryKey {
    fn default() -> Self {
        Self {
            token: ID_TOKEN.to_string(),
            column: ID_TOKEN.to_string(),
        }
    }
}

/// Result of probing an entity for a single path segment.
///
/// Attributes win over relationships, and both win over the primary-key
/// token, so an attribute literally named `id` shadows the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property<'a> {
    Attribute(&'a Attribute),
    Relationship(&'a Relationship),
    PrimaryKey(&'a PrimaryKey),
    Unresolved,
}

/// An entity of the schema graph. Immutable once the schema is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    name: String,
    primary_key: PrimaryKey,
    attributes: IndexMap<String, Attribute>,
    relationships: IndexMap<String, Relationship>,
}

impl Entity {
    pub(crate) fn new(name: String, primary_key: PrimaryKey) -> Self {
        Self {
            name,
            primary_key,
            attributes: IndexMap::new(),
            relationships: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key(&self) -> &PrimaryKey {
        &self.primary_key
    }

    /// Client-facing primary key token, `id` unless configured otherwise.
    pub fn primary_key_token(&self) -> &str {
        &self.primary_key.token
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.get(name)
    }

    /// Attributes in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Relationships in declaration order.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    /// Single tagged lookup of a path segment. Lookups are case-sensitive.
    pub fn property(&self, name: &str) -> Property<'_> {
        if let Some(attribute) = self.attributes.get(name) {
            return Property::Attribute(attribute);
        }
        if let Some(relationship) = self.relationships.get(name) {
            return Property::Relationship(relationship);
        }
        if name == self.primary_key.token {
            return Property::PrimaryKey(&self.primary_key);
        }
        Property::Unresolved
    }

    fn contains_name(&self, name: &str) -> bool {
        self.attributes.contains_key(name) || self.relationships.contains_key(name)
    }

    pub(crate) fn push_attribute(&mut self, attribute: Attribute) -> Result<(), SchemaError> {
        if self.contains_name(&attribute.name) {
            return Err(SchemaError::DuplicateProperty {
                entity: self.name.clone(),
                property: attribute.name,
            });
        }
        self.attributes.insert(attribute.name.clone(), attribute);
        Ok(())
    }

    pub(crate) fn push_relationship(
        &mut self,
        relationship: Relationship,
    ) -> Result<(), SchemaError> {
        if self.contains_name(&relationship.name) {
            return Err(SchemaError::DuplicateProperty {
                entity: self.name.clone(),
                property: relationship.name,
            });
        }
        self.relationships
            .insert(relationship.name.clone(), relationship);
        Ok(())
    }
}

/// Read-only view of the entities of one schema version.
///
/// Implementors must never mutate an entity after handing it out; the
/// compiler shares one provider across all concurrent requests.
pub trait SchemaGraph: Send + Sync {
    /// Looks up an entity by name. Case-sensitive.
    fn entity(&self, name: &str) -> Option<&Entity>;
}

impl<S: SchemaGraph + ?Sized> SchemaGraph for std::sync::Arc<S> {
    fn entity(&self, name: &str) -> Option<&Entity> {
        (**self).entity(name)
    }
}

impl<S: SchemaGraph + ?Sized> SchemaGraph for &S {
    fn entity(&self, name: &str) -> Option<&Entity> {
        (**self).entity(name)
    }
}
