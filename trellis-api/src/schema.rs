use crate::{Attribute, Entity, PrimaryKey, Relationship, SchemaError, SchemaGraph};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// In-memory schema graph.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entities: IndexMap<String, Entity>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Parses and validates a JSON schema document.
    ///
    /// ```json
    /// {"entities": [{"name": "E2",
    ///                "attributes": [{"name": "name", "type": "text"}],
    ///                "relationships": [{"name": "e3s", "target": "E3", "cardinality": "to_many"}]}]}
    /// ```
    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        let def: SchemaDef = serde_json::from_str(raw)?;
        Self::from_def(def)
    }

    pub fn from_def(def: SchemaDef) -> Result<Self, SchemaError> {
        let mut builder = Self::builder();
        for entity in def.entities {
            builder = builder.entity_def(entity);
        }
        builder.build()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl SchemaGraph for Schema {
    fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }
}

/// Serialized form of a schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDef {
    pub entities: Vec<EntityDef>,
}

/// Serialized form of one entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,
    #[serde(default)]
    pub primary_key: PrimaryKey,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl EntityDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn primary_key(mut self, token: impl Into<String>, column: impl Into<String>) -> Self {
        self.primary_key = PrimaryKey {
            token: token.into(),
            column: column.into(),
        };
        self
    }
}

/// Collects entity definitions and validates them as a whole on
/// [`SchemaBuilder::build`]: property names must be unique within an entity
/// and every relationship must target a known entity.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    defs: Vec<EntityDef>,
}

impl SchemaBuilder {
    pub fn entity_def(mut self, def: EntityDef) -> Self {
        self.defs.push(def);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut entities = IndexMap::with_capacity(self.defs.len());
        for def in self.defs {
            if entities.contains_key(&def.name) {
                return Err(SchemaError::DuplicateEntity(def.name));
            }
            let mut entity = Entity::new(def.name.clone(), def.primary_key);
            for attribute in def.attributes {
                entity.push_attribute(attribute)?;
            }
            for relationship in def.relationships {
                entity.push_relationship(relationship)?;
            }
            entities.insert(def.name, entity);
        }

        for entity in entities.values() {
            for relationship in entity.relationships() {
                if !entities.contains_key(&relationship.target) {
                    return Err(SchemaError::UnknownTarget {
                        entity: entity.name().to_string(),
                        relationship: relationship.name.clone(),
                        target: relationship.target.clone(),
                    });
                }
            }
        }

        Ok(Schema { entities })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttributeType, Cardinality, Property};

    fn two_entities() -> Schema {
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
    fn property_lookup_is_tagged() {
        let schema = two_entities();
        let e2 = schema.entity("E2").unwrap();

        assert!(matches!(e2.property("name"), Property::Attribute(a) if a.name == "name"));
        assert!(matches!(e2.property("e3s"), Property::Relationship(r) if r.target == "E3"));
        assert!(matches!(e2.property("id"), Property::PrimaryKey(_)));
        assert_eq!(e2.property("Name"), Property::Unresolved);
    }

    #[test]
    fn attribute_shadows_primary_key_token() {
        let schema = Schema::builder()
            .entity_def(EntityDef::new("P").attribute(Attribute::new("id", AttributeType::Text)))
            .build()
            .unwrap();
        assert!(matches!(
            schema.entity("P").unwrap().property("id"),
            Property::Attribute(_)
        ));
    }

    #[test]
    fn rejects_duplicate_property_names() {
        let err = Schema::builder()
            .entity_def(
                EntityDef::new("E")
                    .attribute(Attribute::new("x", AttributeType::Integer))
                    .relationship(Relationship::new("x", "E", Cardinality::ToOne)),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateProperty { .. }));
    }

    #[test]
    fn rejects_unknown_relationship_target() {
        let err = Schema::builder()
            .entity_def(EntityDef::new("E").relationship(Relationship::new(
                "other",
                "Missing",
                Cardinality::ToOne,
            )))
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "relationship 'other' of entity E targets unknown entity Missing"
        );
    }

    #[test]
    fn loads_json_document() {
        let schema = Schema::from_json(
            r#"{"entities": [
                {"name": "E2",
                 "attributes": [{"name": "name", "type": "text"}],
                 "relationships": [{"name": "e3s", "target": "E3", "cardinality": "to_many"}]},
                {"name": "E3", "primary_key": {"token": "id", "column": "ID"}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(schema.len(), 2);
        let e3 = schema.entity("E3").unwrap();
        assert_eq!(e3.primary_key().column, "ID");
        assert!(schema.entity("E2").unwrap().relationship("e3s").unwrap().is_to_many());
    }
}
