#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use trellis_api::{
    Attribute, AttributeType, Cardinality, Entity, EntityDef, Relationship, Schema, SchemaGraph,
};
use trellis_query::{CompileOptions, Compiler, ServerTimeZone};

/// E2 -< E3 >- E5, plus the flat E4 with one attribute of every type.
pub fn schema() -> Schema {
    Schema::builder()
        .entity_def(
            EntityDef::new("E2")
                .attribute(Attribute::new("name", AttributeType::Text))
                .attribute(Attribute::new("address", AttributeType::Text))
                .relationship(Relationship::new("e3s", "E3", Cardinality::ToMany)),
        )
        .entity_def(
            EntityDef::new("E3")
                .attribute(Attribute::new("name", AttributeType::Text))
                .attribute(Attribute::new("phoneNumber", AttributeType::Text))
                .relationship(Relationship::new("e2", "E2", Cardinality::ToOne))
                .relationship(Relationship::new("e5", "E5", Cardinality::ToOne)),
        )
        .entity_def(
            EntityDef::new("E4")
                .attribute(Attribute::new("cBoolean", AttributeType::Boolean))
                .attribute(Attribute::new("cDate", AttributeType::Date))
                .attribute(Attribute::new("cDecimal", AttributeType::Decimal))
                .attribute(Attribute::new("cInt", AttributeType::Integer))
                .attribute(Attribute::new("cTime", AttributeType::Time))
                .attribute(Attribute::new("cTimestamp", AttributeType::Timestamp))
                .attribute(Attribute::new("cVarchar", AttributeType::Text)),
        )
        .entity_def(
            EntityDef::new("E5")
                .attribute(Attribute::new("name", AttributeType::Text))
                .attribute(Attribute::new("date", AttributeType::Timestamp))
                .relationship(Relationship::new("e3s", "E3", Cardinality::ToMany)),
        )
        .build()
        .expect("fixture schema is valid")
}

/// Fixed -08:00, the server zone the date assertions are written for.
pub fn pacific() -> ServerTimeZone {
    "-08:00".parse().expect("valid offset")
}

pub fn options() -> CompileOptions {
    CompileOptions::default().with_time_zone(pacific())
}

pub fn compiler() -> Compiler {
    Compiler::new(schema(), options())
}

/// Compiler that leaves attribute sets exactly as the request built them.
pub fn bare_compiler() -> Compiler {
    Compiler::new(schema(), options().with_default_attributes(false))
}

/// Schema wrapper that counts entity lookups.
pub struct CountingSchema {
    inner: Schema,
    lookups: AtomicUsize,
}

impl CountingSchema {
    pub fn new(inner: Schema) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl SchemaGraph for CountingSchema {
    fn entity(&self, name: &str) -> Option<&Entity> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.entity(name)
    }
}
