#![allow(dead_code)]

use trellis::{CompileOptions, Schema, Trellis};

/// E2 -< E3 >- E5, as a schema document.
pub const SCHEMA_JSON: &str = r#"{"entities": [
    {"name": "E2",
     "attributes": [{"name": "name", "type": "text"}, {"name": "address", "type": "text"}],
     "relationships": [{"name": "e3s", "target": "E3", "cardinality": "to_many"}]},
    {"name": "E3",
     "attributes": [{"name": "name", "type": "text"}, {"name": "phoneNumber", "type": "text"}],
     "relationships": [{"name": "e2", "target": "E2", "cardinality": "to_one"},
                       {"name": "e5", "target": "E5", "cardinality": "to_one"}]},
    {"name": "E5",
     "attributes": [{"name": "name", "type": "text"}],
     "relationships": [{"name": "e3s", "target": "E3", "cardinality": "to_many"}]}
]}"#;

pub fn schema() -> Schema {
    Schema::from_json(SCHEMA_JSON).expect("fixture schema is valid")
}

pub fn trellis() -> Trellis {
    Trellis::new(schema(), CompileOptions::default())
}

pub fn keys(value: &serde_json::Value) -> Vec<&str> {
    value
        .as_object()
        .expect("an object")
        .keys()
        .map(String::as_str)
        .collect()
}
