use thiserror::Error;

/// Problems detected while assembling a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("duplicate entity: {0}")]
    DuplicateEntity(String),

    #[error("duplicate property '{property}' in entity {entity}")]
    DuplicateProperty { entity: String, property: String },

    #[error("relationship '{relationship}' of entity {entity} targets unknown entity {target}")]
    UnknownTarget {
        entity: String,
        relationship: String,
        target: String,
    },

    #[error("invalid schema document: {0}")]
    Json(#[from] serde_json::Error),
}
