use crate::encoder;
use serde::Serialize;
use serde_json::{Value, json};
use trellis_api::SchemaGraph;
use trellis_query::SelectionTree;

/// A successful read: the compiled tree plus every fetched root object.
///
/// `total` counts the objects before pagination; `data` holds only the
/// requested page.
#[derive(Debug, Clone)]
pub struct DataResponse {
    tree: SelectionTree,
    objects: Vec<Value>,
}

impl DataResponse {
    pub fn new(tree: SelectionTree, objects: Vec<Value>) -> Self {
        Self { tree, objects }
    }

    pub fn tree(&self) -> &SelectionTree {
        &self.tree
    }

    pub fn total(&self) -> usize {
        self.objects.len()
    }

    pub fn encode(&self, schema: &dyn SchemaGraph) -> Value {
        let page = self.tree.page(&self.objects);
        json!({
            "success": true,
            "data": encoder::encode_list(schema, &self.tree.root, page),
            "total": self.total(),
        })
    }
}

/// Status-only envelope, used for failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SimpleResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    pub fn to_json(&self) -> Value {
        match &self.message {
            Some(message) => json!({ "success": self.success, "message": message }),
            None => json!({ "success": self.success }),
        }
    }
}

impl From<&trellis_query::Error> for SimpleResponse {
    fn from(e: &trellis_query::Error) -> Self {
        SimpleResponse::fail(e.message())
    }
}

impl From<&crate::Error> for SimpleResponse {
    fn from(e: &crate::Error) -> Self {
        match e {
            crate::Error::Query(e) => e.into(),
            other => SimpleResponse::fail(other.to_string()),
        }
    }
}
