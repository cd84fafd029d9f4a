//! # Trellis
//!
//! Compiles REST read-request parameters (`include`, `exclude`, `sort`,
//! `cayenneExp`/`filter`, `start`, `limit`) into a selection tree, and
//! encodes fetched records through that tree.
//!
//! ```rust,no_run
//! use trellis::{CompileOptions, RequestParams, Trellis, Result};
//!
//! fn main() -> Result<()> {
//!     // 1. Load the schema graph
//!     let trellis = Trellis::open("schema.json", CompileOptions::default())?;
//!
//!     // 2. Compile a request
//!     let params = RequestParams::new().include("e3s.name").sort("name");
//!     let tree = trellis.select("E2", &params)?;
//!
//!     // 3. Fetch with `tree`, then encode
//!     let (status, body) = trellis.respond("E2", &params, Vec::new());
//!     println!("{status} {body}");
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! - **[`Trellis`]**: The entry point. Owns the schema and a shared compiler.
//!   Safe to share across threads.
//! - **[`SelectionTree`]**: What to fetch and how to shape it.
//! - **[`encoder`]**: Renders records through a selection tree, including
//!   `mapBy` grouping.
//! - **[`query`]**: The compiler itself (re-exported from `trellis-query`).

pub mod encoder;
mod error;
mod response;

use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub use error::{Error, Result};
pub use response::{DataResponse, SimpleResponse};
pub use trellis_api::{Schema, SchemaGraph};
pub use trellis_query::{
    CompileOptions, Compiler, ErrorKind, PrefetchSemantics, RequestParams, SelectionNode,
    SelectionTree, ServerTimeZone,
};

/// Re-export of the compiler crate.
pub mod query {
    pub use trellis_query::*;
}

/// A schema plus the compiler serving requests against it.
#[derive(Debug)]
pub struct Trellis {
    compiler: Compiler,
}

impl Trellis {
    pub fn new<S: SchemaGraph + 'static>(schema: S, options: CompileOptions) -> Self {
        Self {
            compiler: Compiler::new(schema, options),
        }
    }

    /// Shares an existing schema graph, e.g. one owned by a metadata
    /// provider that serves several runtimes.
    pub fn with_shared_schema(schema: Arc<dyn SchemaGraph>, options: CompileOptions) -> Self {
        Self {
            compiler: Compiler::with_shared_schema(schema, options),
        }
    }

    /// Loads a JSON schema description from `path`.
    pub fn open(path: impl AsRef<Path>, options: CompileOptions) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let schema = Schema::from_json(&raw)?;
        Ok(Self::new(schema, options))
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub fn schema(&self) -> &dyn SchemaGraph {
        self.compiler.schema()
    }

    pub fn select(&self, entity: &str, params: &RequestParams) -> Result<SelectionTree> {
        Ok(self.compiler.compile(entity, params)?)
    }

    /// Compiles `params` and encodes `objects` through the result.
    ///
    /// Returns the status code and the success or failure envelope.
    pub fn respond(
        &self,
        entity: &str,
        params: &RequestParams,
        objects: Vec<serde_json::Value>,
    ) -> (u16, serde_json::Value) {
        match self.compiler.compile(entity, params) {
            Ok(tree) => (200, DataResponse::new(tree, objects).encode(self.schema())),
            Err(e) => {
                debug!(entity, kind = ?e.kind(), "request rejected: {e}");
                (e.status(), SimpleResponse::from(&e).to_json())
            }
        }
    }
}
