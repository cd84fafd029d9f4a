//! Trellis query compiler.
//!
//! Turns flat request parameters (`include`, `exclude`, `sort`/`direction`,
//! `filter`/`cayenneExp`, `start`, `limit`) into a validated
//! [`SelectionTree`] resolved against a [`SchemaGraph`](trellis_api::SchemaGraph).
//!
//! ```ignore
//! let compiler = Compiler::new(schema, CompileOptions::default());
//! let tree = compiler.compile(
//!     "E2",
//!     &RequestParams::new().include("e3s.name").sort("name").direction("DESC"),
//! )?;
//! ```

pub mod ast;
pub mod compiler;
pub mod error;
pub mod exclude;
pub mod filter;
pub mod include;
pub mod lexer;
pub mod literal;
pub mod options;
pub mod parser;
pub mod path;
pub mod request;
pub mod selection;
pub mod sort;

pub use ast::{BinaryOperator, Expression};
pub use compiler::{Compiler, Context};
pub use error::{Error, ErrorKind, Result};
pub use literal::{Literal, LiteralParser, ServerTimeZone};
pub use options::{CompileOptions, DEFAULT_MAX_PATH_LENGTH};
pub use parser::Parser;
pub use path::{PathCache, PathExpression, PathTarget};
pub use request::RequestParams;
pub use selection::{
    MapBy, Ordering, PrefetchSemantics, SelectionNode, SelectionTree, SortDirection,
};
