use crate::error::{Error, Result};
use crate::literal::LiteralParser;
use crate::options::CompileOptions;
use crate::path::PathCache;
use crate::request::RequestParams;
use crate::selection::{SelectionNode, SelectionTree};
use crate::{exclude, filter, include, sort};
use std::sync::Arc;
use tracing::trace;
use trellis_api::SchemaGraph;

/// Shared, read-only state every resolver works against.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub schema: &'a dyn SchemaGraph,
    pub cache: &'a PathCache,
    pub literals: LiteralParser,
}

impl<'a> Context<'a> {
    pub fn new(schema: &'a dyn SchemaGraph, cache: &'a PathCache, literals: LiteralParser) -> Self {
        Self {
            schema,
            cache,
            literals,
        }
    }
}

/// Compiles request parameters into selection trees for one schema version.
///
/// A compiler is `Send + Sync` and meant to be shared; the path cache it
/// owns is reused by every request.
pub struct Compiler {
    schema: Arc<dyn SchemaGraph>,
    cache: PathCache,
    options: CompileOptions,
}

impl Compiler {
    pub fn new<S: SchemaGraph + 'static>(schema: S, options: CompileOptions) -> Self {
        Self::with_shared_schema(Arc::new(schema), options)
    }

    pub fn with_shared_schema(schema: Arc<dyn SchemaGraph>, options: CompileOptions) -> Self {
        Self {
            cache: PathCache::new(options.max_path_length),
            schema,
            options,
        }
    }

    pub fn schema(&self) -> &dyn SchemaGraph {
        self.schema.as_ref()
    }

    pub fn cache(&self) -> &PathCache {
        &self.cache
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn context(&self) -> Context<'_> {
        Context::new(
            self.schema.as_ref(),
            &self.cache,
            LiteralParser::new(self.options.time_zone),
        )
    }

    /// Runs include, default attributes, exclude, sort and filter, in that
    /// order, then attaches pagination.
    pub fn compile(&self, entity: &str, params: &RequestParams) -> Result<SelectionTree> {
        if self.schema.entity(entity).is_none() {
            return Err(Error::InvalidPath(format!("Unknown entity '{entity}'")));
        }

        let ctx = self.context();
        let mut root = SelectionNode::new(entity);

        for raw in &params.include {
            include::apply(&ctx, &mut root, raw)?;
        }
        if self.options.default_attributes {
            apply_default_attributes(self.schema.as_ref(), &mut root);
        }
        for raw in &params.exclude {
            exclude::apply(&ctx, &mut root, raw)?;
        }
        if let Some(raw) = &params.sort {
            sort::apply(&ctx, &mut root, raw, params.direction.as_deref())?;
        }
        if let Some(raw) = &params.filter {
            filter::apply(&ctx, &mut root, raw)?;
        }

        trace!(entity, "compiled selection tree");
        Ok(SelectionTree::new(root)
            .with_pagination(params.start, params.limit)
            .with_prefetch(self.options.prefetch))
    }
}

/// Gives every node with no explicit selection (no attribute and no
/// primary-key include) all of its entity's attributes, in declaration
/// order.
pub fn apply_default_attributes(schema: &dyn SchemaGraph, root: &mut SelectionNode) {
    root.for_each_mut(|node| {
        if node.has_explicit_selection() {
            return;
        }
        if let Some(entity) = schema.entity(node.entity()) {
            for attribute in entity.attributes() {
                node.include_attribute(attribute.name.as_str());
            }
        }
    });
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("cache", &self.cache)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
