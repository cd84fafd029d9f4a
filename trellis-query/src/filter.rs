//! Filter phase: compiles `{exp, params}` specs into node qualifiers.
//!
//! Paths in `exp` are expressed in the client-facing schema, so `db:`
//! references are rejected. Primary-key references are rewritten to their
//! `db:` column form. `$name` placeholders are bound from `params`; a
//! missing parameter binds to null.

use crate::ast::{BetweenExpression, BinaryExpression, Expression};
use crate::compiler::Context;
use crate::error::{Error, Result};
use crate::lexer::DB_PREFIX;
use crate::literal::Literal;
use crate::parser::Parser;
use crate::selection::SelectionNode;
use serde_json::{Map, Value};

/// Applies a raw filter parameter: a JSON `{exp, params}` object or a bare
/// expression string.
pub fn apply(ctx: &Context<'_>, node: &mut SelectionNode, raw: &str) -> Result<()> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('{') {
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| Error::BadFilterSpec(format!("Bad filter spec: {raw} ({e})")))?;
        return apply_value(ctx, node, &value);
    }
    qualify(ctx, node, raw, &Map::new())
}

/// Applies an already-parsed filter spec. `null` is no filter.
pub fn apply_value(ctx: &Context<'_>, node: &mut SelectionNode, value: &Value) -> Result<()> {
    match value {
        Value::Null => Ok(()),
        Value::String(exp) => qualify(ctx, node, exp, &Map::new()),
        Value::Object(object) => {
            let exp = match object.get("exp") {
                Some(Value::String(exp)) => exp,
                _ => {
                    return Err(Error::BadFilterSpec(format!(
                        "Bad filter spec, no textual 'exp': {value}"
                    )));
                }
            };
            let empty = Map::new();
            let params = match object.get("params") {
                None | Some(Value::Null) => &empty,
                Some(Value::Object(params)) => params,
                Some(other) => {
                    return Err(Error::BadFilterSpec(format!(
                        "Bad filter spec, 'params' is not an object: {other}"
                    )));
                }
            };
            qualify(ctx, node, exp, params)
        }
        other => Err(Error::BadFilterSpec(format!("Bad filter spec: {other}"))),
    }
}

fn qualify(
    ctx: &Context<'_>,
    node: &mut SelectionNode,
    exp: &str,
    params: &Map<String, Value>,
) -> Result<()> {
    let expression = compile(ctx, node.entity(), exp, params)?;
    node.and_qualifier(expression);
    Ok(())
}

/// Parses `exp` and binds it against `entity` and `params`.
pub fn compile(
    ctx: &Context<'_>,
    entity: &str,
    exp: &str,
    params: &Map<String, Value>,
) -> Result<Expression> {
    let parsed = Parser::parse(exp)?;
    Binder {
        ctx,
        entity,
        params,
    }
    .bind(parsed)
}

struct Binder<'c, 'a> {
    ctx: &'c Context<'a>,
    entity: &'c str,
    params: &'c Map<String, Value>,
}

impl Binder<'_, '_> {
    fn bind(&self, expression: Expression) -> Result<Expression> {
        Ok(match expression {
            Expression::Path(raw) => {
                if raw.starts_with(DB_PREFIX) {
                    return Err(Error::DisallowedPathPrefix(format!(
                        "Expression path can't start with '{DB_PREFIX}': {raw}"
                    )));
                }
                let path = self.ctx.cache.resolve(self.ctx.schema, self.entity, &raw)?;
                Expression::Path(path.canonical().to_string())
            }
            Expression::Parameter(name) => self.parameter(&name)?,
            Expression::Literal(literal) => Expression::Literal(literal),
            Expression::List(items) => Expression::List(self.bind_all(items)?),
            Expression::And(terms) => Expression::And(self.bind_all(terms)?),
            Expression::Or(terms) => Expression::Or(self.bind_all(terms)?),
            Expression::Not(inner) => Expression::Not(Box::new(self.bind(*inner)?)),
            Expression::Negate(inner) => Expression::Negate(Box::new(self.bind(*inner)?)),
            Expression::Binary(binary) => {
                let BinaryExpression {
                    left,
                    operator,
                    right,
                } = *binary;
                Expression::binary(self.bind(left)?, operator, self.bind(right)?)
            }
            Expression::Between(between) => {
                let BetweenExpression {
                    value,
                    low,
                    high,
                    negated,
                } = *between;
                Expression::Between(Box::new(BetweenExpression {
                    value: self.bind(value)?,
                    low: self.bind(low)?,
                    high: self.bind(high)?,
                    negated,
                }))
            }
        })
    }

    fn bind_all(&self, items: Vec<Expression>) -> Result<Vec<Expression>> {
        items.into_iter().map(|item| self.bind(item)).collect()
    }

    fn parameter(&self, name: &str) -> Result<Expression> {
        match self.params.get(name) {
            None => Ok(Expression::Literal(Literal::Null)),
            Some(Value::Array(values)) => values
                .iter()
                .map(|value| self.ctx.literals.parse(value).map(Expression::Literal))
                .collect::<Result<Vec<_>>>()
                .map(Expression::List),
            Some(value) => self.ctx.literals.parse(value).map(Expression::Literal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::LiteralParser;
    use crate::path::PathCache;
    use serde_json::json;
    use trellis_api::{Attribute, AttributeType, EntityDef, Schema};

    fn schema() -> Schema {
        Schema::builder()
            .entity_def(
                EntityDef::new("E4")
                    .attribute(Attribute::new("cInt", AttributeType::Integer))
                    .attribute(Attribute::new("cVarchar", AttributeType::Text)),
            )
            .build()
            .unwrap()
    }

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn binds_parameters() {
        let schema = schema();
        let cache = PathCache::new(100);
        let ctx = Context::new(&schema, &cache, LiteralParser::default());

        let expr = compile(&ctx, "E4", "cInt = $n or cVarchar in $names", &params(json!({
            "n": 453,
            "names": ["a", "b"]
        })))
        .unwrap();
        assert_eq!(expr.to_string(), "cInt = 453 or cVarchar in ('a', 'b')");
    }

    #[test]
    fn missing_parameter_is_null() {
        let schema = schema();
        let cache = PathCache::new(100);
        let ctx = Context::new(&schema, &cache, LiteralParser::default());
        let expr = compile(&ctx, "E4", "cInt = $missing", &Map::new()).unwrap();
        assert_eq!(expr.to_string(), "cInt = null");
    }

    #[test]
    fn qualifiers_accumulate() {
        let schema = schema();
        let cache = PathCache::new(100);
        let ctx = Context::new(&schema, &cache, LiteralParser::default());
        let mut node = SelectionNode::new("E4");

        apply(&ctx, &mut node, "cInt > 1").unwrap();
        apply(&ctx, &mut node, r#"{"exp": "cInt < $max", "params": {"max": 9}}"#).unwrap();
        assert_eq!(node.qualifier().unwrap().to_string(), "cInt > 1 and cInt < 9");
    }

    #[test]
    fn storage_prefix_is_disallowed() {
        let schema = schema();
        let cache = PathCache::new(100);
        let ctx = Context::new(&schema, &cache, LiteralParser::default());
        let err = compile(&ctx, "E4", "db:id = 5", &Map::new()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DisallowedPathPrefix);
    }

    #[test]
    fn object_parameter_is_rejected() {
        let schema = schema();
        let cache = PathCache::new(100);
        let ctx = Context::new(&schema, &cache, LiteralParser::default());
        let err = compile(&ctx, "E4", "cInt = $p", &params(json!({"p": {"x": 1}}))).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::BadFilterSpec);
    }
}
