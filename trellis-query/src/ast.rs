use crate::literal::Literal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Filter expression tree.
///
/// The parser emits `Path` nodes holding the raw reference and `Parameter`
/// nodes for `$name` placeholders; the filter resolver replaces both with
/// canonical paths and literals before the tree is attached to a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Path(String),
    Parameter(String),
    List(Vec<Expression>),
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Not(Box<Expression>),
    Negate(Box<Expression>),
    Binary(Box<BinaryExpression>),
    Between(Box<BetweenExpression>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BinaryExpression {
    pub left: Expression,
    pub operator: BinaryOperator,
    pub right: Expression,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BetweenExpression {
    pub value: Expression,
    pub low: Expression,
    pub high: Expression,
    pub negated: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BinaryOperator {
    Equals,
    NotEquals,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Like,
    NotLike,
    LikeIgnoreCase,
    NotLikeIgnoreCase,
    In,
    NotIn,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Equals => "=",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Like => "like",
            BinaryOperator::NotLike => "not like",
            BinaryOperator::LikeIgnoreCase => "likeIgnoreCase",
            BinaryOperator::NotLikeIgnoreCase => "not likeIgnoreCase",
            BinaryOperator::In => "in",
            BinaryOperator::NotIn => "not in",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Add | BinaryOperator::Subtract => PREC_ADD,
            BinaryOperator::Multiply | BinaryOperator::Divide => PREC_MUL,
            _ => PREC_CMP,
        }
    }
}

const PREC_OR: u8 = 10;
const PREC_AND: u8 = 30;
const PREC_NOT: u8 = 35;
const PREC_CMP: u8 = 40;
const PREC_ADD: u8 = 50;
const PREC_MUL: u8 = 60;
const PREC_PREFIX: u8 = 80;
const PREC_ATOM: u8 = 100;

impl Expression {
    pub fn literal(literal: Literal) -> Self {
        Expression::Literal(literal)
    }

    pub fn path(path: impl Into<String>) -> Self {
        Expression::Path(path.into())
    }

    pub fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Self {
        Expression::Binary(Box::new(BinaryExpression {
            left,
            operator,
            right,
        }))
    }

    /// Conjunction of `self` and `other`, flattening nested `And`s.
    pub fn and(self, other: Expression) -> Self {
        let mut terms = match self {
            Expression::And(terms) => terms,
            single => vec![single],
        };
        match other {
            Expression::And(more) => terms.extend(more),
            single => terms.push(single),
        }
        Expression::And(terms)
    }

    /// Disjunction of `self` and `other`, flattening nested `Or`s.
    pub fn or(self, other: Expression) -> Self {
        let mut terms = match self {
            Expression::Or(terms) => terms,
            single => vec![single],
        };
        match other {
            Expression::Or(more) => terms.extend(more),
            single => terms.push(single),
        }
        Expression::Or(terms)
    }

    fn precedence(&self) -> u8 {
        match self {
            Expression::Or(_) => PREC_OR,
            Expression::And(_) => PREC_AND,
            Expression::Not(_) => PREC_NOT,
            Expression::Between(_) => PREC_CMP,
            Expression::Binary(b) => b.operator.precedence(),
            Expression::Negate(_) => PREC_PREFIX,
            Expression::Literal(_)
            | Expression::Path(_)
            | Expression::Parameter(_)
            | Expression::List(_) => PREC_ATOM,
        }
    }

    /// Calls `f` on every path reference in the tree.
    pub fn visit_paths<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Expression::Path(p) => f(p),
            Expression::Literal(_) | Expression::Parameter(_) => {}
            Expression::List(items) | Expression::And(items) | Expression::Or(items) => {
                for item in items {
                    item.visit_paths(f);
                }
            }
            Expression::Not(inner) | Expression::Negate(inner) => inner.visit_paths(f),
            Expression::Binary(b) => {
                b.left.visit_paths(f);
                b.right.visit_paths(f);
            }
            Expression::Between(b) => {
                b.value.visit_paths(f);
                b.low.visit_paths(f);
                b.high.visit_paths(f);
            }
        }
    }
}

struct Operand<'a> {
    expr: &'a Expression,
    wrap: bool,
}

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.wrap {
            write!(f, "({})", self.expr)
        } else {
            write!(f, "{}", self.expr)
        }
    }
}

fn below<'a>(expr: &'a Expression, min: u8) -> Operand<'a> {
    Operand {
        expr,
        wrap: expr.precedence() < min,
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    items: &[Expression],
    separator: &str,
    min: u8,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", below(item, min))?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(literal) => write!(f, "{literal}"),
            Expression::Path(path) => f.write_str(path),
            Expression::Parameter(name) => write!(f, "${name}"),
            Expression::List(items) => {
                f.write_str("(")?;
                write_joined(f, items, ", ", 0)?;
                f.write_str(")")
            }
            Expression::And(terms) => write_joined(f, terms, " and ", PREC_AND + 1),
            Expression::Or(terms) => write_joined(f, terms, " or ", PREC_OR + 1),
            Expression::Not(inner) => write!(f, "not {}", below(inner, PREC_ATOM)),
            Expression::Negate(inner) => write!(f, "-{}", below(inner, PREC_ATOM)),
            Expression::Binary(b) => {
                let prec = b.operator.precedence();
                write!(
                    f,
                    "{} {} {}",
                    below(&b.left, prec),
                    b.operator.symbol(),
                    below(&b.right, prec + 1)
                )
            }
            Expression::Between(b) => write!(
                f,
                "{} {} {} and {}",
                below(&b.value, PREC_CMP + 1),
                if b.negated { "not between" } else { "between" },
                below(&b.low, PREC_CMP + 1),
                below(&b.high, PREC_CMP + 1)
            ),
        }
    }
}
