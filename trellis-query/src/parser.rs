use crate::ast::{BetweenExpression, BinaryOperator, Expression};
use crate::error::Error;
use crate::lexer::{Lexer, Token, TokenType};
use crate::literal::Literal;

/// Entry point for filter expression parsing.
pub struct Parser;

impl Parser {
    pub fn parse(input: &str) -> Result<Expression, Error> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize().map_err(syntax_error)?;
        if tokens.len() > TokenParser::MAX_TOKENS {
            return Err(TokenParser::parser_complexity_error());
        }
        let mut parser = TokenParser::new(tokens);
        let expression = parser.parse_expression_bp(0)?;
        parser.ensure_budget()?;
        if !parser.is_at_end() {
            return Err(parser.unexpected());
        }
        Ok(expression)
    }
}

fn syntax_error(message: impl Into<String>) -> Error {
    Error::BadFilterSpec(format!("syntax error: {}", message.into()))
}

enum Infix {
    Or,
    And,
    Binary(BinaryOperator),
    Between { negated: bool },
    In { negated: bool },
}

struct TokenParser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
    parse_steps: usize,
    max_parse_steps: usize,
    budget_exhausted: bool,
}

impl TokenParser {
    // Pratt parser binding powers (higher = tighter binding).
    const BP_OR: u8 = 10;
    const BP_AND: u8 = 30;
    const BP_NOT: u8 = 35;
    const BP_CMP: u8 = 40;
    const BP_ADD: u8 = 50;
    const BP_MUL: u8 = 60;
    const BP_PREFIX: u8 = 80;
    const PARSE_STEP_FACTOR: usize = 64;
    const PARSE_STEP_FLOOR: usize = 4_096;
    const MAX_DEPTH: usize = 64;
    const MAX_TOKENS: usize = 4_096;

    fn new(tokens: Vec<Token>) -> Self {
        let max_parse_steps = Self::max_parse_steps_for(tokens.len());
        Self {
            tokens,
            position: 0,
            depth: 0,
            parse_steps: 0,
            max_parse_steps,
            budget_exhausted: false,
        }
    }

    #[cfg(test)]
    fn new_with_step_budget(tokens: Vec<Token>, max_parse_steps: usize) -> Self {
        let mut parser = Self::new(tokens);
        parser.max_parse_steps = max_parse_steps.max(1);
        parser
    }

    fn max_parse_steps_for(tokens_len: usize) -> usize {
        tokens_len
            .saturating_mul(Self::PARSE_STEP_FACTOR)
            .max(Self::PARSE_STEP_FLOOR)
    }

    fn parser_complexity_error() -> Error {
        syntax_error("expression is too complex")
    }

    fn ensure_budget(&self) -> Result<(), Error> {
        if self.budget_exhausted {
            Err(Self::parser_complexity_error())
        } else {
            Ok(())
        }
    }

    fn unexpected(&self) -> Error {
        let token = self.peek();
        match token.token_type {
            TokenType::Eof => syntax_error("unexpected end of expression"),
            ref other => syntax_error(format!(
                "unexpected {other:?} at {}:{}",
                token.line, token.column
            )),
        }
    }

    fn parse_expression_bp(&mut self, min_bp: u8) -> Result<Expression, Error> {
        self.ensure_budget()?;
        self.depth += 1;
        if self.depth > Self::MAX_DEPTH {
            return Err(Self::parser_complexity_error());
        }

        let mut lhs = self.parse_prefix_expression()?;

        loop {
            self.ensure_budget()?;
            let Some((infix, lbp, rbp, width)) = self.peek_infix_operator() else {
                break;
            };
            if lbp < min_bp {
                break;
            }
            for _ in 0..width {
                self.advance();
            }

            lhs = match infix {
                Infix::Or => lhs.or(self.parse_expression_bp(rbp)?),
                Infix::And => lhs.and(self.parse_expression_bp(rbp)?),
                Infix::Binary(op) => {
                    let rhs = self.parse_expression_bp(rbp)?;
                    Expression::binary(lhs, op, rhs)
                }
                Infix::Between { negated } => {
                    let low = self.parse_expression_bp(rbp)?;
                    self.consume(&TokenType::And, "expected AND in BETWEEN")?;
                    let high = self.parse_expression_bp(rbp)?;
                    Expression::Between(Box::new(BetweenExpression {
                        value: lhs,
                        low,
                        high,
                        negated,
                    }))
                }
                Infix::In { negated } => {
                    let list = self.parse_in_list()?;
                    let op = if negated {
                        BinaryOperator::NotIn
                    } else {
                        BinaryOperator::In
                    };
                    Expression::binary(lhs, op, list)
                }
            };
        }

        self.depth -= 1;
        Ok(lhs)
    }

    /// Returns the operator, its binding powers and how many tokens it spans.
    fn peek_infix_operator(&self) -> Option<(Infix, u8, u8, usize)> {
        let cmp = |infix| Some((infix, Self::BP_CMP, Self::BP_CMP + 1, 1));
        match &self.peek().token_type {
            TokenType::Or => Some((Infix::Or, Self::BP_OR, Self::BP_OR + 1, 1)),
            TokenType::And => Some((Infix::And, Self::BP_AND, Self::BP_AND + 1, 1)),
            TokenType::Equals => cmp(Infix::Binary(BinaryOperator::Equals)),
            TokenType::NotEquals => cmp(Infix::Binary(BinaryOperator::NotEquals)),
            TokenType::LessThan => cmp(Infix::Binary(BinaryOperator::LessThan)),
            TokenType::LessEqual => cmp(Infix::Binary(BinaryOperator::LessEqual)),
            TokenType::GreaterThan => cmp(Infix::Binary(BinaryOperator::GreaterThan)),
            TokenType::GreaterEqual => cmp(Infix::Binary(BinaryOperator::GreaterEqual)),
            TokenType::Like => cmp(Infix::Binary(BinaryOperator::Like)),
            TokenType::LikeIgnoreCase => cmp(Infix::Binary(BinaryOperator::LikeIgnoreCase)),
            TokenType::In => cmp(Infix::In { negated: false }),
            TokenType::Between => cmp(Infix::Between { negated: false }),
            TokenType::Not => {
                // NOT LIKE / NOT IN / NOT BETWEEN
                let negated = match self.peek_next().map(|t| &t.token_type)? {
                    TokenType::Like => Infix::Binary(BinaryOperator::NotLike),
                    TokenType::LikeIgnoreCase => {
                        Infix::Binary(BinaryOperator::NotLikeIgnoreCase)
                    }
                    TokenType::In => Infix::In { negated: true },
                    TokenType::Between => Infix::Between { negated: true },
                    _ => return None,
                };
                Some((negated, Self::BP_CMP, Self::BP_CMP + 1, 2))
            }
            TokenType::Plus => Some((
                Infix::Binary(BinaryOperator::Add),
                Self::BP_ADD,
                Self::BP_ADD + 1,
                1,
            )),
            TokenType::Dash => Some((
                Infix::Binary(BinaryOperator::Subtract),
                Self::BP_ADD,
                Self::BP_ADD + 1,
                1,
            )),
            TokenType::Asterisk => Some((
                Infix::Binary(BinaryOperator::Multiply),
                Self::BP_MUL,
                Self::BP_MUL + 1,
                1,
            )),
            TokenType::Divide => Some((
                Infix::Binary(BinaryOperator::Divide),
                Self::BP_MUL,
                Self::BP_MUL + 1,
                1,
            )),
            _ => None,
        }
    }

    fn parse_prefix_expression(&mut self) -> Result<Expression, Error> {
        self.ensure_budget()?;
        let token_type = self.peek().token_type.clone();
        match token_type {
            TokenType::Not => {
                self.advance();
                let operand = self.parse_expression_bp(Self::BP_NOT)?;
                Ok(Expression::Not(Box::new(operand)))
            }
            TokenType::Dash => {
                self.advance();
                let operand = self.parse_expression_bp(Self::BP_PREFIX)?;
                Ok(match operand {
                    Expression::Literal(Literal::Int(n)) => match n.checked_neg() {
                        Some(neg) => Expression::Literal(Literal::Int(neg)),
                        None => Expression::Literal(Literal::Decimal(-(n as f64))),
                    },
                    Expression::Literal(Literal::Decimal(d)) => {
                        Expression::Literal(Literal::Decimal(-d))
                    }
                    other => Expression::Negate(Box::new(other)),
                })
            }
            TokenType::Plus => {
                self.advance();
                self.parse_expression_bp(Self::BP_PREFIX)
            }
            TokenType::LeftParen => {
                self.advance();
                let inner = self.parse_expression_bp(0)?;
                self.consume(&TokenType::RightParen, "expected ')'")?;
                Ok(inner)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, Error> {
        let expression = match &self.peek().token_type {
            TokenType::Integer(n) => Expression::Literal(Literal::Int(*n)),
            TokenType::Decimal(d) => Expression::Literal(Literal::Decimal(*d)),
            TokenType::String(s) => Expression::Literal(Literal::Text(s.clone())),
            TokenType::Boolean(b) => Expression::Literal(Literal::Bool(*b)),
            TokenType::Null => Expression::Literal(Literal::Null),
            TokenType::Path(p) => Expression::Path(p.clone()),
            TokenType::Parameter(name) => Expression::Parameter(name.clone()),
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(expression)
    }

    /// `(a, b, ...)` or a single `$param` bound to a list later.
    fn parse_in_list(&mut self) -> Result<Expression, Error> {
        if let TokenType::Parameter(name) = &self.peek().token_type {
            let name = name.clone();
            self.advance();
            return Ok(Expression::Parameter(name));
        }

        self.consume(&TokenType::LeftParen, "expected '(' after IN")?;
        let mut items = Vec::new();
        if !self.check(&TokenType::RightParen) {
            items.push(self.parse_expression_bp(Self::BP_CMP + 1)?);
            while self.match_token(&TokenType::Comma) {
                self.ensure_budget()?;
                items.push(self.parse_expression_bp(Self::BP_CMP + 1)?);
            }
        }
        self.consume(&TokenType::RightParen, "expected ')' after IN list")?;
        Ok(Expression::List(items))
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token_type: &TokenType) -> bool {
        std::mem::discriminant(token_type) == std::mem::discriminant(&self.peek().token_type)
    }

    fn consume(&mut self, token_type: &TokenType, message: &str) -> Result<(), Error> {
        if self.check(token_type) {
            self.advance();
            Ok(())
        } else {
            let token = self.peek();
            Err(syntax_error(format!(
                "{message} at {}:{}",
                token.line, token.column
            )))
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.position + 1)
    }

    fn advance(&mut self) -> &Token {
        self.parse_steps = self.parse_steps.saturating_add(1);
        if self.parse_steps > self.max_parse_steps {
            self.budget_exhausted = true;
            self.position = self.tokens.len().saturating_sub(1);
            return &self.tokens[self.position];
        }

        let current = self.position;
        if !self.is_at_end() {
            self.position += 1;
        }
        &self.tokens[current]
    }
}
