// Expression Parser/Evaluator
// Single-pass recursive descent: each grammar rule parses its
// production and immediately computes the resulting value

use thiserror::Error;

use crate::context::Context;
use crate::expression::lexer::{LexError, Lexer, Op, Token};
use crate::expression::resolver;
use crate::expression::value::{loose_equal, strict_equal, Value};

/// Maximum nesting depth of parenthesized groups and unary chains.
/// Exceeding it is a parse error instead of a stack overflow.
pub const MAX_DEPTH: usize = 64;

/// Parser error, fatal to the single expression being evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected trailing tokens after expression")]
    TrailingTokens,
    #[error("missing closing ')'")]
    MissingParen,
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("expression nesting exceeds {MAX_DEPTH} levels")]
    TooDeep,
}

/// Any failure while evaluating one expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Tokenize and evaluate `expr` against the normalized context.
///
/// Coercion never fails: non-numeric operands become NaN, and NaN
/// compares false under every relational operator. Only malformed
/// input (lex or parse) produces an error.
pub fn evaluate(expr: &str, ctx: &Context) -> Result<Value, ExpressionError> {
    let tokens = Lexer::new(expr).tokenize()?;
    let mut evaluator = Evaluator {
        tokens,
        pos: 0,
        depth: 0,
        ctx,
    };

    let value = evaluator.parse_or()?;
    if evaluator.pos != evaluator.tokens.len() {
        return Err(ParseError::TrailingTokens.into());
    }
    Ok(value)
}

struct Evaluator<'a> {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    ctx: &'a Context,
}

impl Evaluator<'_> {
    // Precedence, lowest to highest:
    //   Or, And, Equality/Relational, AddSub, MulDiv, Unary, Primary.
    // All binary operators are left-associative.

    fn parse_or(&mut self) -> Result<Value, ExpressionError> {
        self.enter()?;
        let mut left = self.parse_and()?;
        while self.peek_op() == Some(Op::Or) {
            self.pos += 1;
            // Both operands are computed; the left side's truthiness
            // only selects which operand value flows through.
            let right = self.parse_and()?;
            left = if left.is_truthy() { left } else { right };
        }
        self.leave();
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Value, ExpressionError> {
        let mut left = self.parse_equality()?;
        while self.peek_op() == Some(Op::And) {
            self.pos += 1;
            let right = self.parse_equality()?;
            left = if left.is_truthy() { right } else { left };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Value, ExpressionError> {
        let mut left = self.parse_add_sub()?;
        loop {
            let op = match self.peek_op() {
                Some(
                    op @ (Op::Eq
                    | Op::Ne
                    | Op::StrictEq
                    | Op::StrictNe
                    | Op::Gt
                    | Op::Ge
                    | Op::Lt
                    | Op::Le),
                ) => op,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_add_sub()?;
            left = Value::Bool(match op {
                Op::Eq => loose_equal(&left, &right),
                Op::Ne => !loose_equal(&left, &right),
                Op::StrictEq => strict_equal(&left, &right),
                Op::StrictNe => !strict_equal(&left, &right),
                Op::Gt => left.to_number() > right.to_number(),
                Op::Ge => left.to_number() >= right.to_number(),
                Op::Lt => left.to_number() < right.to_number(),
                Op::Le => left.to_number() <= right.to_number(),
                _ => unreachable!("matched above"),
            });
        }
        Ok(left)
    }

    fn parse_add_sub(&mut self) -> Result<Value, ExpressionError> {
        let mut left = self.parse_mul_div()?;
        loop {
            let op = match self.peek_op() {
                Some(op @ (Op::Plus | Op::Minus)) => op,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_mul_div()?;
            left = if op == Op::Plus {
                if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                    Value::String(format!("{}{}", left.as_string(), right.as_string()))
                } else {
                    Value::Number(left.to_number() + right.to_number())
                }
            } else {
                Value::Number(left.to_number() - right.to_number())
            };
        }
        Ok(left)
    }

    fn parse_mul_div(&mut self) -> Result<Value, ExpressionError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_op() {
                Some(op @ (Op::Star | Op::Slash | Op::Percent)) => op,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            let (a, b) = (left.to_number(), right.to_number());
            // division and modulo by zero follow IEEE-754
            left = Value::Number(match op {
                Op::Star => a * b,
                Op::Slash => a / b,
                _ => a % b,
            });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Value, ExpressionError> {
        if self.peek_op() == Some(Op::Not) {
            self.pos += 1;
            self.enter()?;
            let value = self.parse_unary()?;
            self.leave();
            return Ok(Value::Bool(!value.is_truthy()));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Value, ExpressionError> {
        let Some(token) = self.eat() else {
            return Err(ParseError::UnexpectedEnd.into());
        };

        match token {
            Token::LParen => {
                let value = self.parse_or()?;
                match self.eat() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(ParseError::MissingParen.into()),
                }
            }
            Token::String(s) => Ok(Value::String(s)),
            Token::Number(n) => Ok(Value::Number(n)),
            Token::Bool(b) => Ok(Value::Bool(b)),
            Token::Null => Ok(Value::Null),
            Token::Identifier(path) => Ok(resolver::resolve(&path, self.ctx)),
            other => Err(ParseError::UnexpectedToken(other.to_string()).into()),
        }
    }

    fn peek_op(&self) -> Option<Op> {
        match self.tokens.get(self.pos) {
            Some(Token::Op(op)) => Some(*op),
            _ => None,
        }
    }

    fn eat(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn enter(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::TooDeep.into());
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}
