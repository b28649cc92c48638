// MIT License
//
// Copyright (c) 2024 Jerome Johnson
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Embedded expressions
//!
//! The grammar is deliberately small: literals, identifiers, parentheses,
//! unary `! - +`, the binary operators below, member access `a.b` and index
//! access `a[i]`. There are no calls and no assignment.
//!
//! | precedence | operators |
//! |---|---|
//! | 5 | `*` `/` `%` |
//! | 4 | `+` `-` |
//! | 3 | `==` `!=` `<` `<=` `>` `>=` |
//! | 2 | `&&` |
//! | 1 | `\|\|` |
//!
//! Arithmetic works on floats, except `%` which needs two integers. `+`
//! concatenates when either side is a string. Any failure aborts the whole
//! expression.
//!
//! ```rust
//! use satori_xhtml::{expression::evaluate, Map, Scope, Value};
//!
//! let mut vars = Map::new();
//! vars.insert("arr".into(), Value::from(vec![5, 8]));
//! assert_eq!(evaluate("arr[1] + 2", &Scope::new(&vars)), Ok(Value::Float(10.0)));
//! ```

use std::cmp::Ordering;

use crate::{
    error::ExprError,
    expression_tokenizer::{Token, TokenType},
    scope::Scope,
    value::Value,
};

pub type Result<T> = std::result::Result<T, ExprError>;

/// Operands and postfix accesses one expression may contain. Bounds both
/// parser recursion and the depth of the resulting tree.
pub const MAX_TERMS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    fn from_token(value: &str) -> Option<Self> {
        Some(match value {
            "||" => BinaryOp::Or,
            "&&" => BinaryOp::And,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            _ => return None,
        })
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 3,
            BinaryOp::Add | BinaryOp::Sub => 4,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 5,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Ident(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
}

fn unquote(token: &Token<'_>) -> Result<String> {
    let inner = &token.value[1..token.value.len() - 1];
    if token.token_type == TokenType::RawString {
        return Ok(inner.to_string());
    }
    let bad = || ExprError::syntax("invalid escape", token.value);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next().ok_or_else(bad)?;
        let hex_len = match escaped {
            'x' => 2,
            'u' => 4,
            'U' => 8,
            _ => 0,
        };
        if hex_len > 0 {
            let digits: String = chars.by_ref().take(hex_len).collect();
            let code = u32::from_str_radix(&digits, 16).map_err(|_| bad())?;
            out.push(char::from_u32(code).ok_or_else(bad)?);
            continue;
        }
        out.push(match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            '0' => '\0',
            '\\' | '"' | '\'' => escaped,
            _ => return Err(bad()),
        });
    }
    if token.token_type == TokenType::Char && out.chars().count() != 1 {
        return Err(ExprError::syntax("invalid character literal", token.value));
    }
    Ok(out)
}

fn parse_int(value: &str) -> Option<i64> {
    let digits = value.replace('_', "");
    let (radix, digits) = match digits.get(..2) {
        Some("0x" | "0X") => (16, &digits[2..]),
        Some("0o" | "0O") => (8, &digits[2..]),
        Some("0b" | "0B") => (2, &digits[2..]),
        _ => (10, digits.as_str()),
    };
    i64::from_str_radix(digits, radix).ok()
}

struct Parser<'a> {
    src: &'a str,
    current: Option<Token<'a>>,
    terms: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Self> {
        Ok(Parser {
            src,
            current: Token::first(src)?,
            terms: 0,
        })
    }

    fn count_term(&mut self) -> Result<()> {
        self.terms += 1;
        if self.terms > MAX_TERMS {
            return Err(ExprError::syntax("expression too complex", self.near()));
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<Token<'a>>> {
        let token = self.current;
        if let Some(t) = &token {
            self.current = t.next()?;
        }
        Ok(token)
    }

    fn near(&self) -> &'a str {
        self.current.map_or(self.src, |t| t.value)
    }

    fn peek_punct(&self, value: &str) -> bool {
        self.current
            .is_some_and(|t| t.token_type == TokenType::Punct && t.value == value)
    }

    fn expect_punct(&mut self, value: &str) -> Result<()> {
        if !self.peek_punct(value) {
            return Err(ExprError::syntax(format!("expected {}", value), self.near()));
        }
        self.advance()?;
        Ok(())
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current {
                Some(t) if t.token_type == TokenType::Punct => BinaryOp::from_token(t.value),
                _ => None,
            };
            let Some(op) = op.filter(|op| op.precedence() >= min_precedence) else {
                return Ok(left);
            };
            self.advance()?;
            let right = self.parse_binary(op.precedence() + 1)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        self.count_term()?;
        let op = match self.current {
            Some(t) if t.token_type == TokenType::Punct => match t.value {
                "!" => Some(UnaryOp::Not),
                "-" => Some(UnaryOp::Neg),
                "+" => Some(UnaryOp::Plus),
                _ => None,
            },
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance()?;
                Ok(Expr::Unary(op, Box::new(self.parse_unary()?)))
            }
            None => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.peek_punct(".") {
                self.count_term()?;
                self.advance()?;
                match self.advance()? {
                    Some(t) if t.token_type == TokenType::Ident => {
                        expr = Expr::Member(Box::new(expr), t.value.to_string());
                    }
                    _ => return Err(ExprError::syntax("expected member name", self.near())),
                }
            } else if self.peek_punct("[") {
                self.count_term()?;
                self.advance()?;
                let index = self.parse_binary(1)?;
                self.expect_punct("]")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else if self.peek_punct("(") {
                return Err(ExprError::Call(self.src.to_string()));
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let Some(token) = self.advance()? else {
            return Err(ExprError::syntax("unexpected end of expression", self.src));
        };
        Ok(match token.token_type {
            TokenType::Int => Expr::Literal(Value::Int(
                parse_int(token.value).ok_or_else(|| ExprError::syntax("invalid integer", token.value))?,
            )),
            TokenType::Float => Expr::Literal(Value::Float(
                token
                    .value
                    .replace('_', "")
                    .parse()
                    .map_err(|_| ExprError::syntax("invalid float", token.value))?,
            )),
            TokenType::String | TokenType::RawString | TokenType::Char => {
                Expr::Literal(Value::String(unquote(&token)?))
            }
            TokenType::Ident => match token.value {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "nil" | "null" => Expr::Literal(Value::Null),
                name => Expr::Ident(name.to_string()),
            },
            TokenType::Punct if token.value == "(" => {
                let inner = self.parse_binary(1)?;
                self.expect_punct(")")?;
                inner
            }
            TokenType::Punct => {
                return Err(ExprError::syntax(format!("unexpected {}", token.value), token.value));
            }
        })
    }
}

/// Parses `src` into an expression tree.
pub fn parse(src: &str) -> Result<Expr> {
    let mut parser = Parser::new(src)?;
    let expr = parser.parse_binary(1)?;
    match parser.current {
        Some(t) => Err(ExprError::syntax(format!("unexpected {}", t.value), t.value)),
        None => Ok(expr),
    }
}

/// Parses and evaluates `src` against `scope`.
pub fn evaluate(src: &str, scope: &Scope<'_>) -> Result<Value> {
    parse(src)?.eval(scope)
}

impl Expr {
    pub fn eval(&self, scope: &Scope<'_>) -> Result<Value> {
        match self {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Ident(name) => scope
                .get(name)
                .cloned()
                .ok_or_else(|| ExprError::UnknownIdentifier(name.clone())),
            Expr::Unary(op, operand) => apply_unary(*op, operand.eval(scope)?),
            Expr::Binary(BinaryOp::And, left, right) => {
                Ok(Value::Bool(left.eval(scope)?.is_truthy() && right.eval(scope)?.is_truthy()))
            }
            Expr::Binary(BinaryOp::Or, left, right) => {
                Ok(Value::Bool(left.eval(scope)?.is_truthy() || right.eval(scope)?.is_truthy()))
            }
            Expr::Binary(op, left, right) => apply_binary(*op, left.eval(scope)?, right.eval(scope)?),
            Expr::Member(base, name) => {
                let base = base.eval(scope)?;
                lookup_value(&base, name).ok_or_else(|| ExprError::Member {
                    name: name.clone(),
                    kind: base.kind(),
                })
            }
            Expr::Index(base, index) => {
                let base = base.eval(scope)?;
                let index = index.eval(scope)?;
                index_value(&base, &index).ok_or_else(|| ExprError::Index {
                    index: index.to_string(),
                    kind: base.kind(),
                })
            }
        }
    }
}

fn apply_unary(op: UnaryOp, value: Value) -> Result<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Neg | UnaryOp::Plus => {
            let f = value.as_f64().ok_or(ExprError::Unary {
                op: if op == UnaryOp::Neg { "-" } else { "+" },
                kind: value.kind(),
            })?;
            Ok(Value::Float(if op == UnaryOp::Neg { -f } else { f }))
        }
    }
}

fn apply_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    let unsupported = |left: &Value, right: &Value| ExprError::Binary {
        op: op.symbol(),
        left: left.kind(),
        right: right.kind(),
    };
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(&left, &right).ok_or_else(|| unsupported(&left, &right))?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        BinaryOp::Add if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) => {
            Ok(Value::String(format!("{}{}", left, right)))
        }
        BinaryOp::Rem => {
            let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) else {
                return Err(unsupported(&left, &right));
            };
            if r == 0 {
                return Err(ExprError::DivisionByZero);
            }
            Ok(Value::Int(l.wrapping_rem(r)))
        }
        _ => {
            let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) else {
                return Err(unsupported(&left, &right));
            };
            Ok(Value::Float(match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                _ if r == 0.0 => return Err(ExprError::DivisionByZero),
                _ => l / r,
            }))
        }
    }
}

/// Orders two values: numerically when the left side reads as a number,
/// otherwise as two strings or two booleans. Other pairs don't compare.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if let Some(l) = left.as_f64() {
        return l.partial_cmp(&right.as_f64()?);
    }
    match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// Reads `name` from a map or a record.
pub fn lookup_value(value: &Value, name: &str) -> Option<Value> {
    match value {
        Value::Map(map) => map.get(name).cloned(),
        Value::Record(record) => record.field(name),
        _ => None,
    }
}

/// Indexes a list by position, a string by character, or a map by key.
pub fn index_value(base: &Value, index: &Value) -> Option<Value> {
    match base {
        Value::List(items) => {
            let i = usize::try_from(index.as_i64()?).ok()?;
            items.get(i).cloned()
        }
        Value::String(s) => {
            let i = usize::try_from(index.as_i64()?).ok()?;
            s.chars().nth(i).map(Value::from)
        }
        Value::Map(map) if !index.is_null() => map.get(index.to_string().as_str()).cloned(),
        Value::Record(record) => match index {
            Value::String(name) => record.field(name),
            _ => None,
        },
        _ => None,
    }
}
