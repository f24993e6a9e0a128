//! Text parser for the expression language.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! or         := and ("||" and)*
//! and        := equality ("&&" equality)*
//! equality   := relational (("==" | "!=") relational)*
//! relational := additive (("<" | "<=" | ">" | ">=") additive)*
//! additive   := term (("+" | "-") term)*
//! term       := unary (("*" | "/") unary)*
//! unary      := ("!" | "-") unary | primary
//! primary    := literal | path | name "(" args ")" | "(" or ")"
//! ```

use serde_json::{Number, Value};

use crate::error::{ExpressionError, ExpressionResult};
use crate::expression::{Expression, ExpressionType};

/// Parse expression text.
pub fn parse(text: &str) -> ExpressionResult<Expression> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens,
        position: 0,
        end: text.len(),
    };
    let expression = parser.or()?;
    match parser.peek() {
        None => Ok(expression),
        Some(token) => Err(ExpressionError::parse(
            format!("unexpected {}", token.kind),
            token.offset,
        )),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(Number),
    Str(String),
    Path(String),
    Operator(&'static str),
    LeftParen,
    RightParen,
    Comma,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::Str(s) => write!(f, "string '{}'", s),
            TokenKind::Path(p) => write!(f, "'{}'", p),
            TokenKind::Operator(op) => write!(f, "'{}'", op),
            TokenKind::LeftParen => f.write_str("'('"),
            TokenKind::RightParen => f.write_str("')'"),
            TokenKind::Comma => f.write_str("','"),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

const OPERATORS: [&str; 13] = [
    "&&", "||", "==", "!=", "<=", ">=", "<", ">", "!", "+", "-", "*", "/",
];

fn tokenize(text: &str) -> ExpressionResult<Vec<Token>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let kind = match c {
            b'(' => {
                i += 1;
                TokenKind::LeftParen
            }
            b')' => {
                i += 1;
                TokenKind::RightParen
            }
            b',' => {
                i += 1;
                TokenKind::Comma
            }
            b'\'' | b'"' => {
                let (value, next) = string_literal(text, i)?;
                i = next;
                TokenKind::Str(value)
            }
            b'0'..=b'9' => {
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                TokenKind::Number(number_literal(&text[start..i], start)?)
            }
            c if c.is_ascii_alphabetic() || c == b'_' || c == b'$' || c == b'@' => {
                i = path_end(bytes, i);
                TokenKind::Path(text[start..i].to_string())
            }
            _ => {
                let rest = &text[i..];
                let op = OPERATORS
                    .iter()
                    .find(|op| rest.starts_with(**op))
                    .ok_or_else(|| {
                        let found = rest.chars().next().unwrap_or_default();
                        ExpressionError::parse(format!("unexpected character '{}'", found), start)
                    })?;
                i += op.len();
                TokenKind::Operator(op)
            }
        };
        tokens.push(Token {
            kind,
            offset: start,
        });
    }

    Ok(tokens)
}

fn path_end(bytes: &[u8], mut i: usize) -> usize {
    let is_name = |b: u8| b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b == b'@';
    while i < bytes.len() {
        match bytes[i] {
            b if is_name(b) => i += 1,
            b'.' if i + 1 < bytes.len() && is_name(bytes[i + 1]) => i += 1,
            b'[' => match bytes[i..].iter().position(|&b| b == b']') {
                Some(close) => i += close + 1,
                None => break,
            },
            _ => break,
        }
    }
    i
}

fn number_literal(text: &str, offset: usize) -> ExpressionResult<Number> {
    if let Ok(integer) = text.parse::<i64>() {
        return Ok(Number::from(integer));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| ExpressionError::parse(format!("invalid number '{}'", text), offset))
}

fn string_literal(text: &str, start: usize) -> ExpressionResult<(String, usize)> {
    let mut chars = text[start..].char_indices();
    let quote = chars.next().map(|(_, c)| c).unwrap_or('\'');
    let mut value = String::new();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            c if c == quote => return Ok((value, start + i + 1)),
            c => value.push(c),
        }
    }
    Err(ExpressionError::parse("unterminated string", start))
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |token| token.offset)
    }

    fn eat_operator(&mut self, candidates: &[&'static str]) -> Option<&'static str> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Operator(op),
                ..
            }) if candidates.contains(op) => {
                let op = *op;
                self.position += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().map_or(false, |token| &token.kind == kind) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ExpressionResult<()> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {}", kind)))
        }
    }

    fn unexpected(&self, context: &str) -> ExpressionError {
        match self.peek() {
            Some(token) => {
                ExpressionError::parse(format!("{}, found {}", context, token.kind), token.offset)
            }
            None => ExpressionError::parse(format!("{}, found end of input", context), self.end),
        }
    }

    /// Same-operator chains of `&&` and `||` are flattened into one node.
    fn chain(
        &mut self,
        op: &'static str,
        kind: ExpressionType,
        next: fn(&mut Self) -> ExpressionResult<Expression>,
    ) -> ExpressionResult<Expression> {
        let mut children = vec![next(self)?];
        while self.eat_operator(&[op]).is_some() {
            children.push(next(self)?);
        }
        Ok(if children.len() == 1 {
            children.remove(0)
        } else {
            Expression::make_expression(kind, children)
        })
    }

    fn binary(
        &mut self,
        operators: &[&'static str],
        next: fn(&mut Self) -> ExpressionResult<Expression>,
    ) -> ExpressionResult<Expression> {
        let mut left = next(self)?;
        while let Some(op) = self.eat_operator(operators) {
            let right = next(self)?;
            let kind = op
                .parse::<ExpressionType>()
                .map_err(|_| ExpressionError::parse(format!("unknown operator '{}'", op), self.offset()))?;
            left = Expression::make_expression(kind, vec![left, right]);
        }
        Ok(left)
    }

    fn or(&mut self) -> ExpressionResult<Expression> {
        self.chain("||", ExpressionType::Or, Self::and)
    }

    fn and(&mut self) -> ExpressionResult<Expression> {
        self.chain("&&", ExpressionType::And, Self::equality)
    }

    fn equality(&mut self) -> ExpressionResult<Expression> {
        self.binary(&["==", "!="], Self::relational)
    }

    fn relational(&mut self) -> ExpressionResult<Expression> {
        self.binary(&["<=", ">=", "<", ">"], Self::additive)
    }

    fn additive(&mut self) -> ExpressionResult<Expression> {
        self.binary(&["+", "-"], Self::term)
    }

    fn term(&mut self) -> ExpressionResult<Expression> {
        self.binary(&["*", "/"], Self::unary)
    }

    fn unary(&mut self) -> ExpressionResult<Expression> {
        match self.eat_operator(&["!", "-"]) {
            Some("!") => Ok(Expression::not_expression(self.unary()?)),
            Some(_) => {
                let operand = self.unary()?;
                Ok(match operand.as_constant().and_then(Value::as_f64) {
                    Some(n) => negate(operand.as_constant(), n),
                    None => Expression::make_expression(
                        ExpressionType::Subtract,
                        vec![Expression::constant(0), operand],
                    ),
                })
            }
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> ExpressionResult<Expression> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.unexpected("expected an expression"));
        };
        self.position += 1;
        match token.kind {
            TokenKind::Number(n) => Ok(Expression::Constant(Value::Number(n))),
            TokenKind::Str(s) => Ok(Expression::Constant(Value::String(s))),
            TokenKind::LeftParen => {
                let inner = self.or()?;
                self.expect(TokenKind::RightParen)?;
                Ok(inner)
            }
            TokenKind::Path(name) if self.eat(&TokenKind::LeftParen) => {
                self.call(&name)
            }
            TokenKind::Path(name) => Ok(match name.as_str() {
                "true" => Expression::constant(true),
                "false" => Expression::constant(false),
                "null" => Expression::Constant(Value::Null),
                _ => Expression::Accessor(name),
            }),
            _ => {
                self.position -= 1;
                Err(self.unexpected("expected an expression"))
            }
        }
    }

    fn call(&mut self, name: &str) -> ExpressionResult<Expression> {
        let kind = ExpressionType::function(name)
            .ok_or_else(|| ExpressionError::UnknownFunction(name.to_string()))?;

        let mut args = Vec::new();
        if !self.eat(&TokenKind::RightParen) {
            loop {
                args.push(self.or()?);
                if self.eat(&TokenKind::RightParen) {
                    break;
                }
                self.expect(TokenKind::Comma)?;
            }
        }

        let expected = if kind == ExpressionType::Contains { 2 } else { 1 };
        if args.len() != expected {
            return Err(ExpressionError::Arity {
                function: name.to_string(),
                expected,
                actual: args.len(),
            });
        }
        Ok(Expression::make_expression(kind, args))
    }
}

fn negate(constant: Option<&Value>, n: f64) -> Expression {
    match constant.and_then(Value::as_i64).and_then(i64::checked_neg) {
        Some(i) => Expression::constant(i),
        None => Number::from_f64(-n)
            .map(|n| Expression::Constant(Value::Number(n)))
            .unwrap_or_else(|| Expression::constant(0)),
    }
}
