//! Path expression parser.

use std::str::FromStr;

use crate::ast::*;
use crate::lexer::{tokenize, Punct, Token, TokenKind};

pub type Result<T> = std::result::Result<T, Error>;

/// The error type returned when the token stream does not form an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("at position {offset}, {message}")]
pub struct Error {
    offset: usize,
    message: Box<str>,
}

impl Error {
    /// Byte offset of the offending token.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl JsonPath {
    /// Parse a path expression from string.
    pub fn new(text: &str) -> crate::Result<Self> {
        parse(text)
    }
}

impl FromStr for JsonPath {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        parse(s)
    }
}

/// Parses a path expression.
pub fn parse(text: &str) -> crate::Result<JsonPath> {
    let tokens = tokenize(text)?;
    let expr = Parser {
        tokens: &tokens,
        pos: 0,
    }
    .root()?;
    log::debug!("parsed {text:?} as `{expr}`");
    Ok(JsonPath { expr })
}

struct Parser<'t> {
    /// Never empty: the lexer always terminates the stream with `End`.
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn token(&self) -> &'t Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek(&self) -> &'t TokenKind {
        &self.token().kind
    }

    /// Returns the kind of the token after the current one.
    fn peek_next(&self) -> Option<&'t TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| &t.kind)
    }

    fn advance(&mut self) {
        if !matches!(self.peek(), TokenKind::End) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<Box<str>>) -> Error {
        Error {
            offset: self.token().offset,
            message: message.into(),
        }
    }

    fn root(&mut self) -> Result<Expr> {
        if matches!(self.peek(), TokenKind::End) {
            return Err(self.error("empty expression"));
        }
        let expr = self.expression()?;
        match self.peek() {
            TokenKind::End => Ok(expr),
            other => Err(self.error(format!("unexpected trailing {other}"))),
        }
    }

    fn expression(&mut self) -> Result<Expr> {
        let literal = match self.peek() {
            TokenKind::String(s) => Expr::String(s.clone()),
            TokenKind::Number(n) => Expr::Number(*n),
            TokenKind::Boolean(b) => Expr::Boolean(*b),
            _ => return self.path().map(Expr::Path),
        };
        self.advance();
        Ok(literal)
    }

    fn path(&mut self) -> Result<PathNode> {
        let mut node = match self.peek() {
            // `.a` and `..a` continue the current context
            TokenKind::Punct(Punct::Dot | Punct::DotDot) => PathNode::this(),
            _ => PathNode::new(self.segment()?),
        };
        loop {
            node = match self.peek() {
                TokenKind::Punct(Punct::Dot) => {
                    self.advance();
                    let segment = self.segment()?;
                    node.then(false, segment)
                }
                TokenKind::Punct(Punct::DotDot) => {
                    self.advance();
                    let segment = if self.at_path_end() {
                        Segment::Wildcard
                    } else {
                        self.segment()?
                    };
                    node.then(true, segment)
                }
                TokenKind::Punct(Punct::LBracket) => {
                    let segment = self.subscript()?;
                    node.then(false, segment)
                }
                _ => return Ok(node),
            };
        }
    }

    /// Returns true if the current token cannot continue a path.
    fn at_path_end(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::End
                | TokenKind::Operator(_)
                | TokenKind::Punct(Punct::RBracket | Punct::Comma | Punct::Question)
        )
    }

    fn segment(&mut self) -> Result<Segment> {
        let segment = match self.peek() {
            TokenKind::Punct(Punct::This) => Segment::This,
            TokenKind::Punct(Punct::Star) => Segment::Wildcard,
            TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name) => {
                Segment::Identifier(name.clone())
            }
            TokenKind::Punct(Punct::LBracket) => return self.subscript(),
            other => return Err(self.error(format!("expected path segment, found {other}"))),
        };
        self.advance();
        Ok(segment)
    }

    fn subscript(&mut self) -> Result<Segment> {
        // skip `[`
        self.advance();
        let mut elements = vec![self.subscript_element()?];
        loop {
            match self.peek() {
                TokenKind::Punct(Punct::Comma) => {
                    self.advance();
                    elements.push(self.subscript_element()?);
                }
                TokenKind::Punct(Punct::RBracket) => {
                    self.advance();
                    return Ok(Segment::Subscript(elements));
                }
                TokenKind::End => return Err(self.error("unterminated subscript")),
                other => return Err(self.error(format!("expected `,` or `]`, found {other}"))),
            }
        }
    }

    fn subscript_element(&mut self) -> Result<SubscriptElement> {
        match self.peek() {
            TokenKind::End => return Err(self.error("unterminated subscript")),
            TokenKind::Punct(Punct::RBracket | Punct::Comma) => {
                return Err(self.error("empty subscript element"))
            }
            TokenKind::Punct(Punct::Colon) => return self.slice(None),
            TokenKind::Number(n) if self.peek_next() == Some(&TokenKind::Punct(Punct::Colon)) => {
                let start = self.slice_bound(*n)?;
                self.advance();
                return self.slice(Some(start));
            }
            _ => {}
        }
        let left = self.expression()?;
        match self.peek() {
            TokenKind::Operator(op) => {
                let op = *op;
                self.advance();
                if matches!(
                    self.peek(),
                    TokenKind::End | TokenKind::Punct(Punct::RBracket | Punct::Comma)
                ) {
                    return Err(self.error("incomplete constraint"));
                }
                let right = self.expression()?;
                Ok(SubscriptElement::Comparison { left, op, right })
            }
            TokenKind::Punct(Punct::Question) => match left {
                Expr::Path(path) => {
                    self.advance();
                    Ok(SubscriptElement::Existence(path))
                }
                _ => Err(self.error("existence check requires a path")),
            },
            _ => Ok(SubscriptElement::Expr(left)),
        }
    }

    /// Parses the rest of a slice, starting at the `:`.
    fn slice(&mut self, start: Option<i64>) -> Result<SubscriptElement> {
        // skip `:`
        self.advance();
        let end = match self.peek() {
            TokenKind::Number(n) => {
                let end = self.slice_bound(*n)?;
                self.advance();
                Some(end)
            }
            _ => None,
        };
        Ok(SubscriptElement::Slice { start, end })
    }

    fn slice_bound(&self, n: f64) -> Result<i64> {
        // `i64::MAX as f64` rounds up to 2^63, which is out of range
        if n.fract() != 0.0 || n < i64::MIN as f64 || n >= i64::MAX as f64 {
            return Err(self.error("slice bounds must be integers"));
        }
        Ok(n as i64)
    }
}
