// Copyright 2023 RisingWave Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The AST of path expressions.
//!
//! The [`Display`] implementations render the canonical form: the minimal,
//! whitespace-free source text that parses back to the same tree.

use std::fmt::{Display, Formatter, Write};

use crate::json::KEY_FIELD;
use crate::lexer::{is_identifier_char, is_identifier_start};

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    pub(crate) expr: Expr,
}

impl JsonPath {
    /// Returns the root of the expression tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }
}

impl From<Expr> for JsonPath {
    fn from(expr: Expr) -> Self {
        Self { expr }
    }
}

/// An expression: a literal or a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Number literal.
    Number(f64),
    /// String literal.
    String(String),
    /// Boolean literal.
    Boolean(bool),
    /// A path into the document.
    Path(PathNode),
}

/// A step of a path: take the locations produced by `base`, then apply `segment`.
///
/// `a.b[0]` is `PathNode { base: PathNode { base: a, segment: b }, segment: [0] }`.
/// The chain is left-recursive, so the evaluator resolves the outer context
/// before applying the current segment.
#[derive(Debug, Clone, PartialEq)]
pub struct PathNode {
    /// The path this step continues, or `None` to start from the current context.
    pub base: Option<Box<PathNode>>,
    /// `..` applies the segment at every depth below the base.
    pub recursive: bool,
    pub segment: Segment,
}

impl PathNode {
    /// Creates a path that applies `segment` to the current context.
    pub fn new(segment: Segment) -> Self {
        Self {
            base: None,
            recursive: false,
            segment,
        }
    }

    /// Creates the `@` path.
    pub fn this() -> Self {
        Self::new(Segment::This)
    }

    /// Creates a path that applies `segment` to the locations of `self`.
    pub fn then(self, recursive: bool, segment: Segment) -> Self {
        Self {
            base: Some(Box::new(self)),
            recursive,
            segment,
        }
    }

    /// Returns true if this is exactly the bare identifier `_key`.
    pub fn is_key_field(&self) -> bool {
        matches!(
            self,
            PathNode {
                base: None,
                recursive: false,
                segment: Segment::Identifier(name),
            } if name == KEY_FIELD
        )
    }
}

/// The operation applied at one step of a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// `@` or `$`: the current context.
    This,
    /// `name` or `'name'`: a member of an object.
    Identifier(String),
    /// `*`: every element of an array or member of an object.
    Wildcard,
    /// `[a, b, ...]`: the union of the elements' results.
    Subscript(Vec<SubscriptElement>),
}

/// An element of a [`Segment::Subscript`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptElement {
    /// `start:end` selects a range of array elements.
    Slice {
        start: Option<i64>,
        end: Option<i64>,
    },
    /// `left op right` keeps the values for which the comparison holds.
    Comparison {
        left: Expr,
        op: CompareOp,
        right: Expr,
    },
    /// `path?` keeps the values on which `path` resolves.
    Existence(PathNode),
    /// An index, a nested path or a literal.
    Expr(Expr),
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==` represents left is equal to right.
    Eq,
    /// `!=` represents left is not equal to right.
    Ne,
    /// `<` represents left is less than right.
    Lt,
    /// `<=` represents left is less or equal to right.
    Le,
    /// `>` represents left is greater than right.
    Gt,
    /// `>=` represents left is greater than or equal to right.
    Ge,
}

impl Display for JsonPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.expr)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => {
                let json = serde_json::to_string(s).map_err(|_| std::fmt::Error)?;
                f.write_str(&json)
            }
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Path(path) => write!(f, "{path}"),
        }
    }
}

impl Display for PathNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(base) = &self.base {
            write!(f, "{base}")?;
        }
        if self.recursive {
            write!(f, "..")?;
        } else if self.base.is_some() && !matches!(self.segment, Segment::Subscript(_)) {
            write!(f, ".")?;
        }
        write!(f, "{}", self.segment)
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::This => write!(f, "@"),
            Self::Identifier(name) if is_bare_identifier(name) => write!(f, "{name}"),
            Self::Identifier(name) => write_quoted(f, name),
            Self::Wildcard => write!(f, "*"),
            Self::Subscript(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Display for SubscriptElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slice { start, end } => {
                if let Some(start) = start {
                    write!(f, "{start}")?;
                }
                write!(f, ":")?;
                if let Some(end) = end {
                    write!(f, "{end}")?;
                }
                Ok(())
            }
            Self::Comparison { left, op, right } => write!(f, "{left}{op}{right}"),
            Self::Existence(path) => write!(f, "{path}?"),
            Self::Expr(expr) => write!(f, "{expr}"),
        }
    }
}

impl Display for CompareOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eq => write!(f, "=="),
            Self::Ne => write!(f, "!="),
            Self::Lt => write!(f, "<"),
            Self::Le => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::Ge => write!(f, ">="),
        }
    }
}

/// Returns true if `name` can be written without quotes.
fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    is_identifier_start(first)
        && chars.all(is_identifier_char)
        && !matches!(name, "$" | "true" | "false")
}

/// Writes a field name in single quotes.
///
/// The escape grammar has no `\'`, so the quote itself is written as `'`.
fn write_quoted(f: &mut Formatter<'_>, name: &str) -> std::fmt::Result {
    f.write_char('\'')?;
    for c in name.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\u{8}' => f.write_str("\\b")?,
            '\u{c}' => f.write_str("\\f")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\'' => f.write_str("\\u0027")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('\'')
}
