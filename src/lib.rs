//! A path query language over JSON documents, with keyed array addressing.
//!
//! Every match is reported together with its location in the document.
//! Array elements that carry a string `_key` field are addressed by that key
//! instead of their position, so locations stay stable when arrays are
//! reordered.
//!
//! # Usage
//!
//! ```rust
//! use keyed_json_path::{JsonPath, PathSegment};
//! use serde_json::json;
//!
//! let doc = json!({"items": [{"_key": "a", "v": 1}, {"_key": "b", "v": 2}]});
//! let path = JsonPath::new("items[v > 1].v").unwrap();
//!
//! let matches: Vec<_> = path.query(&doc).collect();
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].value, &json!(2));
//! assert_eq!(
//!     matches[0].path,
//!     vec!["items".into(), PathSegment::key("b"), "v".into()]
//! );
//! ```
//!
//! # Syntax
//!
//! - `a.b`, `'a b'`: object members
//! - `@`, `$`: the current value
//! - `*`: every array element or object member
//! - `..a`: `a` at any depth
//! - `[0]`, `[-1]`, `[1:3]`: array elements by position
//! - `[a > 1]`, `[_key == "b"]`: elements for which a comparison holds
//! - `[a?]`: elements on which a path resolves
//! - `[a, b]`: the union of several subscripts

mod ast;
mod eval;
pub mod json;
mod key_cache;
mod lexer;
mod parser;
mod path;
mod path_set;

pub use ast::{CompareOp, Expr, JsonPath, PathNode, Segment, SubscriptElement};
pub use eval::{evaluate, evaluate_str, Match, Matches};
pub use key_cache::KeyedIndexCache;
pub use lexer::{tokenize, Error as LexError, Punct, Token, TokenKind};
pub use parser::{parse, Error as ParseError};
pub use path::{Path, PathSegment};
pub use path_set::PathSet;

pub type Result<T> = std::result::Result<T, Error>;

/// The error type returned when an expression cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl Error {
    /// Byte offset in the expression text where the error was detected.
    pub fn offset(&self) -> usize {
        match self {
            Self::Lex(e) => e.offset(),
            Self::Parse(e) => e.offset(),
        }
    }
}
