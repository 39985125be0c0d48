//! Path expression lexer.

use std::fmt::{Display, Formatter};

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, satisfy},
    combinator::{map, opt, recognize, value},
    error::{ErrorKind, ParseError},
    sequence::{pair, preceded, tuple},
    IResult, Offset,
};

use crate::ast::CompareOp;

pub type Result<T> = std::result::Result<T, Error>;

/// The error type returned when the expression text is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("at position {offset}, {message}")]
pub struct Error {
    offset: usize,
    character: char,
    message: Box<str>,
}

impl Error {
    /// Byte offset of the offending character.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The offending character.
    pub fn character(&self) -> char {
        self.character
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character of the token.
    pub offset: usize,
}

/// The kind of a [`Token`], with its decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A bare field name, like `name`.
    Identifier(String),
    /// A field name in single quotes, like `'first name'`.
    QuotedIdentifier(String),
    Number(f64),
    /// A string literal in double quotes.
    String(String),
    Boolean(bool),
    /// A comparison operator.
    Operator(CompareOp),
    Punct(Punct),
    /// End of input. Always the last token.
    End,
}

/// Punctuation tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    /// `.`
    Dot,
    /// `..`
    DotDot,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `?`
    Question,
    /// `*`
    Star,
    /// `@` or a lone `$`
    This,
}

impl Display for Punct {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dot => write!(f, "."),
            Self::DotDot => write!(f, ".."),
            Self::LBracket => write!(f, "["),
            Self::RBracket => write!(f, "]"),
            Self::Comma => write!(f, ","),
            Self::Colon => write!(f, ":"),
            Self::Question => write!(f, "?"),
            Self::Star => write!(f, "*"),
            Self::This => write!(f, "@"),
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier(name) => write!(f, "identifier `{name}`"),
            Self::QuotedIdentifier(name) => write!(f, "identifier '{name}'"),
            Self::Number(n) => write!(f, "number {n}"),
            Self::String(s) => write!(f, "string {s:?}"),
            Self::Boolean(b) => write!(f, "`{b}`"),
            Self::Operator(op) => write!(f, "`{op}`"),
            Self::Punct(p) => write!(f, "`{p}`"),
            Self::End => write!(f, "end of input"),
        }
    }
}

/// Splits an expression into tokens.
///
/// The returned sequence always ends with a single [`TokenKind::End`].
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = vec![];
    let mut rest = skip_whitespace(text);
    while let Some(c) = rest.chars().next() {
        let offset = text.offset(rest);
        match token(rest) {
            Ok((next, kind)) => {
                tokens.push(Token { kind, offset });
                rest = skip_whitespace(next);
            }
            Err(nom::Err::Failure(e)) => {
                return Err(Error {
                    offset: text.offset(e.input),
                    character: e.input.chars().next().unwrap_or_default(),
                    message: e.message.into(),
                })
            }
            Err(_) => {
                return Err(Error {
                    offset,
                    character: c,
                    message: format!("unexpected character {c:?}").into(),
                })
            }
        }
    }
    tokens.push(Token {
        kind: TokenKind::End,
        offset: text.len(),
    });
    Ok(tokens)
}

/// Returns true if `c` may start a bare identifier.
pub(crate) fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

/// Returns true if `c` may continue a bare identifier.
pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn skip_whitespace(input: &str) -> &str {
    input.trim_start_matches(|c: char| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

/// A lexing failure that is reported as is, without trying other tokens.
#[derive(Debug)]
struct Failure<'a> {
    input: &'a str,
    message: &'static str,
}

impl<'a> ParseError<&'a str> for Failure<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        Failure {
            input,
            message: "unexpected character",
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type LexResult<'a, O> = IResult<&'a str, O, Failure<'a>>;

fn fail<'a, O>(input: &'a str, message: &'static str) -> LexResult<'a, O> {
    Err(nom::Err::Failure(Failure { input, message }))
}

fn token(input: &str) -> LexResult<'_, TokenKind> {
    alt((
        number,
        punct,
        operator,
        map(quoted('"'), TokenKind::String),
        map(quoted('\''), TokenKind::QuotedIdentifier),
        identifier,
    ))(input)
}

fn punct(input: &str) -> LexResult<'_, TokenKind> {
    map(
        alt((
            value(Punct::DotDot, tag("..")),
            value(Punct::Dot, char('.')),
            value(Punct::LBracket, char('[')),
            value(Punct::RBracket, char(']')),
            value(Punct::Comma, char(',')),
            value(Punct::Colon, char(':')),
            value(Punct::Question, char('?')),
            value(Punct::Star, char('*')),
            value(Punct::This, char('@')),
        )),
        TokenKind::Punct,
    )(input)
}

fn operator(input: &str) -> LexResult<'_, TokenKind> {
    // `=` and `!` only exist as the first half of `==` and `!=`
    if input.starts_with(|c: char| c == '=' || c == '!') && !input[1..].starts_with('=') {
        return fail(input, "invalid operator");
    }
    map(
        alt((
            value(CompareOp::Eq, tag("==")),
            value(CompareOp::Ne, tag("!=")),
            value(CompareOp::Le, tag("<=")),
            value(CompareOp::Lt, char('<')),
            value(CompareOp::Ge, tag(">=")),
            value(CompareOp::Gt, char('>')),
        )),
        TokenKind::Operator,
    )(input)
}

fn number(input: &str) -> LexResult<'_, TokenKind> {
    let digits: LexResult<'_, &str> = recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input);
    let (rest, text) = digits?;
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok((rest, TokenKind::Number(n))),
        Ok(_) => fail(input, "number out of range"),
        Err(_) => fail(input, "invalid number"),
    }
}

fn identifier(input: &str) -> LexResult<'_, TokenKind> {
    let name: LexResult<'_, &str> = recognize(pair(
        satisfy(is_identifier_start),
        take_while(is_identifier_char),
    ))(input);
    let (rest, name) = name?;
    let kind = match name {
        "$" => TokenKind::Punct(Punct::This),
        "true" => TokenKind::Boolean(true),
        "false" => TokenKind::Boolean(false),
        _ => TokenKind::Identifier(name.to_owned()),
    };
    Ok((rest, kind))
}

/// Parses a string delimited by `quote`, decoding escape sequences.
fn quoted(quote: char) -> impl Fn(&str) -> LexResult<'_, String> {
    move |input| {
        let open: LexResult<'_, char> = char(quote)(input);
        let (mut rest, _) = open?;
        let mut decoded = String::new();
        loop {
            let mut chars = rest.chars();
            match chars.next() {
                None if quote == '"' => return fail(input, "unterminated string"),
                None => return fail(input, "unterminated quoted identifier"),
                Some(c) if c == quote => return Ok((chars.as_str(), decoded)),
                Some('\\') => {
                    let (next, c) = escape(rest)?;
                    decoded.push(c);
                    rest = next;
                }
                Some(c) => {
                    decoded.push(c);
                    rest = chars.as_str();
                }
            }
        }
    }
}

/// Decodes one escape sequence starting at a backslash.
fn escape(input: &str) -> LexResult<'_, char> {
    let mut chars = input[1..].chars();
    let c = match chars.next() {
        Some('"') => '"',
        Some('\\') => '\\',
        Some('/') => '/',
        Some('b') => '\u{8}',
        Some('f') => '\u{c}',
        Some('n') => '\n',
        Some('r') => '\r',
        Some('t') => '\t',
        Some('u') => return unicode_escape(input),
        _ => return fail(input, "invalid escape sequence"),
    };
    Ok((chars.as_str(), c))
}

/// Decodes a `\uXXXX` escape, joining a surrogate pair written as two escapes.
fn unicode_escape(input: &str) -> LexResult<'_, char> {
    let (rest, unit) = code_unit(input)?;
    if !(0xD800..0xDC00).contains(&unit) {
        return Ok((
            rest,
            char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER),
        ));
    }
    if let Ok((after, low)) = code_unit(rest) {
        if (0xDC00..0xE000).contains(&low) {
            let c = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
            return Ok((after, char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER)));
        }
    }
    // unpaired high surrogate
    Ok((rest, char::REPLACEMENT_CHARACTER))
}

/// Reads one `\uXXXX` UTF-16 code unit.
fn code_unit(input: &str) -> LexResult<'_, u32> {
    let prefix: LexResult<'_, char> = preceded(char('\\'), char('u'))(input);
    let (rest, _) = prefix?;
    match rest.get(..4) {
        Some(hex) if hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            match u32::from_str_radix(hex, 16) {
                Ok(unit) => Ok((&rest[4..], unit)),
                Err(_) => fail(input, "invalid unicode escape"),
            }
        }
        _ => fail(input, "invalid unicode escape"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[track_caller]
    fn lex_err(text: &str, offset: usize, message: &str) {
        let err = tokenize(text).unwrap_err();
        assert_eq!(err.offset(), offset, "{err}");
        assert!(err.message().contains(message), "{err}");
    }

    #[test]
    fn empty() {
        assert_eq!(kinds(""), vec![TokenKind::End]);
        assert_eq!(kinds(" \t\r\n"), vec![TokenKind::End]);
    }

    #[test]
    fn path_tokens() {
        use Punct::*;
        assert_eq!(
            kinds("users[age > -5].name"),
            vec![
                TokenKind::Identifier("users".into()),
                TokenKind::Punct(LBracket),
                TokenKind::Identifier("age".into()),
                TokenKind::Operator(CompareOp::Gt),
                TokenKind::Number(-5.0),
                TokenKind::Punct(RBracket),
                TokenKind::Punct(Dot),
                TokenKind::Identifier("name".into()),
                TokenKind::End,
            ]
        );
        assert_eq!(
            kinds("$..* @ $a [1:-2]?,"),
            vec![
                TokenKind::Punct(This),
                TokenKind::Punct(DotDot),
                TokenKind::Punct(Star),
                TokenKind::Punct(This),
                TokenKind::Identifier("$a".into()),
                TokenKind::Punct(LBracket),
                TokenKind::Number(1.0),
                TokenKind::Punct(Colon),
                TokenKind::Number(-2.0),
                TokenKind::Punct(RBracket),
                TokenKind::Punct(Question),
                TokenKind::Punct(Comma),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn operators() {
        use CompareOp::*;
        assert_eq!(
            kinds("== != < <= > >="),
            vec![
                TokenKind::Operator(Eq),
                TokenKind::Operator(Ne),
                TokenKind::Operator(Lt),
                TokenKind::Operator(Le),
                TokenKind::Operator(Gt),
                TokenKind::Operator(Ge),
                TokenKind::End,
            ]
        );
        lex_err("a = 1", 2, "invalid operator");
        lex_err("a ! 1", 2, "invalid operator");
    }

    #[test]
    fn literals() {
        assert_eq!(
            kinds(r#"true false 3.25 "a\"b" 'c d'"#),
            vec![
                TokenKind::Boolean(true),
                TokenKind::Boolean(false),
                TokenKind::Number(3.25),
                TokenKind::String("a\"b".into()),
                TokenKind::QuotedIdentifier("c d".into()),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn number_out_of_range() {
        let huge = format!("1{}", "0".repeat(400));
        lex_err(&format!("a[b == {huge}]"), 7, "number out of range");
        lex_err(&format!("-{huge}"), 0, "number out of range");
    }

    #[test]
    fn escapes() {
        assert_eq!(
            kinds(r#""\\\/\b\f\n\r\tA""#),
            vec![
                TokenKind::String("\\/\u{8}\u{c}\n\r\tA".into()),
                TokenKind::End
            ]
        );
        assert_eq!(
            kinds(r#"'\uD83D\uDE00 \u00e9'"#),
            vec![TokenKind::QuotedIdentifier("😀 é".into()), TokenKind::End]
        );
        assert_eq!(
            kinds(r#""\uD83Dx""#),
            vec![TokenKind::String("\u{FFFD}x".into()), TokenKind::End]
        );
        lex_err(r#"a["\x"]"#, 3, "invalid escape sequence");
        lex_err(r#""\u12G4""#, 1, "invalid unicode escape");
        lex_err(r#""\u12""#, 1, "invalid unicode escape");
    }

    #[test]
    fn unterminated() {
        lex_err(r#"a["abc"#, 2, "unterminated string");
        lex_err("'abc", 0, "unterminated quoted identifier");
    }

    #[test]
    fn unexpected_character() {
        let err = tokenize("a.b # c").unwrap_err();
        assert_eq!(err.offset(), 4);
        assert_eq!(err.character(), '#');
        lex_err("a - 1", 2, "unexpected character");
        lex_err("a && b", 2, "unexpected character");
    }

    #[test]
    fn offsets() {
        let offsets: Vec<_> = tokenize("ab [ 'x' ]")
            .unwrap()
            .into_iter()
            .map(|t| t.offset)
            .collect();
        assert_eq!(offsets, vec![0, 3, 5, 9, 10]);
    }
}
