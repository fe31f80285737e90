//! Lexical units and call forms handed from the front end to the lowering core.
//!
//! Tokens are produced once by the lexer and never mutated afterwards.

use std::fmt;

/// 1-based source position used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl Location {
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// Position reached after reading `ch` from this position.
    pub fn advance(self, ch: char) -> Self {
        if ch == '\n' {
            Self {
                line: self.line + 1,
                col: 1,
            }
        } else {
            Self {
                line: self.line,
                col: self.col + 1,
            }
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    /// Quoted literal; `text` holds the unescaped content.
    String,
    /// `() => { ... }`; `body` holds the nested statements.
    Func,
    ParenRound,
    ParenSquare,
    ParenCurly,
    Comma,
    Assign,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub location: Location,
    /// Statements of an arrow function body.
    pub body: Vec<BodyLine>,
}

/// One statement inside an arrow function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyLine {
    pub text: String,
    /// Where the statement's first character sits in the source.
    pub location: Location,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            text: text.into(),
            location,
            body: Vec::new(),
        }
    }

    pub fn func(text: impl Into<String>, body: Vec<BodyLine>, location: Location) -> Self {
        Self {
            kind: TokenKind::Func,
            text: text.into(),
            location,
            body,
        }
    }

    /// Text re-quoted so it can be embedded in structured data.
    pub fn to_raw(&self) -> String {
        match self.kind {
            TokenKind::String => {
                serde_json::to_string(&self.text).unwrap_or_else(|_| format!("\"{}\"", self.text))
            }
            _ => self.text.clone(),
        }
    }
}

/// `Feature.method(positional..., name=value...)`
#[derive(Debug, Clone, PartialEq)]
pub struct CallSite {
    pub call_string: String,
    pub positional: Vec<Token>,
    pub named: Vec<(String, Token)>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Call(CallSite),
    /// Host command copied through untouched.
    Raw { text: String, location: Location },
}
