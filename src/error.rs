//! Compile errors raised while lowering a call site.
//!
//! Every failure carries the location of the offending token and, where one
//! exists, a hint the user can act on.

use std::fmt;

use thiserror::Error;

use crate::model::{Location, Token};

pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed call shape, unterminated group, unknown argument kind.
    Syntax,
    /// Kind mismatch or a violated constraint.
    Value,
    /// Required parameter absent.
    MissingValue,
    /// Embedded JSON literal failed to parse.
    Decode,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Value => "ValueError",
            ErrorKind::MissingValue => "MissingValueError",
            ErrorKind::Decode => "DecodeError",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at line {} col {}: {message}{}", .location.line, .location.col, hint(.suggestion))]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Location,
    pub suggestion: Option<String>,
}

fn hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!("\n{s}"),
        None => String::new(),
    }
}

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
            suggestion: None,
        }
    }

    pub fn syntax(message: impl Into<String>, token: &Token) -> Self {
        Self::new(ErrorKind::Syntax, message, token.location)
    }

    pub fn value(message: impl Into<String>, token: &Token) -> Self {
        Self::new(ErrorKind::Value, message, token.location)
    }

    pub fn decode(message: impl Into<String>, token: &Token) -> Self {
        Self::new(ErrorKind::Decode, message, token.location)
    }

    pub fn missing(param: &str, call_string: &str, location: Location) -> Self {
        Self::new(
            ErrorKind::MissingValue,
            format!("'{param}' argument is required in {call_string}"),
            location,
        )
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}
