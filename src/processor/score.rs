//! Scoreboard references: the integer registers branches are keyed on.

use std::fmt;

use crate::error::{CompileError, Result};
use crate::model::{Token, TokenKind};
use crate::processor::datapack::{VARIABLE_OBJECTIVE, VARIABLE_SIGN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreRef {
    /// Bare integer constant.
    Integer(i32),
    /// `$name`, stored in the shared variable objective.
    Variable(String),
    /// `objective:selector`
    Objective { objective: String, selector: String },
}

impl ScoreRef {
    pub fn variable(name: impl Into<String>) -> Self {
        ScoreRef::Variable(name.into())
    }

    pub fn objective(objective: impl Into<String>, selector: impl Into<String>) -> Self {
        ScoreRef::Objective {
            objective: objective.into(),
            selector: selector.into(),
        }
    }

    /// Classifies a keyword token.
    pub fn from_token(token: &Token, allow_integer: bool) -> Result<Self> {
        if token.kind != TokenKind::Keyword {
            return Err(CompileError::syntax("Expected keyword", token));
        }
        let text = token.text.as_str();

        if text.starts_with(VARIABLE_SIGN) {
            return Ok(ScoreRef::Variable(text.to_string()));
        }

        if is_integer(text) {
            return match text.parse::<i32>() {
                Ok(n) if allow_integer => Ok(ScoreRef::Integer(n)),
                Ok(_) => Err(CompileError::syntax(
                    "Expected variable or objective:selector",
                    token,
                )),
                Err(_) => Err(CompileError::value(
                    format!("Integer '{text}' is out of range"),
                    token,
                )),
            };
        }

        let splits: Vec<&str> = text.split(':').collect();
        match splits.as_slice() {
            [_] if allow_integer => Err(CompileError::syntax(
                "Expected integer, variable, or objective:selector",
                token,
            )),
            [_] => Err(CompileError::syntax(
                "Expected variable or objective:selector",
                token,
            )),
            [objective, selector] => Ok(ScoreRef::objective(*objective, *selector)),
            _ => Err(CompileError::syntax(
                "Scoreboard's player cannot contain more than 1 colon(:)",
                token,
            )),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, ScoreRef::Integer(_))
    }
}

/// Renders the `<holder> <objective>` pair used by `execute if score`.
impl fmt::Display for ScoreRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreRef::Integer(n) => write!(f, "{n}"),
            ScoreRef::Variable(name) => write!(f, "{name} {VARIABLE_OBJECTIVE}"),
            ScoreRef::Objective {
                objective,
                selector,
            } => write!(f, "{selector} {objective}"),
        }
    }
}

/// Optional leading `-` followed by ASCII digits only.
pub fn is_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Decimal literal that is not already an integer.
pub fn is_float(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !is_integer(text)
        && digits.bytes().filter(|b| *b == b'.').count() == 1
        && digits.bytes().any(|b| b.is_ascii_digit())
        && digits.bytes().all(|b| b.is_ascii_digit() || b == b'.')
}
