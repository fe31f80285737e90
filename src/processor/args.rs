//! Argument classification, verification and call-site binding.
//!
//! A token's kind is inferred once from its lexical type and shape, then
//! narrowed against what each parameter expects.

use std::fmt;

use crate::error::{CompileError, Result};
use crate::model::{CallSite, Token, TokenKind};
use crate::processor::datapack::VARIABLE_SIGN;
use crate::processor::score::{ScoreRef, is_float, is_integer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    ArrowFunc,
    JsObject,
    Json,
    Scoreboard,
    Integer,
    /// Integer or decimal.
    Float,
    String,
    Keyword,
    Selector,
    List,
    /// Expectation only: arrow function or a named call.
    Func,
    /// A keyword or scoreboard-shaped token accepted as a function name.
    FuncCall,
    /// Expectation only: integer or scoreboard reference.
    ScoreboardPlayer,
    Any,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArgKind::ArrowFunc => "arrow(anonymous) function",
            ArgKind::JsObject => "JavaScript object (dictionary)",
            ArgKind::Json => "JSON",
            ArgKind::Scoreboard => "variable or objective:selector",
            ArgKind::Integer => "integer",
            ArgKind::Float => "integer or decimal(real number)",
            ArgKind::String => "string",
            ArgKind::Keyword => "keyword",
            ArgKind::Selector => "target selector",
            ArgKind::List => "list/array",
            ArgKind::Func | ArgKind::FuncCall => "function",
            ArgKind::ScoreboardPlayer => "integer, variable, or objective:selector",
            ArgKind::Any => "any",
        };
        f.write_str(s)
    }
}

/// Infers the kind of an argument token.
pub fn classify(token: &Token) -> Result<ArgKind> {
    let kind = match token.kind {
        TokenKind::Func => ArgKind::ArrowFunc,
        TokenKind::ParenCurly => {
            if token.text[1..].trim_start().starts_with('"') {
                ArgKind::Json
            } else {
                ArgKind::JsObject
            }
        }
        TokenKind::ParenSquare => ArgKind::List,
        TokenKind::String => ArgKind::String,
        TokenKind::Keyword => {
            let text = token.text.as_str();
            if text.starts_with(VARIABLE_SIGN) || text.contains(':') {
                ArgKind::Scoreboard
            } else if is_integer(text) {
                ArgKind::Integer
            } else if is_float(text) {
                ArgKind::Float
            } else if text.starts_with('@') {
                ArgKind::Selector
            } else {
                ArgKind::Keyword
            }
        }
        TokenKind::ParenRound | TokenKind::Comma | TokenKind::Assign => {
            return Err(CompileError::syntax("Unknown argument type", token));
        }
    };
    Ok(kind)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberType {
    Positive,
    ZeroPositive,
    NonZero,
}

impl NumberType {
    fn accepts(self, n: i64) -> bool {
        match self {
            NumberType::Positive => n > 0,
            NumberType::ZeroPositive => n >= 0,
            NumberType::NonZero => n != 0,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            NumberType::Positive => "more than zero",
            NumberType::ZeroPositive => "more than or equal to zero",
            NumberType::NonZero => "non-zero",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub token: Token,
    pub kind: ArgKind,
}

impl Arg {
    pub fn new(token: Token) -> Result<Self> {
        let kind = classify(&token)?;
        Ok(Self { token, kind })
    }

    pub fn text(&self) -> &str {
        &self.token.text
    }

    /// Narrows this argument against the kind parameter `key` expects.
    pub fn verify(mut self, expected: ArgKind, key: &str) -> Result<Self> {
        let mismatch = |arg: &Arg| {
            CompileError::value(
                format!("For '{key}' key, expected {expected}, got {}", arg.kind),
                &arg.token,
            )
        };

        match expected {
            ArgKind::Any => Ok(self),
            ArgKind::ScoreboardPlayer => match self.kind {
                ArgKind::Scoreboard | ArgKind::Integer => Ok(self),
                _ => Err(mismatch(&self)),
            },
            ArgKind::Float => match self.kind {
                ArgKind::Float | ArgKind::Integer => Ok(self),
                _ => Err(mismatch(&self)),
            },
            ArgKind::Func => match self.kind {
                ArgKind::ArrowFunc => Ok(self),
                ArgKind::Keyword | ArgKind::Scoreboard => {
                    self.kind = ArgKind::FuncCall;
                    Ok(self)
                }
                _ => Err(mismatch(&self)),
            },
            _ if expected == self.kind => Ok(self),
            ArgKind::String => {
                let suggestion = format!("Did you mean: ' \"{}\" '", self.token.text);
                Err(mismatch(&self).with_suggestion(suggestion))
            }
            _ => Err(mismatch(&self)),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        self.token.text.parse::<i64>().map_err(|_| {
            CompileError::value(
                format!("Expected integer, got '{}'", self.token.text),
                &self.token,
            )
        })
    }
}

/// One declared parameter of an intrinsic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ArgKind,
    pub default: Option<&'static str>,
    /// May be left out entirely; binds to `None`.
    pub optional: bool,
    pub number: Option<NumberType>,
}

impl Param {
    pub const fn required(name: &'static str, kind: ArgKind) -> Self {
        Self {
            name,
            kind,
            default: None,
            optional: false,
            number: None,
        }
    }

    pub const fn optional(name: &'static str, kind: ArgKind) -> Self {
        Self {
            optional: true,
            ..Self::required(name, kind)
        }
    }

    pub const fn with_default(name: &'static str, kind: ArgKind, default: &'static str) -> Self {
        Self {
            default: Some(default),
            ..Self::required(name, kind)
        }
    }

    pub const fn number(self, number: NumberType) -> Self {
        Self {
            number: Some(number),
            ..self
        }
    }

    fn check(&self, token: Token) -> Result<Arg> {
        let arg = Arg::new(token)?.verify(self.kind, self.name)?;
        if let (Some(number), ArgKind::Integer) = (self.number, arg.kind) {
            let n = arg.as_int()?;
            if !number.accepts(n) {
                return Err(CompileError::value(
                    format!(
                        "For '{}' key, expected integer {}, got {n}",
                        self.name,
                        number.describe()
                    ),
                    &arg.token,
                ));
            }
        }
        Ok(arg)
    }
}

/// Arguments of one call site keyed by parameter name, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArgs {
    call_string: String,
    location: crate::model::Location,
    values: Vec<(&'static str, Option<Arg>)>,
}

impl BoundArgs {
    pub fn get(&self, name: &str) -> Option<&Arg> {
        self.values
            .iter()
            .find(|(key, _)| *key == name)
            .and_then(|(_, arg)| arg.as_ref())
    }

    pub fn is_given(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Argument that binding guaranteed to be present.
    pub fn arg(&self, name: &str) -> Result<&Arg> {
        self.get(name)
            .ok_or_else(|| CompileError::missing(name, &self.call_string, self.location))
    }

    pub fn text(&self, name: &str) -> Result<&str> {
        self.arg(name).map(Arg::text)
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        self.arg(name)?.as_int()
    }

    pub fn score(&self, name: &str) -> Result<ScoreRef> {
        ScoreRef::from_token(&self.arg(name)?.token, true)
    }

    pub fn call_string(&self) -> &str {
        &self.call_string
    }

    pub fn location(&self) -> crate::model::Location {
        self.location
    }
}

/// Binds a call's positional and named arguments to `params`.
pub fn bind_arguments(call_string: &str, params: &[Param], call: &CallSite) -> Result<BoundArgs> {
    let location = call.location;
    let mut values: Vec<(&'static str, Option<Arg>)> =
        params.iter().map(|p| (p.name, None)).collect();

    if call.positional.len() > params.len() {
        let culprit = &call.positional[params.len()];
        return Err(CompileError::value(
            format!(
                "{call_string} takes {} positional arguments, got {}",
                params.len(),
                call.positional.len()
            ),
            culprit,
        ));
    }

    for (i, token) in call.positional.iter().enumerate() {
        values[i].1 = Some(params[i].check(token.clone())?);
    }

    for (key, token) in &call.named {
        let Some(i) = params.iter().position(|p| p.name == key) else {
            let available = params
                .iter()
                .map(|p| format!("'{}'", p.name))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(CompileError::value(
                format!("{call_string} got unexpected keyword argument '{key}'"),
                token,
            )
            .with_suggestion(format!("Available arguments are\n{available}")));
        };
        if values[i].1.is_some() {
            return Err(CompileError::value(
                format!("{call_string} got multiple values for argument '{key}'"),
                token,
            ));
        }
        values[i].1 = Some(params[i].check(token.clone())?);
    }

    for (param, (_, slot)) in params.iter().zip(values.iter_mut()) {
        if slot.is_some() {
            continue;
        }
        match param.default {
            Some(default) => {
                let token = Token::new(default_token_kind(param.kind), default, location);
                *slot = Some(Arg {
                    token,
                    kind: param.kind,
                });
            }
            None if param.optional => {}
            None => return Err(CompileError::missing(param.name, call_string, location)),
        }
    }

    Ok(BoundArgs {
        call_string: call_string.to_string(),
        location,
        values,
    })
}

fn default_token_kind(kind: ArgKind) -> TokenKind {
    match kind {
        ArgKind::String => TokenKind::String,
        ArgKind::JsObject | ArgKind::Json => TokenKind::ParenCurly,
        ArgKind::List => TokenKind::ParenSquare,
        _ => TokenKind::Keyword,
    }
}
