//! Inline bodies and named functions behind one interface.

use crate::error::{CompileError, Result};
use crate::model::{BodyLine, Token, TokenKind};
use crate::processor::args::{Arg, ArgKind};
use crate::processor::datapack::{DataPack, VARIABLE_SIGN};

#[derive(Debug, Clone, PartialEq)]
pub enum Callable {
    /// `() => { ... }`, lowered when materialised.
    Inline { lines: Vec<BodyLine> },
    /// Fully qualified `<ns>:<path>` of an existing function.
    Named(String),
}

impl Callable {
    pub fn from_arg(arg: &Arg, namespace: &str) -> Result<Self> {
        match arg.kind {
            ArgKind::ArrowFunc | ArgKind::FuncCall | ArgKind::Keyword | ArgKind::Scoreboard => {
                Self::from_token(&arg.token, namespace)
            }
            other => Err(CompileError::value(
                format!("Expected function, got {other}"),
                &arg.token,
            )),
        }
    }

    pub fn from_token(token: &Token, namespace: &str) -> Result<Self> {
        match token.kind {
            TokenKind::Func => Ok(Callable::Inline {
                lines: token.body.clone(),
            }),
            TokenKind::Keyword if !token.text.starts_with(VARIABLE_SIGN) => {
                Ok(Callable::Named(qualify(&token.text, namespace)))
            }
            _ => Err(CompileError::value(
                format!("Expected function, got '{}'", token.text),
                token,
            )),
        }
    }

    /// Command lines that run this callable in place.
    pub fn body(&self, pack: &mut DataPack) -> Result<Vec<String>> {
        match self {
            Callable::Inline { lines } => crate::processor::compile_nested(lines, pack),
            Callable::Named(path) => Ok(vec![format!("function {path}")]),
        }
    }

    /// A single command that runs this callable; inline bodies become a
    /// fresh helper block of `feature`.
    pub fn call(&self, pack: &mut DataPack, feature: &str) -> Result<String> {
        match self {
            Callable::Inline { .. } => {
                let lines = self.body(pack)?;
                Ok(pack.add_private_function(feature, lines, None))
            }
            Callable::Named(path) => Ok(format!("function {path}")),
        }
    }
}

/// `my.func` -> `<ns>:my/func`; already qualified names pass through.
pub fn qualify(name: &str, namespace: &str) -> String {
    if name.contains(':') {
        return name.to_string();
    }
    format!("{namespace}:{}", name.replace('.', "/"))
}
