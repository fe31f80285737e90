//! The functional core: lowers parsed statements into a [`DataPack`].
//!
//! Top-level statements run in load context, so load-only intrinsics may
//! register their tick/load hooks. Inline function bodies are lowered
//! through [`compile_nested`], where only command intrinsics are allowed.
pub mod args;
pub mod builtin;
pub mod callable;
pub mod datapack;
pub mod dispatch;
pub mod lexer;
pub mod rich_text;
pub mod score;
pub mod statement;

pub use crate::error::Result;
pub use datapack::DataPack;

use tracing::{info, trace};

use crate::model::{BodyLine, Statement};
use builtin::Context;

/// Runs every statement of the load function and returns the finished pack.
pub fn run(statements: &[Statement], namespace: &str) -> Result<DataPack> {
    let mut pack = DataPack::new(namespace);
    for statement in statements {
        match statement {
            Statement::Call(call) => {
                for line in builtin::invoke(call, &mut pack, Context::Load)? {
                    pack.add_load(line);
                }
            }
            Statement::Raw { text, .. } => pack.add_load(text.as_str()),
        }
    }
    info!(
        blocks = pack.blocks().len(),
        objectives = pack.objectives().len(),
        documents = pack.documents().len(),
        "lowered load function"
    );
    Ok(pack)
}

/// Lowers the lines of an inline function body, each parsed at its own
/// source location.
pub fn compile_nested(lines: &[BodyLine], pack: &mut DataPack) -> Result<Vec<String>> {
    trace!(count = lines.len(), "lowering inline body");
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        match statement::parse_statement(&line.text, line.location)? {
            Statement::Call(call) => out.extend(builtin::invoke(&call, pack, Context::Nested)?),
            Statement::Raw { text, .. } => out.push(text),
        }
    }
    Ok(out)
}
