//! Intrinsic functions: compile-time code generators keyed by call string.
//!
//! Each intrinsic declares a static [`Signature`]; [`invoke`] binds the call
//! site's arguments against it, runs the intrinsic's own checks and then
//! lowers. Load-only intrinsics only produce side effects on the
//! [`DataPack`]; command intrinsics return the lines to emit in place.

mod command;
mod load_only;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{CompileError, ErrorKind, Result};
use crate::model::CallSite;
use crate::processor::args::{BoundArgs, Param, bind_arguments};
use crate::processor::callable::qualify;
use crate::processor::datapack::DataPack;

pub use command::{
    ItemGive, ItemReplaceBlock, ItemReplaceEntity, ItemSummon, JmcPut, TextKind, TextMessage,
    TimerSet,
};
pub use load_only::{
    ItemCreate, PlayerOnEvent, RecipeTable, RightClickSetup, TimerAdd, TriggerAdd, TriggerSetup,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncType {
    /// Only valid at the top level of the load function.
    LoadOnly,
    /// Usable anywhere; expands to commands at the call site.
    Command,
}

/// Where a statement is being lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Load,
    /// Inside an inline function body.
    Nested,
}

#[derive(Debug)]
pub struct Signature {
    pub call_string: &'static str,
    pub func_type: FuncType,
    pub params: &'static [Param],
}

pub trait Intrinsic: Sync + Send {
    fn signature(&self) -> &'static Signature;

    /// Domain checks beyond argument kinds. Runs before any mutation.
    fn validate(&self, _args: &BoundArgs, _pack: &DataPack) -> Result<()> {
        Ok(())
    }

    fn lower(&self, args: &BoundArgs, pack: &mut DataPack) -> Result<Vec<String>>;
}

static REGISTRY: Lazy<HashMap<&'static str, &'static dyn Intrinsic>> = Lazy::new(|| {
    let all: [&'static dyn Intrinsic; 17] = [
        &RightClickSetup,
        &ItemCreate,
        &PlayerOnEvent,
        &TriggerSetup,
        &TriggerAdd,
        &TimerAdd,
        &RecipeTable,
        &TimerSet,
        &ItemGive,
        &ItemSummon,
        &ItemReplaceBlock,
        &ItemReplaceEntity,
        &JmcPut,
        &TextMessage(TextKind::Tellraw),
        &TextMessage(TextKind::Title),
        &TextMessage(TextKind::Subtitle),
        &TextMessage(TextKind::Actionbar),
    ];
    all.into_iter()
        .map(|intrinsic| (intrinsic.signature().call_string, intrinsic))
        .collect()
});

pub fn lookup(call_string: &str) -> Option<&'static dyn Intrinsic> {
    REGISTRY.get(call_string).copied()
}

/// Lowers one call site. Unknown calls without arguments become a call to
/// the user function of that name.
pub fn invoke(call: &CallSite, pack: &mut DataPack, context: Context) -> Result<Vec<String>> {
    let Some(intrinsic) = lookup(&call.call_string) else {
        if call.positional.is_empty() && call.named.is_empty() {
            return Ok(vec![format!(
                "function {}",
                qualify(&call.call_string, pack.namespace())
            )]);
        }
        return Err(CompileError::new(
            ErrorKind::Syntax,
            format!("Unknown function '{}'", call.call_string),
            call.location,
        ));
    };

    let signature = intrinsic.signature();
    if signature.func_type == FuncType::LoadOnly && context == Context::Nested {
        return Err(CompileError::new(
            ErrorKind::Syntax,
            format!(
                "{} can only be used in load function",
                signature.call_string
            ),
            call.location,
        ));
    }

    let args = bind_arguments(signature.call_string, signature.params, call)?;
    intrinsic.validate(&args, pack)?;
    debug!(
        call = signature.call_string,
        line = call.location.line,
        "lowering intrinsic"
    );
    if signature.func_type == FuncType::Command {
        return intrinsic.lower(&args, pack);
    }

    // Load-only lowering registers hooks before its inline bodies are
    // compiled; a failing body must not leave them behind.
    let checkpoint = pack.clone();
    let result = intrinsic.lower(&args, pack);
    if result.is_err() {
        *pack = checkpoint;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Location;
    use crate::processor::statement::parse_statement;
    use crate::model::Statement;

    fn call_site(src: &str) -> CallSite {
        match parse_statement(src, Location::new(1, 1)).unwrap() {
            Statement::Call(call) => call,
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_registry_is_keyed_by_call_string() {
        let test_cases = vec![
            ("RightClick.setup", FuncType::LoadOnly),
            ("Item.create", FuncType::LoadOnly),
            ("Timer.add", FuncType::LoadOnly),
            ("Timer.set", FuncType::Command),
            ("Text.actionbar", FuncType::Command),
            ("JMC.put", FuncType::Command),
        ];
        for (call_string, func_type) in test_cases {
            let intrinsic = lookup(call_string).unwrap();
            assert_eq!(intrinsic.signature().call_string, call_string);
            assert_eq!(intrinsic.signature().func_type, func_type);
        }
        assert!(lookup("Nope.nothing").is_none());
    }

    #[test]
    fn test_unknown_call_becomes_function_call() {
        let mut pack = DataPack::new("ns");
        let out = invoke(&call_site("lib.setup()"), &mut pack, Context::Load).unwrap();
        assert_eq!(out, vec!["function ns:lib/setup".to_string()]);
    }

    #[test]
    fn test_unknown_call_with_arguments() {
        let mut pack = DataPack::new("ns");
        let err = invoke(&call_site("lib.setup(1)"), &mut pack, Context::Load).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.message, "Unknown function 'lib.setup'");
    }

    #[test]
    fn test_load_only_rejected_when_nested() {
        let mut pack = DataPack::new("ns");
        let call = call_site("Player.onEvent(jumps, () => {say jump;})");
        let err = invoke(&call, &mut pack, Context::Nested).unwrap_err();
        assert_eq!(err.message, "Player.onEvent can only be used in load function");
        assert!(pack.tick().is_empty());

        let out = invoke(&call_site("JMC.put(\"say hi\")"), &mut pack, Context::Nested).unwrap();
        assert_eq!(out, vec!["say hi".to_string()]);
    }

    #[test]
    fn test_binding_errors_surface() {
        let mut pack = DataPack::new("ns");
        let err = invoke(&call_site("JMC.put(\"a\", \"b\")"), &mut pack, Context::Load)
            .unwrap_err();
        assert_eq!(err.message, "JMC.put takes 1 positional arguments, got 2");

        let err = invoke(
            &call_site("Timer.set(obj, @s, tick=5, ticks=3)"),
            &mut pack,
            Context::Load,
        )
        .unwrap_err();
        assert_eq!(err.message, "Timer.set got unexpected keyword argument 'ticks'");
        assert_eq!(
            err.suggestion.as_deref(),
            Some("Available arguments are\n'objective', 'selector', 'tick'")
        );
    }
}
