//! Declarative intrinsics valid only at the top level of the load function.
//!
//! None of these emit anything at the call site. They wire helper blocks,
//! objectives and tick/load hooks into the [`DataPack`], setting up each
//! feature's shared blocks once through [`DataPack::first_use`].

use serde_json::{Value, json};
use tracing::debug;

use crate::error::{CompileError, Result};
use crate::model::{Location, TokenKind};
use crate::processor::args::{ArgKind, BoundArgs, Param};
use crate::processor::callable::Callable;
use crate::processor::datapack::{BlockId, DataPack, Item};
use crate::processor::dispatch::{self, Dispatch, Strategy, guarded_branch, parse_func_map};
use crate::processor::lexer::{parse_list, parse_object};
use crate::processor::rich_text::{RichText, TextOptions};
use crate::processor::score::ScoreRef;

use super::{FuncType, Intrinsic, Signature};

const MAIN: &str = "main";
const FOUND: &str = "found";
const ENABLE: &str = "enable";

/// NBT key and register holding a clickable item's numeric tag.
const ITEM_ID: &str = "__item_id__";
const CLICK_ITEM: &str = "minecraft:carrot_on_a_stick";
const CLICK_CRITERIA: &str = "used:carrot_on_a_stick";

fn item_register() -> ScoreRef {
    ScoreRef::variable(ITEM_ID)
}

fn store_held_tag(tag_key: &str) -> String {
    format!(
        "execute store result score {} run data get entity @s SelectedItem.tag.{tag_key}",
        item_register()
    )
}

fn with_minecraft_prefix(id: &str) -> String {
    if id.contains(':') {
        id.to_string()
    } else {
        format!("minecraft:{id}")
    }
}

/// An item id given either bare (`stone`, `minecraft:stone`) or quoted.
fn item_id_arg(args: &BoundArgs, key: &str) -> Result<String> {
    let arg = args.arg(key)?;
    let accepted = match arg.token.kind {
        TokenKind::String => true,
        TokenKind::Keyword => !arg.text().starts_with('$'),
        _ => false,
    };
    if !accepted {
        return Err(CompileError::value(
            format!("For '{key}' key, expected item id, got {}", arg.kind),
            &arg.token,
        ));
    }
    Ok(with_minecraft_prefix(arg.text()))
}

fn callable_arg(args: &BoundArgs, key: &str, pack: &DataPack) -> Result<Option<Callable>> {
    args.get(key)
        .map(|arg| Callable::from_arg(arg, pack.namespace()))
        .transpose()
}

fn quote_single(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Tick hook for a carrot-on-a-stick counter calling the feature's `main`.
fn click_setup(pack: &mut DataPack, feature: &str, objective: &str) {
    debug!(feature, objective, "first use setup");
    pack.add_objective(objective, CLICK_CRITERIA);
    let main = pack.call_function(feature, &BlockId::from(MAIN));
    pack.add_tick(format!(
        "execute as @a[scores={{{objective}=1..}}] at @s run {main}"
    ));
    pack.block_mut(feature, MAIN)
        .push(format!("scoreboard players set @s {objective} 0"));
}

/// One command running a dispatch table; sparse branches get their own block.
fn dispatch_call(
    pack: &mut DataPack,
    feature: &str,
    register: &ScoreRef,
    cases: &[(u32, Callable)],
    location: Location,
) -> Result<String> {
    let reserved = (dispatch::strategy(cases) == Strategy::Sparse)
        .then(|| BlockId::Index(pack.allocate_block_id(feature)));
    match dispatch::lower(pack, feature, register, cases, location)? {
        Dispatch::Tree(call) => Ok(call),
        Dispatch::Branches(lines) => Ok(pack.add_private_function(feature, lines, reserved)),
    }
}

pub struct RightClickSetup;

static RIGHT_CLICK_SETUP: Signature = Signature {
    call_string: "RightClick.setup",
    func_type: FuncType::LoadOnly,
    params: &[
        Param::required("idName", ArgKind::Keyword),
        Param::required("functionMap", ArgKind::JsObject),
    ],
};

impl Intrinsic for RightClickSetup {
    fn signature(&self) -> &'static Signature {
        &RIGHT_CLICK_SETUP
    }

    fn lower(&self, args: &BoundArgs, pack: &mut DataPack) -> Result<Vec<String>> {
        let id_name = args.text("idName")?;
        let cases = parse_func_map(&args.arg("functionMap")?.token, pack.namespace())?;

        let prefix = id_name.chars().take(10).collect::<String>().to_lowercase();
        let feature = format!("right_click_setup_{prefix}");
        let objective = format!("__rc__{prefix}");
        if pack.first_use(&feature) {
            click_setup(pack, &feature, &objective);
        }
        pack.block_mut(&feature, MAIN).push(store_held_tag(id_name));

        let register = item_register();
        let call = dispatch_call(pack, &feature, &register, &cases, args.location())?;
        pack.block_mut(&feature, MAIN)
            .push(format!("execute if score {register} matches 1.. run {call}"));
        Ok(Vec::new())
    }
}

pub struct ItemCreate;

static ITEM_CREATE: Signature = Signature {
    call_string: "Item.create",
    func_type: FuncType::LoadOnly,
    params: &[
        Param::required("itemId", ArgKind::Keyword),
        Param::required("itemType", ArgKind::Any),
        Param::required("displayName", ArgKind::String),
        Param::with_default("lore", ArgKind::List, "[]"),
        Param::with_default("nbt", ArgKind::JsObject, "{}"),
        Param::optional("onClick", ArgKind::Func),
    ],
};

const ITEM_CREATE_FEATURE: &str = "item_create";
const ITEM_CLICK_OBJECTIVE: &str = "__item__rc__";

impl Intrinsic for ItemCreate {
    fn signature(&self) -> &'static Signature {
        &ITEM_CREATE
    }

    fn lower(&self, args: &BoundArgs, pack: &mut DataPack) -> Result<Vec<String>> {
        let item_type = item_id_arg(args, "itemType")?;
        let on_click = callable_arg(args, "onClick", pack)?;
        if on_click.is_some() && item_type != CLICK_ITEM {
            let arg = args.arg("onClick")?;
            return Err(CompileError::value(
                format!(
                    "on_click can only be used with {CLICK_ITEM} in {}",
                    args.call_string()
                ),
                &arg.token,
            )
            .with_suggestion(format!("Change item_type to {CLICK_ITEM}")));
        }

        let nbt_arg = args.arg("nbt")?;
        let entries = parse_object(&nbt_arg.token)?;
        if let Some((key, _)) = entries
            .iter()
            .find(|(key, _)| key == ITEM_ID || key == "display")
        {
            return Err(CompileError::value(
                format!("{key} is already inside the nbt"),
                &nbt_arg.token,
            ));
        }

        let name_arg = args.arg("displayName")?;
        let name = RichText::parse(name_arg.text(), name_arg.token.location, TextOptions::ITEM)?;
        let mut lore = Vec::new();
        for line in parse_list(&args.arg("lore")?.token)? {
            if line.kind != TokenKind::String {
                return Err(CompileError::value(
                    format!("Expected string in lore, got '{}'", line.text),
                    &line,
                ));
            }
            let text = RichText::parse(&line.text, line.location, TextOptions::ITEM)?;
            lore.push(quote_single(&text.to_string()));
        }

        let mut fields: Vec<String> = entries
            .iter()
            .map(|(key, value)| format!("{key}:{}", value.to_raw()))
            .collect();

        if let Some(callable) = on_click {
            let tag = pack.allocate_item_tag();
            let register = item_register();
            if pack.first_use(ITEM_CREATE_FEATURE) {
                click_setup(pack, ITEM_CREATE_FEATURE, ITEM_CLICK_OBJECTIVE);
                let found = pack.call_function(ITEM_CREATE_FEATURE, &BlockId::from(FOUND));
                let main = pack.block_mut(ITEM_CREATE_FEATURE, MAIN);
                main.push(store_held_tag(ITEM_ID));
                main.push(format!("execute if score {register} matches 1.. run {found}"));
                pack.block_mut(ITEM_CREATE_FEATURE, FOUND);
            }
            let branch = guarded_branch(pack, ITEM_CREATE_FEATURE, &register, tag, &callable)?;
            pack.block_mut(ITEM_CREATE_FEATURE, FOUND).push(branch);
            fields.push(format!("{ITEM_ID}:{tag}"));
        }

        fields.push(format!(
            "display:{{Name:{},Lore:[{}]}}",
            quote_single(&name.to_string()),
            lore.join(",")
        ));
        pack.put_item(
            args.text("itemId")?,
            Item {
                item_type,
                nbt: format!("{{{}}}", fields.join(",")),
            },
        );
        Ok(Vec::new())
    }
}

pub struct PlayerOnEvent;

static PLAYER_ON_EVENT: Signature = Signature {
    call_string: "Player.onEvent",
    func_type: FuncType::LoadOnly,
    params: &[
        Param::required("objective", ArgKind::Keyword),
        Param::required("function", ArgKind::Func),
    ],
};

impl Intrinsic for PlayerOnEvent {
    fn signature(&self) -> &'static Signature {
        &PLAYER_ON_EVENT
    }

    fn lower(&self, args: &BoundArgs, pack: &mut DataPack) -> Result<Vec<String>> {
        let objective = args.text("objective")?;
        let callable = Callable::from_arg(args.arg("function")?, pack.namespace())?;

        let mut lines = vec![format!("scoreboard players set @s {objective} 0")];
        lines.extend(callable.body(pack)?);
        let call = pack.add_private_function("player_on_event", lines, None);
        pack.add_tick(format!(
            "execute as @a[scores={{{objective}=1..}}] at @s run {call}"
        ));
        Ok(Vec::new())
    }
}

/// Declares a trigger objective and, once per feature, the `main` tick
/// block and the `enable` block re-armed every tick by an advancement.
fn trigger_bootstrap(pack: &mut DataPack, feature: &str, objective: &str) {
    pack.add_objective(objective, "trigger");
    if pack.first_use(feature) {
        debug!(feature, "first use setup");
        let main = pack.call_function(feature, &BlockId::from(MAIN));
        pack.add_tick(main);
        pack.block_mut(feature, MAIN);

        let enable_id = BlockId::from(ENABLE);
        let enable = pack.call_function(feature, &enable_id);
        pack.add_load(format!("execute as @a run {enable}"));
        pack.block_mut(feature, ENABLE);

        let reward = pack.private_path(feature, &enable_id);
        pack.put_document(
            "advancements",
            &format!("{feature}/{ENABLE}"),
            json!({
                "criteria": {
                    "requirement": {
                        "trigger": "minecraft:tick"
                    }
                },
                "rewards": {
                    "function": reward
                }
            }),
        );
    }
    pack.block_mut(feature, ENABLE)
        .push(format!("scoreboard players enable @s {objective}"));
}

fn rearm(objective: &str) -> [String; 2] {
    [
        format!("scoreboard players set @s {objective} 0"),
        format!("scoreboard players enable @s {objective}"),
    ]
}

pub struct TriggerSetup;

static TRIGGER_SETUP: Signature = Signature {
    call_string: "Trigger.setup",
    func_type: FuncType::LoadOnly,
    params: &[
        Param::required("objective", ArgKind::Keyword),
        Param::required("triggers", ArgKind::JsObject),
    ],
};

const TRIGGER_SETUP_FEATURE: &str = "trigger_setup";

impl Intrinsic for TriggerSetup {
    fn signature(&self) -> &'static Signature {
        &TRIGGER_SETUP
    }

    fn lower(&self, args: &BoundArgs, pack: &mut DataPack) -> Result<Vec<String>> {
        let objective = args.text("objective")?;
        let cases = parse_func_map(&args.arg("triggers")?.token, pack.namespace())?;

        trigger_bootstrap(pack, TRIGGER_SETUP_FEATURE, objective);
        let id = BlockId::Index(pack.allocate_block_id(TRIGGER_SETUP_FEATURE));
        let call = pack.call_function(TRIGGER_SETUP_FEATURE, &id);
        pack.block_mut(TRIGGER_SETUP_FEATURE, MAIN).push(format!(
            "execute as @a[scores={{{objective}=1..}}] at @s run {call}"
        ));

        let register = ScoreRef::objective(objective, "@s");
        let mut lines = dispatch::lower(
            pack,
            TRIGGER_SETUP_FEATURE,
            &register,
            &cases,
            args.location(),
        )?
        .into_lines();
        lines.extend(rearm(objective));
        pack.add_private_function(TRIGGER_SETUP_FEATURE, lines, Some(id));
        Ok(Vec::new())
    }
}

pub struct TriggerAdd;

static TRIGGER_ADD: Signature = Signature {
    call_string: "Trigger.add",
    func_type: FuncType::LoadOnly,
    params: &[
        Param::required("objective", ArgKind::Keyword),
        Param::required("function", ArgKind::Func),
    ],
};

const TRIGGER_ADD_FEATURE: &str = "trigger_add";

impl Intrinsic for TriggerAdd {
    fn signature(&self) -> &'static Signature {
        &TRIGGER_ADD
    }

    fn validate(&self, args: &BoundArgs, _pack: &DataPack) -> Result<()> {
        let objective = args.arg("objective")?;
        if matches!(objective.text(), MAIN | ENABLE) {
            return Err(CompileError::value(
                format!("'{}' is reserved in {}", objective.text(), args.call_string()),
                &objective.token,
            ));
        }
        Ok(())
    }

    fn lower(&self, args: &BoundArgs, pack: &mut DataPack) -> Result<Vec<String>> {
        let objective = args.text("objective")?;
        let callable = Callable::from_arg(args.arg("function")?, pack.namespace())?;

        trigger_bootstrap(pack, TRIGGER_ADD_FEATURE, objective);
        let mut lines = callable.body(pack)?;
        lines.extend(rearm(objective));
        let call = pack.add_private_function(
            TRIGGER_ADD_FEATURE,
            lines,
            Some(BlockId::from(objective)),
        );
        pack.block_mut(TRIGGER_ADD_FEATURE, MAIN).push(format!(
            "execute as @a[scores={{{objective}=1..}}] at @s run {call}"
        ));
        Ok(Vec::new())
    }
}

pub struct TimerAdd;

static TIMER_ADD: Signature = Signature {
    call_string: "Timer.add",
    func_type: FuncType::LoadOnly,
    params: &[
        Param::required("objective", ArgKind::Keyword),
        Param::required("mode", ArgKind::Keyword),
        Param::required("selector", ArgKind::Selector),
        Param::optional("function", ArgKind::Func),
    ],
};

const TIMER_ADD_FEATURE: &str = "timer_add";

impl Intrinsic for TimerAdd {
    fn signature(&self) -> &'static Signature {
        &TIMER_ADD
    }

    fn validate(&self, args: &BoundArgs, _pack: &DataPack) -> Result<()> {
        let mode = args.arg("mode")?;
        match (mode.text(), args.get("function")) {
            ("runOnce" | "runTick", Some(_)) | ("none", None) => Ok(()),
            ("runOnce" | "runTick", None) => Err(CompileError::missing(
                "function",
                args.call_string(),
                args.location(),
            )),
            ("none", Some(function)) => Err(CompileError::value(
                format!("'function' is provided in 'none' mode {}", args.call_string()),
                &function.token,
            )),
            (other, _) => Err(CompileError::value(
                format!(
                    "Available modes for {} are 'runOnce', 'runTick' and 'none' (got '{other}')",
                    args.call_string()
                ),
                &mode.token,
            )
            .with_suggestion(
                "'runOnce' run the commands once after the timer is over.\n\
                 'runTick' run the commands every tick if timer is over.\n\
                 'none' do not run any command.",
            )),
        }
    }

    fn lower(&self, args: &BoundArgs, pack: &mut DataPack) -> Result<Vec<String>> {
        let objective = args.text("objective")?;
        let mode = args.text("mode")?;
        let selector = args.text("selector")?;
        let callable = callable_arg(args, "function", pack)?;

        pack.add_objective(objective, "dummy");
        if pack.first_use(TIMER_ADD_FEATURE) {
            debug!(feature = TIMER_ADD_FEATURE, "first use setup");
            let main = pack.call_function(TIMER_ADD_FEATURE, &BlockId::from(MAIN));
            pack.add_tick(main);
            pack.block_mut(TIMER_ADD_FEATURE, MAIN);
        }
        pack.block_mut(TIMER_ADD_FEATURE, MAIN).push(format!(
            "execute as {selector} if score @s {objective} matches 1.. run scoreboard players remove @s {objective} 1"
        ));

        let Some(callable) = callable else {
            return Ok(Vec::new());
        };
        let line = if mode == "runOnce" {
            let mut lines = vec![format!("scoreboard players reset @s {objective}")];
            lines.extend(callable.body(pack)?);
            let call = pack.add_private_function(TIMER_ADD_FEATURE, lines, None);
            format!("execute as {selector} if score @s {objective} matches 0 run {call}")
        } else {
            let call = callable.call(pack, TIMER_ADD_FEATURE)?;
            format!("execute as {selector} unless score @s {objective} matches 1.. run {call}")
        };
        pack.block_mut(TIMER_ADD_FEATURE, MAIN).push(line);
        Ok(Vec::new())
    }
}

pub struct RecipeTable;

static RECIPE_TABLE: Signature = Signature {
    call_string: "Recipe.table",
    func_type: FuncType::LoadOnly,
    params: &[
        Param::required("recipe", ArgKind::Json),
        Param::with_default("baseItem", ArgKind::Any, "minecraft:knowledge_book"),
        Param::optional("onCraft", ArgKind::Func),
    ],
};

const RECIPE_TABLE_FEATURE: &str = "recipe_table";

/// Recipe document with its result swapped for `base_item`, plus the
/// item and count it replaced.
fn rewrite_recipe(args: &BoundArgs, base_item: &str) -> Result<(Value, String, u64)> {
    let arg = args.arg("recipe")?;
    let mut recipe: Value = serde_json::from_str(arg.text())
        .map_err(|e| CompileError::decode(format!("Invalid JSON: {e}"), &arg.token))?;

    let invalid = |message: &str| {
        CompileError::value(message, &arg.token).with_suggestion("recipe json maybe invalid")
    };
    let result = recipe
        .get_mut("result")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| invalid("'result' key not found in recipe"))?;
    let item = result
        .get("item")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| invalid("'item' key not found in 'result' in recipe"))?;
    let count = result
        .get("count")
        .and_then(Value::as_u64)
        .ok_or_else(|| invalid("'count' key not found in 'result' in recipe"))?;

    result.insert("item".into(), Value::String(base_item.to_string()));
    result.insert("count".into(), json!(1));
    Ok((recipe, item, count))
}

impl Intrinsic for RecipeTable {
    fn signature(&self) -> &'static Signature {
        &RECIPE_TABLE
    }

    fn lower(&self, args: &BoundArgs, pack: &mut DataPack) -> Result<Vec<String>> {
        let base_item = item_id_arg(args, "baseItem")?;
        let (recipe, result_item, result_count) = rewrite_recipe(args, &base_item)?;
        let on_craft = callable_arg(args, "onCraft", pack)?;

        let id = BlockId::Index(pack.allocate_block_id(RECIPE_TABLE_FEATURE));
        let name = format!("{RECIPE_TABLE_FEATURE}/{id}");
        let path = pack.private_path(RECIPE_TABLE_FEATURE, &id);
        pack.put_document(
            "advancements",
            &name,
            json!({
                "criteria": {
                    "requirement": {
                        "trigger": "minecraft:recipe_unlocked",
                        "conditions": {
                            "recipe": path
                        }
                    }
                },
                "rewards": {
                    "function": path
                }
            }),
        );
        pack.put_document("recipes", &name, recipe);

        let mut lines = vec![
            format!("clear @s {base_item} 1"),
            format!("give @s {result_item} {result_count}"),
            format!("recipe take @s {path}"),
            format!("advancement revoke @s only {path}"),
        ];
        if let Some(callable) = on_craft {
            lines.extend(callable.body(pack)?);
        }
        pack.add_private_function(RECIPE_TABLE_FEATURE, lines, Some(id));
        Ok(Vec::new())
    }
}
