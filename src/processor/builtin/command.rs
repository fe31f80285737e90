//! Intrinsics that expand to commands at the call site.

use crate::error::{CompileError, Result};
use crate::processor::args::{ArgKind, BoundArgs, NumberType, Param};
use crate::processor::datapack::{DataPack, Item};
use crate::processor::lexer::parse_object;
use crate::processor::rich_text::{RichText, TextOptions};
use crate::processor::score::ScoreRef;

use super::{FuncType, Intrinsic, Signature};

pub struct TimerSet;

static TIMER_SET: Signature = Signature {
    call_string: "Timer.set",
    func_type: FuncType::Command,
    params: &[
        Param::required("objective", ArgKind::Keyword),
        Param::required("selector", ArgKind::Selector),
        Param::required("tick", ArgKind::ScoreboardPlayer),
    ],
};

impl Intrinsic for TimerSet {
    fn signature(&self) -> &'static Signature {
        &TIMER_SET
    }

    fn lower(&self, args: &BoundArgs, _pack: &mut DataPack) -> Result<Vec<String>> {
        let objective = args.text("objective")?;
        let selector = args.text("selector")?;
        let line = match args.score("tick")? {
            ScoreRef::Integer(n) => format!("scoreboard players set {selector} {objective} {n}"),
            score => format!("scoreboard players operation {selector} {objective} = {score}"),
        };
        Ok(vec![line])
    }
}

/// Looks up an item made by `Item.create`.
fn defined_item<'a>(args: &BoundArgs, pack: &'a DataPack) -> Result<&'a Item> {
    let id = args.arg("itemId")?;
    pack.item(id.text()).ok_or_else(|| {
        CompileError::value(format!("Item id: '{}' is not defined.", id.text()), &id.token)
            .with_suggestion(format!(
                "Use Item.create to make this item BEFORE using {}",
                args.call_string()
            ))
    })
}

pub struct ItemGive;

static ITEM_GIVE: Signature = Signature {
    call_string: "Item.give",
    func_type: FuncType::Command,
    params: &[
        Param::required("itemId", ArgKind::Keyword),
        Param::with_default("selector", ArgKind::Selector, "@s"),
        Param::with_default("amount", ArgKind::Integer, "1").number(NumberType::ZeroPositive),
    ],
};

impl Intrinsic for ItemGive {
    fn signature(&self) -> &'static Signature {
        &ITEM_GIVE
    }

    fn validate(&self, args: &BoundArgs, pack: &DataPack) -> Result<()> {
        defined_item(args, pack).map(|_| ())
    }

    fn lower(&self, args: &BoundArgs, pack: &mut DataPack) -> Result<Vec<String>> {
        let item = defined_item(args, pack)?;
        Ok(vec![format!(
            "give {} {item} {}",
            args.text("selector")?,
            args.int("amount")?
        )])
    }
}

pub struct ItemSummon;

static ITEM_SUMMON: Signature = Signature {
    call_string: "Item.summon",
    func_type: FuncType::Command,
    params: &[
        Param::required("itemId", ArgKind::Keyword),
        Param::with_default("pos", ArgKind::String, "~ ~ ~"),
        Param::with_default("count", ArgKind::Integer, "1").number(NumberType::Positive),
        Param::with_default("nbt", ArgKind::JsObject, "{}"),
    ],
};

impl Intrinsic for ItemSummon {
    fn signature(&self) -> &'static Signature {
        &ITEM_SUMMON
    }

    fn validate(&self, args: &BoundArgs, pack: &DataPack) -> Result<()> {
        defined_item(args, pack)?;
        let nbt = args.arg("nbt")?;
        if parse_object(&nbt.token)?.iter().any(|(key, _)| key == "Item") {
            return Err(CompileError::value(
                "`Item` key found inside Item.summon nbt argument.",
                &nbt.token,
            )
            .with_suggestion("Remove `Item` in the nbt"));
        }
        Ok(())
    }

    fn lower(&self, args: &BoundArgs, pack: &mut DataPack) -> Result<Vec<String>> {
        let item = defined_item(args, pack)?;
        let extra: Vec<String> = parse_object(&args.arg("nbt")?.token)?
            .into_iter()
            .map(|(key, value)| format!(",{key}:{}", value.to_raw()))
            .collect();
        Ok(vec![format!(
            "summon item {} {{Item:{{id:\"{}\",Count:{},tag:{}}}{}}}",
            args.text("pos")?,
            item.item_type,
            args.int("count")?,
            item.nbt,
            extra.concat()
        )])
    }
}

pub struct ItemReplaceBlock;

static ITEM_REPLACE_BLOCK: Signature = Signature {
    call_string: "Item.replaceBlock",
    func_type: FuncType::Command,
    params: &[
        Param::required("itemId", ArgKind::Keyword),
        Param::required("pos", ArgKind::String),
        Param::required("slot", ArgKind::String),
        Param::with_default("count", ArgKind::Integer, "1").number(NumberType::Positive),
    ],
};

impl Intrinsic for ItemReplaceBlock {
    fn signature(&self) -> &'static Signature {
        &ITEM_REPLACE_BLOCK
    }

    fn validate(&self, args: &BoundArgs, pack: &DataPack) -> Result<()> {
        defined_item(args, pack).map(|_| ())
    }

    fn lower(&self, args: &BoundArgs, pack: &mut DataPack) -> Result<Vec<String>> {
        let item = defined_item(args, pack)?;
        Ok(vec![format!(
            "item replace block {} {} with {item} {}",
            args.text("pos")?,
            args.text("slot")?,
            args.int("count")?
        )])
    }
}

pub struct ItemReplaceEntity;

static ITEM_REPLACE_ENTITY: Signature = Signature {
    call_string: "Item.replaceEntity",
    func_type: FuncType::Command,
    params: &[
        Param::required("itemId", ArgKind::Keyword),
        Param::required("selector", ArgKind::Selector),
        Param::required("slot", ArgKind::String),
        Param::with_default("count", ArgKind::Integer, "1").number(NumberType::Positive),
    ],
};

impl Intrinsic for ItemReplaceEntity {
    fn signature(&self) -> &'static Signature {
        &ITEM_REPLACE_ENTITY
    }

    fn validate(&self, args: &BoundArgs, pack: &DataPack) -> Result<()> {
        defined_item(args, pack).map(|_| ())
    }

    fn lower(&self, args: &BoundArgs, pack: &mut DataPack) -> Result<Vec<String>> {
        let item = defined_item(args, pack)?;
        Ok(vec![format!(
            "item replace entity {} {} with {item} {}",
            args.text("selector")?,
            args.text("slot")?,
            args.int("count")?
        )])
    }
}

pub struct JmcPut;

static JMC_PUT: Signature = Signature {
    call_string: "JMC.put",
    func_type: FuncType::Command,
    params: &[Param::required("command", ArgKind::String)],
};

impl Intrinsic for JmcPut {
    fn signature(&self) -> &'static Signature {
        &JMC_PUT
    }

    fn lower(&self, args: &BoundArgs, _pack: &mut DataPack) -> Result<Vec<String>> {
        Ok(vec![args.text("command")?.to_string()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Tellraw,
    Title,
    Subtitle,
    Actionbar,
}

/// `Text.tellraw` and the three `title` variants.
pub struct TextMessage(pub TextKind);

const TEXT_PARAMS: &[Param] = &[
    Param::required("selector", ArgKind::Selector),
    Param::required("message", ArgKind::String),
];

static TEXT_TELLRAW: Signature = Signature {
    call_string: "Text.tellraw",
    func_type: FuncType::Command,
    params: TEXT_PARAMS,
};

static TEXT_TITLE: Signature = Signature {
    call_string: "Text.title",
    func_type: FuncType::Command,
    params: TEXT_PARAMS,
};

static TEXT_SUBTITLE: Signature = Signature {
    call_string: "Text.subtitle",
    func_type: FuncType::Command,
    params: TEXT_PARAMS,
};

static TEXT_ACTIONBAR: Signature = Signature {
    call_string: "Text.actionbar",
    func_type: FuncType::Command,
    params: TEXT_PARAMS,
};

impl Intrinsic for TextMessage {
    fn signature(&self) -> &'static Signature {
        match self.0 {
            TextKind::Tellraw => &TEXT_TELLRAW,
            TextKind::Title => &TEXT_TITLE,
            TextKind::Subtitle => &TEXT_SUBTITLE,
            TextKind::Actionbar => &TEXT_ACTIONBAR,
        }
    }

    fn lower(&self, args: &BoundArgs, _pack: &mut DataPack) -> Result<Vec<String>> {
        let selector = args.text("selector")?;
        let message = args.arg("message")?;
        let json = RichText::parse(message.text(), message.token.location, TextOptions::CHAT)?;
        if json.is_empty() {
            return Err(CompileError::value(
                "Formatted text cannot be empty",
                &message.token,
            ));
        }
        let line = match self.0 {
            TextKind::Tellraw => format!("tellraw {selector} {json}"),
            TextKind::Title => format!("title {selector} title {json}"),
            TextKind::Subtitle => format!("title {selector} subtitle {json}"),
            TextKind::Actionbar => format!("title {selector} actionbar {json}"),
        };
        Ok(vec![line])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{Location, Statement};
    use crate::processor::builtin::{Context, invoke};
    use crate::processor::statement::parse_statement;

    fn run(pack: &mut DataPack, src: &str) -> Result<Vec<String>> {
        match parse_statement(src, Location::new(1, 1))? {
            Statement::Call(call) => invoke(&call, pack, Context::Nested),
            other => panic!("expected call, got {other:?}"),
        }
    }

    fn pack_with_sword() -> DataPack {
        let mut pack = DataPack::new("ns");
        pack.put_item(
            "sword",
            Item {
                item_type: "minecraft:diamond_sword".into(),
                nbt: "{CustomModelData:3}".into(),
            },
        );
        pack
    }

    #[test]
    fn test_command_output() {
        let test_cases = vec![
            ("Timer.set(cd, @a, 20)", "scoreboard players set @a cd 20"),
            (
                "Timer.set(cd, @s, $delay)",
                "scoreboard players operation @s cd = $delay __variable__",
            ),
            (
                "Timer.set(cd, @s, base:@p)",
                "scoreboard players operation @s cd = @p base",
            ),
            ("Item.give(sword)", "give @s minecraft:diamond_sword{CustomModelData:3} 1"),
            (
                "Item.give(sword, @a[tag=x], amount=0)",
                "give @a[tag=x] minecraft:diamond_sword{CustomModelData:3} 0",
            ),
            (
                "Item.summon(sword, \"1 2 3\", 2, {PickupDelay: 10})",
                "summon item 1 2 3 {Item:{id:\"minecraft:diamond_sword\",Count:2,tag:{CustomModelData:3}},PickupDelay:10}",
            ),
            (
                "Item.summon(sword)",
                "summon item ~ ~ ~ {Item:{id:\"minecraft:diamond_sword\",Count:1,tag:{CustomModelData:3}}}",
            ),
            (
                "Item.replaceBlock(sword, \"~ ~-1 ~\", \"container.0\")",
                "item replace block ~ ~-1 ~ container.0 with minecraft:diamond_sword{CustomModelData:3} 1",
            ),
            (
                "Item.replaceEntity(sword, @s, \"weapon.mainhand\", 1)",
                "item replace entity @s weapon.mainhand with minecraft:diamond_sword{CustomModelData:3} 1",
            ),
            ("JMC.put(\"say raw\")", "say raw"),
            ("Text.tellraw(@a, \"&aHi\")", r#"tellraw @a {"text":"Hi","color":"green"}"#),
            ("Text.title(@a, \"Big\")", r#"title @a title {"text":"Big"}"#),
            ("Text.subtitle(@a, \"small\")", r#"title @a subtitle {"text":"small"}"#),
            ("Text.actionbar(@p, \"bar\")", r#"title @p actionbar {"text":"bar"}"#),
        ];
        for (src, expected) in test_cases {
            let mut pack = pack_with_sword();
            assert_eq!(run(&mut pack, src).unwrap(), vec![expected.to_string()], "source: {src}");
        }
    }

    #[test]
    fn test_undefined_item() {
        let mut pack = DataPack::new("ns");
        let err = run(&mut pack, "Item.give(shield)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Value);
        assert_eq!(err.message, "Item id: 'shield' is not defined.");
        assert_eq!(
            err.suggestion.as_deref(),
            Some("Use Item.create to make this item BEFORE using Item.give")
        );
    }

    #[test]
    fn test_command_errors() {
        let test_cases = vec![
            ("Item.summon(sword, nbt={Item: {}})", ErrorKind::Value),
            ("Item.summon(sword, count=0)", ErrorKind::Value),
            ("Item.give(sword, amount=-1)", ErrorKind::Value),
            ("Timer.set(cd, @a, 1.5)", ErrorKind::Value),
            ("JMC.put(say)", ErrorKind::Value),
            ("Text.tellraw(@a)", ErrorKind::MissingValue),
            ("Text.tellraw(@a, \"&<red,blue>x\")", ErrorKind::Value),
            ("Text.tellraw(@a, \"\")", ErrorKind::Value),
            ("Text.title(@a, \"&l\")", ErrorKind::Value),
            ("Text.actionbar(@s, \"&a&<bold>\")", ErrorKind::Value),
        ];
        for (src, kind) in test_cases {
            let mut pack = pack_with_sword();
            let err = run(&mut pack, src).unwrap_err();
            assert_eq!(err.kind, kind, "source: {src}");
        }
    }
}
