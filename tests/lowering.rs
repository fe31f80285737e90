use std::fs;

use datapack_lower::compile_source;
use datapack_lower::error::ErrorKind;
use datapack_lower::model::Location;
use datapack_lower::processor::DataPack;
use datapack_lower::processor::datapack::BlockId;
use datapack_lower::writer::{self, PackMeta};

const DEMO: &str = include_str!("fixtures/demo.jmc");

fn demo() -> DataPack {
    compile_source(DEMO, "demo").expect("demo source lowers")
}

fn block(pack: &DataPack, feature: &str, id: &str) -> Vec<String> {
    let id: BlockId = match id.parse::<u32>() {
        Ok(n) => n.into(),
        Err(_) => id.into(),
    };
    pack.block(feature, id).unwrap_or_default().to_vec()
}

#[test]
fn lowers_demo_hooks() {
    let pack = demo();

    assert_eq!(
        pack.load(),
        [
            "execute as @a run function demo:__private__/trigger_setup/enable",
            "say loaded",
        ]
    );
    assert_eq!(
        pack.tick(),
        [
            "execute as @a[scores={__item__rc__=1..}] at @s run function demo:__private__/item_create/main",
            "function demo:__private__/timer_add/main",
            "function demo:__private__/trigger_setup/main",
            "execute as @a[scores={deaths=1..}] at @s run function demo:__private__/player_on_event/0",
            "execute as @a[scores={__rc__staff=1..}] at @s run function demo:__private__/right_click_setup_staff/main",
        ]
    );
}

#[test]
fn lowers_nested_bodies() {
    let pack = demo();

    assert_eq!(
        block(&pack, "item_create", "0"),
        [
            r#"title @s actionbar {"text":"Zap!","color":"yellow"}"#,
            "scoreboard players set @s zap_cd 40",
        ]
    );
    assert_eq!(
        block(&pack, "timer_add", "main"),
        [
            "execute as @a if score @s zap_cd matches 1.. run scoreboard players remove @s zap_cd 1",
            "execute as @a unless score @s zap_cd matches 1.. run function demo:lib/cooldown",
        ]
    );

    let give = block(&pack, "trigger_setup", "3");
    assert_eq!(give.len(), 1);
    assert!(give[0].starts_with("give @s minecraft:emerald{display:{Name:"));
    assert!(give[0].ends_with(" 1"));
    assert_eq!(block(&pack, "trigger_setup", "2"), ["function demo:lib/help"]);

    assert_eq!(
        block(&pack, "right_click_setup_staff", "0"),
        [
            "execute if score __item_id__ __variable__ matches 1 run function demo:lib/fire",
            "execute if score __item_id__ __variable__ matches 3 run function demo:lib/ice",
        ]
    );
}

#[test]
fn catalogues_items() {
    let pack = demo();

    let wand = pack.item("wand").unwrap();
    assert_eq!(wand.item_type, "minecraft:carrot_on_a_stick");
    assert!(wand.nbt.starts_with("{CustomModelData:1,__item_id__:1,display:{Name:'"));
    assert_eq!(pack.item("gem").unwrap().item_type, "minecraft:emerald");
}

#[test]
fn reports_error_location() {
    let test_cases = vec![
        ("say a;\nItem.give(nope);", ErrorKind::Value, Location::new(2, 11)),
        ("Timer.add(cd, runOnce, @a);", ErrorKind::MissingValue, Location::new(1, 1)),
        ("say a;\n  Item.give(", ErrorKind::Syntax, Location::new(2, 12)),
        (
            "Timer.add(cd, runTick, @a, () => {Trigger.setup(m, {1: a});});",
            ErrorKind::Syntax,
            Location::new(1, 35),
        ),
        (
            "Timer.add(cd, runTick, @a, () => {\n  say a;\n  Trigger.setup(m, {1: a});\n});",
            ErrorKind::Syntax,
            Location::new(3, 3),
        ),
        (
            "Player.onEvent(x, () => {\n  say a;\n    Text.tellraw(@a, \"\");\n});",
            ErrorKind::Value,
            Location::new(3, 22),
        ),
    ];
    for (source, kind, location) in test_cases {
        let err = compile_source(source, "demo").unwrap_err();
        assert_eq!(err.kind, kind, "source: {source:?}");
        assert_eq!(err.location, location, "source: {source:?}");
    }
}

#[test]
fn writes_datapack_tree() {
    let pack = demo();
    let out = std::env::temp_dir().join(format!("datapack-lower-{}", std::process::id()));
    let meta = PackMeta {
        pack_format: 10,
        description: "demo".to_string(),
    };
    writer::emit(&pack, &meta, &out).unwrap();

    let load = fs::read_to_string(out.join("data/demo/functions/__load__.mcfunction")).unwrap();
    assert_eq!(
        load,
        "scoreboard objectives add __variable__ dummy\n\
         scoreboard objectives add __item__rc__ used:carrot_on_a_stick\n\
         scoreboard objectives add __rc__staff used:carrot_on_a_stick\n\
         scoreboard objectives add menu trigger\n\
         scoreboard objectives add zap_cd dummy\n\
         execute as @a run function demo:__private__/trigger_setup/enable\n\
         say loaded\n"
    );

    let mcmeta: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("pack.mcmeta")).unwrap()).unwrap();
    assert_eq!(mcmeta["pack"]["description"], "demo");

    let tick: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(out.join("data/minecraft/tags/functions/tick.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(tick["values"][0], "demo:__tick__");

    for path in [
        "data/demo/functions/__tick__.mcfunction",
        "data/demo/functions/__private__/trigger_setup/main.mcfunction",
        "data/demo/functions/__private__/item_create/found.mcfunction",
        "data/demo/advancements/__private__/trigger_setup/enable.json",
        "items.json",
    ] {
        assert!(out.join(path).is_file(), "missing {path}");
    }

    fs::remove_dir_all(&out).unwrap();
}
