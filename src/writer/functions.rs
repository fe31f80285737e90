//! Emit `.mcfunction` files: the load and tick entry points plus one file
//! per private block.

use crate::processor::DataPack;
use crate::processor::datapack::{PRIVATE_ROOT, VARIABLE_OBJECTIVE};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const LOAD_FUNCTION: &str = "__load__";
pub const TICK_FUNCTION: &str = "__tick__";

pub fn functions_dir(out_dir: &Path, namespace: &str) -> PathBuf {
    out_dir.join("data").join(namespace).join("functions")
}

/// Returns the number of files written.
pub fn emit(pack: &DataPack, out_dir: &Path) -> io::Result<usize> {
    let dir = functions_dir(out_dir, pack.namespace());
    fs::create_dir_all(&dir)?;

    // 1. load: objectives first so every later line can use them
    let mut load = File::create(dir.join(format!("{LOAD_FUNCTION}.mcfunction")))?;
    if !pack.objectives().contains_key(VARIABLE_OBJECTIVE) {
        writeln!(load, "scoreboard objectives add {VARIABLE_OBJECTIVE} dummy")?;
    }
    for (name, criteria) in pack.objectives() {
        writeln!(load, "scoreboard objectives add {name} {criteria}")?;
    }
    write_lines(&mut load, pack.load())?;
    let mut written = 1;

    // 2. tick
    if !pack.tick().is_empty() {
        let mut tick = File::create(dir.join(format!("{TICK_FUNCTION}.mcfunction")))?;
        write_lines(&mut tick, pack.tick())?;
        written += 1;
    }

    // 3. private blocks
    for (key, lines) in pack.blocks() {
        let feature_dir = dir.join(PRIVATE_ROOT).join(&key.feature);
        fs::create_dir_all(&feature_dir)?;
        let mut file = File::create(feature_dir.join(format!("{}.mcfunction", key.id)))?;
        write_lines(&mut file, lines)?;
        written += 1;
    }
    Ok(written)
}

fn write_lines(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
