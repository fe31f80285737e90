//! Dump the JSON side of the pack: metadata, function tags, structured
//! documents and the item catalogue.

use super::PackMeta;
use super::functions::{LOAD_FUNCTION, TICK_FUNCTION};
use crate::processor::DataPack;
use crate::processor::datapack::PRIVATE_ROOT;
use anyhow::Result;
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::Path;

/// Returns the number of files written.
pub fn emit(pack: &DataPack, meta: &PackMeta, out_dir: &Path) -> Result<usize> {
    let ns = pack.namespace();
    write_json(
        &out_dir.join("pack.mcmeta"),
        &json!({
            "pack": {
                "pack_format": meta.pack_format,
                "description": meta.description,
            }
        }),
    )?;

    let tags = out_dir.join("data/minecraft/tags/functions");
    write_json(
        &tags.join("load.json"),
        &json!({ "values": [format!("{ns}:{LOAD_FUNCTION}")] }),
    )?;
    let mut written = 2;
    if !pack.tick().is_empty() {
        write_json(
            &tags.join("tick.json"),
            &json!({ "values": [format!("{ns}:{TICK_FUNCTION}")] }),
        )?;
        written += 1;
    }

    for ((category, name), document) in pack.documents() {
        let path = out_dir
            .join("data")
            .join(ns)
            .join(category)
            .join(PRIVATE_ROOT)
            .join(format!("{name}.json"));
        write_json(&path, document)?;
        written += 1;
    }

    if !pack.items().is_empty() {
        write_json(&out_dir.join("items.json"), pack.items())?;
        written += 1;
    }
    Ok(written)
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
