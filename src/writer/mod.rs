//! Flattens a finished [`DataPack`] into a datapack directory tree.
pub mod documents;
pub mod functions;

use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::processor::DataPack;

/// Values for `pack.mcmeta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackMeta {
    pub pack_format: u32,
    pub description: String,
}

impl Default for PackMeta {
    fn default() -> Self {
        Self {
            pack_format: 10,
            description: String::new(),
        }
    }
}

pub fn emit(pack: &DataPack, meta: &PackMeta, out_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Creating {}", out_dir.display()))?;

    let functions = functions::emit(pack, out_dir).with_context(|| "Writing function files")?;
    let documents =
        documents::emit(pack, meta, out_dir).with_context(|| "Writing JSON documents")?;
    info!(functions, documents, out = %out_dir.display(), "datapack written");
    Ok(())
}
