pub mod cli;
pub mod error;
pub mod logging;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use crate::processor::DataPack;

/// Loads and lowers one source text into a finished pack.
pub fn compile_source(source: &str, namespace: &str) -> error::Result<DataPack> {
    let statements = parser::load(source)?;
    processor::run(&statements, namespace)
}

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    logging::init(args.log_format, args.verbose).with_context(|| "Initialising logging")?;

    // 1. ── Parse ──────────────────────────────────────────────────────
    let source = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Reading {}", args.input.display()))?;
    let statements = parser::load(&source)
        .with_context(|| format!("Parsing {}", args.input.display()))?;
    info!(statements = statements.len(), namespace = %args.namespace, "parsed");

    // 2. ── Lower ──────────────────────────────────────────────────────
    let pack = processor::run(&statements, &args.namespace)
        .with_context(|| "Lowering statements")?;

    // 3. ── Write outputs ──────────────────────────────────────────────
    let meta = writer::PackMeta {
        pack_format: args.pack_format,
        description: args.description.clone(),
    };
    writer::emit(&pack, &meta, &args.output)
        .with_context(|| format!("Writing datapack to {}", args.output.display()))?;

    Ok(())
}
