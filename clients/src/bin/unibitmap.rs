//! `unibitmap` compiles one Unicode property into C lookup tables.
//!
//! Binary properties become a deduplicated two-level bitmap; `EastAsianWidth`
//! becomes a transition list. With `--tests`, Seed7 check procedures sampled
//! from named Unicode blocks are appended.
//!
//! **Usage:**
//! ```text
//! unibitmap --ucd <ucd.xml> [PROPERTY] [--packing byte|word]
//!           [--layout terminated|unterminated] [--tests]
//!           [--force <hex>...] [--out <file>] [--config <file.toml>]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use unibitmap_clients::{load_oracle, CompileArgs};
use unibitmap_codegen::emit::write_file;

/// Compile a Unicode property into C lookup tables.
#[derive(Parser)]
#[command(
    name = "unibitmap",
    about = "Compile a Unicode property into compact C lookup tables"
)]
struct Args {
    #[command(flatten)]
    compile: CompileArgs,

    /// Write the tables here instead of standard output.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write a JSON generation summary here.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let (ucd, options) = args.compile.resolve()?;
    let oracle = load_oracle(&ucd)?;

    let (text, report) = unibitmap_codegen::generate(&oracle, &options)
        .with_context(|| format!("Failed to compile {}", options.property))?;

    match &args.out {
        Some(path) => {
            write_file(path, &text)?;
            println!(
                "Compiled {}: {} blocks, {} mixed, {} transitions, {} vectors",
                report.property,
                report.blocks,
                report.mixed_blocks,
                report.transitions,
                report.vectors
            );
            println!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize generation report")?;
        write_file(path, &json)?;
    }

    Ok(())
}
