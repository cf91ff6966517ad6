//! `unibitmap-conformance` validates generated tables against the UCD.
//!
//! Compiles the requested property, parses the emitted C text back and checks
//! every code point of the domain against the oracle it was compiled from.
//!
//! **Usage:**
//! ```text
//! unibitmap-conformance --ucd <ucd.xml> [PROPERTY] [--packing byte|word]
//!                       [--layout terminated|unterminated] [--tests]
//!                       [--report <file.json>]
//! ```
//!
//! Exits non-zero if any conformance check fails.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use unibitmap_clients::{load_oracle, CompileArgs};
use unibitmap_codegen::emit::write_file;
use unibitmap_conformance::{run_all, Severity};

/// Run the unibitmap conformance suite.
#[derive(Parser)]
#[command(
    name = "unibitmap-conformance",
    about = "Validate generated Unicode tables against the UCD"
)]
struct Args {
    #[command(flatten)]
    compile: CompileArgs,

    /// Write the report as JSON here.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let (ucd, options) = args.compile.resolve()?;
    let oracle = load_oracle(&ucd)?;

    let report = run_all(&oracle, &options)?;

    println!("unibitmap Conformance Report: {}", options.property);
    println!("===========================");
    println!();

    for result in &report.results {
        let status = match result.severity {
            Severity::Pass => "PASS",
            Severity::Warning => "WARN",
            Severity::Failure => "FAIL",
        };
        println!("[{}] {}: {}", status, result.validator, result.message);
        for detail in &result.details {
            println!("       {}", detail);
        }
    }

    let passed = report.count(Severity::Pass);
    let warned = report.count(Severity::Warning);
    let failed = report.failure_count();
    println!();
    println!(
        "Summary: {} passed, {} warnings, {} failed",
        passed, warned, failed
    );

    if let Some(path) = &args.report {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        write_file(path, &json)?;
    }

    if failed > 0 {
        eprintln!("Conformance FAILED: {} check(s) did not pass.", failed);
        process::exit(1);
    }

    println!("Conformance PASSED.");
    Ok(())
}
