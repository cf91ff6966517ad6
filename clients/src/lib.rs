//! Command-line plumbing shared by the unibitmap binaries.
//!
//! Both binaries accept the same compilation flags ([`CompileArgs`]). Any flag
//! may instead come from a TOML file ([`GenerateConfig`]); a flag given on the
//! command line wins over the file.
//!
//! ```toml
//! ucd = "ucd.nounihan.grouped.xml"
//! property = "WHITE_SPACE"
//! packing = "word"
//! layout = "unterminated"
//! tests = true
//! forced = [0x5F]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Deserialize;
use unibitmap_codegen::{GenerateOptions, IndexLayout, Packing};
use unibitmap_ucd::UcdXmlOracle;

/// Flags selecting what to compile.
#[derive(Args, Debug, Default)]
pub struct CompileArgs {
    /// Path to a UCD XML file (e.g. ucd.nounihan.grouped.xml).
    #[arg(long)]
    pub ucd: Option<PathBuf>,

    /// Binary property to compile, or EastAsianWidth (default: ALPHABETIC).
    pub property: Option<String>,

    /// Data array element width.
    #[arg(long, value_name = "byte|word")]
    pub packing: Option<Packing>,

    /// Index array termination.
    #[arg(long, value_name = "terminated|unterminated")]
    pub layout: Option<IndexLayout>,

    /// Append Seed7 check procedures.
    #[arg(long)]
    pub tests: bool,

    /// Hex code points to force into block 0 (e.g. 5F or U+005F). Repeat the
    /// flag or separate values with commas.
    #[arg(long, value_parser = parse_codepoint, value_delimiter = ',')]
    pub force: Vec<u32>,

    /// Exclusive end of the scanned domain, in hex.
    #[arg(long, value_parser = parse_codepoint)]
    pub domain_end: Option<u32>,

    /// TOML file with defaults for any of the above.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Contents of a `--config` file. Every field is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GenerateConfig {
    /// Path to the UCD XML file, relative to the working directory.
    pub ucd: Option<PathBuf>,
    /// Property name.
    pub property: Option<String>,
    /// Data array element width.
    pub packing: Option<Packing>,
    /// Index array termination.
    pub layout: Option<IndexLayout>,
    /// Append Seed7 check procedures.
    pub tests: Option<bool>,
    /// Code points forced into block 0.
    pub forced: Option<Vec<u32>>,
    /// Exclusive end of the scanned domain.
    pub domain_end: Option<u32>,
}

impl GenerateConfig {
    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid config.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

impl CompileArgs {
    /// Merges the flags over the config file, if any.
    ///
    /// Returns the UCD path and the generation options.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is unreadable or no UCD path is given.
    pub fn resolve(&self) -> Result<(PathBuf, GenerateOptions)> {
        let config = match &self.config {
            Some(path) => GenerateConfig::load(path)?,
            None => GenerateConfig::default(),
        };
        self.merge(config)
    }

    fn merge(&self, config: GenerateConfig) -> Result<(PathBuf, GenerateOptions)> {
        let Some(ucd) = self.ucd.clone().or(config.ucd) else {
            bail!("no UCD file given: pass --ucd or set `ucd` in the config file");
        };
        let defaults = GenerateOptions::default();
        let forced = if self.force.is_empty() {
            config.forced.unwrap_or_default()
        } else {
            self.force.clone()
        };
        let options = GenerateOptions {
            property: self
                .property
                .clone()
                .or(config.property)
                .unwrap_or(defaults.property),
            packing: self.packing.or(config.packing).unwrap_or(defaults.packing),
            layout: self.layout.or(config.layout).unwrap_or(defaults.layout),
            tests: self.tests || config.tests.unwrap_or(defaults.tests),
            forced,
            domain_end: self
                .domain_end
                .or(config.domain_end)
                .unwrap_or(defaults.domain_end),
        };
        Ok((ucd, options))
    }
}

/// Parses `5F`, `0x5F` or `U+005F`.
///
/// # Errors
///
/// Returns a message if `s` is not a hex number.
pub fn parse_codepoint(s: &str) -> Result<u32, String> {
    let digits = s
        .strip_prefix("U+")
        .or_else(|| s.strip_prefix("u+"))
        .or_else(|| s.strip_prefix("0x"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid code point \"{s}\": {e}"))
}

/// Loads the UCD XML oracle, logging its size.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_oracle(path: &Path) -> Result<UcdXmlOracle> {
    let oracle = UcdXmlOracle::from_path(path)
        .with_context(|| format!("Failed to load UCD data from {}", path.display()))?;
    log::info!("loaded {}", path.display());
    Ok(oracle)
}
