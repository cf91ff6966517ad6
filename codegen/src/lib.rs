//! unibitmap table compiler.
//!
//! Queries a [`PropertyOracle`] once per code point and compiles the answers
//! into compact C tables: a deduplicated two-level bitmap for binary
//! properties, or a transition list for East Asian Width. Optionally appends
//! Seed7 regression checks sampled at named Unicode block boundaries.
//!
//! # Pipeline
//!
//! - [`blocks::BlockBitmapBuilder`] scans and classifies 512-code-point blocks
//! - [`index::encode`] turns the classification into the signed block index
//! - [`emit::TableSerializer`] renders data and index arrays
//! - [`transitions::TransitionCompressor`] reduces width to flip points
//! - [`vectors::VectorGenerator`] samples test vectors

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod blocks;
pub mod emit;
pub mod error;
pub mod index;
pub mod transitions;
pub mod vectors;

use serde::Serialize;
use unibitmap_ucd::{resolve_or_default, PropertyOracle, PropertySelector, CODEPOINT_END};

pub use blocks::{BlockBitmapBuilder, BlockClass, BlockTable, DedupData, BLOCK_SIZE};
pub use emit::{IndexLayout, Packing, SerializeOptions, TableSerializer};
pub use error::CodegenError;
pub use index::{IndexArray, IndexEntry};
pub use transitions::{TransitionCompressor, TransitionList};
pub use vectors::{Expected, TestVector, VectorGenerator};

/// Property name selecting the East Asian Width transition list.
pub const WIDTH_PROPERTY: &str = "EastAsianWidth";

/// Property compiled when none is given or the requested one is unknown.
pub const DEFAULT_PROPERTY: &str = "ALPHABETIC";

/// Symbol of the emitted transition array.
pub const WIDTH_SYMBOL: &str = "east_asian_width";

/// A scanned, encoded binary property.
#[derive(Debug, Clone)]
pub struct CompiledTable {
    /// The property that was scanned.
    pub selector: PropertySelector,
    /// Per-block classification.
    pub table: BlockTable,
    /// Bits of the mixed blocks, by dedup position.
    pub data: DedupData,
    /// The block index.
    pub index: IndexArray,
}

impl CompiledTable {
    /// Scans `selector` with `builder` and encodes the index.
    ///
    /// # Errors
    ///
    /// Propagates the builder's [`CodegenError`].
    pub fn compile<O: PropertyOracle + Sync>(
        oracle: &O,
        selector: PropertySelector,
        builder: &BlockBitmapBuilder,
    ) -> Result<Self, CodegenError> {
        let (table, data) = builder.build(oracle, &selector)?;
        let index = index::encode(&table);
        Ok(Self {
            selector,
            table,
            data,
            index,
        })
    }

    /// Two-level lookup through the index and dedup data.
    #[must_use]
    pub fn lookup(&self, codepoint: u32) -> bool {
        self.index.lookup(&self.data, codepoint)
    }
}

/// What to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Binary property name, or [`WIDTH_PROPERTY`].
    pub property: String,
    /// Data array element width.
    pub packing: Packing,
    /// Index array termination.
    pub layout: IndexLayout,
    /// Append Seed7 check procedures.
    pub tests: bool,
    /// Code points OR-ed into block 0 after the scan.
    pub forced: Vec<u32>,
    /// Exclusive end of the scanned domain.
    pub domain_end: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            property: DEFAULT_PROPERTY.to_string(),
            packing: Packing::default(),
            layout: IndexLayout::default(),
            tests: false,
            forced: Vec::new(),
            domain_end: CODEPOINT_END,
        }
    }
}

impl GenerateOptions {
    /// Whether the width transition list was requested.
    #[must_use]
    pub fn is_width(&self) -> bool {
        self.property.eq_ignore_ascii_case(WIDTH_PROPERTY)
    }
}

/// Summary of one generation run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Property actually compiled, after any fallback.
    pub property: String,
    /// Blocks scanned.
    pub blocks: usize,
    /// Last non-empty block, `-1` if none.
    pub last_non_empty: i64,
    /// Distinct mixed blocks stored.
    pub mixed_blocks: usize,
    /// Index array entries before any terminator.
    pub index_entries: usize,
    /// Transition boundaries (width only).
    pub transitions: usize,
    /// Test vectors emitted.
    pub vectors: usize,
}

/// Compiles the requested property and renders it as C text.
///
/// An unknown binary property falls back to [`DEFAULT_PROPERTY`] with a warning.
///
/// # Errors
///
/// Returns [`CodegenError`] if the fallback property is unknown too, the domain
/// is invalid, or any oracle query fails. Nothing is returned on failure.
pub fn generate<O: PropertyOracle + Sync>(
    oracle: &O,
    options: &GenerateOptions,
) -> Result<(String, GenerationReport), CodegenError> {
    let mut report = GenerationReport {
        last_non_empty: -1,
        ..GenerationReport::default()
    };

    let text = if options.is_width() {
        let list = TransitionCompressor::new()
            .domain_end(options.domain_end)
            .compress(oracle)?;
        report.property = WIDTH_PROPERTY.to_string();
        report.transitions = list.len();

        let mut text = width_header(oracle.description());
        text.push_str(&list.to_c_array(WIDTH_SYMBOL));
        if options.tests {
            let vectors: Vec<TestVector> = VectorGenerator::widths(oracle)
                .domain_end(options.domain_end)
                .collect::<Result<_, _>>()?;
            report.vectors = vectors.len();
            text.push('\n');
            text.push_str(&vectors::render_width_checks(
                vectors.into_iter().map(Ok),
            )?);
        }
        text
    } else {
        let selector = resolve_or_default(oracle, &options.property, DEFAULT_PROPERTY)?;
        let builder = BlockBitmapBuilder::new()
            .domain_end(options.domain_end)
            .force(options.forced.iter().copied());
        let compiled = CompiledTable::compile(oracle, selector, &builder)?;
        report.property = compiled.selector.name().to_string();
        report.blocks = compiled.table.blocks().len();
        report.last_non_empty = compiled.table.last_non_empty_index();
        report.mixed_blocks = compiled.table.mixed_count();
        report.index_entries = compiled.index.len();

        let serializer = TableSerializer::new(
            oracle.description(),
            compiled.selector.clone(),
            SerializeOptions {
                packing: options.packing,
                layout: options.layout,
            },
        );
        let mut text = serializer.serialize(&compiled.table, &compiled.data, &compiled.index);
        if options.tests {
            let vectors: Vec<TestVector> = VectorGenerator::binary(oracle, &compiled.selector)
                .domain_end(options.domain_end)
                .collect::<Result<_, _>>()?;
            report.vectors = vectors.len();
            text.push('\n');
            text.push_str(&vectors::render_binary_checks(
                &compiled.selector.display_name(),
                vectors.into_iter().map(Ok),
            )?);
        }
        text
    };

    log::info!(
        "generated {}: {} mixed blocks, {} transitions, {} vectors",
        report.property,
        report.mixed_blocks,
        report.transitions,
        report.vectors
    );
    Ok((text, report))
}

fn width_header(source: &str) -> String {
    let source = format!("This data is generated from {source}");
    emit::SourceFile::new(&[
        &source,
        "by testing each code point for the EAST_ASIAN_WIDTH property",
    ])
    .finish()
}
