//! unibitmap conformance suite.
//!
//! Compiles a property with [`unibitmap_codegen::generate`], parses the emitted
//! text back, and checks the result against the same oracle over the whole
//! domain. A table conforms when every lookup through the parsed arrays agrees
//! with the oracle.
//!
//! # Checks
//!
//! | Validator | Checks |
//! |-----------|--------|
//! | `parser` | Emitted text is well formed |
//! | `table/*` | Full-domain round trip, forced code points |
//! | `index/*` | Dense positions, final entry, terminator, bound comment |
//! | `transitions/*` | Leading 0, ordering, parity round trip |
//! | `vectors/*` | Determinism, agreement with the emitted table |
//!
//! # Entry Point
//!
//! ```no_run
//! use unibitmap_codegen::GenerateOptions;
//! use unibitmap_conformance::run_all;
//! use unibitmap_ucd::UcdXmlOracle;
//!
//! let ucd = UcdXmlOracle::from_path("ucd.nounihan.grouped.xml".as_ref())?;
//! let report = run_all(&ucd, &GenerateOptions::default())?;
//! assert!(report.all_passed());
//! # Ok::<(), anyhow::Error>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod parser;
pub mod report;
pub mod validators;

use anyhow::{Context, Result};
use unibitmap_codegen::{generate, GenerateOptions, DEFAULT_PROPERTY};
use unibitmap_ucd::{resolve_or_default, PropertyOracle};

pub use parser::{parse_table, parse_transitions, ParseError, ParsedTable};
pub use report::{ConformanceReport, Severity, TestResult};

/// Generates the requested table and runs every applicable validator.
///
/// Validators are run in this order:
/// 1. Parse the emitted text
/// 2. Full-domain round trip (bitmap or transition list)
/// 3. Index structure (bitmap only)
/// 4. Test vectors, when `options.tests` is set
///
/// # Errors
///
/// Returns an error if generation fails or an oracle query fails during
/// validation. Malformed output is reported as a failure, not an error.
pub fn run_all<O: PropertyOracle + Sync>(
    oracle: &O,
    options: &GenerateOptions,
) -> Result<ConformanceReport> {
    let mut report = ConformanceReport::new();
    let (text, summary) = generate(oracle, options)
        .with_context(|| format!("Failed to generate {}", options.property))?;
    log::info!("validating {} ({} bytes of output)", summary.property, text.len());

    if options.is_width() {
        let list = match parse_transitions(&text) {
            Ok(list) => list,
            Err(e) => {
                report.push(TestResult::fail("parser", e.to_string()));
                return Ok(report);
            }
        };
        report.push(TestResult::pass(
            "parser",
            format!("{} transition boundaries", list.len()),
        ));
        report.extend(validators::transitions::validate(
            oracle,
            &list,
            options.domain_end,
        )?);
        if options.tests {
            report.extend(validators::vectors::validate_widths(
                oracle,
                &list,
                options.domain_end,
            )?);
        }
        return Ok(report);
    }

    let selector = resolve_or_default(oracle, &options.property, DEFAULT_PROPERTY)?;
    let parsed = match parse_table(&text) {
        Ok(parsed) => parsed,
        Err(e) => {
            report.push(TestResult::fail("parser", e.to_string()));
            return Ok(report);
        }
    };
    report.push(TestResult::pass(
        "parser",
        format!(
            "{}: {} index entries, {} data blocks",
            parsed.symbol,
            parsed.index.len(),
            parsed.data.len()
        ),
    ));
    report.extend(validators::table::validate(
        oracle,
        &selector,
        &parsed,
        options.domain_end,
        &options.forced,
    )?);
    report.extend(validators::index::validate(&parsed, options.layout));
    if options.tests {
        report.extend(validators::vectors::validate_binary(
            oracle,
            &selector,
            &parsed,
            options.domain_end,
            &options.forced,
        )?);
    }
    Ok(report)
}

#[cfg(test)]
mod tests_unit {
    use super::*;
    use unibitmap_codegen::{IndexLayout, Packing};
    use unibitmap_test_helpers::ToyOracle;
    use unibitmap_ucd::WidthClass;

    fn toy() -> ToyOracle {
        ToyOracle::new()
            .property("ALPHABETIC")
            .set(0x41..0x5B)
            .set(0x61..0x7B)
            .set(0xC0..0x250)
            .set(0x400..0x600)
            .block(0x00..0x80, "Basic Latin")
            .block(0x80..0x100, "Latin-1 Supplement")
            .width(0x1100..0x1160, WidthClass::Wide)
    }

    fn options() -> GenerateOptions {
        GenerateOptions {
            tests: true,
            domain_end: 0x2000,
            ..GenerateOptions::default()
        }
    }

    #[test]
    fn every_packing_and_layout_conforms() {
        for packing in [Packing::Byte, Packing::Word] {
            for layout in [IndexLayout::Terminated, IndexLayout::Unterminated] {
                let opts = GenerateOptions {
                    packing,
                    layout,
                    ..options()
                };
                let report = run_all(&toy(), &opts).unwrap();
                let failures: Vec<_> = report.results.iter().filter(|r| r.is_failure()).collect();
                assert!(failures.is_empty(), "{packing:?}/{layout:?}: {failures:#?}");
            }
        }
    }

    #[test]
    fn width_conforms() {
        let opts = GenerateOptions {
            property: "EastAsianWidth".to_string(),
            ..options()
        };
        let report = run_all(&toy(), &opts).unwrap();
        assert!(report.all_passed(), "{:#?}", report.results);
        assert_eq!(report.results[0].validator, "parser");
    }

    #[test]
    fn oracle_failure_is_an_error() {
        let toy = toy().fail_at(0x1234);
        assert!(run_all(&toy, &options()).is_err());
    }
}
