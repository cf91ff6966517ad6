//! Round-trip validator: every code point of the domain is looked up in the
//! parsed table and compared with the oracle.

use anyhow::Result;
use unibitmap_codegen::BLOCK_SIZE;
use unibitmap_ucd::{PropertyOracle, PropertySelector};

use super::MAX_DETAILS;
use crate::parser::ParsedTable;
use crate::report::{ConformanceReport, TestResult};

/// Compares `parsed` with the oracle over `[0, domain_end)`.
///
/// Forced code points are checked separately: a forced bit the table does not
/// carry is reported as a warning, not a failure.
///
/// # Errors
///
/// Returns an error if an oracle query fails.
pub fn validate<O: PropertyOracle + ?Sized>(
    oracle: &O,
    selector: &PropertySelector,
    parsed: &ParsedTable,
    domain_end: u32,
    forced: &[u32],
) -> Result<ConformanceReport> {
    let mut report = ConformanceReport::new();

    let mut mismatches = 0usize;
    let mut details = Vec::new();
    for c in 0..domain_end {
        if c < BLOCK_SIZE && forced.contains(&c) {
            continue;
        }
        let expected = oracle.test_binary(c, selector)?;
        if parsed.lookup(c) != expected {
            mismatches += 1;
            if details.len() < MAX_DETAILS {
                details.push(format!("U+{c:04X}: oracle {expected}, table {}", !expected));
            }
        }
    }
    if mismatches == 0 {
        report.push(TestResult::pass(
            "table/round-trip",
            format!("{} lookups of {selector} agree with the oracle", domain_end),
        ));
    } else {
        report.push(TestResult::fail_with_details(
            "table/round-trip",
            format!("{mismatches} lookups of {selector} disagree with the oracle"),
            details,
        ));
    }

    if !forced.is_empty() {
        let dropped: Vec<String> = forced
            .iter()
            .filter(|&&c| c < BLOCK_SIZE && !parsed.lookup(c))
            .map(|c| format!("U+{c:04X}"))
            .collect();
        if dropped.is_empty() {
            report.push(TestResult::pass(
                "table/forced",
                "all forced code points are set in the table",
            ));
        } else {
            report.push(TestResult::warn_with_details(
                "table/forced",
                "forced code points are not carried because block 0 is not mixed",
                dropped,
            ));
        }
    }

    Ok(report)
}
