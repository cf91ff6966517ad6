//! Width transition list checks.

use anyhow::Result;
use unibitmap_codegen::TransitionList;
use unibitmap_ucd::PropertyOracle;

use super::MAX_DETAILS;
use crate::report::{ConformanceReport, TestResult};

/// Validates ordering, the leading `0` and parity reconstruction over
/// `[0, domain_end)`.
///
/// # Errors
///
/// Returns an error if an oracle query fails.
pub fn validate<O: PropertyOracle + ?Sized>(
    oracle: &O,
    list: &TransitionList,
    domain_end: u32,
) -> Result<ConformanceReport> {
    let mut report = ConformanceReport::new();
    let boundaries = list.boundaries();

    if boundaries.first() == Some(&0) {
        report.push(TestResult::pass("transitions/start", "list starts at 0"));
    } else {
        report.push(TestResult::fail("transitions/start", "list does not start at 0"));
    }

    // A wide code point 0 produces the leading [0, 0] pair.
    let tail = match boundaries {
        [0, 0, ..] => &boundaries[1..],
        _ => boundaries,
    };
    if tail.windows(2).all(|w| w[0] < w[1]) {
        report.push(TestResult::pass(
            "transitions/order",
            format!("{} boundaries strictly increasing", boundaries.len()),
        ));
    } else {
        report.push(TestResult::fail(
            "transitions/order",
            "boundaries are not strictly increasing",
        ));
    }

    let mut mismatches = 0usize;
    let mut details = Vec::new();
    for c in 0..domain_end {
        let class = oracle.width_class(c)?;
        if list.is_wide(c) != class.is_wide() {
            mismatches += 1;
            if details.len() < MAX_DETAILS {
                details.push(format!("U+{c:04X}: oracle {class}"));
            }
        }
    }
    if mismatches == 0 {
        report.push(TestResult::pass(
            "transitions/round-trip",
            format!("{domain_end} widths agree with the oracle"),
        ));
    } else {
        report.push(TestResult::fail_with_details(
            "transitions/round-trip",
            format!("{mismatches} widths disagree with the oracle"),
            details,
        ));
    }

    Ok(report)
}
