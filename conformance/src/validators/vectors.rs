//! Test vector checks: regeneration is deterministic and every vector agrees
//! with the emitted table.

use anyhow::Result;
use unibitmap_codegen::{Expected, TestVector, TransitionList, VectorGenerator, BLOCK_SIZE};
use unibitmap_ucd::{PropertyOracle, PropertySelector};

use super::MAX_DETAILS;
use crate::parser::ParsedTable;
use crate::report::{ConformanceReport, TestResult};

/// Checks binary property vectors against `parsed`. Forced code points are
/// skipped since the oracle does not know about them.
///
/// # Errors
///
/// Returns an error if an oracle query fails.
pub fn validate_binary<O: PropertyOracle + ?Sized>(
    oracle: &O,
    selector: &PropertySelector,
    parsed: &ParsedTable,
    domain_end: u32,
    forced: &[u32],
) -> Result<ConformanceReport> {
    let generate = || -> Result<Vec<TestVector>> {
        Ok(VectorGenerator::binary(oracle, selector)
            .domain_end(domain_end)
            .collect::<Result<_, _>>()?)
    };
    let first = generate()?;
    let second = generate()?;
    let mut report = determinism(&first, &second);
    report.extend(agreement(&first, |v| match v.expected {
        Expected::Flag(flag) => {
            (v.codepoint < BLOCK_SIZE && forced.contains(&v.codepoint))
                || parsed.lookup(v.codepoint) == flag
        }
        Expected::Width(_) => false,
    }));
    Ok(report)
}

/// Checks width vectors against the transition list.
///
/// # Errors
///
/// Returns an error if an oracle query fails.
pub fn validate_widths<O: PropertyOracle + ?Sized>(
    oracle: &O,
    list: &TransitionList,
    domain_end: u32,
) -> Result<ConformanceReport> {
    let generate = || -> Result<Vec<TestVector>> {
        Ok(VectorGenerator::widths(oracle)
            .domain_end(domain_end)
            .collect::<Result<_, _>>()?)
    };
    let first = generate()?;
    let second = generate()?;
    let mut report = determinism(&first, &second);
    report.extend(agreement(&first, |v| match v.expected {
        Expected::Width(w) => (w == 2) == list.is_wide(v.codepoint),
        Expected::Flag(_) => false,
    }));
    Ok(report)
}

fn determinism(first: &[TestVector], second: &[TestVector]) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    if first == second {
        report.push(TestResult::pass(
            "vectors/determinism",
            format!("{} vectors regenerated identically", first.len()),
        ));
    } else {
        report.push(TestResult::fail(
            "vectors/determinism",
            "regenerating the vectors produced a different sequence",
        ));
    }
    if first.is_empty() {
        report.push(TestResult::warn(
            "vectors/coverage",
            "no vectors were sampled; the oracle names no blocks",
        ));
    }
    report
}

fn agreement(vectors: &[TestVector], holds: impl Fn(&TestVector) -> bool) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    let failing: Vec<&TestVector> = vectors.iter().filter(|v| !holds(v)).collect();
    if failing.is_empty() {
        report.push(TestResult::pass(
            "vectors/table",
            format!("{} vectors agree with the table", vectors.len()),
        ));
    } else {
        report.push(TestResult::fail_with_details(
            "vectors/table",
            format!("{} vectors disagree with the table", failing.len()),
            failing
                .iter()
                .take(MAX_DETAILS)
                .map(|v| format!("U+{:04X} {}: expected {:?}", v.codepoint, v.name, v.expected))
                .collect(),
        ));
    }
    report
}
