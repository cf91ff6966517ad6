//! Structural checks on the parsed index array.

use unibitmap_codegen::{IndexEntry, IndexLayout, BLOCK_SIZE};

use crate::parser::ParsedTable;
use crate::report::{ConformanceReport, TestResult};

/// Validates positions, the final entry, the terminator and the bound comment.
pub fn validate(parsed: &ParsedTable, layout: IndexLayout) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    let entries = parsed.index.entries();

    let positions: Vec<usize> = entries
        .iter()
        .filter_map(|e| match e {
            IndexEntry::Mixed(p) => Some(*p),
            _ => None,
        })
        .collect();
    let dense = positions.iter().enumerate().all(|(i, p)| i == *p);
    if dense && positions.len() == parsed.data.len() {
        report.push(TestResult::pass(
            "index/positions",
            format!("{} mixed blocks, positions 0..{}", positions.len(), positions.len()),
        ));
    } else {
        report.push(TestResult::fail(
            "index/positions",
            format!(
                "{} positions for {} data blocks, ascending without gaps: {dense}",
                positions.len(),
                parsed.data.len()
            ),
        ));
    }

    match entries.last() {
        Some(IndexEntry::Empty) => report.push(TestResult::fail(
            "index/last-entry",
            "index extends past the last non-empty block",
        )),
        _ => report.push(TestResult::pass(
            "index/last-entry",
            "index ends at the last non-empty block",
        )),
    }

    // An empty index is emitted as a lone terminator in either layout.
    let expected_terminated = layout == IndexLayout::Terminated || entries.is_empty();
    if parsed.terminated == expected_terminated {
        report.push(TestResult::pass(
            "index/layout",
            format!("{layout:?} layout"),
        ));
    } else {
        report.push(TestResult::fail(
            "index/layout",
            format!("expected {layout:?} layout, terminator present: {}", parsed.terminated),
        ));
    }

    let blocks = entries.len() as u32;
    let expected_bound = match layout {
        IndexLayout::Terminated => blocks * BLOCK_SIZE,
        IndexLayout::Unterminated => blocks.saturating_sub(1) * BLOCK_SIZE,
    };
    if parsed.bound == expected_bound {
        report.push(TestResult::pass(
            "index/bound",
            format!("bound 0x{expected_bound:06x}"),
        ));
    } else {
        report.push(TestResult::fail(
            "index/bound",
            format!(
                "bound comment says 0x{:06x}, index implies 0x{expected_bound:06x}",
                parsed.bound
            ),
        ));
    }

    report
}
