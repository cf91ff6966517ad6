//! East Asian Width transition lists.
//!
//! Width is reduced to a wide/narrow flag and stored as the sorted list of code
//! points where the flag flips. The list starts with `0`; the entry at an even
//! position opens a narrow run and the entry at an odd position a wide run.

use std::fmt::Write as FmtWrite;

use unibitmap_ucd::{PropertyOracle, WidthClass, CODEPOINT_END};

use crate::error::CodegenError;

/// Boundaries where the wide flag flips, first entry `0`.
///
/// Strictly increasing, except that a wide code point 0 yields a leading
/// `[0, 0]` pair (an empty narrow run), which keeps the parity rule intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionList {
    boundaries: Vec<u32>,
}

impl TransitionList {
    /// Wraps already computed boundaries.
    #[must_use]
    pub fn from_boundaries(boundaries: Vec<u32>) -> Self {
        Self { boundaries }
    }

    /// The boundaries in ascending order.
    #[must_use]
    pub fn boundaries(&self) -> &[u32] {
        &self.boundaries
    }

    /// Number of boundaries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    /// Whether the list is empty (never true for a compressed list).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Reconstructs the wide flag at `codepoint` from the parity of the
    /// greatest boundary not above it.
    #[must_use]
    pub fn is_wide(&self, codepoint: u32) -> bool {
        let covering = self.boundaries.partition_point(|&b| b <= codepoint);
        covering > 0 && (covering - 1) % 2 == 1
    }

    /// Renders the list as a C array of hex code points.
    #[must_use]
    pub fn to_c_array(&self, symbol: &str) -> String {
        let cells: Vec<String> = self
            .boundaries
            .iter()
            .map(|b| format!("0x{b:06x}"))
            .collect();
        let mut buf = String::new();
        let _ = writeln!(
            buf,
            "int {symbol}[{}] = {{{}}};",
            self.boundaries.len(),
            cells.join(",")
        );
        buf
    }
}

/// Scans width classes over the domain.
#[derive(Debug, Clone)]
pub struct TransitionCompressor {
    domain_end: u32,
}

impl Default for TransitionCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionCompressor {
    /// A compressor over the full `[0, CODEPOINT_END)` domain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            domain_end: CODEPOINT_END,
        }
    }

    /// Restricts the scan to `[0, end)`.
    #[must_use]
    pub fn domain_end(mut self, end: u32) -> Self {
        self.domain_end = end;
        self
    }

    /// Scans every code point in ascending order.
    ///
    /// `Ambiguous` counts as `Neutral` when deciding whether the class changed;
    /// the wide flag itself comes from the unreduced class.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::InvalidDomain`] for an empty or oversized domain
    /// and [`CodegenError::Oracle`] if any oracle query fails.
    pub fn compress<O: PropertyOracle>(&self, oracle: &O) -> Result<TransitionList, CodegenError> {
        if self.domain_end == 0 || self.domain_end > CODEPOINT_END {
            return Err(CodegenError::InvalidDomain {
                end: self.domain_end,
            });
        }
        let mut boundaries = vec![0];
        let mut wide = false;
        let mut last = WidthClass::Neutral;
        for c in 0..self.domain_end {
            let class = oracle.width_class(c)?;
            let reduced = class.reduced();
            if reduced == last {
                continue;
            }
            log::debug!("0x{c:06x} : EAST_ASIAN_WIDTH changed from {last} to {reduced}");
            last = reduced;
            if class.is_wide() != wide {
                boundaries.push(c);
                wide = !wide;
            }
        }
        log::info!("EAST_ASIAN_WIDTH: {} transitions", boundaries.len());
        Ok(TransitionList { boundaries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unibitmap_test_helpers::ToyOracle;
    use unibitmap_ucd::OracleError;

    fn compress(toy: &ToyOracle, end: u32) -> TransitionList {
        TransitionCompressor::new().domain_end(end).compress(toy).unwrap()
    }

    #[test]
    fn toy_scenario_single_wide_run() {
        let toy = ToyOracle::new().width(0x3000..0x3100, WidthClass::Wide);
        let list = compress(&toy, 0x10000);
        assert_eq!(list.boundaries(), [0, 0x3000, 0x3100]);
        assert!(!list.is_wide(0x2FFF));
        assert!(list.is_wide(0x3000));
        assert!(list.is_wide(0x30FF));
        assert!(!list.is_wide(0x3100));
    }

    #[test]
    fn adjacent_wide_classes_do_not_flip() {
        let toy = ToyOracle::new()
            .width(0x1100..0x1160, WidthClass::Wide)
            .width(0x1160..0x1200, WidthClass::Fullwidth);
        let list = compress(&toy, 0x2000);
        assert_eq!(list.boundaries(), [0, 0x1100, 0x1200]);
    }

    #[test]
    fn ambiguous_is_narrow() {
        let toy = ToyOracle::new()
            .default_width(WidthClass::Neutral)
            .width(0x00A1..0x00A2, WidthClass::Ambiguous)
            .width(0x2E80..0x2E90, WidthClass::Wide)
            .width(0x2E90..0x2E91, WidthClass::Ambiguous)
            .width(0x2E91..0x2EA0, WidthClass::Halfwidth);
        let list = compress(&toy, 0x4000);
        assert_eq!(list.boundaries(), [0, 0x2E80, 0x2E90]);
        assert!(!list.is_wide(0x00A1));
        assert!(!list.is_wide(0x2E90));
    }

    #[test]
    fn wide_code_point_zero_keeps_parity() {
        let toy = ToyOracle::new().width(0..0x10, WidthClass::Wide);
        let list = compress(&toy, 0x100);
        assert_eq!(list.boundaries(), [0, 0, 0x10]);
        assert!(list.is_wide(0));
        assert!(list.is_wide(0xF));
        assert!(!list.is_wide(0x10));
    }

    #[test]
    fn reconstruction_matches_oracle() {
        let toy = ToyOracle::new()
            .width(0x1100..0x1160, WidthClass::Wide)
            .width(0x2329..0x232B, WidthClass::Wide)
            .width(0x2E80..0x303F, WidthClass::Wide)
            .width(0x3000..0x3001, WidthClass::Fullwidth)
            .width(0xFF61..0xFFDD, WidthClass::Halfwidth);
        let list = compress(&toy, 0x20000);
        assert!(list.boundaries().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(list.len() % 2, 1);
        for c in 0..0x20000 {
            assert_eq!(list.is_wide(c), toy.width_class(c).unwrap().is_wide(), "U+{c:04X}");
        }
    }

    #[test]
    fn c_array_format() {
        let list = TransitionList::from_boundaries(vec![0, 0x1100, 0x1160]);
        assert_eq!(
            list.to_c_array("east_asian_width"),
            "int east_asian_width[3] = {0x000000,0x001100,0x001160};\n"
        );
    }

    #[test]
    fn oracle_failure_aborts() {
        let toy = ToyOracle::new().fail_at(0x42);
        let result = TransitionCompressor::new().domain_end(0x100).compress(&toy);
        assert!(matches!(
            result,
            Err(CodegenError::Oracle(OracleError::QueryFailure { codepoint: 0x42, .. }))
        ));
    }
}
