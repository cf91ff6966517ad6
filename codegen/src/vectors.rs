//! Regression test vectors sampled at named Unicode block boundaries.
//!
//! The domain is walked from U+0020 and split wherever the oracle's block
//! name changes. Every closed group contributes four evenly spaced samples;
//! a sample becomes a [`TestVector`] only if the oracle knows a name for it
//! that does not mark an unassigned code point.

use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;

use unibitmap_ucd::{PropertyOracle, PropertySelector, CODEPOINT_END};

use crate::error::CodegenError;

/// First code point considered for sampling; C0 controls are skipped.
pub const FIRST_SAMPLED: u32 = 0x20;

/// Samples per named block.
pub const SAMPLES_PER_BLOCK: u32 = 4;

/// Expected value recorded in a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// Binary property value.
    Flag(bool),
    /// Column width: 2 for wide, 1 otherwise.
    Width(u8),
}

/// One generated assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestVector {
    /// Sampled code point.
    pub codepoint: u32,
    /// Value the compiled table must produce.
    pub expected: Expected,
    /// Human-readable name, emitted as a comment.
    pub name: String,
}

#[derive(Debug, Clone)]
enum Query<'a> {
    Binary(&'a PropertySelector),
    Width,
}

/// Lazy, one-shot sequence of test vectors.
///
/// Stops after the first oracle failure, which it yields as an error.
pub struct VectorGenerator<'a, O: ?Sized> {
    oracle: &'a O,
    query: Query<'a>,
    cursor: u32,
    domain_end: u32,
    group: Option<(u32, Option<&'a str>)>,
    pending: VecDeque<u32>,
    failed: bool,
}

impl<'a, O: PropertyOracle + ?Sized> VectorGenerator<'a, O> {
    /// Vectors for the binary property `selector`.
    pub fn binary(oracle: &'a O, selector: &'a PropertySelector) -> Self {
        Self::with_query(oracle, Query::Binary(selector))
    }

    /// Vectors for East Asian Width column counts.
    pub fn widths(oracle: &'a O) -> Self {
        Self::with_query(oracle, Query::Width)
    }

    fn with_query(oracle: &'a O, query: Query<'a>) -> Self {
        Self {
            oracle,
            query,
            cursor: FIRST_SAMPLED,
            domain_end: CODEPOINT_END,
            group: None,
            pending: VecDeque::new(),
            failed: false,
        }
    }

    /// Restricts the walk to `[FIRST_SAMPLED, end)`.
    #[must_use]
    pub fn domain_end(mut self, end: u32) -> Self {
        self.domain_end = end;
        self
    }

    /// Advances the walk until a group closes and queues its samples.
    /// Returns `false` once the domain is exhausted.
    fn fill(&mut self) -> bool {
        while self.cursor < self.domain_end {
            let c = self.cursor;
            self.cursor += 1;
            let block = self.oracle.block_name(c);
            match self.group {
                Some((start, name)) if name != block => {
                    self.group = Some((c, block));
                    self.queue_samples(start, c);
                    return true;
                }
                Some(_) => {}
                None => self.group = Some((c, block)),
            }
        }
        if let Some((start, _)) = self.group.take() {
            self.queue_samples(start, self.domain_end);
            return true;
        }
        false
    }

    /// Queues the samples of `[start, end)`. Groups shorter than four code
    /// points yield each of their code points once.
    fn queue_samples(&mut self, start: u32, end: u32) {
        let incr = (end - start + 1) / SAMPLES_PER_BLOCK;
        let mut previous = None;
        for codepoint in (0..SAMPLES_PER_BLOCK)
            .map(|i| start + incr * i)
            .take_while(|&c| c < end)
        {
            if previous != Some(codepoint) {
                self.pending.push_back(codepoint);
                previous = Some(codepoint);
            }
        }
    }

    fn vector(&self, codepoint: u32) -> Result<Option<TestVector>, CodegenError> {
        let Some(name) = self.oracle.extended_name(codepoint) else {
            return Ok(None);
        };
        if name.contains("unassigned-") {
            return Ok(None);
        }
        let expected = match self.query {
            Query::Binary(selector) => {
                Expected::Flag(self.oracle.test_binary(codepoint, selector)?)
            }
            Query::Width => {
                let wide = self.oracle.width_class(codepoint)?.is_wide();
                Expected::Width(if wide { 2 } else { 1 })
            }
        };
        Ok(Some(TestVector {
            codepoint,
            expected,
            name,
        }))
    }
}

impl<O: PropertyOracle + ?Sized> Iterator for VectorGenerator<'_, O> {
    type Item = Result<TestVector, CodegenError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            while let Some(codepoint) = self.pending.pop_front() {
                match self.vector(codepoint) {
                    Ok(Some(v)) => return Some(Ok(v)),
                    Ok(None) => {}
                    Err(e) => {
                        self.failed = true;
                        return Some(Err(e));
                    }
                }
            }
            if !self.fill() {
                return None;
            }
        }
    }
}

/// Vectors for the binary property `selector` over the full domain.
pub fn generate<'a, O: PropertyOracle + ?Sized>(
    oracle: &'a O,
    selector: &'a PropertySelector,
) -> VectorGenerator<'a, O> {
    VectorGenerator::binary(oracle, selector)
}

/// Width vectors over the full domain.
pub fn generate_widths<O: PropertyOracle + ?Sized>(oracle: &O) -> VectorGenerator<'_, O> {
    VectorGenerator::widths(oracle)
}

/// Renders vectors as a Seed7 check procedure for `is<Name>`.
///
/// # Errors
///
/// Returns the first error produced by `vectors`.
pub fn render_binary_checks(
    display_name: &str,
    vectors: impl Iterator<Item = Result<TestVector, CodegenError>>,
) -> Result<String, CodegenError> {
    render_checks(&format!("is{display_name}"), vectors)
}

/// Renders width vectors as a Seed7 check procedure for `chr_width`.
///
/// # Errors
///
/// Returns the first error produced by `vectors`.
pub fn render_width_checks(
    vectors: impl Iterator<Item = Result<TestVector, CodegenError>>,
) -> Result<String, CodegenError> {
    render_checks("chr_width", vectors)
}

fn render_checks(
    func: &str,
    vectors: impl Iterator<Item = Result<TestVector, CodegenError>>,
) -> Result<String, CodegenError> {
    let mut buf = String::new();
    write_prologue(&mut buf, &format!("check_{func}"));
    for v in vectors {
        let v = v?;
        let expected = match v.expected {
            Expected::Flag(true) => "TRUE ".to_string(),
            Expected::Flag(false) => "FALSE".to_string(),
            Expected::Width(w) => w.to_string(),
        };
        write_check(&mut buf, func, &v, &expected);
    }
    write_epilogue(&mut buf, func);
    Ok(buf)
}

fn write_prologue(buf: &mut String, proc_name: &str) {
    let _ = write!(
        buf,
        "const proc: {proc_name} is func\n  local\n    var boolean: success is TRUE;\n  begin\n"
    );
}

fn write_check(buf: &mut String, func: &str, v: &TestVector, expected: &str) {
    let _ = writeln!(
        buf,
        "    if {func}('\\16#{cp:05x};') <> {expected} then writeln(\"{func}( #{cp:5x} ) incorrect\"); success := FALSE; end if; # {name}",
        cp = v.codepoint,
        name = v.name,
    );
}

fn write_epilogue(buf: &mut String, func: &str) {
    let _ = write!(
        buf,
        "    if success then\n      writeln(\"{func} function works correctly.\");\n    end if;\n  end func;\n\n\n"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use unibitmap_test_helpers::ToyOracle;
    use unibitmap_ucd::{OracleError, WidthClass};

    fn toy() -> ToyOracle {
        ToyOracle::new()
            .set(0x41..0x5B)
            .block(0x00..0x80, "ASCII")
            .block(0x80..0x100, "Latin 1 Sup")
            .block(0x300..0x370, "Combining Marks")
            .unassigned(0x340..0x350)
    }

    fn collect(toy: &ToyOracle, end: u32) -> Vec<TestVector> {
        let sel = toy.resolve("TOY").unwrap();
        generate(toy, &sel)
            .domain_end(end)
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn quartiles_of_each_named_block() {
        let vectors = collect(&toy(), 0x400);
        let cps: Vec<u32> = vectors.iter().map(|v| v.codepoint).collect();
        // ASCII group is [0x20, 0x80): incr = 0x61 / 4 = 24.
        // Latin 1 Sup is [0x80, 0x100): incr = 0x81 / 4 = 32.
        // Combining Marks is [0x300, 0x370): incr = 0x71 / 4 = 28, all outside the hole.
        // The nameless groups in between yield nothing.
        assert_eq!(
            cps,
            [0x20, 0x38, 0x50, 0x68, 0x80, 0xA0, 0xC0, 0xE0, 0x300, 0x31C, 0x338, 0x354]
        );
        assert_eq!(vectors[2].expected, Expected::Flag(true));
        assert_eq!(vectors[0].expected, Expected::Flag(false));
        assert_eq!(vectors[2].name, "TOY CHARACTER-0050");
    }

    #[test]
    fn unassigned_and_unnamed_samples_are_skipped() {
        let toy = ToyOracle::new()
            .block(0x20..0x60, "Toy Block")
            .unassigned(0x30..0x40);
        let vectors = collect(&toy, 0x100);
        let cps: Vec<u32> = vectors.iter().map(|v| v.codepoint).collect();
        // [0x20, 0x60): incr = 0x41 / 4 = 16 -> 0x20, 0x30 (unassigned), 0x40, 0x50.
        // The trailing nameless group [0x60, 0x100) yields nothing.
        assert_eq!(cps, [0x20, 0x40, 0x50]);
    }

    #[test]
    fn short_groups_stay_inside_their_range() {
        let toy = ToyOracle::new()
            .block(0x20..0x23, "Tiny")
            .block(0x23..0x40, "Next")
            .block(0x40..0x41, "Single");
        let vectors = collect(&toy, 0x60);
        let cps: Vec<u32> = vectors.iter().map(|v| v.codepoint).collect();
        // Tiny: incr = 1, the fourth sample would be 0x23 and belongs to Next.
        // Next is [0x23, 0x40): incr = 0x1E / 4 = 7.
        // Single: incr = 0, one sample.
        assert_eq!(cps, [0x20, 0x21, 0x22, 0x23, 0x2A, 0x31, 0x38, 0x40]);
    }

    #[test]
    fn final_group_never_samples_the_domain_end() {
        let toy = ToyOracle::new().block(0x20..0x100, "Tail");
        let vectors = collect(&toy, 0x23);
        let cps: Vec<u32> = vectors.iter().map(|v| v.codepoint).collect();
        assert_eq!(cps, [0x20, 0x21, 0x22]);
    }

    #[test]
    fn generation_is_deterministic() {
        let toy = toy();
        assert_eq!(collect(&toy, 0x400), collect(&toy, 0x400));
    }

    #[test]
    fn iterator_is_lazy_and_finite() {
        let toy = toy();
        let sel = toy.resolve("TOY").unwrap();
        let mut gen = VectorGenerator::binary(&toy, &sel).domain_end(0x400);
        let first = gen.next().unwrap().unwrap();
        assert_eq!(first.codepoint, 0x20);
        assert_eq!(gen.by_ref().count(), 11);
        assert!(gen.next().is_none());
    }

    #[test]
    fn width_vectors() {
        let toy = ToyOracle::new()
            .block(0x3000..0x3040, "CJK Symbols")
            .width(0x3000..0x3040, WidthClass::Wide);
        let vectors: Vec<TestVector> = generate_widths(&toy)
            .domain_end(0x3040)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(vectors.len(), 4);
        assert!(vectors.iter().all(|v| v.expected == Expected::Width(2)));
    }

    #[test]
    fn oracle_failure_stops_the_sequence() {
        let toy = toy().fail_at(0x50);
        let sel = toy.resolve("TOY").unwrap();
        let results: Vec<_> = VectorGenerator::binary(&toy, &sel).domain_end(0x400).collect();
        assert_eq!(results.len(), 3);
        assert!(matches!(
            results[2],
            Err(CodegenError::Oracle(OracleError::QueryFailure { codepoint: 0x50, .. }))
        ));
    }

    #[test]
    fn seed7_rendering() {
        let toy = toy();
        let sel = toy.resolve("TOY").unwrap();
        let text =
            render_binary_checks("Toy", VectorGenerator::binary(&toy, &sel).domain_end(0x80))
                .unwrap();
        assert!(text.starts_with(
            "const proc: check_isToy is func\n  local\n    var boolean: success is TRUE;\n  begin\n"
        ));
        assert!(text.contains(
            "    if isToy('\\16#00050;') <> TRUE  then writeln(\"isToy( #   50 ) incorrect\"); success := FALSE; end if; # TOY CHARACTER-0050\n"
        ));
        assert!(text.ends_with(
            "    if success then\n      writeln(\"isToy function works correctly.\");\n    end if;\n  end func;\n\n\n"
        ));
    }
}
