//! Synthetic property oracles for tests.
//!
//! [`ToyOracle`] answers every query from a handful of ranges so the compiler
//! and conformance crates can be tested without a UCD file, with results that
//! do not depend on any Unicode version.
//!
//! ```
//! use unibitmap_test_helpers::ToyOracle;
//! use unibitmap_ucd::PropertyOracle;
//!
//! let toy = ToyOracle::new().set(512..600);
//! let sel = toy.resolve("TOY").unwrap();
//! assert!(toy.test_binary(512, &sel).unwrap());
//! assert!(!toy.test_binary(600, &sel).unwrap());
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::ops::Range;

use unibitmap_ucd::{OracleError, PropertyOracle, PropertySelector, WidthClass};

/// A deterministic oracle defined by ranges.
#[derive(Debug, Clone)]
pub struct ToyOracle {
    property: String,
    set: Vec<Range<u32>>,
    widths: Vec<(Range<u32>, WidthClass)>,
    default_width: WidthClass,
    blocks: Vec<(Range<u32>, String)>,
    unassigned: Vec<Range<u32>>,
    fail_at: Option<u32>,
}

impl Default for ToyOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl ToyOracle {
    /// An oracle with one empty binary property named `TOY` and every code
    /// point `NARROW`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            property: "TOY".to_string(),
            set: Vec::new(),
            widths: Vec::new(),
            default_width: WidthClass::Narrow,
            blocks: Vec::new(),
            unassigned: Vec::new(),
            fail_at: None,
        }
    }

    /// Renames the binary property.
    #[must_use]
    pub fn property(mut self, name: &str) -> Self {
        self.property = name.to_string();
        self
    }

    /// Marks `range` as having the property.
    #[must_use]
    pub fn set(mut self, range: Range<u32>) -> Self {
        self.set.push(range);
        self
    }

    /// Assigns `class` to `range`. Later assignments win.
    #[must_use]
    pub fn width(mut self, range: Range<u32>, class: WidthClass) -> Self {
        self.widths.push((range, class));
        self
    }

    /// Width class of code points not covered by [`ToyOracle::width`].
    #[must_use]
    pub fn default_width(mut self, class: WidthClass) -> Self {
        self.default_width = class;
        self
    }

    /// Declares a named block. Code points inside get `TOY CHARACTER-XXXX` names.
    #[must_use]
    pub fn block(mut self, range: Range<u32>, name: &str) -> Self {
        self.blocks.push((range, name.to_string()));
        self
    }

    /// Marks `range` as unassigned: names become `<unassigned-XXXX>`.
    #[must_use]
    pub fn unassigned(mut self, range: Range<u32>) -> Self {
        self.unassigned.push(range);
        self
    }

    /// Makes every query for `codepoint` fail.
    #[must_use]
    pub fn fail_at(mut self, codepoint: u32) -> Self {
        self.fail_at = Some(codepoint);
        self
    }

    fn check(&self, codepoint: u32) -> Result<(), OracleError> {
        if self.fail_at == Some(codepoint) {
            return Err(OracleError::QueryFailure {
                codepoint,
                reason: "toy oracle failure".to_string(),
            });
        }
        Ok(())
    }
}

impl PropertyOracle for ToyOracle {
    fn description(&self) -> &str {
        "a synthetic toy oracle"
    }

    fn resolve(&self, name: &str) -> Result<PropertySelector, OracleError> {
        if name.eq_ignore_ascii_case(&self.property) {
            Ok(PropertySelector::new(self.property.clone(), 0))
        } else {
            Err(OracleError::UnknownProperty {
                name: name.to_string(),
            })
        }
    }

    fn test_binary(&self, codepoint: u32, _selector: &PropertySelector) -> Result<bool, OracleError> {
        self.check(codepoint)?;
        Ok(self.set.iter().any(|r| r.contains(&codepoint)))
    }

    fn width_class(&self, codepoint: u32) -> Result<WidthClass, OracleError> {
        self.check(codepoint)?;
        Ok(self
            .widths
            .iter()
            .rev()
            .find(|(r, _)| r.contains(&codepoint))
            .map_or(self.default_width, |(_, class)| *class))
    }

    fn block_name(&self, codepoint: u32) -> Option<&str> {
        self.blocks
            .iter()
            .find(|(r, _)| r.contains(&codepoint))
            .map(|(_, name)| name.as_str())
    }

    fn extended_name(&self, codepoint: u32) -> Option<String> {
        if self.unassigned.iter().any(|r| r.contains(&codepoint)) {
            return Some(format!("<unassigned-{codepoint:04X}>"));
        }
        self.block_name(codepoint)
            .map(|_| format!("TOY CHARACTER-{codepoint:04X}"))
    }
}
