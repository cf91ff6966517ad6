//! Unicode property oracle for unibitmap.
//!
//! The `unibitmap-ucd` crate defines the [`PropertyOracle`] capability that the
//! table compiler consumes, the value types it answers with ([`WidthClass`],
//! [`PropertySelector`]), and one concrete oracle backed by the Unicode
//! Character Database XML distribution.
//!
//! # Entry Point
//!
//! ```no_run
//! use unibitmap_ucd::{PropertyOracle, UcdXmlOracle};
//!
//! let ucd = UcdXmlOracle::from_path("ucd.nounihan.grouped.xml".as_ref())?;
//! let alpha = ucd.resolve("ALPHABETIC")?;
//! assert!(ucd.test_binary('A' as u32, &alpha)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod model;
pub mod oracle;
pub mod xml;

pub use model::{
    binary_property_index, PropertySelector, WidthClass, BINARY_PROPERTIES, CODEPOINT_END,
};
pub use oracle::{resolve_or_default, OracleError, PropertyOracle};
pub use xml::{LoadError, UcdXmlOracle};
