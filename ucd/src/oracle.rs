//! The `PropertyOracle` capability consumed by the table compiler.

use thiserror::Error;

use crate::model::{PropertySelector, WidthClass};

/// Errors an oracle reports to the compiler.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The property name does not resolve against this oracle.
    #[error("Property {name} not found")]
    UnknownProperty {
        /// The name that failed to resolve.
        name: String,
    },
    /// The oracle could not answer a query. Compilation aborts on this error.
    #[error("oracle query for U+{codepoint:04X} failed: {reason}")]
    QueryFailure {
        /// Code point being queried.
        codepoint: u32,
        /// Oracle-specific description.
        reason: String,
    },
}

/// Per-code-point Unicode classification supplied to the compiler.
///
/// Implementations must be deterministic: the compiler and the test-vector
/// generator may query the same code point more than once and rely on
/// identical answers.
pub trait PropertyOracle {
    /// Human-readable description of the data source, used in header comments.
    fn description(&self) -> &str;

    /// Resolves a property name to a selector.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::UnknownProperty`] if the name is not known.
    fn resolve(&self, name: &str) -> Result<PropertySelector, OracleError>;

    /// Tests whether `codepoint` has the binary property.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::QueryFailure`] if the oracle cannot answer.
    fn test_binary(&self, codepoint: u32, selector: &PropertySelector) -> Result<bool, OracleError>;

    /// Returns the East Asian Width class of `codepoint`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::QueryFailure`] if the oracle cannot answer.
    fn width_class(&self, codepoint: u32) -> Result<WidthClass, OracleError>;

    /// Name of the Unicode block containing `codepoint`, if any.
    fn block_name(&self, codepoint: u32) -> Option<&str>;

    /// Human-readable name of `codepoint`, if one is available.
    fn extended_name(&self, codepoint: u32) -> Option<String>;
}

/// Resolves `name`, falling back to `default` when the name is unknown.
///
/// The fallback is logged as a warning.
///
/// # Errors
///
/// Returns an error only if `default` itself does not resolve.
pub fn resolve_or_default<O: PropertyOracle + ?Sized>(
    oracle: &O,
    name: &str,
    default: &str,
) -> Result<PropertySelector, OracleError> {
    match oracle.resolve(name) {
        Ok(selector) => Ok(selector),
        Err(OracleError::UnknownProperty { .. }) => {
            log::warn!("Property {name} not found, falling back to {default}");
            oracle.resolve(default)
        }
        Err(other) => Err(other),
    }
}
