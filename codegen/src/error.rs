//! Compiler errors.

use thiserror::Error;
use unibitmap_ucd::OracleError;

/// Errors that abort a compilation. There is no partial output.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// The oracle failed; the scan cannot continue.
    #[error("compilation aborted: {0}")]
    Oracle(#[from] OracleError),
    /// The requested domain is empty or exceeds the code point space.
    #[error("invalid code point domain end 0x{end:06x}")]
    InvalidDomain {
        /// Requested exclusive end.
        end: u32,
    },
}
