//! Validators for emitted tables, grouped by artifact.

pub mod index;
pub mod table;
pub mod transitions;
pub mod vectors;

/// Detail lines kept per failing check.
pub(crate) const MAX_DETAILS: usize = 10;
