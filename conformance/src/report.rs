//! Conformance report types: results, severity levels, and report aggregation.

use serde::Serialize;

/// Severity level of a conformance check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The check passed.
    Pass,
    /// The check found a known divergence that does not block conformance.
    Warning,
    /// The check failed.
    Failure,
}

/// A single conformance check result.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    /// Short identifier of the validator that produced this result.
    pub validator: String,
    /// Human-readable message describing the outcome.
    pub message: String,
    /// Severity of the result.
    pub severity: Severity,
    /// Optional additional detail lines, e.g. the first mismatching code points.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl TestResult {
    /// Creates a passing result.
    pub fn pass(validator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with(validator, message, Severity::Pass, Vec::new())
    }

    /// Creates a failure result.
    pub fn fail(validator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with(validator, message, Severity::Failure, Vec::new())
    }

    /// Creates a failure result with additional detail lines.
    pub fn fail_with_details(
        validator: impl Into<String>,
        message: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        Self::with(validator, message, Severity::Failure, details)
    }

    /// Creates a warning result.
    pub fn warn(validator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with(validator, message, Severity::Warning, Vec::new())
    }

    /// Creates a warning result with additional detail lines.
    pub fn warn_with_details(
        validator: impl Into<String>,
        message: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        Self::with(validator, message, Severity::Warning, details)
    }

    fn with(
        validator: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        details: Vec<String>,
    ) -> Self {
        Self {
            validator: validator.into(),
            message: message.into(),
            severity,
            details,
        }
    }

    /// Returns true if this result represents a failure.
    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Failure
    }
}

/// Aggregated conformance report from all validators.
#[derive(Debug, Serialize)]
pub struct ConformanceReport {
    /// All individual test results across all validators.
    pub results: Vec<TestResult>,
}

impl ConformanceReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
        }
    }

    /// Appends a result to this report.
    pub fn push(&mut self, result: TestResult) {
        self.results.push(result);
    }

    /// Extends this report with results from another report.
    pub fn extend(&mut self, other: ConformanceReport) {
        self.results.extend(other.results);
    }

    /// Returns the count of results with `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.results.iter().filter(|r| r.severity == severity).count()
    }

    /// Returns the count of failed checks.
    pub fn failure_count(&self) -> usize {
        self.count(Severity::Failure)
    }

    /// Returns true if no check failed. Warnings do not count.
    pub fn all_passed(&self) -> bool {
        self.failure_count() == 0
    }
}

impl Default for ConformanceReport {
    fn default() -> Self {
        Self::new()
    }
}
