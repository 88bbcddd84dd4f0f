//! Process exit codes.

use crate::duplicates::ScanSummary;

/// Exit codes for the CloneSweep application.
///
/// - 0: Success (completed normally, duplicates found)
/// - 1: General error (unexpected failure)
/// - 2: No duplicates found (completed normally, no duplicates)
/// - 3: Partial success (completed with some non-fatal scan errors)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success: command completed; for scans, duplicates were found.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// Partial success: Scan completed but encountered some non-fatal errors.
    PartialSuccess = 3,
    /// Interrupted: Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "CS000",
            Self::GeneralError => "CS001",
            Self::NoDuplicates => "CS002",
            Self::PartialSuccess => "CS003",
            Self::Interrupted => "CS130",
        }
    }

    /// Exit code for a completed scan.
    ///
    /// Entry errors outrank the duplicate outcome.
    #[must_use]
    pub fn from_summary(summary: &ScanSummary) -> Self {
        if summary.has_errors() {
            Self::PartialSuccess
        } else if summary.duplicates_found() {
            Self::Success
        } else {
            Self::NoDuplicates
        }
    }
}
