/*!
 * Error handling for plan analysis operations
 *
 * Two layers: `PlanNavError` for structural failures that abort an operation
 * (bad configuration, invalid records, empty candidate sets), and
 * `ExtractionFailure` for per-source parsing problems that are collected in
 * batch results rather than propagated.
 */

use std::fmt;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Plan navigator result type
pub type Result<T> = std::result::Result<T, PlanNavError>;

/// Errors that abort the operation that raised them
#[derive(Error, Debug)]
pub enum PlanNavError {
    /// File I/O errors with context
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
        path: Option<PathBuf>,
    },

    /// CSV parsing errors with location information
    #[error("CSV parsing error at line {line:?}: {message}")]
    CsvParse {
        message: String,
        line: Option<usize>,
        path: Option<PathBuf>,
    },

    /// JSON (de)serialization errors
    #[error("JSON error: {message}")]
    JsonParse {
        message: String,
        path: Option<PathBuf>,
    },

    /// Data validation errors with field-level detail
    #[error("Data validation error: {message}")]
    DataValidation {
        message: String,
        field: Option<String>,
        value: Option<String>,
    },

    /// Scoring weight configurations that do not sum to 1.0
    #[error("Invalid scoring weights: sum is {sum:.4}, expected 1.0 ± {tolerance}")]
    InvalidWeights { sum: f64, tolerance: f64 },

    /// An analysis run where no source yielded a usable plan
    #[error("No plans available for analysis: {sources} source(s), {failure_count} extraction failure(s)")]
    NoPlansAvailable {
        sources: usize,
        failure_count: usize,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        suggestion: Option<String>,
    },

    /// Export errors
    #[error("Export error: {message}")]
    Export {
        message: String,
        path: Option<PathBuf>,
    },

    /// Generic errors with custom message
    #[error("{message}")]
    Custom {
        message: String,
        suggestion: Option<String>,
    },
}

impl PlanNavError {
    /// Create a validation error for a specific field
    pub fn validation(message: impl Into<String>, field: &str, value: impl fmt::Display) -> Self {
        Self::DataValidation {
            message: message.into(),
            field: Some(field.to_string()),
            value: Some(value.to_string()),
        }
    }

    /// Get a user-friendly error message with suggestions where available
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration { suggestion: Some(sug), .. }
            | Self::Custom { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            Self::InvalidWeights { .. } => format!(
                "{}\n\nSuggestion: adjust the six metric weights so they sum to exactly 1.0",
                self
            ),
            Self::NoPlansAvailable { .. } => format!(
                "{}\n\nSuggestion: check that the source paths exist and contain supported plan documents (PDF, DOCX, TXT, JSON, CSV)",
                self
            ),
            _ => self.to_string(),
        }
    }
}

/// Why a single source could not be turned into a plan record
///
/// These are recorded per source and never abort a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FailureReason {
    /// File extension/content signature did not match any strategy
    UnsupportedFormat { extension: String },
    /// The source could not be read
    Io { message: String },
    /// The source was readable but its content could not be interpreted
    Malformed { message: String },
    /// One row of a tabular batch was unusable; sibling rows are unaffected
    MalformedRow { line: usize, message: String },
    /// Extraction exceeded the configured per-source time limit
    Timeout { limit_secs: u64 },
    /// The source contained no extractable content at all
    EmptyDocument,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::UnsupportedFormat { extension } => {
                write!(f, "unsupported format '{}'", extension)
            }
            FailureReason::Io { message } => write!(f, "read error: {}", message),
            FailureReason::Malformed { message } => write!(f, "malformed document: {}", message),
            FailureReason::MalformedRow { line, message } => {
                write!(f, "malformed row at line {}: {}", line, message)
            }
            FailureReason::Timeout { limit_secs } => {
                write!(f, "extraction exceeded {}s time limit", limit_secs)
            }
            FailureReason::EmptyDocument => write!(f, "document contained no extractable content"),
        }
    }
}

/// A per-source extraction failure, reported alongside batch results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub source: PathBuf,
    pub reason: FailureReason,
}

impl ExtractionFailure {
    pub fn new(source: impl Into<PathBuf>, reason: FailureReason) -> Self {
        Self {
            source: source.into(),
            reason,
        }
    }
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source.display(), self.reason)
    }
}

// Convenience conversions
impl From<std::io::Error> for PlanNavError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
            path: None,
        }
    }
}

impl From<csv::Error> for PlanNavError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|pos| pos.line() as usize);
        Self::CsvParse {
            message: err.to_string(),
            line,
            path: None,
        }
    }
}

impl From<serde_json::Error> for PlanNavError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_failure_display_includes_source_and_reason() {
        let failure = ExtractionFailure::new(
            "plans/bad.csv",
            FailureReason::MalformedRow {
                line: 3,
                message: "missing plan_id".to_string(),
            },
        );
        let rendered = failure.to_string();
        assert!(rendered.contains("bad.csv"));
        assert!(rendered.contains("line 3"));
    }

    #[test]
    fn no_plans_available_message_mentions_counts() {
        let err = PlanNavError::NoPlansAvailable {
            sources: 4,
            failure_count: 4,
        };
        assert!(err.to_string().contains("4 source(s)"));
        assert!(err.user_message().contains("Suggestion"));
    }
}
