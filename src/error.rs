use serde::Serialize;
use thiserror::Error;

/// Reasons a single uploaded source is skipped. None of these abort a batch.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceError {
    #[error("no row starts with a '#' or 'Ticket' marker")]
    HeaderNotFound,

    #[error("no Ticket or Request time column found (columns: {})", .found.join(", "))]
    MissingRequiredColumns { found: Vec<String> },

    #[error("unreadable file: {reason}")]
    UnreadableFile { reason: String },

    #[error("no matching worksheet (available: {})", .available.join(", "))]
    NoMatchingWorksheet { available: Vec<String> },
}

impl SourceError {
    pub fn unreadable(reason: impl ToString) -> Self {
        SourceError::UnreadableFile {
            reason: reason.to_string(),
        }
    }

    /// Short label used for metrics and log fields
    pub fn code(&self) -> &'static str {
        match self {
            SourceError::HeaderNotFound => "header_not_found",
            SourceError::MissingRequiredColumns { .. } => "missing_required_columns",
            SourceError::UnreadableFile { .. } => "unreadable_file",
            SourceError::NoMatchingWorksheet { .. } => "no_matching_worksheet",
        }
    }
}

/// A source that was dropped from the batch, with the reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSource {
    pub label: String,
    pub reason: SourceError,
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown time window '{0}' (expected All Time, Last 90 Days, Last 30 Days or Last 7 Days)")]
    UnknownWindow(String),

    #[error("Unknown report source '{label}' (available: {})", .available.join(", "))]
    UnknownSource { label: String, available: Vec<String> },

    #[error("No usable data: all {} uploaded sources were skipped", .skipped.len())]
    NoUsableData { skipped: Vec<SkippedSource> },
}

pub type Result<T> = std::result::Result<T, ReportError>;
