use crate::download::{DownloadResult, FileOutcome};
use crate::listing::MalformedEntry;

/// Structured feedback from a run, so callers decide how to present it
/// (the CLI prints to stderr, library consumers can log or ignore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Informational message (progress, status updates).
    Info(String),
    /// The run continued but something was skipped or went wrong for one item.
    Warning(String),
    /// A file failed.
    Error(String),
}

impl Feedback {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self::Warning(msg.into())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    pub fn is_info(&self) -> bool {
        matches!(self, Self::Info(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Info(msg) | Self::Warning(msg) | Self::Error(msg) => msg,
        }
    }

    /// Feedback for a listing entry that was skipped.
    pub fn for_malformed(entry: &MalformedEntry) -> Self {
        Self::warning(format!("skipping listing {entry}"))
    }

    /// Feedback for one download outcome, or `None` when it completed normally.
    pub fn for_outcome(outcome: &FileOutcome) -> Option<Self> {
        match &outcome.result {
            DownloadResult::Failed { error } => {
                Some(Self::error(format!("{}: {error}", outcome.file_name)))
            }
            DownloadResult::Skipped { reason } => {
                Some(Self::info(format!("{}: skipped ({reason})", outcome.file_name)))
            }
            DownloadResult::Downloaded { .. } => None,
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info(msg) => write!(f, "{msg}"),
            Self::Warning(msg) => write!(f, "warning: {msg}"),
            Self::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}
