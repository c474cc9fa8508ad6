use crate::shared::types::GroupKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated in `portfolio-monitor`.
///
/// None of these stop the poll loop: the engine recovers locally and attaches the
/// recovered error to the report's diagnostics, the host renders a placeholder.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Error)]
pub enum MonitorError {
    #[error("snapshot source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("failed to decode position list: {0}")]
    Decode(String),

    #[error("group {key} has zero total volume, breakeven undefined")]
    DegenerateGroup { key: GroupKey },

    #[error("missing or unparseable field {0}, defaulted to 0.0")]
    MissingField(String),

    #[error("no snapshot rows for account: {0}")]
    AccountNotFound(String),
}

impl MonitorError {
    /// Determine if the engine recovered from this error and still produced a report.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_recoverable(&self) -> bool {
        match self {
            MonitorError::SourceUnavailable(_) | MonitorError::AccountNotFound(_) => false,
            _ => true,
        }
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(value: reqwest::Error) -> Self {
        Self::SourceUnavailable(value.to_string())
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}
