//! Error types shared across the Warden pipeline.

use thiserror::Error;

/// WardenError - every fallible operation in the pipeline returns this.
#[derive(Error, Debug)]
pub enum WardenError {
    /// Transport-level failure reaching an external source.
    #[error("network error: {0}")]
    FetchNetwork(#[from] reqwest::Error),

    /// Source responded with a non-2xx status.
    #[error("source returned HTTP {0}")]
    FetchHttp(u16),

    /// Response body did not parse into the expected shape.
    #[error("parse error: {0}")]
    FetchParse(#[from] serde_json::Error),

    /// Source returned an empty result set for the query.
    #[error("not found")]
    FetchNotFound,

    /// AI capability did not respond within its deadline, or errored.
    #[error("ai capability unavailable: {0}")]
    AiUnavailable(String),

    /// Archive failed to persist a report; the only error surfaced to callers.
    #[error("archive write failed: {0}")]
    ArchiveWrite(#[from] std::io::Error),

    /// Detection event missing a required field.
    #[error("bad detection: {0}")]
    BadDetection(String),

    /// Configuration failed to load.
    #[error("config error: {0}")]
    Config(String),

    /// Operation exceeded its deadline.
    #[error("timeout")]
    Timeout,
}

pub type WardenResult<T> = Result<T, WardenError>;

impl WardenError {
    pub fn bad_detection<S: Into<String>>(msg: S) -> Self {
        WardenError::BadDetection(msg.into())
    }

    pub fn ai_unavailable<S: Into<String>>(msg: S) -> Self {
        WardenError::AiUnavailable(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        WardenError::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_detection_message() {
        let err = WardenError::bad_detection("missing cve_id");
        assert!(matches!(err, WardenError::BadDetection(_)));
        assert_eq!(err.to_string(), "bad detection: missing cve_id");
    }

    #[test]
    fn http_error_display() {
        let err = WardenError::FetchHttp(500);
        assert_eq!(err.to_string(), "source returned HTTP 500");
    }
}
