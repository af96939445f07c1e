//! Accident reporting domain errors

use thiserror::Error;

/// Errors that can occur in the accident reporting domain
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("Image rejected: {0}")]
    ImageRejected(String),

    #[error("Report already {0}, verification is one-shot")]
    AlreadyVerified(String),

    #[error("Severity prediction failed: {0}")]
    PredictionFailed(String),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),
}
