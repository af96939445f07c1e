//! Claims domain errors

use thiserror::Error;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Claim not found: {0}")]
    ClaimNotFound(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Claim has no assigned agent")]
    NoAssignedAgent,

    #[error("No eligible agent available for assignment")]
    NoAgentAvailable,

    #[error("Rejection requires remarks")]
    RemarksRequired,

    #[error("Settlement amount must be positive")]
    InvalidSettlementAmount,

    #[error("Claim is already settled")]
    AlreadySettled,

    #[error("Agent {0} is not assigned to this claim")]
    NotAssignedAgent(String),
}
