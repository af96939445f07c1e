//! User domain errors

use thiserror::Error;

/// Errors that can occur in the user domain
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Vehicle number already registered: {0}")]
    VehicleNumberTaken(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invalid vehicle number: {0}")]
    InvalidVehicleNumber(String),

    #[error("User {0} is not an agent")]
    NotAnAgent(String),

    #[error("Agent workload cannot go below zero")]
    WorkloadUnderflow,
}
