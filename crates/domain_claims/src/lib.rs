//! Claims Management Domain
//!
//! This crate implements the claim lifecycle from filing against an accident
//! report through agent review and settlement.
//!
//! # Claim Lifecycle
//!
//! ```text
//! Pending -> In Review -> Approved -> Settled
//!                      -> Rejected
//! ```
//!
//! A claim must be assigned to an agent before review can start; rejection
//! requires remarks; settlement records the payout and is terminal.

pub mod claim;
pub mod settlement;
pub mod error;

pub use claim::{AssignmentChange, Claim, ClaimStatus};
pub use settlement::{Settlement, SettlementMethod};
pub use error::ClaimError;
