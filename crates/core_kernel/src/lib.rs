//! Core Kernel - Foundational types and utilities for the claims platform
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers
//! - Port infrastructure for the hexagonal architecture

pub mod money;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{
    UserId, ReportId, ClaimId, NotificationId, SettlementId, MessageId,
};
pub use error::CoreError;
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    OperationMetadata,
};
