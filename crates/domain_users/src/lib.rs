//! User Domain
//!
//! Users are the actors of the claims platform: drivers who report accidents
//! and file claims, agents who review them, traffic officers who verify
//! accident authenticity, and administrators.
//!
//! Roles are modeled twice, mirroring how deployments actually grant access:
//! a primary [`UserRole`] plus independent capability flags, so a driver can
//! be promoted to agent duty without losing their driver identity.

pub mod user;
pub mod validation;
pub mod ports;
pub mod error;

pub use user::{User, UserRole};
pub use ports::{UserPort, UserQuery, CreateUserRequest, UpdateUserRequest, RoleGrant};
pub use error::UserError;
