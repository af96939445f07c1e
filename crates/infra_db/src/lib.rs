//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the claims platform, following the repository
//! pattern on SQLx. Each repository owns the row mapping for its aggregate;
//! the user and notification repositories additionally implement the domain
//! ports (`UserPort`, `NotificationStore`) so services can run against either
//! PostgreSQL or the in-memory mocks.
//!
//! Enumerations are stored as text and parsed on read, keeping the schema
//! readable in psql and the queries usable without compile-time preparation.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{DatabaseConfig, create_pool, ClaimsRepository};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/autosure")).await?;
//! let claims = ClaimsRepository::new(pool.clone());
//! ```

pub mod pool;
pub mod error;
pub mod repositories;

pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use repositories::{
    AccidentRepository, ClaimsRepository, NotificationRepository, UserRepository,
};
