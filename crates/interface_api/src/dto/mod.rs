//! Request/Response data transfer objects

pub mod users;
pub mod accidents;
pub mod claims;
pub mod notifications;
