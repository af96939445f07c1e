//! Request handlers

pub mod health;
pub mod auth;
pub mod accidents;
pub mod traffic;
pub mod claims;
pub mod notifications;
pub mod admin;
