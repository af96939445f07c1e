//! Adapters for external systems used by the accidents domain

pub mod scoring_http;

pub use scoring_http::{HttpDamagePredictor, ScoringServiceConfig};
