//! Response Cache Infrastructure
//!
//! Redis-backed JSON cache for GET responses, keyed `{prefix}_{request_uri}`.
//! Three backends share one interface: Redis in production, an in-process
//! map for development and tests, and a disabled mode in which every
//! operation is a no-op so handlers keep working when no Redis is configured.

pub mod cache;
pub mod keys;
pub mod error;

pub use cache::{CacheConfig, ResponseCache};
pub use keys::response_key;
pub use error::CacheError;
