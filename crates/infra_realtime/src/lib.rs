//! Realtime Infrastructure
//!
//! Rooms keyed `user_{id}` and `claim_{id}` over tokio broadcast channels.
//! The WebSocket endpoint in the API layer subscribes sockets into rooms;
//! the notification service publishes through the hub's `NotificationPush`
//! implementation. Emitting into an empty room is not an error: realtime
//! delivery is an accelerant for the persisted inbox, not a guarantee.

pub mod hub;
pub mod events;

pub use hub::RealtimeHub;
pub use events::{ChatMessage, ClientCommand, ServerEvent};
