//! Notification Domain
//!
//! Every claim transition, assignment change, traffic verification, and chat
//! message produces one or more notifications. A notification is first
//! persisted (so the inbox is authoritative), then pushed to the recipient's
//! realtime room on a best-effort basis: a dead socket must never fail the
//! claim operation that triggered it.
//!
//! Composition (which recipients get which copy at which priority) lives in
//! [`compose`]; delivery lives in [`service::NotificationService`].

pub mod notification;
pub mod compose;
pub mod service;
pub mod ports;

pub use notification::{NewNotification, Notification, NotificationKind, Priority};
pub use ports::{InboxPage, ListOptions, NotificationPush, NotificationStore};
pub use service::NotificationService;
