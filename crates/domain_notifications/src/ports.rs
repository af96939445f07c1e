//! Notification Domain Ports
//!
//! Two seams: `NotificationStore` (the authoritative inbox, backed by
//! PostgreSQL in `infra_db`) and `NotificationPush` (the realtime leg, backed
//! by the hub in `infra_realtime`). Both have in-memory mocks so the fan-out
//! can be tested without infrastructure.

use async_trait::async_trait;

use core_kernel::{DomainPort, NotificationId, OperationMetadata, PortError, UserId};

use crate::notification::{NewNotification, Notification};

/// Pagination and filtering for inbox listings
#[derive(Debug, Clone, Copy)]
pub struct ListOptions {
    /// 1-based page number
    pub page: u32,
    pub per_page: u32,
    pub unread_only: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
            unread_only: false,
        }
    }
}

/// One page of a user's inbox
#[derive(Debug, Clone)]
pub struct InboxPage {
    pub notifications: Vec<Notification>,
    pub total: u64,
    pub page: u32,
    pub pages: u32,
    pub unread_count: u64,
}

/// Persistence port for notifications
#[async_trait]
pub trait NotificationStore: DomainPort {
    /// Persists a single notification
    async fn create(
        &self,
        notification: NewNotification,
        metadata: Option<OperationMetadata>,
    ) -> Result<Notification, PortError>;

    /// Persists a batch in one round trip (broadcasts)
    async fn create_bulk(
        &self,
        notifications: Vec<NewNotification>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Notification>, PortError>;

    /// Lists a user's inbox, newest first
    async fn list(
        &self,
        user_id: UserId,
        options: ListOptions,
        metadata: Option<OperationMetadata>,
    ) -> Result<InboxPage, PortError>;

    /// Counts unread notifications
    async fn unread_count(
        &self,
        user_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<u64, PortError>;

    /// Marks one notification read; scoped to the owner
    async fn mark_read(
        &self,
        id: NotificationId,
        user_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Notification, PortError>;

    /// Marks all of a user's notifications read, returning how many changed
    async fn mark_all_read(
        &self,
        user_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<u64, PortError>;

    /// Deletes one notification; scoped to the owner
    async fn delete(
        &self,
        id: NotificationId,
        user_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// Deletes all read notifications, returning how many were removed
    async fn delete_read(
        &self,
        user_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<u64, PortError>;
}

/// Realtime delivery port
///
/// Implementations deliver to whatever transport is connected; recipients
/// without a live connection are not an error.
#[async_trait]
pub trait NotificationPush: DomainPort {
    /// Emits a `new_notification` event to the recipient's room
    async fn push(&self, notification: &Notification) -> Result<(), PortError>;
}

/// In-memory mocks for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Vec-backed notification store
    #[derive(Debug, Default)]
    pub struct MockNotificationStore {
        notifications: Arc<RwLock<Vec<Notification>>>,
    }

    impl MockNotificationStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// All stored notifications, insertion order
        pub async fn all(&self) -> Vec<Notification> {
            self.notifications.read().await.clone()
        }
    }

    impl DomainPort for MockNotificationStore {}

    #[async_trait]
    impl NotificationStore for MockNotificationStore {
        async fn create(
            &self,
            notification: NewNotification,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Notification, PortError> {
            let stored = notification.into_notification();
            self.notifications.write().await.push(stored.clone());
            Ok(stored)
        }

        async fn create_bulk(
            &self,
            notifications: Vec<NewNotification>,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Notification>, PortError> {
            let stored: Vec<Notification> = notifications
                .into_iter()
                .map(NewNotification::into_notification)
                .collect();
            self.notifications.write().await.extend(stored.clone());
            Ok(stored)
        }

        async fn list(
            &self,
            user_id: UserId,
            options: ListOptions,
            _metadata: Option<OperationMetadata>,
        ) -> Result<InboxPage, PortError> {
            let all = self.notifications.read().await;
            let mut mine: Vec<Notification> = all
                .iter()
                .filter(|n| n.user_id == user_id)
                .filter(|n| !options.unread_only || !n.is_read)
                .cloned()
                .collect();
            mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let unread_count = all
                .iter()
                .filter(|n| n.user_id == user_id && !n.is_read)
                .count() as u64;
            let total = mine.len() as u64;
            let per_page = options.per_page.max(1);
            let pages = total.div_ceil(per_page as u64) as u32;

            let start = ((options.page.max(1) - 1) * per_page) as usize;
            let notifications = mine
                .into_iter()
                .skip(start)
                .take(per_page as usize)
                .collect();

            Ok(InboxPage {
                notifications,
                total,
                page: options.page.max(1),
                pages,
                unread_count,
            })
        }

        async fn unread_count(
            &self,
            user_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<u64, PortError> {
            Ok(self
                .notifications
                .read()
                .await
                .iter()
                .filter(|n| n.user_id == user_id && !n.is_read)
                .count() as u64)
        }

        async fn mark_read(
            &self,
            id: NotificationId,
            user_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Notification, PortError> {
            let mut all = self.notifications.write().await;
            let found = all
                .iter_mut()
                .find(|n| n.id == id && n.user_id == user_id)
                .ok_or_else(|| PortError::not_found("Notification", id))?;
            found.is_read = true;
            Ok(found.clone())
        }

        async fn mark_all_read(
            &self,
            user_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<u64, PortError> {
            let mut all = self.notifications.write().await;
            let mut changed = 0;
            for n in all.iter_mut().filter(|n| n.user_id == user_id && !n.is_read) {
                n.is_read = true;
                changed += 1;
            }
            Ok(changed)
        }

        async fn delete(
            &self,
            id: NotificationId,
            user_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut all = self.notifications.write().await;
            let before = all.len();
            all.retain(|n| !(n.id == id && n.user_id == user_id));
            if all.len() == before {
                return Err(PortError::not_found("Notification", id));
            }
            Ok(())
        }

        async fn delete_read(
            &self,
            user_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<u64, PortError> {
            let mut all = self.notifications.write().await;
            let before = all.len();
            all.retain(|n| !(n.user_id == user_id && n.is_read));
            Ok((before - all.len()) as u64)
        }
    }

    /// Push mock that records every emitted notification and can be told to
    /// fail, for exercising the best-effort contract
    #[derive(Debug, Default)]
    pub struct MockNotificationPush {
        pushed: Arc<RwLock<Vec<Notification>>>,
        fail: Arc<RwLock<bool>>,
    }

    impl MockNotificationPush {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn set_failing(&self, fail: bool) {
            *self.fail.write().await = fail;
        }

        pub async fn pushed(&self) -> Vec<Notification> {
            self.pushed.read().await.clone()
        }
    }

    impl DomainPort for MockNotificationPush {}

    #[async_trait]
    impl NotificationPush for MockNotificationPush {
        async fn push(&self, notification: &Notification) -> Result<(), PortError> {
            if *self.fail.read().await {
                return Err(PortError::connection("push transport down"));
            }
            self.pushed.write().await.push(notification.clone());
            Ok(())
        }
    }
}
