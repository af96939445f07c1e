//! Notification fan-out service

use std::sync::Arc;

use tracing::{debug, warn};

use core_kernel::{OperationMetadata, PortError};

use crate::notification::{NewNotification, Notification};
use crate::ports::{NotificationPush, NotificationStore};

/// Persists notifications and pushes them to connected clients
///
/// Persistence is authoritative: a store failure propagates to the caller.
/// The push leg is best-effort: a recipient with no live connection, or a
/// downed transport, is logged and swallowed so claim operations never fail
/// on notification delivery.
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    push: Arc<dyn NotificationPush>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>, push: Arc<dyn NotificationPush>) -> Self {
        Self { store, push }
    }

    /// Persists and pushes one notification
    pub async fn dispatch(
        &self,
        notification: NewNotification,
        metadata: Option<OperationMetadata>,
    ) -> Result<Notification, PortError> {
        let stored = self.store.create(notification, metadata).await?;
        self.push_best_effort(&stored).await;
        Ok(stored)
    }

    /// Persists a batch with one bulk insert, then pushes each
    pub async fn dispatch_all(
        &self,
        notifications: Vec<NewNotification>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Notification>, PortError> {
        if notifications.is_empty() {
            return Ok(Vec::new());
        }
        let stored = self.store.create_bulk(notifications, metadata).await?;
        for notification in &stored {
            self.push_best_effort(notification).await;
        }
        Ok(stored)
    }

    /// The inbox store, for read-side handlers
    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.store
    }

    async fn push_best_effort(&self, notification: &Notification) {
        match self.push.push(notification).await {
            Ok(()) => debug!(
                notification_id = %notification.id,
                user_id = %notification.user_id,
                kind = notification.kind.as_str(),
                "Pushed notification"
            ),
            Err(error) => warn!(
                notification_id = %notification.id,
                user_id = %notification.user_id,
                %error,
                "Realtime push failed, notification remains in inbox"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{NewNotification, NotificationKind, Priority};
    use crate::ports::mock::{MockNotificationPush, MockNotificationStore};
    use crate::ports::{ListOptions, NotificationStore};
    use core_kernel::UserId;

    fn service_with_mocks() -> (NotificationService, Arc<MockNotificationStore>, Arc<MockNotificationPush>) {
        let store = Arc::new(MockNotificationStore::new());
        let push = Arc::new(MockNotificationPush::new());
        let service = NotificationService::new(store.clone(), push.clone());
        (service, store, push)
    }

    fn announcement(user_id: UserId) -> NewNotification {
        NewNotification::to(
            user_id,
            NotificationKind::SystemAnnouncement,
            "Test Notification",
            "This is a test notification to verify the system is working correctly.",
        )
    }

    #[tokio::test]
    async fn test_dispatch_persists_then_pushes() {
        let (service, store, push) = service_with_mocks();
        let user = UserId::new_v7();

        let stored = service.dispatch(announcement(user), None).await.unwrap();

        assert_eq!(store.all().await.len(), 1);
        let pushed = push.pushed().await;
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].id, stored.id);
    }

    #[tokio::test]
    async fn test_push_failure_does_not_fail_dispatch() {
        let (service, store, push) = service_with_mocks();
        push.set_failing(true).await;

        let user = UserId::new_v7();
        let result = service.dispatch(announcement(user), None).await;

        assert!(result.is_ok());
        assert_eq!(store.all().await.len(), 1);
        assert!(push.pushed().await.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_all_bulk_inserts_and_pushes_each() {
        let (service, store, push) = service_with_mocks();
        let users: Vec<UserId> = (0..4).map(|_| UserId::new_v7()).collect();

        let batch: Vec<NewNotification> = users.iter().map(|u| announcement(*u)).collect();
        let stored = service.dispatch_all(batch, None).await.unwrap();

        assert_eq!(stored.len(), 4);
        assert_eq!(store.all().await.len(), 4);
        assert_eq!(push.pushed().await.len(), 4);
    }

    #[tokio::test]
    async fn test_dispatch_all_empty_is_noop() {
        let (service, store, _push) = service_with_mocks();
        let stored = service.dispatch_all(Vec::new(), None).await.unwrap();
        assert!(stored.is_empty());
        assert!(store.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_inbox_pagination_and_unread_flow() {
        let (service, store, _push) = service_with_mocks();
        let user = UserId::new_v7();

        for _ in 0..25 {
            service
                .dispatch(
                    announcement(user).with_priority(Priority::Low),
                    None,
                )
                .await
                .unwrap();
        }

        let page = store
            .list(user, ListOptions { page: 2, per_page: 20, unread_only: false }, None)
            .await
            .unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 2);
        assert_eq!(page.notifications.len(), 5);
        assert_eq!(page.unread_count, 25);

        let first = page.notifications[0].id;
        store.mark_read(first, user, None).await.unwrap();
        assert_eq!(store.unread_count(user, None).await.unwrap(), 24);

        let changed = store.mark_all_read(user, None).await.unwrap();
        assert_eq!(changed, 24);

        let removed = store.delete_read(user, None).await.unwrap();
        assert_eq!(removed, 25);
    }

    #[tokio::test]
    async fn test_mark_read_is_owner_scoped() {
        let (service, store, _push) = service_with_mocks();
        let owner = UserId::new_v7();
        let other = UserId::new_v7();

        let stored = service.dispatch(announcement(owner), None).await.unwrap();

        let result = store.mark_read(stored.id, other, None).await;
        assert!(result.is_err());
    }
}
