//! Room registry and broadcast hub

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use core_kernel::{ClaimId, DomainPort, PortError, UserId};
use domain_notifications::{Notification, NotificationPush};

use crate::events::ServerEvent;

/// Buffered events per room before slow receivers start lagging
const ROOM_CAPACITY: usize = 64;

/// Registry of broadcast rooms
///
/// Rooms are created lazily on first join and garbage-collected when an emit
/// finds no receivers left.
pub struct RealtimeHub {
    rooms: RwLock<HashMap<String, broadcast::Sender<ServerEvent>>>,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Room name for a user's personal feed
    pub fn user_room(user_id: UserId) -> String {
        format!("user_{}", user_id.as_uuid())
    }

    /// Room name for a claim's chat
    pub fn claim_room(claim_id: ClaimId) -> String {
        format!("claim_{}", claim_id.as_uuid())
    }

    /// Subscribes to a room, creating it on first join
    pub async fn join(&self, room: &str) -> broadcast::Receiver<ServerEvent> {
        let mut rooms = self.rooms.write().await;
        let sender = rooms
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0);
        debug!(room, receivers = sender.receiver_count() + 1, "Socket joined room");
        sender.subscribe()
    }

    /// Emits an event into a room, returning how many receivers got it
    ///
    /// An absent or empty room yields zero; the room is dropped from the
    /// registry when its last receiver is gone.
    pub async fn emit(&self, room: &str, event: ServerEvent) -> usize {
        let delivered = {
            let rooms = self.rooms.read().await;
            match rooms.get(room) {
                Some(sender) => sender.send(event).unwrap_or(0),
                None => 0,
            }
        };

        if delivered == 0 {
            let mut rooms = self.rooms.write().await;
            if rooms.get(room).is_some_and(|s| s.receiver_count() == 0) {
                rooms.remove(room);
                debug!(room, "Removed empty room");
            }
        }
        delivered
    }

    /// Emits to a user's personal room
    pub async fn emit_to_user(&self, user_id: UserId, event: ServerEvent) -> usize {
        self.emit(&Self::user_room(user_id), event).await
    }

    /// Emits to a claim's chat room
    pub async fn emit_to_claim(&self, claim_id: ClaimId, event: ServerEvent) -> usize {
        self.emit(&Self::claim_room(claim_id), event).await
    }

    /// Number of live rooms, for the readiness probe
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl DomainPort for RealtimeHub {}

#[async_trait]
impl NotificationPush for RealtimeHub {
    async fn push(&self, notification: &Notification) -> Result<(), PortError> {
        let delivered = self
            .emit_to_user(
                notification.user_id,
                ServerEvent::NewNotification {
                    notification: notification.clone(),
                },
            )
            .await;
        debug!(
            user_id = %notification.user_id,
            delivered,
            "Pushed new_notification"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChatMessage;

    #[tokio::test]
    async fn test_join_then_emit_delivers() {
        let hub = RealtimeHub::new();
        let user = UserId::new_v7();

        let mut receiver = hub.join(&RealtimeHub::user_room(user)).await;

        let message = ChatMessage::new(ClaimId::new_v7(), user, "hi");
        let delivered = hub
            .emit_to_user(user, ServerEvent::ReceiveChat { message })
            .await;
        assert_eq!(delivered, 1);

        let event = receiver.recv().await.unwrap();
        assert!(matches!(event, ServerEvent::ReceiveChat { .. }));
    }

    #[tokio::test]
    async fn test_emit_without_room_is_zero() {
        let hub = RealtimeHub::new();
        let message = ChatMessage::new(ClaimId::new_v7(), UserId::new_v7(), "hi");
        let delivered = hub
            .emit_to_user(UserId::new_v7(), ServerEvent::ReceiveChat { message })
            .await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_claim_room_fans_out_to_all_members() {
        let hub = RealtimeHub::new();
        let claim = ClaimId::new_v7();

        let mut driver_rx = hub.join(&RealtimeHub::claim_room(claim)).await;
        let mut agent_rx = hub.join(&RealtimeHub::claim_room(claim)).await;

        let message = ChatMessage::new(claim, UserId::new_v7(), "any update?");
        let delivered = hub
            .emit_to_claim(claim, ServerEvent::ReceiveChat { message })
            .await;
        assert_eq!(delivered, 2);

        assert!(driver_rx.recv().await.is_ok());
        assert!(agent_rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_room_is_garbage_collected() {
        let hub = RealtimeHub::new();
        let user = UserId::new_v7();
        let room = RealtimeHub::user_room(user);

        let receiver = hub.join(&room).await;
        assert_eq!(hub.room_count().await, 1);
        drop(receiver);

        let message = ChatMessage::new(ClaimId::new_v7(), user, "gone");
        hub.emit_to_user(user, ServerEvent::ReceiveChat { message }).await;
        assert_eq!(hub.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_push_never_fails_without_listeners() {
        use domain_notifications::{NewNotification, NotificationKind};

        let hub = RealtimeHub::new();
        let notification = NewNotification::to(
            UserId::new_v7(),
            NotificationKind::SystemAnnouncement,
            "t",
            "m",
        )
        .into_notification();

        assert!(hub.push(&notification).await.is_ok());
    }
}
