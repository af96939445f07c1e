//! Realtime wire types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, MessageId, UserId};
use domain_notifications::Notification;

/// A chat message relayed within a claim room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub claim_id: ClaimId,
    pub sender_id: UserId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(claim_id: ClaimId, sender_id: UserId, body: impl Into<String>) -> Self {
        Self {
            id: MessageId::new_v7(),
            claim_id,
            sender_id,
            body: body.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Commands a connected client may send
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Subscribe to the caller's user room
    Join { user_id: UserId },
    /// Subscribe to a claim's chat room
    JoinClaim { claim_id: ClaimId },
    /// Send a chat message into a claim room
    SendChat { claim_id: ClaimId, body: String },
}

/// Events pushed to connected clients
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A notification landed in the recipient's inbox
    NewNotification { notification: Notification },
    /// A chat message in a claim room the client joined
    ReceiveChat { message: ChatMessage },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_command_wire_format() {
        let user_id = UserId::new_v7();
        let json = format!(
            r#"{{"type": "join", "user_id": "{}"}}"#,
            user_id.as_uuid()
        );
        let command: ClientCommand = serde_json::from_str(&json).unwrap();
        assert!(matches!(command, ClientCommand::Join { user_id: id } if id == user_id));

        let json = r#"{"type": "send_chat", "claim_id": "0191b2c8-0000-7000-8000-000000000000", "body": "hello"}"#;
        let command: ClientCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(command, ClientCommand::SendChat { .. }));
    }

    #[test]
    fn test_server_event_tags() {
        let message = ChatMessage::new(ClaimId::new_v7(), UserId::new_v7(), "on my way");
        let json = serde_json::to_value(ServerEvent::ReceiveChat { message }).unwrap();
        assert_eq!(json["type"], "receive_chat");
        assert_eq!(json["message"]["body"], "on my way");
    }
}
