//! Notification DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_notifications::{InboxPage, Notification};

#[derive(Debug, Deserialize)]
pub struct InboxQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub unread_only: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BroadcastRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    /// `driver`, `agent`, `traffic`, `admin`, or `all` (default)
    pub target_role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub claim_id: Option<Uuid>,
    pub report_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub priority: String,
    pub action_url: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationResponse {
    fn from(notification: &Notification) -> Self {
        Self {
            id: *notification.id.as_uuid(),
            kind: notification.kind.as_str().to_string(),
            title: notification.title.clone(),
            message: notification.message.clone(),
            claim_id: notification.claim_id.map(|id| *id.as_uuid()),
            report_id: notification.report_id.map(|id| *id.as_uuid()),
            metadata: notification.metadata.clone(),
            priority: notification.priority.as_str().to_string(),
            action_url: notification.action_url.clone(),
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginationResponse {
    pub total: u64,
    pub page: u32,
    pub pages: u32,
    pub unread_count: u64,
}

#[derive(Debug, Serialize)]
pub struct InboxResponse {
    pub notifications: Vec<NotificationResponse>,
    pub pagination: PaginationResponse,
}

impl From<&InboxPage> for InboxResponse {
    fn from(page: &InboxPage) -> Self {
        Self {
            notifications: page.notifications.iter().map(NotificationResponse::from).collect(),
            pagination: PaginationResponse {
                total: page.total,
                page: page.page,
                pages: page.pages,
                unread_count: page.unread_count,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: u64,
}
