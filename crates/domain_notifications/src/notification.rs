//! Notification entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, NotificationId, ReportId, UserId};

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ClaimCreated,
    ClaimAssigned,
    AgentAssigned,
    ClaimReassigned,
    ClaimStatusChanged,
    ClaimApproved,
    ClaimRejected,
    ClaimSettled,
    NewMessage,
    TrafficVerification,
    AdminBroadcast,
    SystemAnnouncement,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ClaimCreated => "claim_created",
            NotificationKind::ClaimAssigned => "claim_assigned",
            NotificationKind::AgentAssigned => "agent_assigned",
            NotificationKind::ClaimReassigned => "claim_reassigned",
            NotificationKind::ClaimStatusChanged => "claim_status_changed",
            NotificationKind::ClaimApproved => "claim_approved",
            NotificationKind::ClaimRejected => "claim_rejected",
            NotificationKind::ClaimSettled => "claim_settled",
            NotificationKind::NewMessage => "new_message",
            NotificationKind::TrafficVerification => "traffic_verification",
            NotificationKind::AdminBroadcast => "admin_broadcast",
            NotificationKind::SystemAnnouncement => "system_announcement",
        }
    }
}

/// Delivery priority, surfaced to the client for ordering and styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

/// A persisted notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub claim_id: Option<ClaimId>,
    pub report_id: Option<ReportId>,
    /// Free-form context (agent names, amounts, old/new status, ...)
    pub metadata: serde_json::Value,
    pub priority: Priority,
    /// Client route the notification links to
    pub action_url: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A notification that has not been persisted yet
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub claim_id: Option<ClaimId>,
    pub report_id: Option<ReportId>,
    pub metadata: serde_json::Value,
    pub priority: Priority,
    pub action_url: Option<String>,
}

impl NewNotification {
    /// Starts a notification for a recipient
    pub fn to(
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            claim_id: None,
            report_id: None,
            metadata: serde_json::Value::Object(Default::default()),
            priority: Priority::default(),
            action_url: None,
        }
    }

    pub fn about_claim(mut self, claim_id: ClaimId) -> Self {
        self.claim_id = Some(claim_id);
        self
    }

    pub fn about_report(mut self, report_id: ReportId) -> Self {
        self.report_id = Some(report_id);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }

    /// Materializes the persisted form
    pub fn into_notification(self) -> Notification {
        Notification {
            id: NotificationId::new_v7(),
            user_id: self.user_id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            claim_id: self.claim_id,
            report_id: self.report_id,
            metadata: self.metadata,
            priority: self.priority,
            action_url: self.action_url,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let n = NewNotification::to(
            UserId::new_v7(),
            NotificationKind::SystemAnnouncement,
            "Maintenance",
            "Scheduled downtime tonight",
        );
        assert_eq!(n.priority, Priority::Medium);
        assert!(n.claim_id.is_none());
        assert!(n.action_url.is_none());
    }

    #[test]
    fn test_into_notification_starts_unread() {
        let n = NewNotification::to(
            UserId::new_v7(),
            NotificationKind::ClaimCreated,
            "t",
            "m",
        )
        .with_priority(Priority::High)
        .into_notification();

        assert!(!n.is_read);
        assert_eq!(n.priority, Priority::High);
    }

    #[test]
    fn test_kind_serialization_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&NotificationKind::ClaimStatusChanged).unwrap(),
            "\"claim_status_changed\""
        );
        assert_eq!(
            serde_json::to_string(&Priority::Urgent).unwrap(),
            "\"urgent\""
        );
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }
}
