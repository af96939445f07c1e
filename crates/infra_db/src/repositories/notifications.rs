//! Notification repository
//!
//! PostgreSQL adapter for the notification inbox, implementing the
//! `NotificationStore` port. Broadcasts land as one multi-row insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use core_kernel::{ClaimId, DomainPort, NotificationId, OperationMetadata, PortError, ReportId, UserId};
use domain_notifications::notification::{NewNotification, Notification, NotificationKind, Priority};
use domain_notifications::ports::{InboxPage, ListOptions, NotificationStore};

use crate::error::DatabaseError;

const NOTIFICATION_COLUMNS: &str = "notification_id, user_id, kind, title, message, claim_id, report_id, \
     metadata, priority, action_url, is_read, created_at";

/// Repository for the notification inbox
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count_where(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<i64, DatabaseError> {
        let query = if unread_only {
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read"
        } else {
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1"
        };
        let count: (i64,) = sqlx::query_as(query)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(count.0)
    }
}

/// Database row for notification
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub notification_id: Uuid,
    pub user_id: Uuid,
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

fn parse_kind(kind: &str) -> Result<NotificationKind, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(kind.to_string()))
        .map_err(|_| DatabaseError::row_mapping(format!("unknown notification kind: {kind}")))
}

fn parse_priority(priority: &str) -> Result<Priority, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(priority.to_string()))
        .map_err(|_| DatabaseError::row_mapping(format!("unknown priority: {priority}")))
}

impl NotificationRow {
    /// Maps the row onto the domain entity
    pub fn into_notification(self) -> Result<Notification, DatabaseError> {
        Ok(Notification {
            id: NotificationId::from_uuid(self.notification_id),
            user_id: UserId::from_uuid(self.user_id),
            kind: parse_kind(&self.kind)?,
            title: self.title,
            message: self.message,
            claim_id: self.claim_id.map(ClaimId::from_uuid),
            report_id: self.report_id.map(ReportId::from_uuid),
            metadata: self.metadata,
            priority: parse_priority(&self.priority)?,
            action_url: self.action_url,
            is_read: self.is_read,
            created_at: self.created_at,
        })
    }
}

fn rows_to_notifications(rows: Vec<NotificationRow>) -> Result<Vec<Notification>, DatabaseError> {
    rows.into_iter().map(NotificationRow::into_notification).collect()
}

impl DomainPort for NotificationRepository {}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn create(
        &self,
        notification: NewNotification,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Notification, PortError> {
        let stored = notification.into_notification();
        sqlx::query(
            "INSERT INTO notifications ( \
                 notification_id, user_id, kind, title, message, claim_id, report_id, \
                 metadata, priority, action_url, is_read, created_at \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(Uuid::from(stored.id))
        .bind(Uuid::from(stored.user_id))
        .bind(stored.kind.as_str())
        .bind(&stored.title)
        .bind(&stored.message)
        .bind(stored.claim_id.map(Uuid::from))
        .bind(stored.report_id.map(Uuid::from))
        .bind(&stored.metadata)
        .bind(stored.priority.as_str())
        .bind(&stored.action_url)
        .bind(stored.is_read)
        .bind(stored.created_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
        .map_err(PortError::from)?;

        Ok(stored)
    }

    async fn create_bulk(
        &self,
        notifications: Vec<NewNotification>,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Notification>, PortError> {
        if notifications.is_empty() {
            return Ok(Vec::new());
        }
        let stored: Vec<Notification> = notifications
            .into_iter()
            .map(NewNotification::into_notification)
            .collect();

        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "INSERT INTO notifications ( \
                 notification_id, user_id, kind, title, message, claim_id, report_id, \
                 metadata, priority, action_url, is_read, created_at) ",
        );
        builder.push_values(stored.iter(), |mut b, n| {
            b.push_bind(Uuid::from(n.id))
                .push_bind(Uuid::from(n.user_id))
                .push_bind(n.kind.as_str())
                .push_bind(n.title.clone())
                .push_bind(n.message.clone())
                .push_bind(n.claim_id.map(Uuid::from))
                .push_bind(n.report_id.map(Uuid::from))
                .push_bind(n.metadata.clone())
                .push_bind(n.priority.as_str())
                .push_bind(n.action_url.clone())
                .push_bind(n.is_read)
                .push_bind(n.created_at);
        });

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
            .map_err(PortError::from)?;

        Ok(stored)
    }

    async fn list(
        &self,
        user_id: UserId,
        options: ListOptions,
        _metadata: Option<OperationMetadata>,
    ) -> Result<InboxPage, PortError> {
        let uuid = *user_id.as_uuid();
        let per_page = options.per_page.max(1);
        let page = options.page.max(1);

        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = "
        ));
        builder.push_bind(uuid);
        if options.unread_only {
            builder.push(" AND NOT is_read");
        }
        builder.push(" ORDER BY created_at DESC");
        builder.push(" LIMIT ").push_bind(per_page as i64);
        builder
            .push(" OFFSET ")
            .push_bind(((page - 1) * per_page) as i64);

        let rows: Vec<NotificationRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
            .map_err(PortError::from)?;

        let total = self
            .count_where(uuid, options.unread_only)
            .await
            .map_err(PortError::from)? as u64;
        let unread_count = self
            .count_where(uuid, true)
            .await
            .map_err(PortError::from)? as u64;

        Ok(InboxPage {
            notifications: rows_to_notifications(rows).map_err(PortError::from)?,
            total,
            page,
            pages: total.div_ceil(per_page as u64) as u32,
            unread_count,
        })
    }

    async fn unread_count(
        &self,
        user_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<u64, PortError> {
        let count = self
            .count_where(*user_id.as_uuid(), true)
            .await
            .map_err(PortError::from)?;
        Ok(count as u64)
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        user_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Notification, PortError> {
        let query = format!(
            "UPDATE notifications SET is_read = true \
             WHERE notification_id = $1 AND user_id = $2 \
             RETURNING {NOTIFICATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, NotificationRow>(&query)
            .bind(Uuid::from(id))
            .bind(Uuid::from(user_id))
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
            .map_err(PortError::from)?
            .ok_or_else(|| PortError::not_found("Notification", id))?;

        row.into_notification().map_err(PortError::from)
    }

    async fn mark_all_read(
        &self,
        user_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<u64, PortError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE user_id = $1 AND NOT is_read",
        )
        .bind(Uuid::from(user_id))
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
        .map_err(PortError::from)?;
        Ok(result.rows_affected())
    }

    async fn delete(
        &self,
        id: NotificationId,
        user_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        let result = sqlx::query(
            "DELETE FROM notifications WHERE notification_id = $1 AND user_id = $2",
        )
        .bind(Uuid::from(id))
        .bind(Uuid::from(user_id))
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
        .map_err(PortError::from)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Notification", id));
        }
        Ok(())
    }

    async fn delete_read(
        &self,
        user_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<u64, PortError> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE user_id = $1 AND is_read")
                .bind(Uuid::from(user_id))
                .execute(&self.pool)
                .await
                .map_err(DatabaseError::from_sqlx)
                .map_err(PortError::from)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing_round_trip() {
        for kind in [
            NotificationKind::ClaimCreated,
            NotificationKind::ClaimStatusChanged,
            NotificationKind::TrafficVerification,
            NotificationKind::SystemAnnouncement,
        ] {
            assert_eq!(parse_kind(kind.as_str()).unwrap(), kind);
        }
        assert!(parse_kind("telegram").is_err());
    }

    #[test]
    fn test_priority_parsing_round_trip() {
        for priority in [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent] {
            assert_eq!(parse_priority(priority.as_str()).unwrap(), priority);
        }
        assert!(parse_priority("asap").is_err());
    }
}
