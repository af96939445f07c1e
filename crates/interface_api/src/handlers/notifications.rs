//! Notification inbox handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use core_kernel::NotificationId;
use domain_notifications::{compose, ListOptions, NewNotification, NotificationKind};
use domain_users::{UserQuery, UserRole};

use crate::auth::AuthUser;
use crate::dto::notifications::{
    BroadcastRequest, InboxQuery, InboxResponse, NotificationResponse, UnreadCountResponse,
};
use crate::error::ApiError;
use crate::AppState;

/// Lists the caller's inbox with pagination and an optional unread filter
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<InboxQuery>,
) -> Result<Json<InboxResponse>, ApiError> {
    let options = ListOptions {
        page: query.page.unwrap_or(1).max(1),
        per_page: query.limit.unwrap_or(20).clamp(1, 100),
        unread_only: query.unread_only.unwrap_or(false),
    };
    let page = state.inbox.list(auth.id, options, None).await?;
    Ok(Json(InboxResponse::from(&page)))
}

/// Returns the caller's unread count
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let count = state.inbox.unread_count(auth.id, None).await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// Marks one notification read
pub async fn mark_as_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let notification = state
        .inbox
        .mark_read(NotificationId::from_uuid(id), auth.id, None)
        .await?;
    Ok(Json(NotificationResponse::from(&notification)))
}

/// Marks every unread notification read
pub async fn mark_all_as_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = state.inbox.mark_all_read(auth.id, None).await?;
    Ok(Json(json!({ "updated": updated })))
}

/// Deletes one notification
pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .inbox
        .delete(NotificationId::from_uuid(id), auth.id, None)
        .await?;
    Ok(Json(json!({ "deleted": true })))
}

/// Deletes every read notification
pub async fn delete_all_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state.inbox.delete_read(auth.id, None).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// Admin broadcast to everyone, or to one role
pub async fn send_broadcast(
    State(state): State<AppState>,
    Json(request): Json<BroadcastRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let mut query = UserQuery::default();
    match request.target_role.as_deref() {
        None | Some("all") => {}
        Some(role) => {
            let role: UserRole = role.parse().map_err(ApiError::BadRequest)?;
            query = UserQuery::by_role(role);
        }
    }

    let recipients = state.users.find_users(query, None).await?;
    let notifications =
        compose::system_announcement(&recipients, &request.title, &request.message);
    let sent = state.notifier.dispatch_all(notifications, None).await?;

    Ok(Json(json!({ "sent": sent.len() })))
}

/// Sends the caller a test notification to verify delivery end to end
pub async fn test_notification(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let notification = state
        .notifier
        .dispatch(
            NewNotification::to(
                auth.id,
                NotificationKind::SystemAnnouncement,
                "Test Notification",
                "This is a test notification to verify the system is working correctly.",
            ),
            None,
        )
        .await?;
    Ok(Json(NotificationResponse::from(&notification)))
}
