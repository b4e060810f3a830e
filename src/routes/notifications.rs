use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Notification;
use crate::{notify, AppState};

#[derive(Debug, Deserialize)]
pub struct InboxParams {
    #[serde(rename = "userId")]
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct InboxResponse {
    pub notifications: Vec<Notification>,
}

/// List a user's notifications, newest first
///
/// Loading the inbox lazily deletes the user's read notifications older
/// than 24 hours before returning the rest.
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(params): Query<InboxParams>,
) -> Result<Json<InboxResponse>> {
    let notifications = notify::inbox(&state.pool, params.user_id).await?;
    Ok(Json(InboxResponse { notifications }))
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    #[serde(rename = "unreadCount")]
    pub unread_count: i64,
}

/// Count a user's unread notifications (polled by the navbar badge)
pub async fn check_notifications(
    State(state): State<AppState>,
    Query(params): Query<InboxParams>,
) -> Result<Json<UnreadCountResponse>> {
    let unread_count = notify::unread_count(&state.pool, params.user_id).await?;
    Ok(Json(UnreadCountResponse { unread_count }))
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// When absent, every unread notification is marked read
    #[serde(rename = "notificationId")]
    pub notification_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Mark one notification as read, or all of them when no id is given
///
/// The bulk path also sweeps the user's expired notifications.
pub async fn mark_notifications_read(
    State(state): State<AppState>,
    Json(payload): Json<MarkReadRequest>,
) -> Result<Json<StatusResponse>> {
    match payload.notification_id {
        Some(notification_id) => {
            notify::mark_read(&state.pool, payload.user_id, notification_id).await?;
        }
        None => {
            notify::mark_all_read(&state.pool, payload.user_id).await?;
        }
    }
    Ok(Json(StatusResponse { status: "success" }))
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Delete all of a user's notifications
pub async fn clear_notifications(
    State(state): State<AppState>,
    Json(payload): Json<InboxParams>,
) -> Result<Json<ClearResponse>> {
    notify::clear_all(&state.pool, payload.user_id).await?;
    Ok(Json(ClearResponse {
        status: "success",
        message: "All notifications cleared.",
    }))
}
