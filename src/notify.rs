//! Notification inbox: deduplicated delivery, read state and expiry sweeps.
//!
//! A notification is keyed by (user, kind, message) so repeated triggers of
//! the same event re-deliver idempotently. Read notifications expire 24
//! hours after creation; expiry is a lazy sweep on inbox access or an
//! explicit housekeeping pass, never a background timer.

use serde_json::Value;
use sqlx::PgPool;

use crate::constants::NOTIFICATION_TTL_HOURS;
use crate::error::{AppError, Result};
use crate::models::{Notification, NotificationKind};

/// What `deliver` did with the requested notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// No matching row existed; a new one was inserted
    Created,
    /// A matching row without links existed; its payload was backfilled
    Backfilled,
    /// A matching row with links already existed; nothing was written
    Duplicate,
}

/// Whether a link payload carries no urls
fn links_empty(links: &Value) -> bool {
    links
        .get("urls")
        .and_then(|urls| urls.as_object())
        .map(|urls| urls.is_empty())
        .unwrap_or(true)
}

/// Append a notification, deduplicating on (user, kind, message)
///
/// A second trigger for the same triple never creates a second row: it only
/// backfills the link payload when the existing row has none.
pub async fn deliver(
    pool: &PgPool,
    user_id: i64,
    kind: NotificationKind,
    message: &str,
    links: Value,
) -> Result<Delivery> {
    let existing: Option<(i64, Value)> = sqlx::query_as(
        "SELECT id, links FROM notifications \
         WHERE user_id = $1 AND kind = $2 AND message = $3 \
         ORDER BY created_at LIMIT 1",
    )
    .bind(user_id)
    .bind(kind)
    .bind(message)
    .fetch_optional(pool)
    .await?;

    match existing {
        Some((id, existing_links)) => {
            if links_empty(&existing_links) && !links_empty(&links) {
                sqlx::query("UPDATE notifications SET links = $2 WHERE id = $1")
                    .bind(id)
                    .bind(links)
                    .execute(pool)
                    .await?;
                tracing::debug!(
                    "Backfilled links on existing {:?} notification {} for user {}",
                    kind,
                    id,
                    user_id
                );
                Ok(Delivery::Backfilled)
            } else {
                tracing::warn!(
                    "Existing {:?} notification already present for user {}",
                    kind,
                    user_id
                );
                Ok(Delivery::Duplicate)
            }
        }
        None => {
            sqlx::query(
                "INSERT INTO notifications (user_id, kind, message, links) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(user_id)
            .bind(kind)
            .bind(message)
            .bind(links)
            .execute(pool)
            .await?;
            tracing::info!("Created {:?} notification for user {}", kind, user_id);
            Ok(Delivery::Created)
        }
    }
}

/// Delete one user's read notifications older than the TTL
pub async fn sweep_user(pool: &PgPool, user_id: i64) -> Result<u64> {
    let result = sqlx::query(
        "DELETE FROM notifications \
         WHERE user_id = $1 AND is_read = TRUE \
           AND created_at < NOW() - make_interval(hours => $2)",
    )
    .bind(user_id)
    .bind(NOTIFICATION_TTL_HOURS as i32)
    .execute(pool)
    .await?;
    if result.rows_affected() > 0 {
        tracing::info!(
            "Cleared {} expired notifications for user {}",
            result.rows_affected(),
            user_id
        );
    }
    Ok(result.rows_affected())
}

/// Delete read+expired notifications across all users (housekeeping pass)
pub async fn sweep_all(pool: &PgPool) -> Result<u64> {
    let result = sqlx::query(
        "DELETE FROM notifications \
         WHERE is_read = TRUE AND created_at < NOW() - make_interval(hours => $1)",
    )
    .bind(NOTIFICATION_TTL_HOURS as i32)
    .execute(pool)
    .await?;
    tracing::info!("Expiry sweep removed {} notifications", result.rows_affected());
    Ok(result.rows_affected())
}

/// Load a user's inbox newest-first, sweeping expired rows first
pub async fn inbox(pool: &PgPool, user_id: i64) -> Result<Vec<Notification>> {
    sweep_user(pool, user_id).await?;

    let notifications = sqlx::query_as::<_, Notification>(
        "SELECT id, user_id, message, kind, is_read, links, created_at \
         FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(notifications)
}

/// Count a user's unread notifications
pub async fn unread_count(pool: &PgPool, user_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Mark a single notification as read; 404 when it is not the user's
pub async fn mark_read(pool: &PgPool, user_id: i64, notification_id: i64) -> Result<()> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2",
    )
    .bind(notification_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!(
        "Notification {} marked as read for user {}",
        notification_id,
        user_id
    );
    Ok(())
}

/// Mark all of a user's notifications as read, then sweep expired rows
pub async fn mark_all_read(pool: &PgPool, user_id: i64) -> Result<()> {
    let result =
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE")
            .bind(user_id)
            .execute(pool)
            .await?;
    if result.rows_affected() > 0 {
        tracing::info!(
            "All unread notifications marked as read for user {}",
            user_id
        );
    }
    sweep_user(pool, user_id).await?;
    Ok(())
}

/// Delete all of a user's notifications
pub async fn clear_all(pool: &PgPool, user_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    tracing::info!("All notifications cleared for user {}", user_id);
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_links_empty() {
        assert!(links_empty(&json!({})));
        assert!(links_empty(&json!({ "urls": {} })));
        assert!(links_empty(&json!(null)));
        assert!(!links_empty(
            &json!({ "urls": { "followerUrl": "/users/ada" } })
        ));
    }
}
