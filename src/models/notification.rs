use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::NOTIFICATION_TTL_HOURS;

/// Category of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Follow,
    Rating,
    Leaderboard,
    Post,
}

/// Per-user inbox message
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub message: String,
    pub kind: NotificationKind,
    #[serde(rename = "isRead")]
    pub is_read: bool,
    /// Structured link payload, e.g. {"urls": {"postingUrl": "/postings/3"}}
    pub links: serde_json::Value,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Whether this notification is eligible for the expiry sweep
    ///
    /// Only read notifications expire, 24 hours after creation.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_read && now > self.created_at + Duration::hours(NOTIFICATION_TTL_HOURS)
    }

    /// Whether the link payload carries any urls
    pub fn has_links(&self) -> bool {
        self.links
            .get("urls")
            .and_then(|urls| urls.as_object())
            .map(|urls| !urls.is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notification(is_read: bool, age_hours: i64, links: serde_json::Value) -> Notification {
        let now = Utc::now();
        Notification {
            id: 1,
            user_id: 1,
            message: "test".to_string(),
            kind: NotificationKind::Leaderboard,
            is_read,
            links,
            created_at: now - Duration::hours(age_hours),
        }
    }

    #[test]
    fn test_unread_never_expires() {
        let n = notification(false, 48, json!({}));
        assert!(!n.is_expired(Utc::now()));
    }

    #[test]
    fn test_read_expires_after_ttl() {
        let now = Utc::now();
        assert!(notification(true, 25, json!({})).is_expired(now));
        assert!(!notification(true, 23, json!({})).is_expired(now));
    }

    #[test]
    fn test_has_links() {
        assert!(!notification(false, 0, json!({})).has_links());
        assert!(!notification(false, 0, json!({ "urls": {} })).has_links());
        assert!(
            notification(false, 0, json!({ "urls": { "leaderboardUrl": "/leaderboard" } }))
                .has_links()
        );
    }
}
