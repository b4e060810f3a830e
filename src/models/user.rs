use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_USERNAME_LEN;

/// User account with notification preferences
///
/// Preferences are all opt-in: a user receives no notifications until they
/// enable the matching flag.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Whether the user appears on the leaderboard
    #[serde(rename = "isPublic")]
    pub is_public: bool,
    #[serde(rename = "notifyFollow")]
    pub notify_follow: bool,
    #[serde(rename = "notifyRating")]
    pub notify_rating: bool,
    #[serde(rename = "notifyLeaderboard")]
    pub notify_leaderboard: bool,
    #[serde(rename = "notifyPost")]
    pub notify_post: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Validate a username: 1-30 characters of letters, digits, '-' or '_'
    pub fn validate_username(username: &str) -> bool {
        !username.is_empty()
            && username.len() <= MAX_USERNAME_LEN
            && username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(User::validate_username("corper_01"));
        assert!(User::validate_username("a"));
        assert!(User::validate_username(&"a".repeat(30)));

        // Empty
        assert!(!User::validate_username(""));

        // Too long
        assert!(!User::validate_username(&"a".repeat(31)));

        // Invalid characters
        assert!(!User::validate_username("user name"));
        assert!(!User::validate_username("user@host"));
    }
}
