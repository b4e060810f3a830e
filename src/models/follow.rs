use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Directed follow edge, unique per (follower, followed) pair
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub id: i64,
    #[serde(rename = "followerId")]
    pub follower_id: i64,
    #[serde(rename = "followedId")]
    pub followed_id: i64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}
