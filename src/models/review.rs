use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Star rating left on a posting, one per user per posting
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    #[serde(rename = "postingId")]
    pub posting_id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Validate a star rating (1-5)
    pub fn validate_rating(rating: i32) -> bool {
        (1..=5).contains(&rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rating() {
        for rating in 1..=5 {
            assert!(Review::validate_rating(rating));
        }
        assert!(!Review::validate_rating(0));
        assert!(!Review::validate_rating(6));
        assert!(!Review::validate_rating(-3));
    }
}
