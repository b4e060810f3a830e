use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{POINTS_PER_POSTING, POINTS_PER_VERIFIED_POSTING};

/// Per-user leaderboard row (1:1 with users)
///
/// The counts are always recomputed from the postings table; `points` is
/// derived from them and never adjusted incrementally.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub points: i32,
    #[serde(rename = "totalPostings")]
    pub total_postings: i32,
    #[serde(rename = "verifiedPostings")]
    pub verified_postings: i32,
    /// Last rank the user was notified about; cleared once they fall
    /// outside the top 10
    #[serde(rename = "lastNotifiedRank")]
    pub last_notified_rank: Option<i32>,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}

/// Derive points from posting counts
///
/// Verified postings earn their base points plus the verified bonus.
pub fn points_for(total_postings: i32, verified_postings: i32) -> i32 {
    total_postings * POINTS_PER_POSTING + verified_postings * POINTS_PER_VERIFIED_POSTING
}

/// Singleton row recording when the leaderboard was last reset
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaderboardReset {
    pub id: i32,
    #[serde(rename = "lastReset")]
    pub last_reset: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_formula() {
        assert_eq!(points_for(0, 0), 0);
        assert_eq!(points_for(1, 0), 10);
        assert_eq!(points_for(1, 1), 30);
        // 3 postings, 1 verified
        assert_eq!(points_for(3, 1), 50);
    }

    #[test]
    fn test_points_after_verified_delete() {
        // 3 postings (1 verified) = 50, deleting the verified one leaves 20
        assert_eq!(points_for(3, 1), 50);
        assert_eq!(points_for(2, 0), 20);
    }
}
