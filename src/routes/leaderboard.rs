use axum::{extract::State, Json};
use serde::Serialize;

use crate::constants::LEADERBOARD_LIMIT;
use crate::error::Result;
use crate::AppState;

/// One row of the leaderboard listing
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct LeaderboardRow {
    pub rank: i64,
    pub username: String,
    pub points: i32,
    #[serde(rename = "totalPostings")]
    pub total_postings: i32,
    #[serde(rename = "verifiedPostings")]
    pub verified_postings: i32,
    #[sqlx(skip)]
    pub badge: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardRow>,
    #[serde(rename = "maxLimit")]
    pub max_limit: i64,
}

/// Badge for the podium ranks
pub fn get_badge(rank: i64) -> Option<&'static str> {
    match rank {
        1 => Some("gold"),
        2 => Some("silver"),
        3 => Some("bronze"),
        _ => None,
    }
}

/// Leaderboard listing: top public users with at least one posting
///
/// Ranks use the strict-greater-count formula (RANK() over descending
/// points), so users with equal points share a rank number.
pub async fn leaderboard(State(state): State<AppState>) -> Result<Json<LeaderboardResponse>> {
    let mut entries = sqlx::query_as::<_, LeaderboardRow>(
        "SELECT RANK() OVER (ORDER BY e.points DESC) AS rank, \
                u.username, e.points, e.total_postings, e.verified_postings \
         FROM leaderboard_entries e \
         JOIN users u ON u.id = e.user_id \
         WHERE u.is_public = TRUE AND e.total_postings > 0 \
         ORDER BY e.points DESC, e.total_postings DESC \
         LIMIT $1",
    )
    .bind(LEADERBOARD_LIMIT)
    .fetch_all(&state.pool)
    .await?;

    for entry in &mut entries {
        entry.badge = get_badge(entry.rank);
    }

    Ok(Json(LeaderboardResponse {
        entries,
        max_limit: LEADERBOARD_LIMIT,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_badge() {
        assert_eq!(get_badge(1), Some("gold"));
        assert_eq!(get_badge(2), Some("silver"));
        assert_eq!(get_badge(3), Some("bronze"));
        assert_eq!(get_badge(4), None);
        assert_eq!(get_badge(10), None);
    }
}
