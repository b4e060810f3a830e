//! Leaderboard scoring engine and rank-change notifier.
//!
//! Points are always recomputed from the user's current posting counts,
//! never adjusted incrementally, so a lost or repeated trigger can not make
//! the stored totals drift.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use sqlx::PgPool;

use crate::constants::{RANK_MILESTONES, RESET_GRACE_HOURS, TOP_RANK_WINDOW};
use crate::error::Result;
use crate::models::leaderboard::points_for;
use crate::models::{LeaderboardEntry, NotificationKind};
use crate::{notify, reset};

/// Result of a score recomputation
#[derive(Debug, Clone, Copy)]
pub struct ScoreUpdate {
    pub points: i32,
    pub total_postings: i32,
    pub verified_postings: i32,
    /// Whether the stored counts differed from the recomputed ones
    pub changed: bool,
}

/// Whether recomputation is currently suppressed by a recent global reset
pub fn within_grace_window(last_reset: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_reset {
        Some(last_reset) => now <= last_reset + Duration::hours(RESET_GRACE_HOURS),
        None => false,
    }
}

/// Recompute a user's leaderboard row from their current postings
///
/// Returns `None` when the recomputation was skipped because of the
/// post-reset grace window. Otherwise the row is locked for the duration of
/// the read-modify-write so two racing triggers for the same user cannot
/// lose an update.
pub async fn recompute_user_score(pool: &PgPool, user_id: i64) -> Result<Option<ScoreUpdate>> {
    let last_reset = reset::last_reset(pool).await?;
    if within_grace_window(last_reset, Utc::now()) {
        tracing::debug!(
            "Skipped leaderboard update for user {} due to recent reset at {:?}",
            user_id,
            last_reset
        );
        return Ok(None);
    }

    let mut tx = pool.begin().await?;

    // Ensure the row exists, then take the row lock
    sqlx::query("INSERT INTO leaderboard_entries (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let entry = sqlx::query_as::<_, LeaderboardEntry>(
        "SELECT user_id, points, total_postings, verified_postings, last_notified_rank, \
                last_updated \
         FROM leaderboard_entries WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    let total_postings: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM postings WHERE posted_by = $1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
    let verified_postings: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM postings WHERE posted_by = $1 AND verified = TRUE",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    let total_postings = total_postings as i32;
    let verified_postings = verified_postings as i32;
    let points = points_for(total_postings, verified_postings);
    let changed =
        entry.total_postings != total_postings || entry.verified_postings != verified_postings;

    if changed {
        sqlx::query(
            "UPDATE leaderboard_entries \
             SET points = $2, total_postings = $3, verified_postings = $4, last_updated = NOW() \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(points)
        .bind(total_postings)
        .bind(verified_postings)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    if changed {
        tracing::info!(
            "Updated leaderboard entry for user {}: {} postings ({} verified), {} points",
            user_id,
            total_postings,
            verified_postings,
            points
        );
    }

    Ok(Some(ScoreUpdate {
        points,
        total_postings,
        verified_postings,
        changed,
    }))
}

/// Rank by the strict-greater-count formula; ties share a rank
pub async fn rank_of(pool: &PgPool, points: i32) -> Result<i64> {
    let greater: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM leaderboard_entries WHERE points > $1")
            .bind(points)
            .fetch_one(pool)
            .await?;
    Ok(greater + 1)
}

/// Notification-worthy rank movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankEvent {
    /// First observation inside the top 10
    EnteredTopTen,
    /// Improvement onto one of the watched milestone ranks
    Milestone,
    /// Fell from the top 3
    DroppedFromTopThree,
}

impl RankEvent {
    /// User-facing message for this event at the given rank
    pub fn message(self, rank: i64) -> String {
        match self {
            RankEvent::EnteredTopTen => format!(
                "You have entered the top 10! You are ranked #{} on the leaderboard!",
                rank
            ),
            RankEvent::Milestone => {
                format!("You are now ranked #{} on the leaderboard!", rank)
            }
            RankEvent::DroppedFromTopThree => {
                format!("You have dropped below top 3. Current rank: #{}.", rank)
            }
        }
    }
}

/// Decide whether a rank change warrants a notification
///
/// Returns the event (if any) and the rank to remember for the next
/// observation. The remembered rank is cleared once the user is outside the
/// top 10, so re-entering the window counts as a first observation again.
pub fn rank_event(remembered: Option<i64>, rank: i64) -> (Option<RankEvent>, Option<i64>) {
    let event = match remembered {
        None => (rank <= TOP_RANK_WINDOW).then_some(RankEvent::EnteredTopTen),
        Some(prev) => {
            if rank != prev && RANK_MILESTONES.contains(&rank) && rank < prev {
                Some(RankEvent::Milestone)
            } else if prev <= 3 && rank > 3 {
                Some(RankEvent::DroppedFromTopThree)
            } else {
                None
            }
        }
    };

    let next_remembered = if rank > TOP_RANK_WINDOW {
        None
    } else if event.is_some() {
        Some(rank)
    } else {
        remembered
    };

    (event, next_remembered)
}

/// Check rank milestones for a user after a score write and notify
///
/// Only runs for users who opted in to leaderboard notifications. The
/// previously-notified rank is persisted on the leaderboard row.
pub async fn notify_rank_change(pool: &PgPool, user_id: i64) -> Result<()> {
    let opted_in: Option<bool> =
        sqlx::query_scalar("SELECT notify_leaderboard FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    if !opted_in.unwrap_or(false) {
        return Ok(());
    }

    let row: Option<(i32, Option<i32>)> = sqlx::query_as(
        "SELECT points, last_notified_rank FROM leaderboard_entries WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    let Some((points, remembered)) = row else {
        return Ok(());
    };

    let rank = rank_of(pool, points).await?;
    let remembered = remembered.map(i64::from);
    let (event, next_remembered) = rank_event(remembered, rank);

    if let Some(event) = event {
        notify::deliver(
            pool,
            user_id,
            NotificationKind::Leaderboard,
            &event.message(rank),
            json!({ "urls": { "leaderboardUrl": "/leaderboard" } }),
        )
        .await?;
    }

    if next_remembered != remembered {
        sqlx::query("UPDATE leaderboard_entries SET last_notified_rank = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(next_remembered.map(|r| r as i32))
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Recompute a user's score and run the rank notifier when it changed
///
/// This is the entry point posting create/delete handlers call. Callers
/// treat failures as best-effort: the triggering write has already
/// succeeded by the time this runs.
pub async fn refresh_user(pool: &PgPool, user_id: i64) -> Result<()> {
    match recompute_user_score(pool, user_id).await? {
        Some(update) if update.changed => notify_rank_change(pool, user_id).await,
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grace_window() {
        let now = Utc::now();
        assert!(!within_grace_window(None, now));
        assert!(within_grace_window(Some(now - Duration::hours(1)), now));
        assert!(within_grace_window(Some(now - Duration::hours(24)), now));
        assert!(!within_grace_window(
            Some(now - Duration::hours(25)),
            now
        ));
    }

    #[test]
    fn test_first_observation_inside_top_ten() {
        let (event, remembered) = rank_event(None, 7);
        assert_eq!(event, Some(RankEvent::EnteredTopTen));
        assert_eq!(remembered, Some(7));
    }

    #[test]
    fn test_first_observation_outside_top_ten() {
        let (event, remembered) = rank_event(None, 11);
        assert_eq!(event, None);
        assert_eq!(remembered, None);
    }

    #[test]
    fn test_unchanged_rank_does_not_renotify() {
        let (event, remembered) = rank_event(Some(7), 7);
        assert_eq!(event, None);
        assert_eq!(remembered, Some(7));
    }

    #[test]
    fn test_milestone_improvement() {
        let (event, remembered) = rank_event(Some(7), 3);
        assert_eq!(event, Some(RankEvent::Milestone));
        assert_eq!(remembered, Some(3));
    }

    #[test]
    fn test_non_milestone_improvement_is_silent() {
        // 8 -> 5 improves but 5 is not a watched rank
        let (event, remembered) = rank_event(Some(8), 5);
        assert_eq!(event, None);
        assert_eq!(remembered, Some(8));
    }

    #[test]
    fn test_worsening_onto_milestone_is_silent() {
        // 1 -> 2 lands on a milestone but is not an improvement
        let (event, remembered) = rank_event(Some(1), 2);
        assert_eq!(event, None);
        assert_eq!(remembered, Some(1));
    }

    #[test]
    fn test_drop_from_top_three() {
        let (event, remembered) = rank_event(Some(2), 6);
        assert_eq!(event, Some(RankEvent::DroppedFromTopThree));
        assert_eq!(remembered, Some(6));
    }

    #[test]
    fn test_drop_out_of_window_clears_remembered() {
        let (event, remembered) = rank_event(Some(3), 12);
        assert_eq!(event, Some(RankEvent::DroppedFromTopThree));
        assert_eq!(remembered, None);
    }

    #[test]
    fn test_mid_table_exit_clears_remembered_silently() {
        let (event, remembered) = rank_event(Some(8), 15);
        assert_eq!(event, None);
        assert_eq!(remembered, None);
    }

    #[test]
    fn test_messages_include_rank() {
        assert!(RankEvent::EnteredTopTen.message(9).contains("#9"));
        assert!(RankEvent::Milestone.message(1).contains("#1"));
        assert!(RankEvent::DroppedFromTopThree.message(4).contains("#4"));
    }
}
