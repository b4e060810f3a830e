//! Weekly leaderboard reset job.
//!
//! Runs when forced or when invoked on the weekly slot (Sunday 00:00 UTC)
//! with the previous reset at least seven days old. The whole run sits
//! behind one failure boundary: an error aborts the remaining work and is
//! logged by the caller; rows already zeroed stay zeroed.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use sqlx::PgPool;

use crate::constants::{MSG_LEADERBOARD_RESET, RESET_INTERVAL_DAYS};
use crate::error::Result;
use crate::models::leaderboard::points_for;
use crate::models::LeaderboardReset;

/// Outcome of one reset-job run
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ResetOutcome {
    /// Whether the reset fired (false: the schedule condition did not hold)
    pub reset: bool,
    #[serde(rename = "entriesReset")]
    pub entries_reset: u64,
    #[serde(rename = "usersNotified")]
    pub users_notified: u64,
}

/// Read the last reset time, if any
pub async fn last_reset(pool: &PgPool) -> Result<Option<DateTime<Utc>>> {
    let marker = sqlx::query_as::<_, LeaderboardReset>(
        "SELECT id, last_reset FROM leaderboard_reset WHERE id = 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(marker.and_then(|m| m.last_reset))
}

/// Create the singleton marker row if missing and return the last reset time
pub async fn ensure_reset_marker(pool: &PgPool) -> Result<Option<DateTime<Utc>>> {
    sqlx::query("INSERT INTO leaderboard_reset (id, last_reset) VALUES (1, NULL) ON CONFLICT (id) DO NOTHING")
        .execute(pool)
        .await?;
    last_reset(pool).await
}

/// Whether a reset should fire at `now`
///
/// Forced runs always fire. Scheduled runs fire only on the weekly slot and
/// only when the previous reset is absent or at least seven days old.
pub fn is_reset_due(now: DateTime<Utc>, last_reset: Option<DateTime<Utc>>, force: bool) -> bool {
    if force {
        return true;
    }
    let on_slot = now.weekday() == Weekday::Sun && now.hour() == 0 && now.minute() == 0;
    on_slot
        && last_reset
            .map(|last| now - last >= Duration::days(RESET_INTERVAL_DAYS))
            .unwrap_or(true)
}

/// Refresh every entry's counts from the postings table
///
/// Only rows whose stored counts drifted are written. Runs on scheduled
/// (non-forced) invocations before the reset condition is evaluated.
async fn refresh_all_counts(pool: &PgPool) -> Result<()> {
    let entries: Vec<(i64, i32, i32)> = sqlx::query_as(
        "SELECT user_id, total_postings, verified_postings FROM leaderboard_entries",
    )
    .fetch_all(pool)
    .await?;

    for (user_id, old_total, old_verified) in entries {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM postings WHERE posted_by = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        let verified: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM postings WHERE posted_by = $1 AND verified = TRUE",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        let total = total as i32;
        let verified = verified as i32;

        if total != old_total || verified != old_verified {
            sqlx::query(
                "UPDATE leaderboard_entries \
                 SET total_postings = $2, verified_postings = $3, points = $4, last_updated = NOW() \
                 WHERE user_id = $1",
            )
            .bind(user_id)
            .bind(total)
            .bind(verified)
            .bind(points_for(total, verified))
            .execute(pool)
            .await?;
            tracing::info!(
                "Refreshed user {}: total postings {} -> {}, verified {} -> {}",
                user_id,
                old_total,
                total,
                old_verified,
                verified
            );
        } else {
            tracing::debug!(
                "No change for user {}: total postings {}, verified {}",
                user_id,
                total,
                verified
            );
        }
    }
    Ok(())
}

/// Run the reset job
///
/// Zeroing is deliberately one row at a time: a failure mid-run leaves the
/// rows already written as they are (at-most-once-per-row, not atomic
/// across rows).
pub async fn run(pool: &PgPool, force: bool) -> Result<ResetOutcome> {
    let now = Utc::now();
    let last = ensure_reset_marker(pool).await?;

    if !force {
        refresh_all_counts(pool).await?;
    }

    if !is_reset_due(now, last, force) {
        tracing::debug!("No reset needed at {}. Last reset: {:?}", now, last);
        return Ok(ResetOutcome {
            reset: false,
            entries_reset: 0,
            users_notified: 0,
        });
    }

    let user_ids: Vec<i64> = sqlx::query_scalar("SELECT user_id FROM leaderboard_entries")
        .fetch_all(pool)
        .await?;

    let mut entries_reset = 0u64;
    for user_id in user_ids {
        sqlx::query(
            "UPDATE leaderboard_entries \
             SET points = 0, total_postings = 0, verified_postings = 0, \
                 last_notified_rank = NULL, last_updated = NOW() \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        tracing::info!("Reset leaderboard entry for user {}", user_id);
        entries_reset += 1;
    }

    sqlx::query("UPDATE leaderboard_reset SET last_reset = $1 WHERE id = 1")
        .bind(now)
        .execute(pool)
        .await?;
    tracing::info!("Leaderboard reset at {} for all users", now);

    // Broadcast to every user; a reset is a genuine re-announcement, so
    // this bypasses the deduplicating delivery path
    let all_users: Vec<i64> = sqlx::query_scalar("SELECT id FROM users")
        .fetch_all(pool)
        .await?;
    let mut users_notified = 0u64;
    for user_id in &all_users {
        sqlx::query(
            "INSERT INTO notifications (user_id, kind, message) VALUES ($1, 'leaderboard', $2)",
        )
        .bind(user_id)
        .bind(MSG_LEADERBOARD_RESET)
        .execute(pool)
        .await?;
        users_notified += 1;
    }
    tracing::info!("Reset notifications sent to {} users", users_notified);

    Ok(ResetOutcome {
        reset: true,
        entries_reset,
        users_notified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sunday_midnight() -> DateTime<Utc> {
        // 2025-06-08 is a Sunday
        Utc.with_ymd_and_hms(2025, 6, 8, 0, 0, 30).unwrap()
    }

    #[test]
    fn test_force_always_fires() {
        let tuesday = Utc.with_ymd_and_hms(2025, 6, 10, 15, 30, 0).unwrap();
        assert!(is_reset_due(tuesday, None, true));
        assert!(is_reset_due(tuesday, Some(tuesday - Duration::hours(1)), true));
    }

    #[test]
    fn test_slot_with_no_previous_reset_fires() {
        assert!(is_reset_due(sunday_midnight(), None, false));
    }

    #[test]
    fn test_slot_with_old_reset_fires() {
        let now = sunday_midnight();
        assert!(is_reset_due(now, Some(now - Duration::days(7)), false));
        assert!(is_reset_due(now, Some(now - Duration::days(14)), false));
    }

    #[test]
    fn test_slot_with_recent_reset_does_not_fire() {
        let now = sunday_midnight();
        assert!(!is_reset_due(now, Some(now - Duration::days(6)), false));
    }

    #[test]
    fn test_off_slot_never_fires_unforced() {
        let sunday_noon = Utc.with_ymd_and_hms(2025, 6, 8, 12, 0, 0).unwrap();
        let monday_midnight = Utc.with_ymd_and_hms(2025, 6, 9, 0, 0, 0).unwrap();
        assert!(!is_reset_due(sunday_noon, None, false));
        assert!(!is_reset_due(monday_midnight, None, false));
    }
}
