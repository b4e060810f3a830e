use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::reset::{self, ResetOutcome};
use crate::{notify, AppState};

/// Query parameters for admin endpoints
#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    /// Admin secret key for authentication
    pub key: String,
    /// Reset only: bypass the weekly schedule check
    #[serde(default)]
    pub force: bool,
}

/// Verify the admin key; admin endpoints stay disabled when none is set
fn require_admin(state: &AppState, key: &str) -> Result<()> {
    let admin_key = state
        .config
        .admin_secret_key
        .as_ref()
        .ok_or(AppError::Unauthorized)?;
    if key != admin_key {
        tracing::warn!("Invalid admin key attempt");
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// Database statistics response
#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    pub user_count: i64,
    pub posting_count: i64,
    pub notification_count: i64,
}

/// Admin stats endpoint
///
/// Returns row counts for monitoring and diagnostics.
///
/// GET /admin/stats?key=<admin_secret_key>
pub async fn admin_stats(
    State(state): State<AppState>,
    Query(params): Query<AdminQuery>,
) -> Result<Json<AdminStatsResponse>> {
    require_admin(&state, &params.key)?;

    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&state.pool)
        .await?;
    let posting_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM postings")
        .fetch_one(&state.pool)
        .await?;
    let notification_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
        .fetch_one(&state.pool)
        .await?;

    tracing::info!(
        "Admin stats requested: {} users, {} postings, {} notifications",
        user_count,
        posting_count,
        notification_count
    );

    Ok(Json(AdminStatsResponse {
        user_count,
        posting_count,
        notification_count,
    }))
}

/// Run the leaderboard reset job
///
/// Invoked on demand or by an external scheduler. `force=true` bypasses
/// the weekly schedule check. The job body is one failure boundary: an
/// error aborts the remaining work for this run and surfaces as a 500.
///
/// POST /admin/leaderboard/reset?key=<admin_secret_key>[&force=true]
pub async fn reset_leaderboard(
    State(state): State<AppState>,
    Query(params): Query<AdminQuery>,
) -> Result<Json<ResetOutcome>> {
    require_admin(&state, &params.key)?;

    let outcome = reset::run(&state.pool, params.force).await.map_err(|err| {
        tracing::error!("Error during leaderboard update/reset: {}", err);
        err
    })?;

    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub status: &'static str,
    pub deleted: u64,
}

/// Delete read notifications older than 24 hours across all users
///
/// POST /admin/notifications/sweep?key=<admin_secret_key>
pub async fn sweep_notifications(
    State(state): State<AppState>,
    Query(params): Query<AdminQuery>,
) -> Result<Json<SweepResponse>> {
    require_admin(&state, &params.key)?;

    let deleted = notify::sweep_all(&state.pool).await?;

    Ok(Json(SweepResponse {
        status: "success",
        deleted,
    }))
}
