use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{NotificationKind, Review};
use crate::routes::users::fetch_user_by_id;
use crate::{notify, AppState};

#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitReviewResponse {
    pub status: &'static str,
    pub review: Review,
}

/// Submit or update a review on a posting
///
/// One review per user per posting; a second submission replaces the first
/// and does not re-notify the owner.
pub async fn submit_review(
    State(state): State<AppState>,
    Path(posting_id): Path<i64>,
    Json(payload): Json<SubmitReviewRequest>,
) -> Result<Json<SubmitReviewResponse>> {
    if !Review::validate_rating(payload.rating) {
        return Err(AppError::InvalidInput(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    let reviewer = fetch_user_by_id(&state, payload.user_id).await?;

    let posting_owner: Option<i64> =
        sqlx::query_scalar("SELECT posted_by FROM postings WHERE id = $1")
            .bind(posting_id)
            .fetch_optional(&state.pool)
            .await?;
    let posting_owner = posting_owner.ok_or(AppError::NotFound)?;

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM reviews WHERE posting_id = $1 AND user_id = $2")
            .bind(posting_id)
            .bind(reviewer.id)
            .fetch_optional(&state.pool)
            .await?;
    let created = existing.is_none();

    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (posting_id, user_id, rating, comment) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (posting_id, user_id) \
         DO UPDATE SET rating = EXCLUDED.rating, comment = EXCLUDED.comment \
         RETURNING *",
    )
    .bind(posting_id)
    .bind(reviewer.id)
    .bind(payload.rating)
    .bind(payload.comment.as_deref())
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(
        "Review {} on posting {} by {} ({} stars)",
        if created { "created" } else { "updated" },
        posting_id,
        reviewer.username,
        payload.rating
    );

    // Notify the posting owner on a new review only (best-effort)
    if created {
        if let Err(err) =
            notify_rating(&state, posting_owner, &reviewer.username, payload.rating, posting_id)
                .await
        {
            tracing::error!(
                "Error creating rating notification for user {}: {}",
                posting_owner,
                err
            );
        }
    }

    Ok(Json(SubmitReviewResponse {
        status: "success",
        review,
    }))
}

/// Deliver a rating notification to the posting owner if opted in
async fn notify_rating(
    state: &AppState,
    owner_id: i64,
    rater: &str,
    rating: i32,
    posting_id: i64,
) -> Result<()> {
    let opted_in: Option<bool> = sqlx::query_scalar("SELECT notify_rating FROM users WHERE id = $1")
        .bind(owner_id)
        .fetch_optional(&state.pool)
        .await?;
    if !opted_in.unwrap_or(false) {
        return Ok(());
    }

    let message = format!("{} rated your posting {} stars.", rater, rating);
    notify::deliver(
        &state.pool,
        owner_id,
        NotificationKind::Rating,
        &message,
        json!({ "urls": { "ratingUrl": format!("/postings/{}", posting_id) } }),
    )
    .await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct DeleteReviewRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteReviewResponse {
    pub status: &'static str,
    pub deleted: bool,
}

/// Delete the caller's review on a posting
pub async fn delete_review(
    State(state): State<AppState>,
    Path(posting_id): Path<i64>,
    Json(payload): Json<DeleteReviewRequest>,
) -> Result<Json<DeleteReviewResponse>> {
    let result = sqlx::query("DELETE FROM reviews WHERE posting_id = $1 AND user_id = $2")
        .bind(posting_id)
        .bind(payload.user_id)
        .execute(&state.pool)
        .await?;

    let deleted = result.rows_affected() > 0;
    if deleted {
        tracing::info!(
            "Review on posting {} deleted by user {}",
            posting_id,
            payload.user_id
        );
    }

    Ok(Json(DeleteReviewResponse {
        status: "success",
        deleted,
    }))
}
