use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Posting;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BookmarkRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ToggleBookmarkResponse {
    pub status: &'static str,
    pub action: &'static str,
    pub message: &'static str,
}

/// Bookmark or un-bookmark a posting (toggle)
pub async fn toggle_bookmark(
    State(state): State<AppState>,
    Path(posting_id): Path<i64>,
    Json(payload): Json<BookmarkRequest>,
) -> Result<Json<ToggleBookmarkResponse>> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM postings WHERE id = $1")
        .bind(posting_id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound);
    }

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM bookmarks WHERE user_id = $1 AND posting_id = $2")
            .bind(payload.user_id)
            .bind(posting_id)
            .fetch_optional(&state.pool)
            .await?;

    let (action, message) = match existing {
        Some(id) => {
            sqlx::query("DELETE FROM bookmarks WHERE id = $1")
                .bind(id)
                .execute(&state.pool)
                .await?;
            ("removed", "Bookmark removed.")
        }
        None => {
            sqlx::query("INSERT INTO bookmarks (user_id, posting_id) VALUES ($1, $2)")
                .bind(payload.user_id)
                .bind(posting_id)
                .execute(&state.pool)
                .await?;
            ("added", "Bookmark added.")
        }
    };

    tracing::info!(
        "User {} {} bookmark for posting {}",
        payload.user_id,
        action,
        posting_id
    );

    Ok(Json(ToggleBookmarkResponse {
        status: "success",
        action,
        message,
    }))
}

#[derive(Debug, Deserialize)]
pub struct BookmarkParams {
    #[serde(rename = "userId")]
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CheckBookmarkResponse {
    pub status: &'static str,
    #[serde(rename = "isBookmarked")]
    pub is_bookmarked: bool,
}

/// Check whether a user bookmarked a posting
pub async fn check_bookmark(
    State(state): State<AppState>,
    Path(posting_id): Path<i64>,
    Query(params): Query<BookmarkParams>,
) -> Result<Json<CheckBookmarkResponse>> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM postings WHERE id = $1")
        .bind(posting_id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound);
    }

    let is_bookmarked: Option<i64> =
        sqlx::query_scalar("SELECT id FROM bookmarks WHERE user_id = $1 AND posting_id = $2")
            .bind(params.user_id)
            .bind(posting_id)
            .fetch_optional(&state.pool)
            .await?;

    Ok(Json(CheckBookmarkResponse {
        status: "success",
        is_bookmarked: is_bookmarked.is_some(),
    }))
}

#[derive(Debug, Serialize)]
pub struct BookmarksListResponse {
    pub bookmarks: Vec<Posting>,
}

/// List a user's bookmarked postings, most recently bookmarked first
pub async fn bookmarks_list(
    State(state): State<AppState>,
    Query(params): Query<BookmarkParams>,
) -> Result<Json<BookmarksListResponse>> {
    let bookmarks = sqlx::query_as::<_, Posting>(
        "SELECT p.* FROM bookmarks b \
         JOIN postings p ON p.id = b.posting_id \
         WHERE b.user_id = $1 ORDER BY b.created_at DESC",
    )
    .bind(params.user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(BookmarksListResponse { bookmarks }))
}
