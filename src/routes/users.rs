use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::constants::ERR_INVALID_USERNAME;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub id: i64,
}

/// Register a new user
///
/// Creates a user with all notification preferences off. Returns 409
/// Conflict when the username is taken.
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    if !User::validate_username(&payload.username) {
        tracing::warn!("Invalid username format: {}", payload.username);
        return Err(AppError::InvalidInput(ERR_INVALID_USERNAME.to_string()));
    }

    let id: i64 = sqlx::query_scalar("INSERT INTO users (username) VALUES ($1) RETURNING id")
        .bind(&payload.username)
        .fetch_one(&state.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                tracing::info!("Username already taken: {}", payload.username);
                AppError::UserAlreadyExists
            }
            other => AppError::Database(other),
        })?;

    tracing::info!("New user registered: {} (id {})", payload.username, id);

    Ok(Json(RegisterResponse { success: true, id }))
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    #[serde(rename = "postsCount")]
    pub posts_count: i64,
    #[serde(rename = "followersCount")]
    pub followers_count: i64,
    #[serde(rename = "followingCount")]
    pub following_count: i64,
}

/// Fetch a user profile with posting and follow counts
pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ProfileResponse>> {
    let user = fetch_user_by_name(&state, &username).await?;

    let posts_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM postings WHERE posted_by = $1")
        .bind(user.id)
        .fetch_one(&state.pool)
        .await?;
    let followers_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE followed_id = $1")
            .bind(user.id)
            .fetch_one(&state.pool)
            .await?;
    let following_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
            .bind(user.id)
            .fetch_one(&state.pool)
            .await?;

    Ok(Json(ProfileResponse {
        user,
        posts_count,
        followers_count,
        following_count,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PreferencesRequest {
    #[serde(rename = "isPublic")]
    pub is_public: Option<bool>,
    #[serde(rename = "notifyFollow")]
    pub notify_follow: Option<bool>,
    #[serde(rename = "notifyRating")]
    pub notify_rating: Option<bool>,
    #[serde(rename = "notifyLeaderboard")]
    pub notify_leaderboard: Option<bool>,
    #[serde(rename = "notifyPost")]
    pub notify_post: Option<bool>,
}

/// Update notification preferences and leaderboard visibility
///
/// Omitted fields keep their current value.
pub async fn update_preferences(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<PreferencesRequest>,
) -> Result<Json<User>> {
    let user = fetch_user_by_name(&state, &username).await?;

    let updated = sqlx::query_as::<_, User>(
        "UPDATE users SET \
             is_public = COALESCE($2, is_public), \
             notify_follow = COALESCE($3, notify_follow), \
             notify_rating = COALESCE($4, notify_rating), \
             notify_leaderboard = COALESCE($5, notify_leaderboard), \
             notify_post = COALESCE($6, notify_post) \
         WHERE id = $1 \
         RETURNING id, username, is_public, notify_follow, notify_rating, \
                   notify_leaderboard, notify_post, created_at",
    )
    .bind(user.id)
    .bind(payload.is_public)
    .bind(payload.notify_follow)
    .bind(payload.notify_rating)
    .bind(payload.notify_leaderboard)
    .bind(payload.notify_post)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("Preferences updated for user {}", username);

    Ok(Json(updated))
}

#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub message: String,
}

/// Delete a user and all associated data
///
/// Postings, reviews, follows, bookmarks, notifications and the
/// leaderboard row all go with the user via cascade.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<DeleteUserResponse>> {
    let result = sqlx::query("DELETE FROM users WHERE username = $1")
        .bind(&username)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!("User {} and all associated data deleted", username);

    Ok(Json(DeleteUserResponse {
        success: true,
        message: "User and all associated data permanently deleted".to_string(),
    }))
}

/// Look up a user by username, answering a generic 404 when absent
pub async fn fetch_user_by_name(state: &AppState, username: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, is_public, notify_follow, notify_rating, \
                notify_leaderboard, notify_post, created_at \
         FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound)
}

/// Look up a user by id, answering a generic 404 when absent
pub async fn fetch_user_by_id(state: &AppState, user_id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, is_public, notify_follow, notify_rating, \
                notify_leaderboard, notify_post, created_at \
         FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound)
}
