use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::ERR_SELF_FOLLOW;
use crate::error::{AppError, Result};
use crate::models::{Follow, NotificationKind};
use crate::notify;
use crate::routes::users::{fetch_user_by_id, fetch_user_by_name};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FollowRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub status: &'static str,
    pub action: &'static str,
    #[serde(rename = "followersCount")]
    pub followers_count: i64,
}

/// Follow or unfollow a user (toggle)
///
/// A second call for the same pair removes the edge. A new follow delivers
/// a notification to the followed user when they opted in; delivery
/// failures never fail the follow itself.
pub async fn toggle_follow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<FollowRequest>,
) -> Result<Json<FollowResponse>> {
    let followed = fetch_user_by_name(&state, &username).await?;
    let follower = fetch_user_by_id(&state, payload.user_id).await?;

    if followed.id == follower.id {
        return Err(AppError::InvalidInput(ERR_SELF_FOLLOW.to_string()));
    }

    let existing = sqlx::query_as::<_, Follow>(
        "SELECT id, follower_id, followed_id, created_at FROM follows \
         WHERE follower_id = $1 AND followed_id = $2",
    )
    .bind(follower.id)
    .bind(followed.id)
    .fetch_optional(&state.pool)
    .await?;

    let action = match existing {
        Some(follow) => {
            sqlx::query("DELETE FROM follows WHERE id = $1")
                .bind(follow.id)
                .execute(&state.pool)
                .await?;
            tracing::info!("User {} unfollowed {}", follower.username, followed.username);
            "unfollowed"
        }
        None => {
            sqlx::query("INSERT INTO follows (follower_id, followed_id) VALUES ($1, $2)")
                .bind(follower.id)
                .bind(followed.id)
                .execute(&state.pool)
                .await?;
            tracing::info!("User {} followed {}", follower.username, followed.username);

            if followed.notify_follow {
                let message = format!("{} followed you.", follower.username);
                let links =
                    json!({ "urls": { "followerUrl": format!("/users/{}", follower.username) } });
                if let Err(err) = notify::deliver(
                    &state.pool,
                    followed.id,
                    NotificationKind::Follow,
                    &message,
                    links,
                )
                .await
                {
                    tracing::error!(
                        "Error creating follow notification for {}: {}",
                        followed.username,
                        err
                    );
                }
            }
            "followed"
        }
    };

    let followers_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE followed_id = $1")
            .bind(followed.id)
            .fetch_one(&state.pool)
            .await?;

    Ok(Json(FollowResponse {
        status: "success",
        action,
        followers_count,
    }))
}

/// Remove a follow edge explicitly
///
/// Unlike the toggle, answers 400 when the caller was not following.
pub async fn unfollow_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<FollowRequest>,
) -> Result<Json<FollowResponse>> {
    let followed = fetch_user_by_name(&state, &username).await?;
    let follower = fetch_user_by_id(&state, payload.user_id).await?;

    let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followed_id = $2")
        .bind(follower.id)
        .bind(followed.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::InvalidInput(
            "Not following this user.".to_string(),
        ));
    }
    tracing::info!("User {} unfollowed {}", follower.username, followed.username);

    let followers_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE followed_id = $1")
            .bind(followed.id)
            .fetch_one(&state.pool)
            .await?;

    Ok(Json(FollowResponse {
        status: "success",
        action: "unfollowed",
        followers_count,
    }))
}
