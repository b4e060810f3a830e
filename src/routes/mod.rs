pub mod admin;
pub mod bookmarks;
pub mod follows;
pub mod health;
pub mod leaderboard;
pub mod notifications;
pub mod postings;
pub mod reviews;
pub mod users;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::AppState;

/// Build the application router over the shared state
///
/// Used by `main` and by the integration tests so both serve the same
/// surface.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/users", post(users::register_user))
        .route(
            "/api/users/:username",
            get(users::get_profile).delete(users::delete_user),
        )
        .route(
            "/api/users/:username/preferences",
            put(users::update_preferences),
        )
        .route(
            "/api/users/:username/follow",
            post(follows::toggle_follow).delete(follows::unfollow_user),
        )
        .route(
            "/api/postings",
            get(postings::list_postings).post(postings::create_posting),
        )
        .route(
            "/api/postings/:id",
            get(postings::get_posting)
                .put(postings::update_posting)
                .delete(postings::delete_posting),
        )
        .route(
            "/api/postings/:id/verification",
            post(postings::request_verification),
        )
        .route(
            "/api/postings/:id/reviews",
            post(reviews::submit_review).delete(reviews::delete_review),
        )
        .route(
            "/api/postings/:id/bookmark",
            get(bookmarks::check_bookmark).post(bookmarks::toggle_bookmark),
        )
        .route("/api/bookmarks", get(bookmarks::bookmarks_list))
        .route("/api/leaderboard", get(leaderboard::leaderboard))
        .route(
            "/api/notifications",
            get(notifications::list_notifications).delete(notifications::clear_notifications),
        )
        .route(
            "/api/notifications/unread-count",
            get(notifications::check_notifications),
        )
        .route(
            "/api/notifications/read",
            post(notifications::mark_notifications_read),
        )
        .route("/admin/stats", get(admin::admin_stats))
        .route("/admin/leaderboard/reset", post(admin::reset_leaderboard))
        .route(
            "/admin/notifications/sweep",
            post(admin::sweep_notifications),
        )
        .with_state(state)
}
