use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{Postgres, QueryBuilder};

use crate::constants::{
    ERR_EMPTY_DOCUMENT, ERR_VERIFICATION_PENDING, FEATURED_LIMIT, FEATURED_MIN_AVG_RATING,
    POSTINGS_PAGE_SIZE,
};
use crate::error::{AppError, Result};
use crate::models::{NotificationKind, Posting, User, VerificationStatus};
use crate::routes::users::fetch_user_by_id;
use crate::{notify, scoring, verification, AppState};

/// Posting row decorated with its average rating
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PostingWithRating {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub posting: Posting,
    #[serde(rename = "avgRating")]
    pub avg_rating: Option<f64>,
    #[serde(skip_serializing)]
    #[sqlx(default)]
    pub total_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostingRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub name: String,
    pub region: String,
    pub district: String,
    pub sector: String,
    pub stipend: Option<i32>,
    #[serde(rename = "accommodationAvailable")]
    pub accommodation_available: Option<bool>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub contact: String,
    pub address: String,
}

/// Create a placement posting
///
/// The posting saves first; score recomputation and follower notifications
/// run afterwards as best-effort steps that never fail the create.
pub async fn create_posting(
    State(state): State<AppState>,
    Json(payload): Json<CreatePostingRequest>,
) -> Result<Json<Posting>> {
    // 1. Validate user-supplied fields
    Posting::validate_fields(
        &payload.name,
        &payload.region,
        &payload.district,
        &payload.sector,
        &payload.address,
        payload.stipend,
    )
    .map_err(AppError::InvalidInput)?;

    // 2. The posting owner must exist
    let owner = fetch_user_by_id(&state, payload.user_id).await?;

    // 3. Insert; (name, address) is unique system-wide
    let posting = sqlx::query_as::<_, Posting>(
        "INSERT INTO postings \
             (name, region, district, sector, stipend, accommodation_available, \
              description, contact, address, posted_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING *",
    )
    .bind(&payload.name)
    .bind(&payload.region)
    .bind(&payload.district)
    .bind(&payload.sector)
    .bind(payload.stipend)
    .bind(payload.accommodation_available)
    .bind(&payload.description)
    .bind(&payload.contact)
    .bind(&payload.address)
    .bind(owner.id)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::DuplicatePosting,
        other => AppError::Database(other),
    })?;

    tracing::info!(
        "Posting {} created by {}: {} ({})",
        posting.id,
        owner.username,
        posting.name,
        posting.region
    );

    // 4. Recompute the owner's score (best-effort)
    if let Err(err) = scoring::refresh_user(&state.pool, owner.id).await {
        tracing::error!("Leaderboard update failed for user {}: {}", owner.id, err);
    }

    // 5. Notify followers who opted in (best-effort)
    if let Err(err) = notify_followers_of_post(&state, &owner, posting.id).await {
        tracing::error!(
            "Follower notifications failed for posting {}: {}",
            posting.id,
            err
        );
    }

    Ok(Json(posting))
}

/// Deliver a post notification to every follower who opted in
async fn notify_followers_of_post(state: &AppState, poster: &User, posting_id: i64) -> Result<()> {
    let followers: Vec<i64> = sqlx::query_scalar(
        "SELECT f.follower_id FROM follows f \
         JOIN users u ON u.id = f.follower_id \
         WHERE f.followed_id = $1 AND u.notify_post = TRUE",
    )
    .bind(poster.id)
    .fetch_all(&state.pool)
    .await?;

    let message = format!("{} posted a new placement.", poster.username);
    for follower_id in followers {
        notify::deliver(
            &state.pool,
            follower_id,
            NotificationKind::Post,
            &message,
            json!({ "urls": { "postUrl": format!("/postings/{}", posting_id) } }),
        )
        .await?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ListPostingsParams {
    pub region: Option<String>,
    pub district: Option<String>,
    pub sector: Option<String>,
    #[serde(rename = "minStipend")]
    pub min_stipend: Option<i32>,
    /// "yes" or "no"; anything else is ignored
    pub accommodation: Option<String>,
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListPostingsResponse {
    pub postings: Vec<PostingWithRating>,
    #[serde(rename = "currentPage")]
    pub current_page: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
    #[serde(rename = "hasPrevious")]
    pub has_previous: bool,
    #[serde(rename = "hasNext")]
    pub has_next: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<Vec<PostingWithRating>>,
}

/// List approved postings with filters and pagination
///
/// Filters are case-insensitive; the district filter only applies together
/// with a region. The first page additionally carries the featured
/// postings (average rating of 4 or better).
pub async fn list_postings(
    State(state): State<AppState>,
    Query(params): Query<ListPostingsParams>,
) -> Result<Json<ListPostingsResponse>> {
    let page = params.page.unwrap_or(1).max(1);
    let offset = (page - 1) * POSTINGS_PAGE_SIZE;

    let mut query = QueryBuilder::<Postgres>::new(
        "SELECT p.*, AVG(r.rating::float8) AS avg_rating, COUNT(*) OVER () AS total_count \
         FROM postings p LEFT JOIN reviews r ON r.posting_id = p.id \
         WHERE p.is_approved = TRUE",
    );

    if let Some(region) = params.region.as_deref().filter(|s| !s.is_empty()) {
        query.push(" AND LOWER(p.region) = LOWER(");
        query.push_bind(region);
        query.push(")");

        if let Some(district) = params.district.as_deref().filter(|s| !s.is_empty()) {
            query.push(" AND LOWER(p.district) = LOWER(");
            query.push_bind(district);
            query.push(")");
        }
    }
    if let Some(sector) = params.sector.as_deref().filter(|s| !s.is_empty()) {
        query.push(" AND LOWER(p.sector) = LOWER(");
        query.push_bind(sector);
        query.push(")");
    }
    if let Some(min_stipend) = params.min_stipend {
        query.push(" AND p.stipend >= ");
        query.push_bind(min_stipend);
    }
    match params.accommodation.as_deref() {
        Some("yes") => {
            query.push(" AND p.accommodation_available = TRUE");
        }
        Some("no") => {
            query.push(" AND p.accommodation_available = FALSE");
        }
        _ => {}
    }

    query.push(" GROUP BY p.id ORDER BY p.created_at DESC LIMIT ");
    query.push_bind(POSTINGS_PAGE_SIZE);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let postings = query
        .build_query_as::<PostingWithRating>()
        .fetch_all(&state.pool)
        .await?;

    let total_count = postings
        .first()
        .and_then(|row| row.total_count)
        .unwrap_or(0);
    let total_pages = ((total_count + POSTINGS_PAGE_SIZE - 1) / POSTINGS_PAGE_SIZE).max(1);

    let featured = if page == 1 {
        Some(featured_postings(&state).await?)
    } else {
        None
    };

    Ok(Json(ListPostingsResponse {
        postings,
        current_page: page,
        total_pages,
        has_previous: page > 1,
        has_next: page < total_pages,
        featured,
    }))
}

/// Best-rated approved postings shown alongside the first page
async fn featured_postings(state: &AppState) -> Result<Vec<PostingWithRating>> {
    let featured = sqlx::query_as::<_, PostingWithRating>(
        "SELECT p.*, AVG(r.rating::float8) AS avg_rating, COUNT(*) OVER () AS total_count \
         FROM postings p JOIN reviews r ON r.posting_id = p.id \
         WHERE p.is_approved = TRUE \
         GROUP BY p.id \
         HAVING AVG(r.rating::float8) >= $1 \
         ORDER BY AVG(r.rating::float8) DESC \
         LIMIT $2",
    )
    .bind(FEATURED_MIN_AVG_RATING)
    .bind(FEATURED_LIMIT)
    .fetch_all(&state.pool)
    .await?;
    Ok(featured)
}

/// Review decorated with the reviewer's username
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ReviewWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: crate::models::Review,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct PostingDetailResponse {
    #[serde(flatten)]
    pub posting: Posting,
    #[serde(rename = "avgRating")]
    pub avg_rating: Option<f64>,
    pub reviews: Vec<ReviewWithUser>,
}

/// Fetch a single posting with its reviews
pub async fn get_posting(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostingDetailResponse>> {
    let posting = sqlx::query_as::<_, Posting>("SELECT * FROM postings WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let avg_rating: Option<f64> =
        sqlx::query_scalar("SELECT AVG(rating::float8) FROM reviews WHERE posting_id = $1")
            .bind(id)
            .fetch_one(&state.pool)
            .await?;

    let reviews = sqlx::query_as::<_, ReviewWithUser>(
        "SELECT r.*, u.username FROM reviews r \
         JOIN users u ON u.id = r.user_id \
         WHERE r.posting_id = $1 ORDER BY r.created_at DESC",
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(PostingDetailResponse {
        posting,
        avg_rating,
        reviews,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostingRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub name: String,
    pub region: String,
    pub district: String,
    pub sector: String,
    pub stipend: Option<i32>,
    #[serde(rename = "accommodationAvailable")]
    pub accommodation_available: Option<bool>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub contact: String,
    pub address: String,
}

/// Edit a posting (owner only)
///
/// Non-owners get the same 404 as a missing posting.
pub async fn update_posting(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePostingRequest>,
) -> Result<Json<Posting>> {
    Posting::validate_fields(
        &payload.name,
        &payload.region,
        &payload.district,
        &payload.sector,
        &payload.address,
        payload.stipend,
    )
    .map_err(AppError::InvalidInput)?;

    let posting = sqlx::query_as::<_, Posting>(
        "UPDATE postings SET \
             name = $3, region = $4, district = $5, sector = $6, stipend = $7, \
             accommodation_available = $8, description = $9, contact = $10, \
             address = $11, updated_at = NOW() \
         WHERE id = $1 AND posted_by = $2 \
         RETURNING *",
    )
    .bind(id)
    .bind(payload.user_id)
    .bind(&payload.name)
    .bind(&payload.region)
    .bind(&payload.district)
    .bind(&payload.sector)
    .bind(payload.stipend)
    .bind(payload.accommodation_available)
    .bind(&payload.description)
    .bind(&payload.contact)
    .bind(&payload.address)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::DuplicatePosting,
        other => AppError::Database(other),
    })?
    .ok_or(AppError::NotFound)?;

    tracing::info!("Posting {} updated by user {}", id, payload.user_id);

    Ok(Json(posting))
}

#[derive(Debug, Deserialize)]
pub struct OwnerRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct DeletePostingResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Delete a posting (owner only) and recompute the owner's score
///
/// The delete succeeds even when the score recomputation fails; the
/// failure is only logged.
pub async fn delete_posting(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<OwnerRequest>,
) -> Result<Json<DeletePostingResponse>> {
    let result = sqlx::query("DELETE FROM postings WHERE id = $1 AND posted_by = $2")
        .bind(id)
        .bind(payload.user_id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!("Posting {} deleted by user {}", id, payload.user_id);

    if let Err(err) = scoring::refresh_user(&state.pool, payload.user_id).await {
        tracing::error!(
            "Leaderboard update failed for user {}: {}",
            payload.user_id,
            err
        );
    }

    Ok(Json(DeletePostingResponse {
        status: "success",
        message: "Posting deleted",
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerificationRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "documentText")]
    pub document_text: String,
}

#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub verified: bool,
    #[serde(rename = "verificationStatus")]
    pub verification_status: VerificationStatus,
}

/// Submit a verification document for a posting (owner only)
///
/// The extracted document text is matched against the posting's metadata;
/// a match verifies immediately, anything else queues manual review.
pub async fn request_verification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<VerificationRequest>,
) -> Result<Json<VerificationResponse>> {
    let posting =
        sqlx::query_as::<_, Posting>("SELECT * FROM postings WHERE id = $1 AND posted_by = $2")
            .bind(id)
            .bind(payload.user_id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or(AppError::NotFound)?;

    if !posting.verification_status.accepts_submission() {
        let message = match posting.verification_status {
            VerificationStatus::Pending => ERR_VERIFICATION_PENDING,
            _ => "This posting is already verified.",
        };
        return Err(AppError::InvalidInput(message.to_string()));
    }
    if payload.document_text.trim().is_empty() {
        return Err(AppError::InvalidInput(ERR_EMPTY_DOCUMENT.to_string()));
    }

    let outcome =
        verification::process_submission(&state.pool, &posting, &payload.document_text).await?;

    // A verified-flag change moves the owner's score (best-effort)
    if let Err(err) = scoring::refresh_user(&state.pool, payload.user_id).await {
        tracing::error!(
            "Leaderboard update failed for user {}: {}",
            payload.user_id,
            err
        );
    }

    Ok(Json(VerificationResponse {
        status: "success",
        message: "Verification request processed.",
        verified: outcome.verified(),
        verification_status: outcome.status(),
    }))
}
