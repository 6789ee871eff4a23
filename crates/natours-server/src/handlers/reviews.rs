//! Review handlers. Mounted both standalone and under a tour, so every
//! handler reads the optional `:tourId`.

use crate::{
    error::{ApiError, ApiResult, ErrorContext},
    middleware::{Auth, QueryParams},
    models::Review,
    repository::{Condition, ListQuery},
    request::{
        CleanPath, CreateReviewRequest, ReviewScope, ScopedIdPath, UpdateReviewRequest, ValidJson,
    },
    response::{no_content, ApiResponse, Document},
    state::AppState,
};
use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

type ReviewResponse = ApiResponse<Document<Review>>;

pub async fn list_reviews(
    State(state): State<AppState>,
    CleanPath(scope): CleanPath<ReviewScope>,
    params: QueryParams,
) -> ApiResult<ApiResponse<Document<Vec<Review>>>> {
    let mut query = ListQuery::from_params(&params);
    if let Some(tour_id) = scope.tour_id {
        query = query.filter(Condition::Eq("tour".into(), Value::String(tour_id.to_string())));
    }

    let reviews = state.reviews.find(&query).await?;
    Ok(ApiResponse::list(reviews))
}

pub async fn get_review(
    State(state): State<AppState>,
    CleanPath(path): CleanPath<ScopedIdPath>,
) -> ApiResult<ReviewResponse> {
    let review = find_scoped(&state, &path).await?;
    Ok(ApiResponse::document(review))
}

/// The route's tour wins over the body, and the caller is the author unless
/// the body names one.
pub async fn create_review(
    State(state): State<AppState>,
    CleanPath(scope): CleanPath<ReviewScope>,
    Auth(identity): Auth,
    ValidJson(body): ValidJson<CreateReviewRequest>,
) -> ApiResult<ReviewResponse> {
    let tour = scope
        .tour_id
        .or(body.tour)
        .ok_or_else(|| ApiError::BadRequest("Review must belong to a tour.".into()))?;
    state.tours.find_by_id(tour).await?.not_found("tour")?;

    let review = Review {
        id: Uuid::new_v4(),
        review: body.review,
        rating: body.rating,
        tour,
        user: body.user.unwrap_or(identity.id),
        created_at: Utc::now(),
    };

    let review = state.reviews.create(review).await?;
    info!(review_id = %review.id, tour_id = %tour, user_id = %identity.id, "Review created");
    Ok(ApiResponse::document(review).created())
}

pub async fn update_review(
    State(state): State<AppState>,
    CleanPath(path): CleanPath<ScopedIdPath>,
    ValidJson(body): ValidJson<UpdateReviewRequest>,
) -> ApiResult<ReviewResponse> {
    find_scoped(&state, &path).await?;

    let patch = serde_json::to_value(&body).context("serializing review update")?;
    let review = state.reviews.update(path.id, patch).await?.not_found("review")?;
    Ok(ApiResponse::document(review))
}

pub async fn delete_review(
    State(state): State<AppState>,
    CleanPath(path): CleanPath<ScopedIdPath>,
) -> ApiResult<StatusCode> {
    find_scoped(&state, &path).await?;
    state.reviews.delete(path.id).await?;
    Ok(no_content())
}

/// Review by id, which must belong to the route's tour when there is one.
async fn find_scoped(state: &AppState, path: &ScopedIdPath) -> ApiResult<Review> {
    state
        .reviews
        .find_by_id(path.id)
        .await?
        .filter(|review| path.tour_id.map_or(true, |tour| review.tour == tour))
        .not_found("review")
}
