//! Tour handlers.

use crate::{
    error::{ApiError, ApiResult, ErrorContext},
    middleware::{ParamValue, QueryParams, RequestTime},
    models::{tour::slugify, Tour},
    repository::ListQuery,
    request::{CleanPath, CreateTourRequest, TourIdPath, UpdateTourRequest, ValidJson},
    response::{no_content, ApiResponse, Document},
    state::AppState,
};
use axum::{
    extract::{Request, State},
    http::StatusCode,
};
use chrono::Utc;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

type TourResponse = ApiResponse<Document<Tour>>;

/// Rewrites the query of `/top-5-cheap` before it reaches [`list_tours`].
pub async fn alias_top_tours(mut req: Request) -> Result<Request, ApiError> {
    let mut params = req
        .extensions()
        .get::<QueryParams>()
        .cloned()
        .unwrap_or_default();
    params.set("limit", ParamValue::Single("5".into()));
    params.set("sort", ParamValue::Single("-ratingsAverage,price".into()));
    params.install(&mut req)?;
    Ok(req)
}

pub async fn list_tours(
    State(state): State<AppState>,
    RequestTime(requested_at): RequestTime,
    params: QueryParams,
) -> ApiResult<ApiResponse<Document<Vec<Tour>>>> {
    let query = ListQuery::from_params(&params);
    let tours = state.tours.find(&query).await?;
    Ok(ApiResponse::list(tours).requested_at(requested_at))
}

pub async fn get_tour(
    State(state): State<AppState>,
    CleanPath(TourIdPath { id }): CleanPath<TourIdPath>,
) -> ApiResult<TourResponse> {
    let tour = state.tours.find_by_id(id).await?.not_found("tour")?;
    Ok(ApiResponse::document(tour))
}

pub async fn create_tour(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CreateTourRequest>,
) -> ApiResult<TourResponse> {
    let tour = Tour {
        id: Uuid::new_v4(),
        slug: slugify(&body.name),
        name: body.name,
        duration: body.duration,
        max_group_size: body.max_group_size,
        difficulty: body.difficulty,
        ratings_average: body.ratings_average.unwrap_or(4.5),
        ratings_quantity: 0,
        price: body.price,
        summary: body.summary,
        created_at: Utc::now(),
    };

    let tour = state.tours.create(tour).await?;
    info!(tour_id = %tour.id, name = %tour.name, "Tour created");
    Ok(ApiResponse::document(tour).created())
}

pub async fn update_tour(
    State(state): State<AppState>,
    CleanPath(TourIdPath { id }): CleanPath<TourIdPath>,
    ValidJson(body): ValidJson<UpdateTourRequest>,
) -> ApiResult<TourResponse> {
    let mut patch = serde_json::to_value(&body).context("serializing tour update")?;
    if let (Some(name), Value::Object(fields)) = (&body.name, &mut patch) {
        fields.insert("slug".into(), Value::String(slugify(name)));
    }

    let tour = state.tours.update(id, patch).await?.not_found("tour")?;
    Ok(ApiResponse::document(tour))
}

pub async fn delete_tour(
    State(state): State<AppState>,
    CleanPath(TourIdPath { id }): CleanPath<TourIdPath>,
) -> ApiResult<StatusCode> {
    if !state.tours.delete(id).await? {
        return Err(ApiError::NotFound { resource: "tour" });
    }
    info!(tour_id = %id, "Tour deleted");
    Ok(no_content())
}
