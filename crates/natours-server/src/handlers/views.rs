//! Rendered pages.

use crate::{
    error::{ApiResult, ErrorContext},
    middleware::Auth,
    repository::{Condition, ListQuery},
    request::{CleanPath, SlugPath},
    state::AppState,
    views::View,
};
use axum::{
    extract::State,
    response::Html,
};
use serde_json::Value;

pub async fn overview(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let tours = state.tours.find(&ListQuery::new().sort_by("-createdAt")).await?;
    let page = state.views.render(&View::Overview { tours: &tours })?;
    Ok(Html(page))
}

pub async fn tour(
    State(state): State<AppState>,
    CleanPath(SlugPath { slug }): CleanPath<SlugPath>,
) -> ApiResult<Html<String>> {
    let tour = state
        .tours
        .find_one("slug", Value::String(slug))
        .await?
        .not_found("tour")?;

    let reviews = state
        .reviews
        .find(&ListQuery::new().filter(Condition::Eq("tour".into(), Value::String(tour.id.to_string()))))
        .await?;

    let page = state.views.render(&View::Tour { tour: &tour, reviews: &reviews })?;
    Ok(Html(page))
}

pub async fn login(State(state): State<AppState>) -> ApiResult<Html<String>> {
    Ok(Html(state.views.render(&View::Login)?))
}

pub async fn account(State(state): State<AppState>, Auth(user): Auth) -> ApiResult<Html<String>> {
    Ok(Html(state.views.render(&View::Account { user: &user })?))
}
