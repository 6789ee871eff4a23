//! Rendered page routes.

use crate::{handlers::views, state::AppState};
use axum::{routing::get, Router};

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(views::overview))
        .route("/tour/:slug", get(views::tour))
        .route("/login", get(views::login))
        .route("/me", get(views::account).route_layer(state.auth_layer()))
}
